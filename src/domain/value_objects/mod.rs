pub mod check_kind;
pub mod delivery_status;
pub mod health_status;
pub mod probe_error;

pub use check_kind::CheckKind;
pub use delivery_status::DeliveryStatus;
pub use health_status::HealthStatus;
pub use probe_error::ProbeErrorKind;
