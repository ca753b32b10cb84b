pub mod alert;
pub mod check;
pub mod state;
pub mod target;

pub use alert::{Alert, AlertMessage, Transition};
pub use check::{CheckResult, ProbeFailure};
pub use state::TargetState;
pub use target::Target;
