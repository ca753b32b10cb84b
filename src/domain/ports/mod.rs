pub mod channel;
pub mod prober;
pub mod store;

pub use channel::{ChannelError, NotificationChannel};
pub use prober::Prober;
pub use store::{AlertStore, StatusStore, StoreError};
