pub mod dispatcher;
pub mod scheduler;
pub mod tracker;

pub use dispatcher::{AlertDispatcher, DispatchPolicy};
pub use scheduler::{Scheduler, SchedulerOptions};
pub use tracker::{StateTracker, run_tracker};
