pub mod composite;
pub mod log_file;
pub mod terminal;
pub mod webhook;

pub use composite::CompositeChannel;
pub use log_file::LogFileChannel;
pub use terminal::TerminalChannel;
pub use webhook::WebhookChannel;
