pub mod config;
pub mod registry_handle;
pub mod services;
