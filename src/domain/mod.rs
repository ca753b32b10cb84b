pub mod entities;
pub mod ports;
pub mod registry;
pub mod state_machine;
pub mod value_objects;
