pub mod channels;
pub mod persistence;
pub mod probers;
