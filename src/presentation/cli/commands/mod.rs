pub mod check;
pub mod daemon;
pub mod status;
pub mod validate;
