pub mod behavior;
pub mod module;
pub mod signal;
