pub mod bits;
pub mod queue;
