//! Background tasks and the scheduler that drives them.

pub mod scheduler;

pub use scheduler::Scheduler;
