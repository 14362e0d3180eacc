//! Domain models for the clinic queue.

mod consultation;
mod employee;
mod queue;
mod reference;
mod stats;

pub use consultation::*;
pub use employee::*;
pub use queue::*;
pub use reference::*;
pub use stats::*;
