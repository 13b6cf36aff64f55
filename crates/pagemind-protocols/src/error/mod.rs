//! Error types for the PageMind protocol layer.

mod model;
mod store;

pub use model::*;
pub use store::*;
