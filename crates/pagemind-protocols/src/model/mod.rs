//! Model backend protocol definitions.
//!
//! A backend exposes a capability probe and a factory for purpose-scoped
//! sessions. Sessions are exclusively owned by the pipeline that created them.

mod options;
mod traits;

pub use options::*;
pub use traits::*;
