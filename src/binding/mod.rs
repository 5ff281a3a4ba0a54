//! Leaf bindings: field read/write and error display

mod error;
mod field;

pub use error::*;
pub use field::*;
