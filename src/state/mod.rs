//! Form state model and per-level authoritative stores

mod scope;
mod store;
mod value;

pub use scope::*;
pub use store::*;
pub use value::*;
