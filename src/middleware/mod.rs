//! Update-path middleware: interceptors and their stock policies

mod debounce;
mod interceptor;
mod pipeline;
mod validation;

pub use debounce::*;
pub use interceptor::*;
pub use pipeline::*;
pub use validation::*;
