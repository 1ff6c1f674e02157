mod argument;
mod core;
mod field;
mod wrapper;

pub use self::core::*;
pub use argument::{Argument, Fallback, FallbackCause, Outcome};
pub(crate) use argument::{final_partial, starts_with_ignore_case};
pub use field::*;
pub use wrapper::*;
