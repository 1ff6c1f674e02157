//! Traits which, typically, may be imported without concern: `use arbor::prelude::*`.

pub use crate::api::{Argument, ArgumentExt};
pub use crate::parser::{Invoker, PermissionOracle, ResultStore, ResultView};
