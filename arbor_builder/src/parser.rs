mod backtrack;
mod base;
mod cursor;
mod interface;
mod middleware;
mod printer;
mod registry;
mod store;

pub use base::{ArgumentError, ArgumentErrorKind, CommandError, ConfigError};
pub use cursor::{CursorError, CursorState, TokenCursor};
#[cfg(any(test, feature = "unit_test"))]
pub use interface::RecordingInvoker;
pub use interface::{AllowAll, CommandInput, ConsoleInvoker, Invoker, PermissionOracle};
pub use middleware::{CommandId, CommandTree};
pub(crate) use middleware::{CommandNode, Executor};
pub(crate) use registry::CommandRegistry;
pub use store::{BufferedResultStore, ResultStore, ResultView, SimpleResultStore};
