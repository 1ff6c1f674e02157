//! `arbor` is an in-process command parser and dispatcher for Rust.
//!
//! It targets hosts which expose a tree of sub-commands to their users, such as a game server plugin or an admin console.
//! The host hands `arbor` the tokens of one invocation; `arbor` selects the command, parses the typed arguments, and runs the command.
//! The very same grammar drives autocompletion of partially typed input.
//!
//! `arbor` prioritizes the following design concerns:
//! * *Type safe argument parsing*:
//! The user should not call any `&str -> T` conversion functions directly.
//! * *Defaults that don't steal tokens*:
//! An argument may fall back to a default (ex: the invoker's own name), but only once no later argument wants its token.
//! * *One grammar, two uses*:
//! Dispatch and autocompletion walk the same arguments, so suggestions never disagree with what parses.
//! * *Specific feedback*:
//! When nothing fits, the most specific error is reported, rendered ready for display.
//!
//! # Usage
//! ```no_run
#![doc = include_str!("../demos/demo_shop.rs")]
//! ```
//!
//! ```console
//! $ demo_shop give 5 stone
//! Gave 5 stone to CONSOLE.
//!
//! $ demo_shop give bob hand
//! Gave 1 hand to bob.
//!
//! $ demo_shop remove notanumber
//! Invalid argument 'notanumber'.
//!
//! $ demo_shop delete 0
//! There is no shop 0.
//!
//! $ demo_shop --complete give b
//! bob
//! ```
//!
//! # Commands
//! Configure `arbor` by starting with a root [`Command`], adding its [arguments](Command::argument) and [children](Command::child).
//! Build the tree with [`Command::build`] (or [`Command::build_tree`] to handle the [`ConfigError`] yourself).
//!
//! A command may be reached by its name or any of its aliases, ignoring case.
//! When two sibling commands claim the same alias, the first one keeps it.
//!
//! Dispatch descends the tree one token at a time, as long as the token names a child.
//! The remaining tokens are parsed by the arguments of the command reached, after which its executor runs.
//! A command without an executor sends its help instead.
//!
//! # Arguments
//! Every argument implements [`Argument`].
//! The built-in arguments are:
//! * [`Scalar`]: a single token, converted via [`std::str::FromStr`].
//! * [`Literal`]: one fixed word.
//! * [`Text`]: every remaining token, joined by spaces.
//! * [`SenderName`]: the invoker's name, consuming nothing.
//! * [`Constant`]: a fixed value, consuming nothing.
//! * [`FirstOf`]: the first of several alternatives to parse.
//!
//! Arguments are composed via [`ArgumentExt`](prelude::ArgumentExt) (import with `use arbor::prelude::*`):
//! * [`optional`](prelude::ArgumentExt::optional): parse to nothing instead of failing.
//! * [`or_fallback`](prelude::ArgumentExt::or_fallback) & [`or_default`](prelude::ArgumentExt::or_default): fall back to another argument (or a value) once the following arguments have had their go.
//! * [`map`](prelude::ArgumentExt::map) & [`filter`](prelude::ArgumentExt::filter): transform or reject the parsed value.
//! * [`postpone_errors`](prelude::ArgumentExt::postpone_errors): report the failure only if nothing more specific turns up.
//!
//! ### Fallbacks
//! Consider the arguments `<player> <amount>`, where the player falls back to the invoker.
//! With the tokens `5`, the player fails to parse `5`, and so raises a fallback rather than an error.
//! The amount then claims `5`, after which the fallback resolves to the invoker.
//! With the tokens `notanumber`, neither argument claims the token; the amount's error is reported, since it is the more specific one.
//!
//! # Autocompletion
//! [`CommandTree::complete`] produces [`Suggestions`] for the final (possibly partial) token.
//! Every candidate starts with that token, ignoring case.
//! When there are none, [`Suggestions::HostDefault`] tells the host to use its own default completion.
//!
//! # Features
//! * `tracing_debug`: emit debug events via [`tracing`](https://docs.rs/tracing).
//! * `unit_test`: expose [`RecordingInvoker`](https://docs.rs/arbor_builder/latest/arbor_builder/struct.RecordingInvoker.html), for testing a host's commands.
pub use arbor_builder::*;
