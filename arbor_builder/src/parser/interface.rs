use std::rc::Rc;

use crate::model::InvokerKind;

/// The actor invoking a command, as supplied by the host.
pub trait Invoker {
    /// What kind of actor this is.
    fn kind(&self) -> InvokerKind;

    /// The name of the actor (ex: the player name).
    fn name(&self) -> &str;

    /// Deliver feedback to the actor.
    fn send_message(&self, message: &str);
}

/// Decides whether an invoker holds a permission.
///
/// Implemented for any `Fn(&dyn Invoker, &str) -> bool`.
///
/// ### Example
/// ```
/// # use arbor_builder as arbor;
/// use arbor::{ConsoleInvoker, Invoker, PermissionOracle};
///
/// let oracle = |invoker: &dyn Invoker, permission: &str| {
///     invoker.name() == "CONSOLE" || permission.starts_with("shop.")
/// };
/// assert!(oracle.has_permission(&ConsoleInvoker::default(), "other"));
/// ```
pub trait PermissionOracle {
    /// Whether `invoker` holds `permission`.
    fn has_permission(&self, invoker: &dyn Invoker, permission: &str) -> bool;
}

impl<F> PermissionOracle for F
where
    F: Fn(&dyn Invoker, &str) -> bool,
{
    fn has_permission(&self, invoker: &dyn Invoker, permission: &str) -> bool {
        self(invoker, permission)
    }
}

/// A [`PermissionOracle`] granting everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl PermissionOracle for AllowAll {
    fn has_permission(&self, _invoker: &dyn Invoker, _permission: &str) -> bool {
        true
    }
}

/// The host console, printing feedback to stdout.
#[derive(Debug, Default)]
pub struct ConsoleInvoker {}

impl Invoker for ConsoleInvoker {
    fn kind(&self) -> InvokerKind {
        InvokerKind::Console
    }

    fn name(&self) -> &str {
        "CONSOLE"
    }

    fn send_message(&self, message: &str) {
        println!("{message}");
    }
}

/// A single invocation: who invokes, by which alias, with which tokens.
///
/// The permission oracle is carried along, so every check during dispatch and completion goes through it.
pub struct CommandInput<'a> {
    invoker: &'a dyn Invoker,
    oracle: &'a dyn PermissionOracle,
    alias: String,
    tokens: Rc<[String]>,
}

impl<'a> std::fmt::Debug for CommandInput<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandInput")
            .field("invoker", &self.invoker.name())
            .field("alias", &self.alias)
            .field("tokens", &self.tokens)
            .finish()
    }
}

impl<'a> CommandInput<'a> {
    /// Create the input for one invocation.
    pub fn new<I, S>(
        invoker: &'a dyn Invoker,
        oracle: &'a dyn PermissionOracle,
        alias: impl Into<String>,
        tokens: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            invoker,
            oracle,
            alias: alias.into(),
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// The invoker.
    pub fn invoker(&self) -> &dyn Invoker {
        self.invoker
    }

    /// The alias the root command was invoked by.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The tokens following the alias.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub(crate) fn shared_tokens(&self) -> Rc<[String]> {
        self.tokens.clone()
    }

    /// Whether the invoker holds `permission`.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.oracle.has_permission(self.invoker, permission)
    }
}

/// *Available using 'unit_test' crate feature only.*</br></br>
/// An [`Invoker`] that records the messages it is sent.
#[cfg(any(test, feature = "unit_test"))]
pub struct RecordingInvoker {
    kind: InvokerKind,
    name: String,
    messages: std::cell::RefCell<Vec<String>>,
}

#[cfg(any(test, feature = "unit_test"))]
impl RecordingInvoker {
    /// A player called `name`.
    pub fn player(name: impl Into<String>) -> Self {
        Self::new(InvokerKind::Player, name)
    }

    /// The console.
    pub fn console() -> Self {
        Self::new(InvokerKind::Console, "CONSOLE")
    }

    /// An invoker of any kind.
    pub fn new(kind: InvokerKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            messages: std::cell::RefCell::new(Vec::default()),
        }
    }

    /// The messages sent so far.
    pub fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }

    /// Take the messages sent so far, joined by newlines.
    pub fn consume_messages(&self) -> String {
        self.messages.take().join("\n")
    }
}

#[cfg(any(test, feature = "unit_test"))]
impl Invoker for RecordingInvoker {
    fn kind(&self) -> InvokerKind {
        self.kind.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn send_message(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}
