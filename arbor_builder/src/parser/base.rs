use thiserror::Error;

use crate::api::Argument;
use crate::model::InvokerKind;

/// A configuration error, raised while building or changing the command tree.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Config error: {0}")]
pub struct ConfigError(pub(crate) String);

/// The reasons an invocation fails.
///
/// Every variant renders to a message meant to be shown to the invoker verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    /// An argument could not be parsed.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// The invoker lacks the command's permission.
    #[error("You don't have the permission to do that.")]
    NoPermission,

    /// The command does not accept this kind of invoker.
    #[error("You cannot execute this command here!")]
    SourceRejected,

    /// A token was left over where a child command was expected.
    #[error("Unknown command '{0}'!")]
    UnknownCommand(String),

    /// A token was left over after every argument was satisfied.
    #[error("Unexpected argument '{0}'.")]
    UnexpectedArgument(String),

    /// The execution hook failed.
    #[error("{0}")]
    Execution(String),
}

impl CommandError {
    /// An execution failure with the given message.
    pub fn execution(message: impl Into<String>) -> Self {
        CommandError::Execution(message.into())
    }
}

/// The way an argument failed to parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentErrorKind {
    /// No token was available.
    Missing,
    /// The token could not be parsed.
    Invalid {
        /// The offending input.
        input: String,
    },
    /// The token was parsed, but then rejected (ex: by a filter).
    Rejected {
        /// The offending input.
        input: String,
    },
    /// The invoker is not of the required kind.
    RequiresInvoker(InvokerKind),
    /// An error to report only if nothing more specific turns up later.
    Postponed(Box<ArgumentError>),
}

/// The failure of a single argument.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ArgumentError {
    argument: String,
    format: String,
    kind: ArgumentErrorKind,
    message: String,
    custom: bool,
}

impl ArgumentError {
    fn build(argument: &(impl Argument + ?Sized), kind: ArgumentErrorKind) -> Self {
        let format = error_format(argument);
        let message = render(&kind, &format);
        Self {
            argument: argument.name().to_string(),
            format,
            kind,
            message,
            custom: false,
        }
    }

    /// No token was available for `argument`.
    pub fn missing(argument: &(impl Argument + ?Sized)) -> Self {
        Self::build(argument, ArgumentErrorKind::Missing)
    }

    /// `argument` could not parse `input`.
    pub fn invalid(argument: &(impl Argument + ?Sized), input: impl Into<String>) -> Self {
        Self::build(
            argument,
            ArgumentErrorKind::Invalid {
                input: input.into(),
            },
        )
    }

    /// `argument` parsed `input`, but rejected the result.
    pub fn rejected(argument: &(impl Argument + ?Sized), input: impl Into<String>) -> Self {
        Self::build(
            argument,
            ArgumentErrorKind::Rejected {
                input: input.into(),
            },
        )
    }

    /// `argument` can only be used by an invoker of `kind`.
    pub fn requires_invoker(argument: &(impl Argument + ?Sized), kind: InvokerKind) -> Self {
        Self::build(argument, ArgumentErrorKind::RequiresInvoker(kind))
    }

    /// Hold back `error`, so that a later, more specific error takes precedence.
    pub fn postponed(error: ArgumentError) -> Self {
        Self {
            argument: error.argument.clone(),
            format: error.format.clone(),
            message: error.message.clone(),
            custom: error.custom,
            kind: ArgumentErrorKind::Postponed(Box::new(error)),
        }
    }

    /// Replace the rendered message.
    /// The message then stays as is, even when the error is re-attributed to an enclosing argument.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self.custom = true;
        self
    }

    /// Attribute the error to `argument`, which encloses the argument that originally failed.
    pub fn attributed_to(self, argument: &(impl Argument + ?Sized)) -> Self {
        match self.kind {
            ArgumentErrorKind::Postponed(inner) => Self::postponed(inner.attributed_to(argument)),
            kind => {
                let format = error_format(argument);
                let message = if self.custom {
                    self.message
                } else {
                    render(&kind, &format)
                };

                Self {
                    argument: argument.name().to_string(),
                    format,
                    kind,
                    message,
                    custom: self.custom,
                }
            }
        }
    }

    /// The name of the argument this error is attributed to.
    pub fn argument(&self) -> &str {
        &self.argument
    }

    /// The format of the argument this error is attributed to.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// How the argument failed.
    pub fn kind(&self) -> &ArgumentErrorKind {
        &self.kind
    }

    /// The input the argument choked on, if any.
    pub fn input(&self) -> Option<&str> {
        match &self.kind {
            ArgumentErrorKind::Invalid { input } | ArgumentErrorKind::Rejected { input } => {
                Some(input)
            }
            ArgumentErrorKind::Postponed(inner) => inner.input(),
            _ => None,
        }
    }

    /// Whether no token was available.
    pub fn is_missing(&self) -> bool {
        matches!(self.kind, ArgumentErrorKind::Missing)
    }

    /// Whether the invoker was of the wrong kind.
    pub fn is_requires_invoker(&self) -> bool {
        matches!(self.kind, ArgumentErrorKind::RequiresInvoker(_))
    }

    /// Whether the input was parsed, but rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(self.kind, ArgumentErrorKind::Rejected { .. })
    }

    /// Whether this error is held back.
    pub fn is_postponed(&self) -> bool {
        matches!(self.kind, ArgumentErrorKind::Postponed(_))
    }

    /// Release a postponed error; any other error is returned as is.
    pub fn into_unpostponed(self) -> ArgumentError {
        match self.kind {
            ArgumentErrorKind::Postponed(inner) => inner.into_unpostponed(),
            _ => self,
        }
    }
}

// Hidden arguments have an empty format, but the error should still name them.
fn error_format(argument: &(impl Argument + ?Sized)) -> String {
    let format = argument.format();

    if format.is_empty() {
        format!("<{}>", argument.display_name())
    } else {
        format
    }
}

fn render(kind: &ArgumentErrorKind, format: &str) -> String {
    match kind {
        ArgumentErrorKind::Missing => format!("Missing argument '{format}'."),
        ArgumentErrorKind::Invalid { input } | ArgumentErrorKind::Rejected { input } => {
            format!("Invalid argument '{input}'.")
        }
        ArgumentErrorKind::RequiresInvoker(kind) => {
            format!("Argument '{format}' requires a {kind} to execute the command.")
        }
        ArgumentErrorKind::Postponed(inner) => inner.message.clone(),
    }
}
