use crate::constant::*;
use crate::model::Value;
use crate::parser::{ArgumentError, CommandInput, ResultStore, ResultView, TokenCursor};

/// The outcome of parsing an argument.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Parsed; zero token arguments may produce no value.
    Success(Option<Value>),
    /// Could not parse.
    Failure(ArgumentError),
    /// Could not parse, but a default may stand in once the rest of the arguments have been seen.
    Fallback(Fallback),
}

impl Outcome {
    /// A successful parse producing `value`.
    pub fn value(value: Value) -> Self {
        Outcome::Success(Some(value))
    }

    /// A successful parse producing nothing.
    pub fn empty() -> Self {
        Outcome::Success(None)
    }
}

impl From<ArgumentError> for Outcome {
    fn from(error: ArgumentError) -> Self {
        Outcome::Failure(error)
    }
}

impl From<Fallback> for Outcome {
    fn from(fallback: Fallback) -> Self {
        Outcome::Fallback(fallback)
    }
}

/// A pending fallback, raised by a fallback argument which failed its regular parse.
#[derive(Debug, Clone)]
pub struct Fallback {
    argument: String,
    cause: FallbackCause,
}

/// What a [`Fallback`] stands in for.
#[derive(Debug, Clone)]
pub enum FallbackCause {
    /// The regular parse failed with this error.
    Failed(ArgumentError),
    /// An inner argument raised this fallback.
    Chained(Box<Fallback>),
    /// Several alternatives each raised a fallback.
    Alternatives(Vec<Fallback>),
}

impl Fallback {
    /// A fallback for `argument`, whose regular parse failed with `error`.
    pub fn failed(argument: &(impl Argument + ?Sized), error: ArgumentError) -> Self {
        Self::new(argument, FallbackCause::Failed(error))
    }

    /// A fallback for `argument`, wrapping the fallback of an inner argument.
    pub fn chained(argument: &(impl Argument + ?Sized), inner: Fallback) -> Self {
        Self::new(argument, FallbackCause::Chained(Box::new(inner)))
    }

    /// A fallback for `argument`, gathering the fallbacks of its alternatives.
    pub fn alternatives(argument: &(impl Argument + ?Sized), fallbacks: Vec<Fallback>) -> Self {
        assert!(
            !fallbacks.is_empty(),
            "internal error - alternative fallbacks must not be empty"
        );
        Self::new(argument, FallbackCause::Alternatives(fallbacks))
    }

    fn new(argument: &(impl Argument + ?Sized), cause: FallbackCause) -> Self {
        Self {
            argument: argument.name().to_string(),
            cause,
        }
    }

    /// The name of the argument which raised this fallback.
    pub fn argument(&self) -> &str {
        &self.argument
    }

    /// What this fallback stands in for.
    pub fn cause(&self) -> &FallbackCause {
        &self.cause
    }

    /// The error at the bottom of the fallback chain.
    pub fn root_error(&self) -> &ArgumentError {
        match &self.cause {
            FallbackCause::Failed(error) => error,
            FallbackCause::Chained(inner) => inner.root_error(),
            FallbackCause::Alternatives(fallbacks) => fallbacks
                .first()
                .expect("internal error - alternative fallbacks must not be empty")
                .root_error(),
        }
    }
}

/// A unit of command grammar.
///
/// An argument claims zero or more of the leading tokens and turns them into a [`Value`].
/// Arguments compose: the higher order arguments ([`Optional`](crate::Optional), [`AnyFallback`](crate::AnyFallback), etc) own an inner argument and shape its outcome.
///
/// Implementors provide [`Argument::parse_value`]; the store writing [`Argument::parse`] is built on it.
pub trait Argument: Send + Sync {
    /// The name, unique among the arguments of a command.
    /// The parsed value is stored under this name.
    fn name(&self) -> &str;

    /// The name shown to users.
    fn display_name(&self) -> &str {
        self.name()
    }

    /// Whether this argument is shown as optional (`[name]`).
    /// This is display only; it doesn't change how the argument parses.
    fn is_optional(&self) -> bool {
        false
    }

    /// Whether this argument is left out of usage formats and completion short circuiting.
    fn is_hidden(&self) -> bool {
        false
    }

    /// The format without brackets.
    fn reduced_format(&self) -> String {
        if self.is_hidden() {
            String::default()
        } else {
            self.display_name().to_string()
        }
    }

    /// The format shown in usages: `<name>`, `[name]`, or empty when hidden.
    fn format(&self) -> String {
        let reduced = self.reduced_format();

        if reduced.is_empty() {
            reduced
        } else if self.is_optional() {
            format!("{OPTIONAL_OPEN}{reduced}{OPTIONAL_CLOSE}")
        } else {
            format!("{REQUIRED_OPEN}{reduced}{REQUIRED_CLOSE}")
        }
    }

    /// Parse the value from the front of `cursor`, without storing it.
    fn parse_value(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        view: &dyn ResultView,
    ) -> Outcome;

    /// Resolve a `fallback` previously raised by this argument, without storing the value.
    ///
    /// `parsing_failed` tells whether the arguments after this one failed to claim the remaining tokens.
    /// Only fallback arguments raise fallbacks, so the default refuses to resolve.
    fn resolve_fallback(
        &self,
        _input: &CommandInput,
        _cursor: &mut TokenCursor,
        _view: &dyn ResultView,
        fallback: &Fallback,
        _parsing_failed: bool,
    ) -> Outcome {
        Outcome::Failure(fallback.root_error().clone())
    }

    /// Suggestions for the final token, when this argument would consume it.
    fn complete(
        &self,
        _input: &CommandInput,
        _view: &dyn ResultView,
        _cursor: &mut TokenCursor,
    ) -> Vec<String> {
        Vec::default()
    }

    /// Parse the value from the front of `cursor`, storing it under [`Argument::name`].
    fn parse(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        store: &mut dyn ResultStore,
    ) -> Outcome {
        let outcome = self.parse_value(input, cursor, store.view());
        store_value(self.name(), &outcome, store);
        outcome
    }

    /// Resolve a `fallback` previously raised by this argument, storing the value under [`Argument::name`].
    fn parse_fallback(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        store: &mut dyn ResultStore,
        fallback: &Fallback,
        parsing_failed: bool,
    ) -> Outcome {
        let outcome = self.resolve_fallback(input, cursor, store.view(), fallback, parsing_failed);
        store_value(self.name(), &outcome, store);
        outcome
    }
}

fn store_value(name: &str, outcome: &Outcome, store: &mut dyn ResultStore) {
    if let Outcome::Success(Some(value)) = outcome {
        store.put(name, value.clone());
    }
}

impl<A: Argument + ?Sized> Argument for Box<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn display_name(&self) -> &str {
        (**self).display_name()
    }

    fn is_optional(&self) -> bool {
        (**self).is_optional()
    }

    fn is_hidden(&self) -> bool {
        (**self).is_hidden()
    }

    fn reduced_format(&self) -> String {
        (**self).reduced_format()
    }

    fn format(&self) -> String {
        (**self).format()
    }

    fn parse_value(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        view: &dyn ResultView,
    ) -> Outcome {
        (**self).parse_value(input, cursor, view)
    }

    fn resolve_fallback(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        view: &dyn ResultView,
        fallback: &Fallback,
        parsing_failed: bool,
    ) -> Outcome {
        (**self).resolve_fallback(input, cursor, view, fallback, parsing_failed)
    }

    fn complete(
        &self,
        input: &CommandInput,
        view: &dyn ResultView,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        (**self).complete(input, view, cursor)
    }

    fn parse(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        store: &mut dyn ResultStore,
    ) -> Outcome {
        (**self).parse(input, cursor, store)
    }

    fn parse_fallback(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        store: &mut dyn ResultStore,
        fallback: &Fallback,
        parsing_failed: bool,
    ) -> Outcome {
        (**self).parse_fallback(input, cursor, store, fallback, parsing_failed)
    }
}

// Case insensitive prefix match, used to filter suggestions.
pub(crate) fn starts_with_ignore_case(candidate: &str, prefix: &str) -> bool {
    candidate.to_lowercase().starts_with(&prefix.to_lowercase())
}

// The partial final token, when the cursor is positioned to consume it.
pub(crate) fn final_partial(cursor: &TokenCursor) -> Option<&str> {
    if cursor.remaining() == 1 {
        cursor.peek_if_present()
    } else {
        None
    }
}
