use std::any::Any;
use std::fmt::Debug;
use std::marker::PhantomData;

use crate::api::argument::*;
use crate::api::field::Constant;
use crate::constant::*;
use crate::model::Value;
use crate::parser::{ArgumentError, CommandInput, CursorState, ResultView, TokenCursor};

/// Behaviour to compose arguments into higher order arguments.
///
/// ### Example
/// ```
/// # use arbor_builder as arbor;
/// use arbor::prelude::*;
/// use arbor::{Argument, Scalar, SenderName};
///
/// let page = Scalar::<u32>::new("page").or_default(1u32);
/// assert_eq!(page.format(), "[page]");
///
/// let player = Scalar::<String>::new("player").or_fallback(SenderName::new("self"));
/// assert_eq!(player.format(), "<player>");
/// ```
pub trait ArgumentExt: Argument + Sized {
    /// Parse to nothing (restoring the cursor) instead of failing.
    fn optional(self) -> Optional<Self> {
        Optional { argument: self }
    }

    /// When parsing fails, consider `fallback` instead, unless a later argument claims the tokens.
    fn or_fallback<F: Argument>(self, fallback: F) -> AnyFallback<Self, F> {
        AnyFallback {
            argument: self,
            fallback,
        }
    }

    /// When parsing fails, use `value` instead, unless a later argument claims the tokens.
    fn or_default<T>(self, value: T) -> DefaultValue<Self>
    where
        T: Any + Debug + Send + Sync,
    {
        let constant = Constant::new(self.name().to_string(), Value::new(value));
        self.or_fallback(constant)
    }

    /// Transform the parsed `T` into a `U`.
    ///
    /// Values of any other type (ex: from a fallback of another type) are rejected.
    fn map<T, U, F>(self, function: F) -> Mapped<Self, T, U, F>
    where
        T: Any,
        U: Any + Debug + Send + Sync,
        F: Fn(&T) -> U + Send + Sync,
    {
        Mapped {
            argument: self,
            function,
            _phantom: PhantomData,
        }
    }

    /// Reject parsed values that don't satisfy `predicate`.
    fn filter<T, F>(self, predicate: F) -> Filtered<Self, T, F>
    where
        T: Any,
        F: Fn(&T) -> bool + Send + Sync,
    {
        Filtered {
            argument: self,
            predicate,
            _phantom: PhantomData,
        }
    }

    /// Hold back failures, so that a later argument's failure is reported instead.
    fn postpone_errors(self) -> Postponing<Self> {
        Postponing { argument: self }
    }

    /// Erase the argument type, as held by a command.
    fn boxed(self) -> Box<dyn Argument>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<A: Argument> ArgumentExt for A {}

// Delegates the naming and display of a wrapper to its inner argument.
macro_rules! delegate_display {
    ($field:ident) => {
        fn name(&self) -> &str {
            self.$field.name()
        }

        fn display_name(&self) -> &str {
            self.$field.display_name()
        }

        fn is_hidden(&self) -> bool {
            self.$field.is_hidden()
        }

        fn reduced_format(&self) -> String {
            self.$field.reduced_format()
        }
    };
}

/// See [`ArgumentExt::optional`].
pub struct Optional<A> {
    argument: A,
}

impl<A: Argument> Optional<A> {
    fn or_empty(&self, outcome: Outcome, cursor: &mut TokenCursor, state: &CursorState) -> Outcome {
        match outcome {
            Outcome::Failure(_) => {
                cursor.set_state(state);
                Outcome::empty()
            }
            Outcome::Fallback(fallback) => Fallback::chained(self, fallback).into(),
            success => success,
        }
    }
}

impl<A: Argument> Argument for Optional<A> {
    delegate_display!(argument);

    fn is_optional(&self) -> bool {
        true
    }

    fn parse_value(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        view: &dyn ResultView,
    ) -> Outcome {
        let state = cursor.state();
        let outcome = self.argument.parse_value(input, cursor, view);
        self.or_empty(outcome, cursor, &state)
    }

    fn resolve_fallback(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        view: &dyn ResultView,
        fallback: &Fallback,
        parsing_failed: bool,
    ) -> Outcome {
        match fallback.cause() {
            FallbackCause::Chained(inner) => {
                let state = cursor.state();
                let outcome =
                    self.argument
                        .resolve_fallback(input, cursor, view, inner, parsing_failed);
                self.or_empty(outcome, cursor, &state)
            }
            _ => Outcome::Failure(fallback.root_error().clone()),
        }
    }

    fn complete(
        &self,
        input: &CommandInput,
        view: &dyn ResultView,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        self.argument.complete(input, view, cursor)
    }
}

/// See [`ArgumentExt::or_fallback`].
///
/// A failed parse raises a [`Fallback`] instead of failing.
/// Once the following arguments have been parsed, the fallback is resolved by parsing the `fallback` argument in its place.
pub struct AnyFallback<A, F> {
    argument: A,
    fallback: F,
}

/// See [`ArgumentExt::or_default`].
pub type DefaultValue<A> = AnyFallback<A, Constant>;

impl<A: Argument, F: Argument> AnyFallback<A, F> {
    fn resolve_chained(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        view: &dyn ResultView,
        fallback: &Fallback,
        parsing_failed: bool,
    ) -> Option<Outcome> {
        let FallbackCause::Chained(inner) = fallback.cause() else {
            return None;
        };

        let state = cursor.state();
        match self
            .argument
            .resolve_fallback(input, cursor, view, inner, parsing_failed)
        {
            Outcome::Success(value) => Some(Outcome::Success(value)),
            // The inner fallback didn't work out; try ours.
            Outcome::Failure(_) | Outcome::Fallback(_) => {
                cursor.set_state(&state);
                None
            }
        }
    }
}

impl<A: Argument, F: Argument> Argument for AnyFallback<A, F> {
    delegate_display!(argument);

    fn is_optional(&self) -> bool {
        self.argument.is_optional() || self.fallback.is_optional()
    }

    fn parse_value(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        view: &dyn ResultView,
    ) -> Outcome {
        // The caller restores the cursor.
        match self.argument.parse_value(input, cursor, view) {
            Outcome::Failure(error) => Fallback::failed(self, error).into(),
            Outcome::Fallback(fallback) => Fallback::chained(self, fallback).into(),
            success => success,
        }
    }

    fn resolve_fallback(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        view: &dyn ResultView,
        fallback: &Fallback,
        parsing_failed: bool,
    ) -> Outcome {
        if let Some(outcome) = self.resolve_chained(input, cursor, view, fallback, parsing_failed) {
            return outcome;
        }

        match self.fallback.parse_value(input, cursor, view) {
            Outcome::Failure(error) if error.is_missing() || error.is_requires_invoker() => {
                if parsing_failed {
                    // The cursor was reset; the original argument would fail the same way again.
                    Outcome::Failure(fallback.root_error().clone())
                } else {
                    // The following arguments took the tokens, so the original argument likely fails differently now.
                    match self.argument.parse_value(input, cursor, view) {
                        Outcome::Fallback(again) => Outcome::Failure(again.root_error().clone()),
                        outcome => outcome,
                    }
                }
            }
            Outcome::Fallback(nested) => Outcome::Failure(nested.root_error().clone()),
            outcome => outcome,
        }
    }

    fn complete(
        &self,
        input: &CommandInput,
        view: &dyn ResultView,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        let state = cursor.state();
        let mut suggestions = self.argument.complete(input, view, cursor);
        suggestions.truncate(MAX_SUGGESTIONS);

        if suggestions.len() < MAX_SUGGESTIONS {
            cursor.set_state(&state);
            let limit = MAX_SUGGESTIONS - suggestions.len();
            suggestions.extend(
                self.fallback
                    .complete(input, view, cursor)
                    .into_iter()
                    .take(limit),
            );
        }

        suggestions
    }
}

/// Tries several alternatives in turn, taking the first that parses.
///
/// ### Example
/// ```
/// # use arbor_builder as arbor;
/// use arbor::prelude::*;
/// use arbor::{Argument, FirstOf, Literal, Scalar};
///
/// let target = FirstOf::new("target")
///     .or(Literal::new("all"))
///     .or(Scalar::<u32>::new("id"));
/// assert_eq!(target.format(), "<all|id>");
/// ```
pub struct FirstOf {
    name: String,
    arguments: Vec<Box<dyn Argument>>,
}

impl FirstOf {
    /// Create a first-of argument, without any alternatives.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::default(),
        }
    }

    /// Add an alternative, tried after the ones added before it.
    pub fn or(mut self, argument: impl Argument + 'static) -> Self {
        self.arguments.push(Box::new(argument));
        self
    }

    fn alternative(&self, name: &str) -> Option<&dyn Argument> {
        self.arguments
            .iter()
            .find(|argument| argument.name() == name)
            .map(|argument| argument.as_ref())
    }

    // Pick the outcome once no alternative has produced a value.
    fn settle(
        &self,
        fallbacks: Vec<Fallback>,
        absent: bool,
        rejected: Option<ArgumentError>,
        first_error: Option<ArgumentError>,
    ) -> Outcome {
        if !fallbacks.is_empty() {
            Fallback::alternatives(self, fallbacks).into()
        } else if absent {
            Outcome::empty()
        } else if let Some(error) = rejected.or(first_error) {
            error.into()
        } else {
            ArgumentError::missing(self).into()
        }
    }
}

impl Argument for FirstOf {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_optional(&self) -> bool {
        self.arguments.iter().any(|argument| argument.is_optional())
    }

    fn is_hidden(&self) -> bool {
        self.reduced_format().is_empty()
    }

    fn reduced_format(&self) -> String {
        self.arguments
            .iter()
            .map(|argument| argument.reduced_format())
            .filter(|format| !format.is_empty())
            .collect::<Vec<String>>()
            .join(ALTERNATIVES_DELIMITER)
    }

    fn parse_value(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        view: &dyn ResultView,
    ) -> Outcome {
        let state = cursor.state();
        let mut fallbacks = Vec::default();
        let mut absent = false;
        let mut rejected: Option<ArgumentError> = None;
        let mut first_error: Option<ArgumentError> = None;

        for argument in &self.arguments {
            cursor.set_state(&state);

            match argument.parse_value(input, cursor, view) {
                Outcome::Success(Some(value)) => return Outcome::value(value),
                Outcome::Success(None) => absent = true,
                Outcome::Fallback(fallback) => fallbacks.push(fallback),
                Outcome::Failure(error) => {
                    if error.is_rejected() && rejected.is_none() {
                        rejected.replace(error.clone());
                    }

                    if first_error.is_none() {
                        first_error.replace(error);
                    }
                }
            }
        }

        cursor.set_state(&state);
        self.settle(fallbacks, absent, rejected, first_error)
    }

    fn resolve_fallback(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        view: &dyn ResultView,
        fallback: &Fallback,
        parsing_failed: bool,
    ) -> Outcome {
        let FallbackCause::Alternatives(alternatives) = fallback.cause() else {
            return Outcome::Failure(fallback.root_error().clone());
        };

        let state = cursor.state();
        let mut absent = false;
        let mut rejected: Option<ArgumentError> = None;
        let mut first_error: Option<ArgumentError> = None;

        for alternative in alternatives {
            cursor.set_state(&state);
            let argument = self.alternative(alternative.argument()).expect(
                "internal error - an alternative fallback must come from one of the alternatives",
            );

            match argument.resolve_fallback(input, cursor, view, alternative, parsing_failed) {
                Outcome::Success(Some(value)) => return Outcome::value(value),
                Outcome::Success(None) => absent = true,
                Outcome::Fallback(nested) => {
                    if first_error.is_none() {
                        first_error.replace(nested.root_error().clone());
                    }
                }
                Outcome::Failure(error) => {
                    if error.is_rejected() && rejected.is_none() {
                        rejected.replace(error.clone());
                    }

                    if first_error.is_none() {
                        first_error.replace(error);
                    }
                }
            }
        }

        cursor.set_state(&state);
        self.settle(Vec::default(), absent, rejected, first_error)
    }

    fn complete(
        &self,
        input: &CommandInput,
        view: &dyn ResultView,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        let state = cursor.state();
        let mut suggestions = Vec::default();

        for argument in &self.arguments {
            let limit = MAX_SUGGESTIONS - suggestions.len();

            if limit == 0 {
                break;
            }

            cursor.set_state(&state);
            suggestions.extend(argument.complete(input, view, cursor).into_iter().take(limit));
        }

        suggestions
    }
}

/// See [`ArgumentExt::map`].
pub struct Mapped<A, T, U, F> {
    argument: A,
    function: F,
    _phantom: PhantomData<fn(&T) -> U>,
}

impl<A, T, U, F> Mapped<A, T, U, F>
where
    A: Argument,
    T: Any,
    U: Any + Debug + Send + Sync,
    F: Fn(&T) -> U + Send + Sync,
{
    fn apply(&self, outcome: Outcome, cursor: &TokenCursor, consumed_before: usize) -> Outcome {
        match outcome {
            Outcome::Success(Some(value)) => match value.downcast_ref::<T>() {
                Some(source) => Outcome::value(Value::new((self.function)(source))),
                None => {
                    let input =
                        cursor.tokens()[consumed_before..cursor.consumed()].join(ARGUMENTS_SEPARATOR);
                    ArgumentError::rejected(self, input).into()
                }
            },
            other => other,
        }
    }
}

impl<A, T, U, F> Argument for Mapped<A, T, U, F>
where
    A: Argument,
    T: Any,
    U: Any + Debug + Send + Sync,
    F: Fn(&T) -> U + Send + Sync,
{
    delegate_display!(argument);

    fn is_optional(&self) -> bool {
        self.argument.is_optional()
    }

    fn parse_value(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        view: &dyn ResultView,
    ) -> Outcome {
        let consumed_before = cursor.consumed();
        let outcome = self.argument.parse_value(input, cursor, view);
        self.apply(outcome, cursor, consumed_before)
    }

    fn resolve_fallback(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        view: &dyn ResultView,
        fallback: &Fallback,
        parsing_failed: bool,
    ) -> Outcome {
        let consumed_before = cursor.consumed();
        let outcome = self
            .argument
            .resolve_fallback(input, cursor, view, fallback, parsing_failed);
        self.apply(outcome, cursor, consumed_before)
    }

    fn complete(
        &self,
        input: &CommandInput,
        view: &dyn ResultView,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        self.argument.complete(input, view, cursor)
    }
}

/// See [`ArgumentExt::filter`].
pub struct Filtered<A, T, F> {
    argument: A,
    predicate: F,
    _phantom: PhantomData<fn(&T)>,
}

impl<A, T, F> Filtered<A, T, F>
where
    A: Argument,
    T: Any,
    F: Fn(&T) -> bool + Send + Sync,
{
    fn check(&self, outcome: Outcome, cursor: &TokenCursor, consumed_before: usize) -> Outcome {
        match outcome {
            Outcome::Success(Some(value)) => {
                let accepted = value
                    .downcast_ref::<T>()
                    .map(|source| (self.predicate)(source))
                    .unwrap_or(false);

                if accepted {
                    Outcome::value(value)
                } else {
                    let input =
                        cursor.tokens()[consumed_before..cursor.consumed()].join(ARGUMENTS_SEPARATOR);
                    ArgumentError::rejected(self, input).into()
                }
            }
            other => other,
        }
    }
}

impl<A, T, F> Argument for Filtered<A, T, F>
where
    A: Argument,
    T: Any,
    F: Fn(&T) -> bool + Send + Sync,
{
    delegate_display!(argument);

    fn is_optional(&self) -> bool {
        self.argument.is_optional()
    }

    fn parse_value(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        view: &dyn ResultView,
    ) -> Outcome {
        let consumed_before = cursor.consumed();
        let outcome = self.argument.parse_value(input, cursor, view);
        self.check(outcome, cursor, consumed_before)
    }

    fn resolve_fallback(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        view: &dyn ResultView,
        fallback: &Fallback,
        parsing_failed: bool,
    ) -> Outcome {
        let consumed_before = cursor.consumed();
        let outcome = self
            .argument
            .resolve_fallback(input, cursor, view, fallback, parsing_failed);
        self.check(outcome, cursor, consumed_before)
    }

    fn complete(
        &self,
        input: &CommandInput,
        view: &dyn ResultView,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        self.argument.complete(input, view, cursor)
    }
}

/// See [`ArgumentExt::postpone_errors`].
pub struct Postponing<A> {
    argument: A,
}

impl<A: Argument> Postponing<A> {
    fn postpone(outcome: Outcome) -> Outcome {
        match outcome {
            Outcome::Failure(error) if !error.is_postponed() => {
                Outcome::Failure(ArgumentError::postponed(error))
            }
            other => other,
        }
    }
}

impl<A: Argument> Argument for Postponing<A> {
    delegate_display!(argument);

    fn is_optional(&self) -> bool {
        self.argument.is_optional()
    }

    fn parse_value(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        view: &dyn ResultView,
    ) -> Outcome {
        Self::postpone(self.argument.parse_value(input, cursor, view))
    }

    fn resolve_fallback(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        view: &dyn ResultView,
        fallback: &Fallback,
        parsing_failed: bool,
    ) -> Outcome {
        Self::postpone(
            self.argument
                .resolve_fallback(input, cursor, view, fallback, parsing_failed),
        )
    }

    fn complete(
        &self,
        input: &CommandInput,
        view: &dyn ResultView,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        self.argument.complete(input, view, cursor)
    }
}
