use std::any::Any;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::str::FromStr;

use crate::api::argument::*;
use crate::constant::*;
use crate::model::{InvokerKind, Value};
use crate::parser::{ArgumentError, CommandInput, ResultView, TokenCursor};

/// An argument that takes a single token, converted via [`FromStr`].
///
/// ### Example
/// ```
/// # use arbor_builder as arbor;
/// use arbor::{Argument, Scalar};
///
/// let amount = Scalar::<u32>::new("amount").suggest(["1", "16", "64"]);
/// assert_eq!(amount.format(), "<amount>");
/// ```
pub struct Scalar<T> {
    name: String,
    display_name: Option<String>,
    suggestions: Vec<String>,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> Scalar<T> {
    /// Create a scalar argument.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
            suggestions: Vec::default(),
            _phantom: PhantomData,
        }
    }

    /// Show the argument to users under a different name.
    pub fn displayed_as(mut self, display_name: impl Into<String>) -> Self {
        self.display_name.replace(display_name.into());
        self
    }

    /// Offer these suggestions during completion.
    pub fn suggest<I, S>(mut self, suggestions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.suggestions
            .extend(suggestions.into_iter().map(Into::into));
        self
    }
}

impl<T> Argument for Scalar<T>
where
    T: FromStr + Any + Debug + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    fn parse_value(
        &self,
        _input: &CommandInput,
        cursor: &mut TokenCursor,
        _view: &dyn ResultView,
    ) -> Outcome {
        let token = match cursor.next() {
            Ok(token) => token.to_string(),
            Err(_) => return ArgumentError::missing(self).into(),
        };

        match T::from_str(&token) {
            Ok(value) => Outcome::value(Value::new(value)),
            Err(_) => ArgumentError::invalid(self, token).into(),
        }
    }

    fn complete(
        &self,
        _input: &CommandInput,
        _view: &dyn ResultView,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        match final_partial(cursor) {
            Some(partial) => self
                .suggestions
                .iter()
                .filter(|suggestion| starts_with_ignore_case(suggestion, partial))
                .take(MAX_SUGGESTIONS)
                .cloned()
                .collect(),
            None => Vec::default(),
        }
    }
}

/// An argument matching one fixed word, ignoring case.
/// The stored value is the word itself (as a `String`).
pub struct Literal {
    name: String,
    literal: String,
}

impl Literal {
    /// Create a literal argument, which goes by the literal as its name.
    pub fn new(literal: impl Into<String>) -> Self {
        let literal = literal.into();
        Self {
            name: literal.clone(),
            literal,
        }
    }

    /// Store the value under a name other than the literal.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Argument for Literal {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.literal
    }

    fn parse_value(
        &self,
        _input: &CommandInput,
        cursor: &mut TokenCursor,
        _view: &dyn ResultView,
    ) -> Outcome {
        match cursor.next() {
            Ok(token) if token.eq_ignore_ascii_case(&self.literal) => {
                Outcome::value(Value::new(self.literal.clone()))
            }
            Ok(token) => ArgumentError::invalid(self, token).into(),
            Err(_) => ArgumentError::missing(self).into(),
        }
    }

    fn complete(
        &self,
        _input: &CommandInput,
        _view: &dyn ResultView,
        cursor: &mut TokenCursor,
    ) -> Vec<String> {
        match final_partial(cursor) {
            Some(partial) if starts_with_ignore_case(&self.literal, partial) => {
                vec![self.literal.clone()]
            }
            _ => Vec::default(),
        }
    }
}

/// An argument taking every remaining token (at least one), joined by single spaces.
pub struct Text {
    name: String,
    display_name: Option<String>,
}

impl Text {
    /// Create a text argument.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
        }
    }

    /// Show the argument to users under a different name.
    pub fn displayed_as(mut self, display_name: impl Into<String>) -> Self {
        self.display_name.replace(display_name.into());
        self
    }
}

impl Argument for Text {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    fn parse_value(
        &self,
        _input: &CommandInput,
        cursor: &mut TokenCursor,
        _view: &dyn ResultView,
    ) -> Outcome {
        if !cursor.has_next() {
            return ArgumentError::missing(self).into();
        }

        let mut parts = Vec::default();

        while let Ok(token) = cursor.next() {
            parts.push(token.to_string());
        }

        Outcome::value(Value::new(parts.join(ARGUMENTS_SEPARATOR)))
    }
}

/// A hidden argument which consumes nothing and produces the invoker's name.
/// Only invokers of the required kind (a player, unless configured otherwise) are accepted.
pub struct SenderName {
    name: String,
    kind: InvokerKind,
}

impl SenderName {
    /// Create a sender name argument, requiring a player.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: InvokerKind::Player,
        }
    }

    /// Require a different kind of invoker.
    pub fn requiring(mut self, kind: InvokerKind) -> Self {
        self.kind = kind;
        self
    }
}

impl Argument for SenderName {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_hidden(&self) -> bool {
        true
    }

    fn parse_value(
        &self,
        input: &CommandInput,
        _cursor: &mut TokenCursor,
        _view: &dyn ResultView,
    ) -> Outcome {
        let invoker = input.invoker();

        if invoker.kind() == self.kind {
            Outcome::value(Value::new(invoker.name().to_string()))
        } else {
            ArgumentError::requires_invoker(self, self.kind.clone()).into()
        }
    }
}

/// A hidden argument which consumes nothing and always produces the same value.
pub struct Constant {
    name: String,
    value: Value,
}

impl Constant {
    /// Create a constant argument.
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl Argument for Constant {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_optional(&self) -> bool {
        true
    }

    fn is_hidden(&self) -> bool {
        true
    }

    fn parse_value(
        &self,
        _input: &CommandInput,
        _cursor: &mut TokenCursor,
        _view: &dyn ResultView,
    ) -> Outcome {
        Outcome::value(self.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{AllowAll, RecordingInvoker, SimpleResultStore};
    use rstest::rstest;

    fn parse(argument: &dyn Argument, invoker: &RecordingInvoker, tokens: &[&str]) -> (Outcome, usize) {
        let input = CommandInput::new(invoker, &AllowAll, "test", tokens.to_vec());
        let mut cursor = TokenCursor::new(input.shared_tokens());
        let store = SimpleResultStore::default();
        let outcome = argument.parse_value(&input, &mut cursor, &store);
        (outcome, cursor.consumed())
    }

    fn complete(argument: &dyn Argument, tokens: &[&str]) -> Vec<String> {
        let invoker = RecordingInvoker::player("alice");
        let input = CommandInput::new(&invoker, &AllowAll, "test", tokens.to_vec());
        let mut cursor = TokenCursor::new(input.shared_tokens());
        let store = SimpleResultStore::default();
        argument.complete(&input, &store, &mut cursor)
    }

    #[rstest]
    #[case(vec!["5"], 5)]
    #[case(vec!["5", "6"], 5)]
    #[case(vec!["0"], 0)]
    fn scalar(#[case] tokens: Vec<&str>, #[case] expected: u32) {
        // Setup
        let argument = Scalar::<u32>::new("amount");
        let invoker = RecordingInvoker::player("alice");

        // Execute
        let (outcome, consumed) = parse(&argument, &invoker, &tokens);

        // Verify
        assert_matches!(outcome, Outcome::Success(Some(value)) => {
            assert_eq!(value.downcast_ref::<u32>(), Some(&expected));
        });
        assert_eq!(consumed, 1);
    }

    #[test]
    fn scalar_invalid() {
        // Setup
        let argument = Scalar::<u32>::new("amount");
        let invoker = RecordingInvoker::player("alice");

        // Execute
        let (outcome, consumed) = parse(&argument, &invoker, &["abc"]);

        // Verify
        assert_matches!(outcome, Outcome::Failure(error) => {
            assert_eq!(error.to_string(), "Invalid argument 'abc'.");
            assert_eq!(error.input(), Some("abc"));
        });
        assert_eq!(consumed, 1);
    }

    #[test]
    fn scalar_missing() {
        // Setup
        let argument = Scalar::<u32>::new("amount");
        let invoker = RecordingInvoker::player("alice");

        // Execute
        let (outcome, consumed) = parse(&argument, &invoker, &[]);

        // Verify
        assert_matches!(outcome, Outcome::Failure(error) => {
            assert!(error.is_missing());
            assert_eq!(error.to_string(), "Missing argument '<amount>'.");
        });
        assert_eq!(consumed, 0);
    }

    #[rstest]
    #[case(vec!["1"], vec!["1", "16"])]
    #[case(vec![""], vec!["1", "16", "64"])]
    #[case(vec!["6"], vec!["64"])]
    #[case(vec!["x"], vec![])]
    #[case(vec!["1", ""], vec![])]
    #[case(vec![], vec![])]
    fn scalar_complete(#[case] tokens: Vec<&str>, #[case] expected: Vec<&str>) {
        // Setup
        let argument = Scalar::<u32>::new("amount").suggest(["1", "16", "64"]);

        // Execute
        let suggestions = complete(&argument, &tokens);

        // Verify
        assert_eq!(suggestions, expected);
    }

    #[test]
    fn scalar_complete_capped() {
        // Setup
        let argument = Scalar::<u32>::new("amount").suggest((0..50).map(|i| i.to_string()));

        // Execute
        let suggestions = complete(&argument, &[""]);

        // Verify
        assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
    }

    #[rstest]
    #[case("remove", true)]
    #[case("REMOVE", true)]
    #[case("remover", false)]
    fn literal(#[case] token: &str, #[case] expected: bool) {
        // Setup
        let argument = Literal::new("remove");
        let invoker = RecordingInvoker::player("alice");

        // Execute
        let (outcome, consumed) = parse(&argument, &invoker, &[token]);

        // Verify
        assert_eq!(consumed, 1);
        if expected {
            assert_matches!(outcome, Outcome::Success(Some(value)) => {
                assert_eq!(value.downcast_ref::<String>(), Some(&"remove".to_string()));
            });
        } else {
            assert_matches!(outcome, Outcome::Failure(_));
        }
    }

    #[test]
    fn literal_format_complete() {
        let argument = Literal::new("all").named("target");
        assert_eq!(argument.name(), "target");
        assert_eq!(argument.format(), "<all>");
        assert_eq!(complete(&argument, &["A"]), vec!["all"]);
        assert!(complete(&argument, &["b"]).is_empty());
    }

    #[rstest]
    #[case(vec!["hello"], "hello")]
    #[case(vec!["hello", "big", "world"], "hello big world")]
    fn text(#[case] tokens: Vec<&str>, #[case] expected: &str) {
        // Setup
        let argument = Text::new("message");
        let invoker = RecordingInvoker::player("alice");

        // Execute
        let (outcome, consumed) = parse(&argument, &invoker, &tokens);

        // Verify
        assert_matches!(outcome, Outcome::Success(Some(value)) => {
            assert_eq!(value.downcast_ref::<String>().unwrap(), expected);
        });
        assert_eq!(consumed, tokens.len());
    }

    #[test]
    fn text_missing() {
        let invoker = RecordingInvoker::player("alice");
        let (outcome, _) = parse(&Text::new("message"), &invoker, &[]);
        assert_matches!(outcome, Outcome::Failure(error) => {
            assert!(error.is_missing());
        });
    }

    #[test]
    fn sender_name() {
        // Setup
        let argument = SenderName::new("player");
        let player = RecordingInvoker::player("alice");
        let console = RecordingInvoker::console();

        // Execute
        let (player_outcome, player_consumed) = parse(&argument, &player, &["bob"]);
        let (console_outcome, _) = parse(&argument, &console, &["bob"]);

        // Verify
        assert_matches!(player_outcome, Outcome::Success(Some(value)) => {
            assert_eq!(value.downcast_ref::<String>().unwrap(), "alice");
        });
        assert_eq!(player_consumed, 0);
        assert_matches!(console_outcome, Outcome::Failure(error) => {
            assert!(error.is_requires_invoker());
            assert_eq!(error.to_string(), "Argument '<player>' requires a player to execute the command.");
        });
        assert_eq!(argument.format(), "");
    }

    #[test]
    fn constant() {
        let argument = Constant::new("page", Value::new(1u32));
        let invoker = RecordingInvoker::console();
        let (outcome, consumed) = parse(&argument, &invoker, &["7"]);
        assert_matches!(outcome, Outcome::Success(Some(value)) => {
            assert_eq!(value.downcast_ref::<u32>(), Some(&1));
        });
        assert_eq!(consumed, 0);
        assert!(argument.is_optional());
        assert!(argument.is_hidden());
    }
}
