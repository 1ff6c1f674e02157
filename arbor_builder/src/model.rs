use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A parsed argument value, with its concrete type erased.
///
/// Values are cheap to clone (reference counted) and are recovered via [`Value::downcast_ref`].
///
/// ### Example
/// ```
/// # use arbor_builder as arbor;
/// use arbor::Value;
///
/// let value = Value::new(5u32);
/// assert_eq!(value.downcast_ref::<u32>(), Some(&5));
/// assert_eq!(value.downcast_ref::<String>(), None);
/// ```
#[derive(Clone)]
pub struct Value(Arc<dyn Stored>);

trait Stored: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
}

impl<T> Stored for T
where
    T: Any + fmt::Debug + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Value {
    /// Wrap a concrete value.
    pub fn new<T>(value: T) -> Self
    where
        T: Any + fmt::Debug + Send + Sync,
    {
        Value(Arc::new(value))
    }

    /// Borrow the value as `T`, if that is its concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        // Deref first, otherwise the blanket impl would pick up the `Arc` itself.
        (*self.0).as_any().downcast_ref::<T>()
    }

    /// Whether the concrete type of the value is `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// The kind of actor invoking a command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InvokerKind {
    /// A player connected to the host.
    Player,
    /// The host console.
    Console,
    /// Any other host specific actor (ex: a command block).
    Other(String),
}

impl fmt::Display for InvokerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvokerKind::Player => write!(f, "player"),
            InvokerKind::Console => write!(f, "console"),
            InvokerKind::Other(name) => write!(f, "{name}"),
        }
    }
}

/// The result of an autocompletion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Suggestions {
    /// Candidates for the final (possibly partial) token, in order.
    Candidates(Vec<String>),
    /// Nothing was found; the host should apply its own default completion.
    HostDefault,
}

impl Suggestions {
    pub(crate) fn from_candidates(candidates: Vec<String>) -> Self {
        if candidates.is_empty() {
            Suggestions::HostDefault
        } else {
            Suggestions::Candidates(candidates)
        }
    }

    /// The candidates, empty when deferring to the host.
    pub fn candidates(&self) -> &[String] {
        match self {
            Suggestions::Candidates(candidates) => candidates.as_slice(),
            Suggestions::HostDefault => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn value_downcast() {
        // Setup
        let value = Value::new("abc".to_string());

        // Execute
        let cloned = value.clone();

        // Verify
        assert!(cloned.is::<String>());
        assert!(!cloned.is::<&str>());
        assert_eq!(cloned.downcast_ref::<String>(), Some(&"abc".to_string()));
        assert_eq!(format!("{value:?}"), "\"abc\"");
    }

    #[rstest]
    #[case(InvokerKind::Player, "player")]
    #[case(InvokerKind::Console, "console")]
    #[case(InvokerKind::Other("command block".to_string()), "command block")]
    fn invoker_kind_display(#[case] kind: InvokerKind, #[case] expected: &str) {
        assert_eq!(kind.to_string(), expected);
    }

    #[test]
    fn suggestions_from_candidates() {
        assert_eq!(Suggestions::from_candidates(vec![]), Suggestions::HostDefault);
        assert!(Suggestions::HostDefault.candidates().is_empty());

        let suggestions = Suggestions::from_candidates(vec!["a".to_string()]);
        assert_eq!(suggestions.candidates(), &["a".to_string()]);
    }
}
