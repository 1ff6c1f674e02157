pub(crate) const COMMAND_PREFIX: &str = "/";
pub(crate) const ARGUMENTS_SEPARATOR: &str = " ";
pub(crate) const REQUIRED_OPEN: &str = "<";
pub(crate) const REQUIRED_CLOSE: &str = ">";
pub(crate) const OPTIONAL_OPEN: &str = "[";
pub(crate) const OPTIONAL_CLOSE: &str = "]";
pub(crate) const ALTERNATIVES_DELIMITER: &str = "|";

/// The most suggestions a single argument offers for one completion request.
pub const MAX_SUGGESTIONS: usize = 20;

// A fallback resolution that keeps handing back new fallbacks is cut off after this many rounds.
pub(crate) const MAX_FALLBACK_CHAIN: usize = 16;

// Chat clients don't report a width, so non-console help uses this.
pub(crate) const DEFAULT_HELP_WIDTH: usize = 80;
