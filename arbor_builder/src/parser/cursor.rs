use std::rc::Rc;
use thiserror::Error;

/// Misuse of a [`TokenCursor`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CursorError {
    /// Every token has been consumed.
    #[error("No more tokens available.")]
    Exhausted,

    /// Nothing has been consumed yet.
    #[error("No current token; the cursor is before the first token.")]
    NoCurrent,

    /// The state belongs to another token list.
    #[error("Cannot restore a cursor state taken from a different token list.")]
    ForeignState,
}

/// A cursor over the tokens of a single invocation.
///
/// The tokens are fixed, while the cursor only moves forward (via [`TokenCursor::next`]) or back to a previously taken [`CursorState`].
/// The cursor starts before the first token.
#[derive(Clone)]
pub struct TokenCursor {
    tokens: Rc<[String]>,
    // -1 is "before the first token".
    cursor: isize,
}

/// An opaque snapshot of a [`TokenCursor`].
#[derive(Clone)]
pub struct CursorState {
    tokens: Rc<[String]>,
    cursor: isize,
}

impl std::fmt::Debug for CursorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorState")
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl PartialEq for CursorState {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tokens, &other.tokens) && self.cursor == other.cursor
    }
}

impl std::fmt::Debug for TokenCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCursor")
            .field("tokens", &self.tokens)
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl TokenCursor {
    /// Create a cursor positioned before the first of `tokens`.
    pub fn new(tokens: Rc<[String]>) -> Self {
        Self { tokens, cursor: -1 }
    }

    /// Create a cursor over freshly allocated tokens.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(tokens.into_iter().map(Into::into).collect())
    }

    /// All the tokens, consumed or not.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The number of tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether there are no tokens at all.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The index of the token most recently consumed; `-1` before the first token.
    pub fn position(&self) -> isize {
        self.cursor
    }

    /// The number of tokens consumed so far.
    pub fn consumed(&self) -> usize {
        (self.cursor + 1) as usize
    }

    /// The number of tokens not yet consumed.
    pub fn remaining(&self) -> usize {
        self.len() - self.consumed()
    }

    /// The tokens not yet consumed.
    pub fn remaining_tokens(&self) -> &[String] {
        &self.tokens[self.consumed()..]
    }

    /// Whether any token remains.
    pub fn has_next(&self) -> bool {
        self.remaining() > 0
    }

    /// The next token, without consuming it.
    pub fn peek(&self) -> Result<&str, CursorError> {
        self.peek_if_present().ok_or(CursorError::Exhausted)
    }

    /// The next token if there is one, without consuming it.
    pub fn peek_if_present(&self) -> Option<&str> {
        self.tokens.get(self.consumed()).map(String::as_str)
    }

    /// Consume the next token and return it.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<&str, CursorError> {
        if !self.has_next() {
            return Err(CursorError::Exhausted);
        }

        self.cursor += 1;
        self.current()
    }

    /// The token most recently consumed.
    pub fn current(&self) -> Result<&str, CursorError> {
        if self.cursor < 0 {
            Err(CursorError::NoCurrent)
        } else {
            Ok(&self.tokens[self.cursor as usize])
        }
    }

    /// Snapshot the cursor.
    pub fn state(&self) -> CursorState {
        CursorState {
            tokens: self.tokens.clone(),
            cursor: self.cursor,
        }
    }

    /// Restore the cursor to a previous `state`.
    ///
    /// Panics if the state was not taken from a cursor over these very tokens.
    pub fn set_state(&mut self, state: &CursorState) {
        self.try_set_state(state)
            .expect("internal error - must restore a state from the same token list");
    }

    /// Restore the cursor to a previous `state`, failing if it was taken from a different token list.
    pub fn try_set_state(&mut self, state: &CursorState) -> Result<(), CursorError> {
        if !Rc::ptr_eq(&self.tokens, &state.tokens) {
            return Err(CursorError::ForeignState);
        }

        self.cursor = state.cursor;
        Ok(())
    }
}
