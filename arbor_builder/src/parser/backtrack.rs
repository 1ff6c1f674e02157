use crate::api::{Argument, Fallback, Outcome};
use crate::constant::*;
use crate::parser::base::{ArgumentError, CommandError};
use crate::parser::cursor::{CursorState, TokenCursor};
use crate::parser::interface::CommandInput;
use crate::parser::store::{BufferedResultStore, ResultStore, ResultView, SimpleResultStore};

#[cfg(feature = "tracing_debug")]
use tracing::debug;

// The fallbacks raised since the walk last settled.
struct Pending {
    // Taken just before the first of the fallbacks.
    snapshot: CursorState,
    // Ascending by argument position.
    fallbacks: Vec<(usize, Fallback)>,
    // The writes of the arguments parsed since the first fallback.
    buffer: SimpleResultStore,
    // The postponed error as it stood before the first fallback.
    postponed: Option<ArgumentError>,
}

impl Pending {
    fn new(snapshot: CursorState, postponed: Option<ArgumentError>) -> Self {
        Self {
            snapshot,
            fallbacks: Vec::default(),
            buffer: SimpleResultStore::default(),
            postponed,
        }
    }

    fn parse(
        &mut self,
        argument: &dyn Argument,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        store: &mut dyn ResultStore,
    ) -> Outcome {
        let mut buffered =
            BufferedResultStore::with_buffer(store, std::mem::take(&mut self.buffer));
        let outcome = argument.parse(input, cursor, &mut buffered);
        self.buffer = buffered.into_buffer();
        outcome
    }
}

/// Walks the tokens through the arguments of a single command.
pub(crate) struct ArgumentParser<'c> {
    arguments: &'c [Box<dyn Argument>],
    has_children: bool,
}

impl<'c> ArgumentParser<'c> {
    pub(crate) fn new(arguments: &'c [Box<dyn Argument>], has_children: bool) -> Self {
        Self {
            arguments,
            has_children,
        }
    }

    /// Parse every argument from `cursor` into `store`.
    ///
    /// A fallback is held pending until a later argument settles whether its tokens are claimed:
    /// 1. A later argument fails.
    /// 2. A later argument consumes the final token.
    /// 3. The last argument has been parsed.
    ///
    /// Tokens left over after the last argument are an error.
    pub(crate) fn parse(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        store: &mut dyn ResultStore,
    ) -> Result<(), CommandError> {
        let mut index = 0;
        let mut pending: Option<Pending> = None;
        let mut postponed: Option<ArgumentError> = None;

        while index < self.arguments.len() {
            let argument = self.arguments[index].as_ref();
            let state = cursor.state();
            let consumed_before = cursor.consumed();
            let outcome = match pending.as_mut() {
                Some(pending) => pending.parse(argument, input, cursor, store),
                None => argument.parse(input, cursor, store),
            };
            let last = index + 1 == self.arguments.len();

            // None: keep going.
            // Some(error): settle the pending fallbacks; `error` is the hard failure (if any) that forced it.
            let trigger: Option<Option<ArgumentError>> = match outcome {
                Outcome::Success(_) => {
                    let claimed_final = cursor.consumed() > consumed_before && !cursor.has_next();
                    (claimed_final || last).then_some(None)
                }
                Outcome::Fallback(fallback) => {
                    cursor.set_state(&state);
                    #[cfg(feature = "tracing_debug")]
                    {
                        debug!(
                            "Pending fallback for argument '{}': {}",
                            argument.name(),
                            fallback.root_error()
                        );
                    }
                    pending
                        .get_or_insert_with(|| Pending::new(state, postponed.clone()))
                        .fallbacks
                        .push((index, fallback));
                    last.then_some(None)
                }
                Outcome::Failure(error) if error.is_postponed() => {
                    cursor.set_state(&state);
                    #[cfg(feature = "tracing_debug")]
                    {
                        debug!("Postponed error for argument '{}': {error}", argument.name());
                    }

                    if postponed.is_none() {
                        postponed.replace(error.attributed_to(argument));
                    }

                    last.then_some(None)
                }
                Outcome::Failure(error) => {
                    cursor.set_state(&state);
                    Some(Some(error.attributed_to(argument)))
                }
            };

            index = match (trigger, pending.take()) {
                (None, still_pending) => {
                    pending = still_pending;
                    index + 1
                }
                (Some(Some(error)), None) => return Err(error.into()),
                (Some(None), None) => index + 1,
                (Some(error), Some(settling)) => {
                    self.settle(settling, index, error, input, cursor, store, &mut postponed)?
                }
            };
        }

        self.check_leftovers(cursor, store)?;

        match postponed {
            Some(error) => Err(error.into_unpostponed().into()),
            None => Ok(()),
        }
    }

    // Resolve the pending fallbacks, returning where to continue the walk.
    #[allow(clippy::too_many_arguments)]
    fn settle(
        &self,
        pending: Pending,
        trigger_index: usize,
        trigger_error: Option<ArgumentError>,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        store: &mut dyn ResultStore,
        postponed: &mut Option<ArgumentError>,
    ) -> Result<usize, CommandError> {
        let Pending {
            snapshot,
            fallbacks,
            buffer,
            postponed: postponed_before,
        } = pending;
        let parsing_failed = trigger_error.is_some() || cursor.has_next();

        if parsing_failed {
            cursor.set_state(&snapshot);
        }

        let mut fallbacks = fallbacks.into_iter();
        let (position, fallback) = fallbacks
            .next()
            .expect("internal error - a pending record must hold a fallback");
        let argument = self.arguments[position].as_ref();
        let had_remaining = cursor.has_next();
        let remaining_before = cursor.remaining();
        let result = resolve(argument, input, cursor, store, &fallback, parsing_failed);
        let consumed = cursor.remaining() < remaining_before;

        if had_remaining && !consumed {
            #[cfg(feature = "tracing_debug")]
            {
                debug!(
                    "Fallback for argument '{}' left the remaining tokens {:?} unclaimed.",
                    argument.name(),
                    cursor.remaining_tokens()
                );
            }

            let error = trigger_error
                .unwrap_or_else(|| fallback.root_error().clone().attributed_to(argument));
            return Err(error.into());
        }

        result?;

        if consumed {
            #[cfg(feature = "tracing_debug")]
            {
                debug!(
                    "Fallback for argument '{}' consumed tokens, restarting after it.",
                    argument.name()
                );
            }

            // The arguments after the fallback are parsed anew, so their postponed errors go with their writes.
            *postponed = postponed_before;
            return Ok(position + 1);
        }

        // Nothing remains to be claimed, so every other fallback falls back too.
        let mut buffered = BufferedResultStore::with_buffer(store, buffer);

        for (position, fallback) in fallbacks {
            let argument = self.arguments[position].as_ref();
            resolve(argument, input, cursor, &mut buffered, &fallback, parsing_failed)?;
        }

        buffered.apply_buffer();
        #[cfg(feature = "tracing_debug")]
        {
            debug!("Fallbacks resolved up to argument {trigger_index}.");
        }

        match trigger_error {
            Some(error) => Err(error.into()),
            None => Ok(trigger_index + 1),
        }
    }

    fn check_leftovers(
        &self,
        cursor: &TokenCursor,
        store: &dyn ResultStore,
    ) -> Result<(), CommandError> {
        let Some(token) = cursor.peek_if_present() else {
            return Ok(());
        };

        if self.has_children {
            return Err(CommandError::UnknownCommand(token.to_string()));
        }

        // The first argument (from behind) not given a value, after the last that was.
        let mut unparsed: Option<&dyn Argument> = None;

        for argument in self.arguments.iter().rev() {
            if store.has(argument.name()) {
                break;
            }

            unparsed.replace(argument.as_ref());
        }

        match unparsed {
            Some(argument) => Err(ArgumentError::invalid(argument, token).into()),
            None => Err(CommandError::UnexpectedArgument(token.to_string())),
        }
    }

    /// Collect the suggestions of the arguments positioned to consume the final token.
    pub(crate) fn complete(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        store: &mut dyn ResultStore,
    ) -> Vec<String> {
        let mut suggestions = Vec::default();

        for argument in self.arguments {
            let remaining = cursor.remaining();

            if remaining == 0 {
                break;
            }

            let state = cursor.state();

            match argument.parse(input, cursor, store) {
                Outcome::Success(_) => {
                    if !cursor.has_next() {
                        // Offer alternatives for the final token instead.
                        cursor.set_state(&state);
                        suggestions.extend(argument.complete(input, store.view(), cursor));
                        break;
                    } else if cursor.remaining() == remaining {
                        // Skipped, so the following arguments get a go at the same tokens.
                        suggestions.extend(argument.complete(input, store.view(), cursor));
                        cursor.set_state(&state);
                    }
                }
                Outcome::Failure(_) if !argument.reduced_format().is_empty() => {
                    cursor.set_state(&state);
                    suggestions.extend(argument.complete(input, store.view(), cursor));
                    break;
                }
                Outcome::Fallback(_) | Outcome::Failure(_) => {
                    cursor.set_state(&state);
                    suggestions.extend(argument.complete(input, store.view(), cursor));
                    cursor.set_state(&state);
                }
            }
        }

        suggestions
    }
}

// Resolve `fallback`, following any fallback the resolution itself raises.
// The cursor is left untouched on failure.
fn resolve(
    argument: &dyn Argument,
    input: &CommandInput,
    cursor: &mut TokenCursor,
    store: &mut dyn ResultStore,
    fallback: &Fallback,
    parsing_failed: bool,
) -> Result<(), ArgumentError> {
    let state = cursor.state();
    let mut current = fallback.clone();

    for _ in 0..MAX_FALLBACK_CHAIN {
        match argument.parse_fallback(input, cursor, store, &current, parsing_failed) {
            Outcome::Success(_) => return Ok(()),
            Outcome::Failure(error) => {
                cursor.set_state(&state);
                return Err(error.attributed_to(argument));
            }
            Outcome::Fallback(next) => {
                cursor.set_state(&state);
                current = next;
            }
        }
    }

    #[cfg(feature = "tracing_debug")]
    {
        debug!(
            "Fallback for argument '{}' did not settle after {MAX_FALLBACK_CHAIN} rounds.",
            argument.name()
        );
    }

    Err(fallback.root_error().clone().attributed_to(argument))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::*;
    use crate::parser::{AllowAll, RecordingInvoker};
    use rstest::rstest;

    const KNOWN: [&str; 2] = ["alice", "bob"];

    fn known_player(name: &str) -> impl Argument {
        Scalar::<String>::new(name).filter(|player: &String| KNOWN.contains(&player.as_str()))
    }

    fn player_or_self() -> Box<dyn Argument> {
        known_player("player")
            .or_fallback(SenderName::new("self"))
            .boxed()
    }

    fn run(
        arguments: &[Box<dyn Argument>],
        has_children: bool,
        tokens: &[&str],
    ) -> (Result<(), CommandError>, SimpleResultStore) {
        let invoker = RecordingInvoker::player("steve");
        let input = CommandInput::new(&invoker, &AllowAll, "test", tokens.to_vec());
        let mut cursor = TokenCursor::new(input.shared_tokens());
        let mut store = SimpleResultStore::default();
        let result = ArgumentParser::new(arguments, has_children).parse(&input, &mut cursor, &mut store);
        (result, store)
    }

    fn suggest(arguments: &[Box<dyn Argument>], tokens: &[&str]) -> Vec<String> {
        let invoker = RecordingInvoker::player("steve");
        let input = CommandInput::new(&invoker, &AllowAll, "test", tokens.to_vec());
        let mut cursor = TokenCursor::new(input.shared_tokens());
        let mut store = SimpleResultStore::default();
        ArgumentParser::new(arguments, false).complete(&input, &mut cursor, &mut store)
    }

    fn get_string(store: &SimpleResultStore, key: &str) -> Option<String> {
        let view: &dyn ResultView = store;
        view.get_as::<String>(key).cloned()
    }

    fn get_u32(store: &SimpleResultStore, key: &str) -> Option<u32> {
        let view: &dyn ResultView = store;
        view.get_as::<u32>(key).copied()
    }

    #[rstest]
    #[case(vec!["5"], "steve", 5)]
    #[case(vec!["bob", "5"], "bob", 5)]
    fn fallback_precedence(
        #[case] tokens: Vec<&str>,
        #[case] expected_player: &str,
        #[case] expected_amount: u32,
    ) {
        // Setup
        let arguments = vec![player_or_self(), Scalar::<u32>::new("amount").boxed()];

        // Execute
        let (result, store) = run(&arguments, false, &tokens);

        // Verify
        result.unwrap();
        assert_eq!(get_string(&store, "player"), Some(expected_player.to_string()));
        assert_eq!(get_u32(&store, "amount"), Some(expected_amount));
        assert_eq!(store.keys(), vec!["player", "amount"]);
    }

    #[test]
    fn fallback_starvation() {
        // Setup
        let arguments = vec![player_or_self(), Scalar::<u32>::new("amount").boxed()];

        // Execute
        let (result, store) = run(&arguments, false, &["notanumber"]);

        // Verify
        assert_matches!(result, Err(CommandError::Argument(error)) => {
            assert_eq!(error.argument(), "amount");
            assert_eq!(error.to_string(), "Invalid argument 'notanumber'.");
        });
        assert_eq!(get_u32(&store, "amount"), None);
    }

    #[test]
    fn fallback_missing() {
        // Setup
        let arguments = vec![player_or_self(), Scalar::<u32>::new("amount").boxed()];

        // Execute
        let (result, _) = run(&arguments, false, &[]);

        // Verify
        assert_matches!(result, Err(CommandError::Argument(error)) => {
            assert!(error.is_missing());
            assert_eq!(error.to_string(), "Missing argument '<amount>'.");
        });
    }

    #[test]
    fn fallback_unclaimed_tokens() {
        // Setup
        let arguments = vec![player_or_self(), Scalar::<u32>::new("amount").boxed()];

        // Execute
        let (result, _) = run(&arguments, false, &["5", "x"]);

        // Verify
        assert_matches!(result, Err(CommandError::Argument(error)) => {
            assert_eq!(error.argument(), "player");
            assert_eq!(error.to_string(), "Invalid argument '5'.");
        });
    }

    #[rstest]
    #[case(vec!["bob"], "bob", 1)]
    #[case(vec!["7"], "steve", 7)]
    #[case(vec![], "steve", 1)]
    fn fallback_defaults(
        #[case] tokens: Vec<&str>,
        #[case] expected_player: &str,
        #[case] expected_page: u32,
    ) {
        // Setup
        let arguments = vec![
            player_or_self(),
            Scalar::<u32>::new("page").or_default(1u32).boxed(),
        ];

        // Execute
        let (result, store) = run(&arguments, false, &tokens);

        // Verify
        result.unwrap();
        assert_eq!(get_string(&store, "player"), Some(expected_player.to_string()));
        assert_eq!(get_u32(&store, "page"), Some(expected_page));
    }

    #[test]
    fn fallback_consumes_restarts() {
        // Setup
        // Any name goes, but only once the page has had a go at the tokens.
        let arguments = vec![
            known_player("player")
                .or_fallback(Scalar::<String>::new("name"))
                .boxed(),
            Scalar::<u32>::new("page").or_default(1u32).boxed(),
        ];

        // Execute
        let (result, store) = run(&arguments, false, &["123", "2"]);

        // Verify
        result.unwrap();
        assert_eq!(get_string(&store, "player"), Some("123".to_string()));
        assert_eq!(get_u32(&store, "page"), Some(2));
    }

    #[test]
    fn fallback_consumes_drops_postponed() {
        // Setup
        let arguments = vec![
            known_player("player")
                .or_fallback(Scalar::<String>::new("name"))
                .boxed(),
            Scalar::<u32>::new("amount").postpone_errors().boxed(),
            Scalar::<u32>::new("page").or_default(1u32).boxed(),
        ];

        // Execute
        let (result, store) = run(&arguments, false, &["zed", "5"]);

        // Verify
        result.unwrap();
        assert_eq!(get_string(&store, "player"), Some("zed".to_string()));
        assert_eq!(get_u32(&store, "amount"), Some(5));
        assert_eq!(get_u32(&store, "page"), Some(1));
    }

    #[test]
    fn fallback_many_pending() {
        // Setup
        let arguments = vec![
            Scalar::<u32>::new("a").or_default(1u32).boxed(),
            Scalar::<u32>::new("b").or_default(2u32).boxed(),
            Text::new("note").boxed(),
        ];

        // Execute
        let (result, store) = run(&arguments, false, &["hello", "world"]);

        // Verify
        result.unwrap();
        assert_eq!(get_u32(&store, "a"), Some(1));
        assert_eq!(get_u32(&store, "b"), Some(2));
        assert_eq!(get_string(&store, "note"), Some("hello world".to_string()));
    }

    #[test]
    fn postponed_released() {
        // Setup
        let arguments = vec![
            Scalar::<u32>::new("amount").postpone_errors().boxed(),
            Text::new("note").boxed(),
        ];

        // Execute
        let (result, _) = run(&arguments, false, &["x"]);

        // Verify
        assert_matches!(result, Err(CommandError::Argument(error)) => {
            assert!(!error.is_postponed());
            assert_eq!(error.argument(), "amount");
            assert_eq!(error.to_string(), "Invalid argument 'x'.");
        });
    }

    #[test]
    fn postponed_preempted() {
        // Setup
        let arguments = vec![
            Scalar::<u32>::new("amount").postpone_errors().boxed(),
            Scalar::<u32>::new("count").boxed(),
        ];

        // Execute
        let (result, _) = run(&arguments, false, &["x"]);

        // Verify
        assert_matches!(result, Err(CommandError::Argument(error)) => {
            assert_eq!(error.argument(), "count");
        });
    }

    #[rstest]
    #[case(vec![], true, vec!["foo"], CommandError::UnknownCommand("foo".to_string()))]
    #[case(vec![Scalar::<u32>::new("amount").boxed()], false, vec!["5", "6"], CommandError::UnexpectedArgument("6".to_string()))]
    #[case(vec![], false, vec!["foo"], CommandError::UnexpectedArgument("foo".to_string()))]
    fn leftovers(
        #[case] arguments: Vec<Box<dyn Argument>>,
        #[case] has_children: bool,
        #[case] tokens: Vec<&str>,
        #[case] expected: CommandError,
    ) {
        let (result, _) = run(&arguments, has_children, &tokens);
        assert_eq!(result, Err(expected));
    }

    #[test]
    fn leftovers_unparsed_argument() {
        // Setup
        let arguments = vec![
            Scalar::<u32>::new("amount").boxed(),
            Scalar::<u32>::new("count").optional().boxed(),
            Scalar::<u32>::new("limit").optional().boxed(),
        ];

        // Execute
        let (result, _) = run(&arguments, false, &["5", "x"]);

        // Verify
        assert_matches!(result, Err(CommandError::Argument(error)) => {
            assert_eq!(error.argument(), "count");
            assert_eq!(error.to_string(), "Invalid argument 'x'.");
        });
    }

    #[test]
    fn hard_failure_attributed() {
        // Setup
        let arguments = vec![Scalar::<u32>::new("amount").displayed_as("count").boxed()];

        // Execute
        let (result, _) = run(&arguments, false, &[]);

        // Verify
        assert_matches!(result, Err(CommandError::Argument(error)) => {
            assert_eq!(error.to_string(), "Missing argument '<count>'.");
        });
    }

    #[test]
    fn reparse_idempotent() {
        // Setup
        let arguments = vec![
            player_or_self(),
            Scalar::<u32>::new("page").or_default(1u32).boxed(),
        ];

        // Execute
        let (first_result, first) = run(&arguments, false, &["9"]);
        let (second_result, second) = run(&arguments, false, &["9"]);

        // Verify
        assert_eq!(first_result, second_result);
        assert_eq!(first.keys(), second.keys());
        assert_eq!(get_string(&first, "player"), get_string(&second, "player"));
        assert_eq!(get_u32(&first, "page"), get_u32(&second, "page"));
    }

    #[rstest]
    #[case(vec!["a"], vec!["alice"])]
    #[case(vec![""], vec!["alice", "bob"])]
    #[case(vec!["bob", ""], vec!["1", "16"])]
    #[case(vec!["bob", "1"], vec!["1", "16"])]
    #[case(vec!["bob", "5", ""], vec![])]
    #[case(vec![], vec![])]
    fn complete(#[case] tokens: Vec<&str>, #[case] expected: Vec<&str>) {
        // Setup
        let arguments = vec![
            Scalar::<String>::new("player").suggest(KNOWN).boxed(),
            Scalar::<u32>::new("amount").suggest(["1", "16"]).boxed(),
        ];

        // Execute
        let suggestions = suggest(&arguments, &tokens);

        // Verify
        assert_eq!(suggestions, expected);
    }

    #[rstest]
    #[case(vec!["1"], vec!["1", "16"])]
    #[case(vec!["b"], vec!["bob"])]
    fn complete_fallback(#[case] tokens: Vec<&str>, #[case] expected: Vec<&str>) {
        // Setup
        let arguments = vec![
            Scalar::<String>::new("player")
                .suggest(KNOWN)
                .filter(|player: &String| KNOWN.contains(&player.as_str()))
                .or_fallback(SenderName::new("self"))
                .boxed(),
            Scalar::<u32>::new("amount").suggest(["1", "16"]).boxed(),
        ];

        // Execute
        let suggestions = suggest(&arguments, &tokens);

        // Verify
        assert_eq!(suggestions, expected);
    }

    #[rstest]
    #[case(vec!["1"], vec!["1", "16"])]
    #[case(vec!["a"], vec!["all"])]
    #[case(vec!["x", ""], vec![])]
    fn complete_skipped(#[case] tokens: Vec<&str>, #[case] expected: Vec<&str>) {
        // Setup
        let arguments = vec![
            Scalar::<u32>::new("amount").suggest(["1", "16"]).optional().boxed(),
            Literal::new("all").boxed(),
        ];

        // Execute
        let suggestions = suggest(&arguments, &tokens);

        // Verify
        assert_eq!(suggestions, expected);
    }
}
