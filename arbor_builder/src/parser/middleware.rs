use crate::api::{starts_with_ignore_case, Argument, Command};
use crate::constant::*;
use crate::model::{InvokerKind, Suggestions};
use crate::parser::backtrack::ArgumentParser;
use crate::parser::base::{CommandError, ConfigError};
use crate::parser::cursor::TokenCursor;
use crate::parser::interface::CommandInput;
use crate::parser::printer::Printer;
use crate::parser::registry::{normalize, CommandRegistry};
use crate::parser::store::{ResultStore, ResultView, SimpleResultStore};

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// Handle to a command within a [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(pub(crate) usize);

pub(crate) type Executor =
    Box<dyn Fn(&CommandInput, &dyn ResultView) -> Result<(), CommandError> + Send + Sync>;

pub(crate) struct CommandNode {
    pub(crate) name: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) description: String,
    pub(crate) permission: Option<String>,
    pub(crate) accepted: Vec<InvokerKind>,
    pub(crate) hidden_in_parent_help: bool,
    pub(crate) hidden_in_own_help: bool,
    pub(crate) include_children_in_parent_help: bool,
    pub(crate) arguments: Vec<Box<dyn Argument>>,
    pub(crate) executor: Option<Executor>,
    pub(crate) parent: Option<CommandId>,
    pub(crate) children: CommandRegistry,
}

impl CommandNode {
    fn accepts(&self, kind: &InvokerKind) -> bool {
        self.accepted.is_empty() || self.accepted.contains(kind)
    }

    fn permits(&self, input: &CommandInput) -> bool {
        match &self.permission {
            Some(permission) => input.has_permission(permission),
            None => true,
        }
    }

    fn argument_parser(&self) -> ArgumentParser<'_> {
        ArgumentParser::new(&self.arguments, !self.children.is_empty())
    }
}

/// The configured command tree.
/// Built via [`Command::build_tree`] or [`Command::build`].
///
/// The commands live in an arena, addressed by [`CommandId`].
/// Dispatch and completion only read the tree, while [`CommandTree::register`] and [`CommandTree::unregister`] change it.
pub struct CommandTree {
    nodes: Vec<Option<CommandNode>>,
    root: CommandId,
}

impl std::fmt::Debug for CommandTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let usages: Vec<String> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_some())
            .map(|(index, _)| self.usage_format(CommandId(index)))
            .collect();
        f.debug_struct("CommandTree")
            .field("root", &self.root)
            .field("commands", &usages)
            .finish()
    }
}

impl CommandTree {
    pub(crate) fn new(root: Command) -> Result<Self, ConfigError> {
        let mut tree = Self {
            nodes: Vec::default(),
            root: CommandId(0),
        };
        tree.root = tree.insert(None, root)?;
        Ok(tree)
    }

    fn node(&self, id: CommandId) -> &CommandNode {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .expect("internal error - the command must be part of the tree")
    }

    fn node_mut(&mut self, id: CommandId) -> &mut CommandNode {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .expect("internal error - the command must be part of the tree")
    }

    fn insert(&mut self, parent: Option<CommandId>, command: Command) -> Result<CommandId, ConfigError> {
        let id = CommandId(self.nodes.len());
        let (node, children) = command.into_node(parent);

        if let Some(parent) = parent {
            self.node_mut(parent)
                .children
                .register(id, &node.name, &node.aliases)?;
        }

        self.nodes.push(Some(node));

        for child in children {
            if let Err(error) = self.insert(Some(id), child) {
                self.remove(id);
                return Err(error);
            }
        }

        Ok(id)
    }

    fn remove(&mut self, id: CommandId) {
        let node = self.nodes[id.0]
            .take()
            .expect("internal error - the command must be part of the tree");

        if let Some(parent) = node.parent {
            if let Some(Some(parent)) = self.nodes.get_mut(parent.0) {
                parent.children.unregister(id);
            }
        }

        for child in node.children.ids() {
            self.remove(child);
        }
    }

    /// The root command.
    pub fn root(&self) -> CommandId {
        self.root
    }

    /// Whether `id` is (still) part of this tree.
    pub fn contains(&self, id: CommandId) -> bool {
        matches!(self.nodes.get(id.0), Some(Some(_)))
    }

    /// The name of the command.
    ///
    /// Panics if `id` is not part of this tree.
    pub fn name(&self, id: CommandId) -> &str {
        &self.node(id).name
    }

    /// The parent of the command; `None` for the root.
    pub fn parent(&self, id: CommandId) -> Option<CommandId> {
        self.node(id).parent
    }

    /// The children of the command, in registration order.
    pub fn children(&self, id: CommandId) -> Vec<CommandId> {
        self.node(id).children.ids().collect()
    }

    /// The child of the command reached via `alias` (ignoring case).
    pub fn child_by_alias(&self, id: CommandId, alias: &str) -> Option<CommandId> {
        self.node(id).children.get(alias)
    }

    /// The (normalized) aliases the command can be reached by, its name first.
    ///
    /// For a child, these are only the aliases it was granted by its parent.
    pub fn aliases_of(&self, id: CommandId) -> Vec<String> {
        let node = self.node(id);

        match node.parent {
            Some(parent) => self.node(parent).children.aliases_of(id).to_vec(),
            None => std::iter::once(&node.name)
                .chain(node.aliases.iter())
                .map(|alias| normalize(alias))
                .collect(),
        }
    }

    /// Add `command` (and its children) beneath `parent`.
    ///
    /// ### Example
    /// ```
    /// # use arbor_builder as arbor;
    /// use arbor::Command;
    ///
    /// let mut tree = Command::new("shop").build_tree().unwrap();
    /// let root = tree.root();
    /// let remove = tree.register(root, Command::new("remove").alias("delete")).unwrap();
    ///
    /// assert_eq!(tree.child_by_alias(root, "DELETE"), Some(remove));
    /// assert_eq!(tree.usage_format(remove), "/shop remove");
    /// ```
    pub fn register(&mut self, parent: CommandId, command: Command) -> Result<CommandId, ConfigError> {
        if !self.contains(parent) {
            return Err(ConfigError(format!(
                "cannot register '{}' under a command that is not part of the tree.",
                command.name()
            )));
        }

        command.validate()?;
        self.insert(Some(parent), command)
    }

    /// Remove the command (and its children) from the tree.
    pub fn unregister(&mut self, id: CommandId) -> Result<(), ConfigError> {
        if id == self.root {
            return Err(ConfigError("cannot unregister the root command.".to_string()));
        }

        if !self.contains(id) {
            return Err(ConfigError("cannot unregister a command that is not part of the tree.".to_string()));
        }

        self.remove(id);
        Ok(())
    }

    /// The command prefix followed by the names of the command path (ex: `/shop remove`).
    pub fn command_format(&self, id: CommandId) -> String {
        let mut names = vec![self.name(id)];
        let mut current = self.parent(id);

        while let Some(parent) = current {
            names.push(self.name(parent));
            current = self.parent(parent);
        }

        names.reverse();
        format!("{COMMAND_PREFIX}{}", names.join(ARGUMENTS_SEPARATOR))
    }

    /// The formats of the command's (non hidden) arguments (ex: `<id> [amount]`).
    pub fn arguments_format(&self, id: CommandId) -> String {
        self.node(id)
            .arguments
            .iter()
            .map(|argument| argument.format())
            .filter(|format| !format.is_empty())
            .collect::<Vec<String>>()
            .join(ARGUMENTS_SEPARATOR)
    }

    /// The command format followed by the arguments format (ex: `/shop remove <id>`).
    pub fn usage_format(&self, id: CommandId) -> String {
        let arguments = self.arguments_format(id);

        if arguments.is_empty() {
            self.command_format(id)
        } else {
            format!("{}{ARGUMENTS_SEPARATOR}{arguments}", self.command_format(id))
        }
    }

    // Follow the leading tokens down the tree, as far as they match child aliases.
    fn descend(&self, cursor: &mut TokenCursor, keep: usize) -> CommandId {
        let mut id = self.root;

        while cursor.remaining() > keep {
            let child = cursor
                .peek_if_present()
                .and_then(|token| self.node(id).children.get(token));

            match child {
                Some(child) => {
                    cursor
                        .next()
                        .expect("internal error - a peeked token must be available");
                    id = child;
                }
                None => break,
            }
        }

        #[cfg(feature = "tracing_debug")]
        {
            debug!("Descended to '{}'.", self.command_format(id));
        }

        id
    }

    fn dispatch(
        &self,
        input: &CommandInput,
        cursor: &mut TokenCursor,
        store: &mut SimpleResultStore,
    ) -> Result<(), CommandError> {
        let id = self.descend(cursor, 0);
        let node = self.node(id);

        if !node.accepts(&input.invoker().kind()) {
            return Err(CommandError::SourceRejected);
        }

        if !node.permits(input) {
            return Err(CommandError::NoPermission);
        }

        node.argument_parser().parse(input, cursor, store)?;

        match &node.executor {
            Some(executor) => executor(input, store.view()),
            None => self.send_help(id, input),
        }
    }

    /// Dispatch the invocation to its command, and execute it.
    ///
    /// The tokens select a command by descending through the child aliases as far as possible.
    /// The selected command's arguments then parse the remaining tokens, after which it executes (exactly once).
    /// A command without an executor sends its help instead.
    pub fn process_command(&self, input: &CommandInput) -> Result<(), CommandError> {
        let mut cursor = TokenCursor::new(input.shared_tokens());
        let mut store = SimpleResultStore::default();
        self.dispatch(input, &mut cursor, &mut store)
    }

    /// Dispatch like [`CommandTree::process_command`], sending any error to the invoker.
    /// Returns whether the command succeeded.
    ///
    /// ### Example
    /// ```
    /// # use arbor_builder as arbor;
    /// use arbor::prelude::*;
    /// use arbor::{AllowAll, Command, CommandInput, ConsoleInvoker, Scalar};
    ///
    /// let tree = Command::new("give")
    ///     .argument(Scalar::<u32>::new("amount"))
    ///     .executes(|input, results| {
    ///         let amount = results.get_as::<u32>("amount").unwrap();
    ///         input.invoker().send_message(&format!("Here's {amount}."));
    ///         Ok(())
    ///     })
    ///     .build_tree()
    ///     .unwrap();
    ///
    /// let console = ConsoleInvoker::default();
    /// assert!(tree.handle_command(&CommandInput::new(&console, &AllowAll, "give", ["5"])));
    /// assert!(!tree.handle_command(&CommandInput::new(&console, &AllowAll, "give", ["x"])));
    /// ```
    pub fn handle_command(&self, input: &CommandInput) -> bool {
        let mut cursor = TokenCursor::new(input.shared_tokens());
        let mut store = SimpleResultStore::default();

        match self.dispatch(input, &mut cursor, &mut store) {
            Ok(()) => true,
            Err(error) => {
                #[cfg(feature = "tracing_debug")]
                {
                    let id = self.descend(&mut TokenCursor::new(input.shared_tokens()), 0);
                    debug!(
                        "Command '{}' failed for '{}': {error}; arguments: '{}'; results: {store:?}; cursor: {cursor:?}.",
                        self.command_format(id),
                        input.invoker().name(),
                        self.arguments_format(id)
                    );
                }

                input.invoker().send_message(&error.to_string());
                false
            }
        }
    }

    /// Suggestions for the final (possibly partial or empty) token of the invocation.
    ///
    /// Every candidate starts with the final token (ignoring case).
    /// When there are none, the host should fall back to its own default completion.
    pub fn complete(&self, input: &CommandInput) -> Suggestions {
        let Some(partial) = input.tokens().last() else {
            return Suggestions::HostDefault;
        };

        let mut cursor = TokenCursor::new(input.shared_tokens());
        // The final token is always left for the suggestions.
        let id = self.descend(&mut cursor, 1);
        let node = self.node(id);

        if !node.accepts(&input.invoker().kind()) || !node.permits(input) {
            return Suggestions::HostDefault;
        }

        let mut candidates = Vec::default();

        if cursor.remaining() == 1 {
            let normalized = normalize(partial);

            for child in node.children.ids() {
                let matching = node
                    .children
                    .aliases_of(child)
                    .iter()
                    .find(|alias| alias.starts_with(&normalized));

                if let Some(alias) = matching {
                    if self.node(child).permits(input) {
                        candidates.push(alias.clone());
                    }
                }
            }
        }

        let mut store = SimpleResultStore::default();
        candidates.extend(node.argument_parser().complete(input, &mut cursor, &mut store));
        candidates.retain(|candidate| starts_with_ignore_case(candidate, partial));
        Suggestions::from_candidates(candidates)
    }

    fn has_help_permission(&self, id: CommandId, input: &CommandInput) -> bool {
        let node = self.node(id);
        node.permits(input)
            || node
                .children
                .ids()
                .any(|child| self.has_help_permission(child, input))
    }

    fn add_children_help(&self, id: CommandId, input: &CommandInput, printer: &mut Printer) {
        for child in self.node(id).children.ids() {
            let node = self.node(child);

            if !node.hidden_in_parent_help && node.permits(input) {
                printer.add_entry(self.usage_format(child), node.description.clone());
            }

            if node.include_children_in_parent_help {
                self.add_children_help(child, input, printer);
            }
        }
    }

    fn help_printer(&self, id: CommandId, input: &CommandInput) -> Result<Printer, CommandError> {
        if !self.has_help_permission(id, input) {
            return Err(CommandError::NoPermission);
        }

        let node = self.node(id);
        let mut printer = Printer::for_invoker(&self.command_format(id), input.invoker());

        if !node.hidden_in_own_help && node.permits(input) {
            printer.add_entry(self.usage_format(id), node.description.clone());
        }

        self.add_children_help(id, input, &mut printer);
        Ok(printer)
    }

    /// The help page of the command: a title, its usage and description, and those of its children.
    ///
    /// Requires permission on the command or on any of its descendants.
    pub fn help(&self, id: CommandId, input: &CommandInput) -> Result<Vec<String>, CommandError> {
        Ok(self.help_printer(id, input)?.render())
    }

    /// Send the help page of the command to the invoker.
    pub fn send_help(&self, id: CommandId, input: &CommandInput) -> Result<(), CommandError> {
        self.help_printer(id, input)?.print(input.invoker());
        Ok(())
    }
}
