use std::collections::HashSet;

use crate::api::Argument;
use crate::model::InvokerKind;
use crate::parser::{
    CommandError, CommandId, CommandInput, CommandNode, CommandRegistry, CommandTree, ConfigError,
    Executor, ResultView,
};

/// A command, along with its arguments and child commands.
///
/// ### Example
/// ```
/// # use arbor_builder as arbor;
/// use arbor::prelude::*;
/// use arbor::{AllowAll, Command, CommandInput, ConsoleInvoker, Scalar};
///
/// let tree = Command::new("shop")
///     .description("Shop commands.")
///     .child(
///         Command::new("remove")
///             .alias("delete")
///             .argument(Scalar::<u32>::new("id"))
///             .executes(|input, results| {
///                 let id = results.get_as::<u32>("id").unwrap();
///                 input.invoker().send_message(&format!("Removed shop {id}."));
///                 Ok(())
///             }),
///     )
///     .build();
///
/// let console = ConsoleInvoker::default();
/// let input = CommandInput::new(&console, &AllowAll, "shop", ["delete", "3"]);
/// tree.process_command(&input).unwrap();
/// ```
pub struct Command {
    name: String,
    aliases: Vec<String>,
    description: String,
    permission: Option<String>,
    accepted: Vec<InvokerKind>,
    hidden_in_parent_help: bool,
    hidden_in_own_help: bool,
    include_children_in_parent_help: bool,
    arguments: Vec<Box<dyn Argument>>,
    executor: Option<Executor>,
    children: Vec<Command>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("arguments", &self.arguments.iter().map(|a| a.name()).collect::<Vec<_>>())
            .field("children", &self.children)
            .finish()
    }
}

impl Command {
    /// Create a command.
    /// The name is always one of the aliases the command can be reached by.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::default(),
            description: String::default(),
            permission: None,
            accepted: Vec::default(),
            hidden_in_parent_help: false,
            hidden_in_own_help: false,
            include_children_in_parent_help: false,
            arguments: Vec::default(),
            executor: None,
            children: Vec::default(),
        }
    }

    /// Add an alias.
    ///
    /// Aliases are matched ignoring case.
    /// An alias already taken by a sibling command is skipped; the sibling keeps it.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Document the command.
    /// If repeated, only the final description will apply.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Require a permission to execute (and complete) the command.
    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission.replace(permission.into());
        self
    }

    /// Accept invokers of `kind`.
    /// Without any, every kind of invoker is accepted.
    /// Other invokers fail with [`CommandError::SourceRejected`].
    pub fn accepts(mut self, kind: InvokerKind) -> Self {
        self.accepted.push(kind);
        self
    }

    /// Leave the command out of its parent's help.
    pub fn hidden_in_parent_help(mut self) -> Self {
        self.hidden_in_parent_help = true;
        self
    }

    /// Leave the command's own entry out of its help.
    pub fn hidden_in_own_help(mut self) -> Self {
        self.hidden_in_own_help = true;
        self
    }

    /// Show the command's children in its parent's help.
    pub fn include_children_in_parent_help(mut self) -> Self {
        self.include_children_in_parent_help = true;
        self
    }

    /// Add an argument.
    ///
    /// The order of the arguments corresponds to their positional order during parsing.
    pub fn argument(mut self, argument: impl Argument + 'static) -> Self {
        self.arguments.push(Box::new(argument));
        self
    }

    /// Set the behaviour to run once the arguments have been parsed.
    /// Without it, the command sends its help instead.
    pub fn executes<F>(mut self, executor: F) -> Self
    where
        F: Fn(&CommandInput, &dyn ResultView) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.executor.replace(Box::new(executor));
        self
    }

    /// Add a child command.
    pub fn child(mut self, child: Command) -> Self {
        self.children.push(child);
        self
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Check the configuration of this command and its children.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        check_word("command name", &self.name)?;

        for alias in &self.aliases {
            check_word("command alias", alias)?;
        }

        let mut names = HashSet::new();

        for argument in &self.arguments {
            if argument.name().is_empty() {
                return Err(ConfigError(format!(
                    "command '{}' has an argument without a name.",
                    self.name
                )));
            }

            if !names.insert(argument.name()) {
                return Err(ConfigError(format!(
                    "command '{}' has multiple arguments named '{}'.",
                    self.name,
                    argument.name()
                )));
            }
        }

        for child in &self.children {
            child.validate()?;
        }

        Ok(())
    }

    pub(crate) fn into_node(self, parent: Option<CommandId>) -> (CommandNode, Vec<Command>) {
        let node = CommandNode {
            name: self.name,
            aliases: self.aliases,
            description: self.description,
            permission: self.permission,
            accepted: self.accepted,
            hidden_in_parent_help: self.hidden_in_parent_help,
            hidden_in_own_help: self.hidden_in_own_help,
            include_children_in_parent_help: self.include_children_in_parent_help,
            arguments: self.arguments,
            executor: self.executor,
            parent,
            children: CommandRegistry::default(),
        };
        (node, self.children)
    }

    /// Build the command tree as a Result, rooted at this command.
    /// This finalizes the configuration and checks for errors (ex: a repeated argument name).
    pub fn build_tree(self) -> Result<CommandTree, ConfigError> {
        self.validate()?;
        CommandTree::new(self)
    }

    /// Build the command tree, rooted at this command.
    /// This finalizes the configuration and checks for errors (ex: a repeated argument name).
    /// If an error is encountered, exits with error code `1` (via [`std::process::exit`]).
    pub fn build(self) -> CommandTree {
        match self.build_tree() {
            Ok(tree) => tree,
            Err(e) => {
                eprintln!("{e}");
                std::process::exit(1);
            }
        }
    }
}

fn check_word(what: &str, word: &str) -> Result<(), ConfigError> {
    if word.is_empty() {
        return Err(ConfigError(format!("{what} cannot be empty.")));
    }

    if word.chars().any(char::is_whitespace) {
        return Err(ConfigError(format!("{what} '{word}' cannot contain whitespace.")));
    }

    Ok(())
}
