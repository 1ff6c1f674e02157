use std::collections::HashMap;

use crate::parser::base::ConfigError;
use crate::parser::middleware::CommandId;

#[cfg(feature = "tracing_debug")]
use tracing::debug;

/// Aliases are matched without regard to case.
pub(crate) fn normalize(alias: &str) -> String {
    alias.to_lowercase()
}

/// The child commands of one command, addressable by (case insensitive) alias.
///
/// A name is always bound to its command.
/// Additional aliases are bound first come first served; an alias already taken is skipped.
#[derive(Debug, Default)]
pub(crate) struct CommandRegistry {
    by_alias: HashMap<String, CommandId>,
    // Registration order, with the aliases bound to each command (name first).
    commands: Vec<(CommandId, Vec<String>)>,
}

impl CommandRegistry {
    pub(crate) fn register(
        &mut self,
        id: CommandId,
        name: &str,
        aliases: &[String],
    ) -> Result<(), ConfigError> {
        if self.commands.iter().any(|(existing, _)| *existing == id) {
            return Err(ConfigError(format!("command '{name}' is already registered.")));
        }

        let name = normalize(name);

        if self.by_alias.contains_key(&name) {
            return Err(ConfigError(format!(
                "another command with the name '{name}' is already registered."
            )));
        }

        self.by_alias.insert(name.clone(), id);
        let mut bound = vec![name];

        for alias in aliases.iter().map(|alias| normalize(alias)) {
            if self.by_alias.contains_key(&alias) {
                #[cfg(feature = "tracing_debug")]
                {
                    debug!("Skipping alias '{alias}', it is already bound to another command.");
                }
                continue;
            }

            self.by_alias.insert(alias.clone(), id);
            bound.push(alias);
        }

        self.commands.push((id, bound));
        Ok(())
    }

    /// Remove `id`, returning whether it was registered here.
    pub(crate) fn unregister(&mut self, id: CommandId) -> bool {
        let Some(index) = self.commands.iter().position(|(existing, _)| *existing == id) else {
            return false;
        };

        let (_, bound) = self.commands.remove(index);

        for alias in bound {
            // Only bound aliases are recorded, but stay strict about what gets removed.
            if self.by_alias.get(&alias) == Some(&id) {
                self.by_alias.remove(&alias);
            }
        }

        true
    }

    pub(crate) fn get(&self, alias: &str) -> Option<CommandId> {
        self.by_alias.get(&normalize(alias)).copied()
    }

    /// The registered commands, in registration order.
    pub(crate) fn ids(&self) -> impl Iterator<Item = CommandId> + '_ {
        self.commands.iter().map(|(id, _)| *id)
    }

    /// The aliases bound to `id`, its name first.
    pub(crate) fn aliases_of(&self, id: CommandId) -> &[String] {
        self.commands
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, bound)| bound.as_slice())
            .unwrap_or_default()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn register() {
        // Setup
        let mut registry = CommandRegistry::default();

        // Execute
        registry
            .register(CommandId(1), "Remove", &aliases(&["delete", "rm"]))
            .unwrap();

        // Verify
        assert_eq!(registry.get("remove"), Some(CommandId(1)));
        assert_eq!(registry.get("DELETE"), Some(CommandId(1)));
        assert_eq!(registry.get("Rm"), Some(CommandId(1)));
        assert_eq!(registry.get("other"), None);
        assert_eq!(registry.aliases_of(CommandId(1)), &["remove", "delete", "rm"]);
        assert_eq!(registry.ids().collect::<Vec<_>>(), vec![CommandId(1)]);
    }

    #[test]
    fn register_alias_collision() {
        // Setup
        let mut registry = CommandRegistry::default();
        registry
            .register(CommandId(1), "remove", &aliases(&["delete"]))
            .unwrap();

        // Execute
        registry
            .register(CommandId(2), "purge", &aliases(&["delete", "wipe"]))
            .unwrap();

        // Verify
        assert_eq!(registry.get("delete"), Some(CommandId(1)));
        assert_eq!(registry.get("wipe"), Some(CommandId(2)));
        assert_eq!(registry.aliases_of(CommandId(2)), &["purge", "wipe"]);
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec![CommandId(1), CommandId(2)]
        );
    }

    #[test]
    fn register_name_collision() {
        // Setup
        let mut registry = CommandRegistry::default();
        registry
            .register(CommandId(1), "remove", &aliases(&["delete"]))
            .unwrap();

        // Execute
        let by_name = registry.register(CommandId(2), "REMOVE", &[]);
        let by_alias = registry.register(CommandId(3), "delete", &[]);
        let again = registry.register(CommandId(1), "other", &[]);

        // Verify
        assert_matches!(by_name, Err(ConfigError(message)) => {
            assert_eq!(message, "another command with the name 'remove' is already registered.");
        });
        assert_matches!(by_alias, Err(_));
        assert_matches!(again, Err(_));
        assert_eq!(registry.ids().count(), 1);
    }

    #[test]
    fn unregister() {
        // Setup
        let mut registry = CommandRegistry::default();
        registry
            .register(CommandId(1), "remove", &aliases(&["delete"]))
            .unwrap();
        registry
            .register(CommandId(2), "purge", &aliases(&["delete"]))
            .unwrap();

        // Execute
        let removed = registry.unregister(CommandId(1));
        let removed_again = registry.unregister(CommandId(1));

        // Verify
        assert!(removed);
        assert!(!removed_again);
        assert_eq!(registry.get("remove"), None);
        // The collision was skipped, so the alias doesn't pass on to the other command.
        assert_eq!(registry.get("delete"), None);
        assert_eq!(registry.get("purge"), Some(CommandId(2)));
        assert!(!registry.is_empty());
        assert!(registry.unregister(CommandId(2)));
        assert!(registry.is_empty());
    }
}
