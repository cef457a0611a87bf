//! The immutable command registry.

use std::collections::HashMap;

use thiserror::Error;

use super::handler::CommandHandler;

/// Insertion-ordered mapping from command name to handler.
///
/// Built once at wiring time from a declarative list and read-only from
/// then on, so concurrent lookups need no synchronization. Registration
/// order is irrelevant to dispatch and preserved only for diagnostic
/// listing.
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn CommandHandler>>,
    by_command: HashMap<String, usize>,
}

/// Errors rejected at registry construction time.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two handlers were registered under the same command name.
    #[error("duplicate command registration: {command}")]
    DuplicateCommand {
        /// The command name registered twice.
        command: String,
    },

    /// A handler reported an empty command name.
    #[error("handler registered with an empty command name")]
    EmptyCommand,
}

impl HandlerRegistry {
    /// Builds the registry from an ordered handler list.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateCommand`] when two handlers share
    /// a name (duplicates are a configuration error, not a
    /// last-registration-wins overwrite) and
    /// [`RegistryError::EmptyCommand`] for a nameless handler.
    pub fn build(handlers: Vec<Box<dyn CommandHandler>>) -> Result<Self, RegistryError> {
        let mut by_command = HashMap::with_capacity(handlers.len());
        for (index, handler) in handlers.iter().enumerate() {
            let command = handler.command();
            if command.is_empty() {
                return Err(RegistryError::EmptyCommand);
            }
            if by_command.insert(command.to_owned(), index).is_some() {
                return Err(RegistryError::DuplicateCommand {
                    command: command.to_owned(),
                });
            }
        }
        Ok(Self {
            handlers,
            by_command,
        })
    }

    /// Resolves a command name to its handler.
    #[must_use]
    pub fn lookup(&self, command: &str) -> Option<&dyn CommandHandler> {
        self.by_command
            .get(command)
            .map(|&index| self.handlers[index].as_ref())
    }

    /// Command names in registration order.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(|handler| handler.command())
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry holds no handlers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
