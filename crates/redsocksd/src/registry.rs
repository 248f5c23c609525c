//! Ordered table of the subsystems the daemon runs.
//!
//! Registry order is the init order, and its exact reverse is the teardown
//! order. The table is assembled once at process start and never changes
//! afterwards, which keeps the rollback sequence easy to audit.

use redsocks_config::{Parser, ParserBuildError};

use crate::subsystem::Subsystem;

/// Fixed, order-significant sequence of subsystems.
pub struct SubsystemRegistry {
    subsystems: Vec<Box<dyn Subsystem>>,
}

impl SubsystemRegistry {
    /// Starts assembling a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Number of registered subsystems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subsystems.len()
    }

    /// Returns true when no subsystem is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subsystems.is_empty()
    }

    /// Subsystem names in registry order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.subsystems
            .iter()
            .map(|subsystem| subsystem.name())
            .collect()
    }

    pub(crate) fn subsystem_mut(&mut self, index: usize) -> Option<&mut (dyn Subsystem + 'static)> {
        self.subsystems.get_mut(index).map(Box::as_mut)
    }

    /// Offers every subsystem's grammar section to `parser`, in registry order.
    ///
    /// # Errors
    ///
    /// Propagates registration failures from the parser.
    pub fn register_sections<'a>(
        &'a mut self,
        parser: &mut Parser<'a>,
    ) -> Result<(), ParserBuildError> {
        for subsystem in &mut self.subsystems {
            if let Some(section) = subsystem.config_section() {
                parser.add_section(section)?;
            }
        }
        Ok(())
    }

    /// Asks every subsystem to dump its state, in registry order.
    ///
    /// Returns how many subsystems were visited.
    pub fn dump_all(&self) -> usize {
        for subsystem in &self.subsystems {
            subsystem.dump();
        }
        self.subsystems.len()
    }
}

/// Builder for [`SubsystemRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
    subsystems: Vec<Box<dyn Subsystem>>,
}

impl RegistryBuilder {
    /// Appends a subsystem; the first one appended is the privileged leader.
    #[must_use]
    pub fn with(mut self, subsystem: impl Subsystem + 'static) -> Self {
        self.subsystems.push(Box::new(subsystem));
        self
    }

    /// Appends an already boxed subsystem.
    #[must_use]
    pub fn with_boxed(mut self, subsystem: Box<dyn Subsystem>) -> Self {
        self.subsystems.push(subsystem);
        self
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> SubsystemRegistry {
        SubsystemRegistry {
            subsystems: self.subsystems,
        }
    }
}
