//! Configuration gate run before any subsystem starts.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use redsocks_config::{ParseSummary, Parser, decode_source};

use crate::lifecycle::LaunchError;
use crate::registry::SubsystemRegistry;
use crate::reporter::LifecycleReporter;

/// Loads the configuration file and feeds it through every subsystem's
/// grammar section.
#[derive(Debug, Clone, Copy)]
pub struct ConfigurationGate<'a> {
    path: &'a Path,
}

impl<'a> ConfigurationGate<'a> {
    /// Gate over the file at `path`.
    #[must_use]
    pub const fn new(path: &'a Path) -> Self {
        Self { path }
    }

    /// Parses the file into the registry's sections.
    ///
    /// No subsystem hook other than the grammar callbacks runs here.
    ///
    /// # Errors
    ///
    /// Returns [`LaunchError::ConfigIo`] when the file cannot be read,
    /// [`LaunchError::OutOfMemory`] when buffers cannot be reserved,
    /// [`LaunchError::ConfigGrammar`] when two sections share a name and
    /// [`LaunchError::ConfigParse`] for the first error in the text, invalid
    /// UTF-8 included.
    pub fn check(
        &self,
        registry: &mut SubsystemRegistry,
        reporter: &dyn LifecycleReporter,
    ) -> Result<ParseSummary, LaunchError> {
        let text = self.read()?;
        let capacity = registry.len();
        let mut parser = Parser::with_capacity(&text, capacity)?;
        registry.register_sections(&mut parser)?;
        let summary = parser.run().map_err(|source| LaunchError::ConfigParse {
            path: self.path.to_path_buf(),
            source,
        })?;
        reporter.config_accepted(self.path, &summary);
        Ok(summary)
    }

    fn read(&self) -> Result<String, LaunchError> {
        let io_error = |source| LaunchError::ConfigIo {
            path: self.path.to_path_buf(),
            source,
        };
        let mut file = File::open(self.path).map_err(io_error)?;
        let length = file.metadata().map_err(io_error)?.len();
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(usize::try_from(length).unwrap_or(usize::MAX))?;
        file.read_to_end(&mut bytes).map_err(io_error)?;
        decode_source(bytes).map_err(|source| LaunchError::ConfigParse {
            path: self.path.to_path_buf(),
            source,
        })
    }
}
