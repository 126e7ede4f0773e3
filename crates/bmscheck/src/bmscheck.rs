//! Main BmsCheck struct and public API.

use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::cancel::CancellationToken;
use crate::config::ValidationConfig;
use crate::error::Result;
use crate::input::{LoadedDataset, Loader};
use crate::validation::{ValidationEngine, ValidationResult};

/// The BmsCheck validation entry point.
///
/// Configuration is checked when the instance is built, so a bad option set
/// never reaches the loader.
#[derive(Debug, Clone)]
pub struct BmsCheck {
    loader: Loader,
    engine: ValidationEngine,
    cancel: CancellationToken,
}

impl BmsCheck {
    /// Create an instance with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(ValidationConfig::default())
    }

    /// Create an instance with a custom configuration.
    pub fn with_config(config: ValidationConfig) -> Result<Self> {
        let resolved = config.resolve()?;
        Ok(Self {
            loader: Loader::from_config(&resolved),
            engine: ValidationEngine::new(resolved),
            cancel: CancellationToken::new(),
        })
    }

    /// Use a caller-owned cancellation token.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &ValidationConfig {
        &self.engine.config().options
    }

    /// The cancellation token polled during runs.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Validate an export on disk.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<ValidationResult> {
        let path = path.as_ref();
        self.cancel.check()?;

        let loaded = self.loader.load_path(path)?;
        info!(path = %path.display(), strategy = ?loaded.dataset.strategy(), "loaded");
        self.run(loaded)
    }

    /// Validate an export read from a stream.
    ///
    /// `format_hint` is a file name or media type; `declared_size` selects the
    /// load strategy when known.
    pub fn validate_reader<R: Read>(
        &self,
        reader: R,
        format_hint: &str,
        declared_size: Option<u64>,
    ) -> Result<ValidationResult> {
        self.cancel.check()?;
        let loaded = self.loader.load_reader(reader, format_hint, declared_size)?;
        self.run(loaded)
    }

    fn run(&self, loaded: LoadedDataset) -> Result<ValidationResult> {
        self.engine
            .run(loaded.dataset.as_ref(), loaded.source, &self.cancel)
    }
}
