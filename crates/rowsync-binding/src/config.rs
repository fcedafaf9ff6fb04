//! Data source configuration
//!
//! One [`DataSourceConfig`] describes how rows are dequeued from the bound
//! view and whether initial population is collapsed into a single reload.
//! Model coercion is not part of the serialized configuration; it is passed as
//! a [`ModelDecoder`](rowsync_core::ModelDecoder) when the data source is built.
//!
//! ```toml
//! reuse_identifier = "message"
//! defer_until_loaded = true
//!
//! [cell_kind]
//! nib = "MessageCell"
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How cells for the reuse identifier are provided.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// The view's stock cell type.
    #[default]
    Default,
    /// A prototype cell already owned by the view; never registered.
    Prototype,
    /// A custom cell type, registered by name.
    CustomClass(String),
    /// A cell loaded from a named layout resource.
    Nib(String),
}

impl CellKind {
    /// Returns true if the data source must register this kind with the view.
    pub fn requires_registration(&self) -> bool {
        !matches!(self, CellKind::Prototype)
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The configuration text could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    Parse {
        /// Parser failure.
        message: String,
    },

    /// The configuration parsed but is not usable.
    #[error("Invalid configuration: {reason}")]
    Invalid {
        /// The reason the configuration is invalid.
        reason: String,
    },
}

/// Configuration for a list data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceConfig {
    /// Identifier cells are registered and dequeued under.
    pub reuse_identifier: String,

    /// How cells are provided.
    pub cell_kind: CellKind,

    /// Collapse initial population into one reload once the query reports it
    /// has delivered its initial result set.
    pub defer_until_loaded: bool,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            reuse_identifier: "cell".to_string(),
            cell_kind: CellKind::Default,
            defer_until_loaded: true,
        }
    }
}

impl DataSourceConfig {
    /// Create a configuration for `reuse_identifier` with default settings.
    pub fn new(reuse_identifier: impl Into<String>) -> Self {
        Self {
            reuse_identifier: reuse_identifier.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a TOML configuration.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Set the reuse identifier.
    pub fn with_reuse_identifier(mut self, reuse_identifier: impl Into<String>) -> Self {
        self.reuse_identifier = reuse_identifier.into();
        self
    }

    /// Set the cell kind.
    pub fn with_cell_kind(mut self, cell_kind: CellKind) -> Self {
        self.cell_kind = cell_kind;
        self
    }

    /// Enable or disable collapsing initial population.
    pub fn with_defer_until_loaded(mut self, defer: bool) -> Self {
        self.defer_until_loaded = defer;
        self
    }

    /// Check that the configuration can be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reuse_identifier.trim().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "reuse_identifier must not be empty".to_string(),
            });
        }
        match &self.cell_kind {
            CellKind::CustomClass(name) if name.trim().is_empty() => Err(ConfigError::Invalid {
                reason: "custom_class name must not be empty".to_string(),
            }),
            CellKind::Nib(name) if name.trim().is_empty() => Err(ConfigError::Invalid {
                reason: "nib name must not be empty".to_string(),
            }),
            _ => Ok(()),
        }
    }
}
