//! # Configuration
//!
//! Optional TOML defaults for the CLI.
//!
//! ```toml
//! directed = true
//! forbidden = [3, 4]
//! order = "dfs"
//! component = true
//! ```
//!
//! Lookup: `--config FILE` when given (the file must exist), otherwise
//! `graphreduce.toml` in the working directory when present, otherwise
//! built-in defaults. Explicit command-line flags always win.

use graphreduce_core::{GraphError, GraphKind, Identifiers, OrderBy, VertexId};
use serde::Deserialize;
use std::path::Path;

/// Config file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "graphreduce.toml";

/// Config files are tiny; anything larger is a mistake.
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Defaults read from a TOML file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub directed: Option<bool>,
    #[serde(default)]
    pub forbidden: Vec<i64>,
    pub order: Option<String>,
    pub component: Option<bool>,
}

impl Config {
    /// Parse a config from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, GraphError> {
        toml::from_str(text)
            .map_err(|e| GraphError::InvalidInput(format!("Invalid configuration: {}", e)))
    }

    /// Load the config, see the module docs for the lookup order.
    pub fn load(explicit: Option<&Path>) -> Result<Self, GraphError> {
        let path = match explicit {
            Some(path) => path,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    tracing::debug!("no configuration file, using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };

        let metadata = std::fs::metadata(path).map_err(|e| {
            GraphError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(GraphError::InvalidInput(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let text = std::fs::read_to_string(path).map_err(|e| {
            GraphError::IoError(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), ?config, "configuration loaded");
        Ok(config)
    }

    /// Merge command-line flags over the file values.
    pub fn resolve(&self, flags: &Flags) -> Result<Settings, GraphError> {
        let directed = flags.directed.or(self.directed).unwrap_or(false);

        let forbidden = match flags.forbidden.as_deref() {
            Some(list) => parse_vertex_list(list)?,
            None => self.forbidden.iter().map(|&v| VertexId(v)).collect(),
        };

        let order = match (flags.order, self.order.as_deref()) {
            (Some(order), _) => order,
            (None, Some(name)) => name.parse()?,
            (None, None) => OrderBy::default(),
        };

        let component = flags.component.or(self.component).unwrap_or(false);

        Ok(Settings {
            kind: GraphKind::from_directed(directed),
            forbidden,
            order,
            component,
        })
    }
}

/// Command-line values that can override the config file.
///
/// `None` means the flag was not given; `Some(false)` comes from an explicit
/// `--undirected` or `--no-component`.
#[derive(Debug, Clone, Default)]
pub struct Flags {
    pub directed: Option<bool>,
    pub forbidden: Option<String>,
    pub order: Option<OrderBy>,
    pub component: Option<bool>,
}

/// Effective settings for one command.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub kind: GraphKind,
    pub forbidden: Identifiers<VertexId>,
    pub order: OrderBy,
    pub component: bool,
}

/// Parse a comma-separated vertex list such as `"3, 4,9"`.
pub fn parse_vertex_list(list: &str) -> Result<Identifiers<VertexId>, GraphError> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<i64>()
                .map(VertexId)
                .map_err(|_| GraphError::InvalidInput(format!("Invalid vertex id: '{}'", item)))
        })
        .collect()
}
