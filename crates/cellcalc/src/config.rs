//! Service configuration
//!
//! Every field has a default, so a configuration file only needs the values
//! it changes:
//!
//! ```json
//! {
//!   "sample": { "headers": ["a", "b"], "rows": [[1, 2], [3, 4]] },
//!   "calculation": { "evaluation": { "maxCallDepth": 64 } }
//! }
//! ```

use crate::calculation::CalculationOptions;
use crate::validation::SampleGrid;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Configuration of the validation service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Grid used by syntax checks
    pub sample: SampleGrid,
    /// Formula-cell calculation and evaluation limits
    pub calculation: CalculationOptions,
}

impl ServiceConfig {
    /// Load a configuration from a JSON file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loading configuration");
        Self::from_json_str(&text)
    }

    /// Parse a configuration from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
