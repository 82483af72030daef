//! Interpreter configuration.
//!
//! Every field has a default, so a JSON file only needs the keys it changes:
//!
//! ```json
//! { "max_loop_iterations": 1000000, "random_seed": 7 }
//! ```

use std::fs;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Run the bundled prelude before user code.
    pub prelude: bool,

    /// Cap on iterations of any single loop statement execution.
    pub max_loop_iterations: Option<u64>,

    /// Cap on nested user-function calls.
    pub max_call_depth: usize,

    /// Seed for `random`/`randomInt`; entropy when absent.
    pub random_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prelude: true,
            max_loop_iterations: None,
            max_call_depth: 1024,
            random_seed: None,
        }
    }
}

impl Config {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Read a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading configuration from {}", path.display());

        let text = fs::read_to_string(path)?;
        Self::from_json(&text).map_err(|err| std::io::Error::from(err).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_keys_take_defaults() {
        let config = Config::from_json(r#"{ "random_seed": 7 }"#).unwrap();
        assert_eq!(
            config,
            Config {
                random_seed: Some(7),
                ..Config::default()
            }
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_json(r#"{ "max_depth": 3 }"#).is_err());
    }

    #[test]
    fn defaults() {
        let config = Config::default();
        assert!(config.prelude);
        assert_eq!(config.max_call_depth, 1024);
        assert_eq!(config.max_loop_iterations, None);
    }
}
