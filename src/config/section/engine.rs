//! `[engine]` section configuration.
//!
//! The external engine executable and its leading arguments.
//!
//! # Example
//!
//! ```toml
//! [engine]
//! command = "glimpse-engine"      # Name on PATH, or a path relative to the project root
//! args = ["--dialect", "v2"]      # Passed before the operation name
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: "glimpse-engine".into(),
            args: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.command.trim().is_empty() {
            diag.error_with_hint(
                "engine.command",
                "must not be empty",
                "set it to the engine executable, e.g. `glimpse-engine`",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_engine_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.engine.command, "glimpse-engine");
        assert!(config.engine.args.is_empty());
    }

    #[test]
    fn test_engine_custom() {
        let config = test_parse_config("[engine]\ncommand = \"./bin/engine\"\nargs = [\"--fast\"]");
        assert_eq!(config.engine.command, "./bin/engine");
        assert_eq!(config.engine.args, vec!["--fast"]);
    }
}
