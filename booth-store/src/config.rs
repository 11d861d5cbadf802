// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};

/// Configuration parameters for a document store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Keep writes with a stale revision as conflict branches even when the request did not ask
    /// for "all-or-nothing" mode.
    pub allow_branching: bool,
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn deserialize_with_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.allow_branching);

        let config: Config = serde_json::from_str(r#"{"allow_branching": true}"#).unwrap();
        assert!(config.allow_branching);
    }
}
