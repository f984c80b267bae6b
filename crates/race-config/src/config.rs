//! The core's configuration tree: the recognized top-level keys plus an
//! untyped side table for anything a component-specific consumer expects
//! but this layer doesn't name, matching the hierarchical-key-value model
//! every component draws a sub-tree from.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticatorAttachment {
    Cross,
    Platform,
    Any,
}

impl Default for AuthenticatorAttachment {
    fn default() -> Self {
        AuthenticatorAttachment::Any
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserVerification {
    Preferred,
    Required,
    Discouraged,
    Any,
}

impl Default for UserVerification {
    fn default() -> Self {
        UserVerification::Preferred
    }
}

/// The WebAuthn-ish credential policy a relying party advertises; fields
/// default to the most permissive setting so an instance with no explicit
/// policy still authenticates.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CredentialPolicy {
    #[serde(default)]
    pub authenticator_attachment: AuthenticatorAttachment,
    #[serde(default)]
    pub user_verification: UserVerification,
    #[serde(default)]
    pub resident_key: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub column_list: Option<PathBuf>,
    #[serde(default)]
    pub row_list: Option<PathBuf>,
    #[serde(default)]
    pub formula_list: Option<PathBuf>,
    #[serde(default)]
    pub column_data: Option<PathBuf>,
    #[serde(default)]
    pub buffer_size: Option<usize>,
    /// Seconds bounding pending auth/wire requests; see [`Config::timeout`].
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub user_credentials: Option<PathBuf>,
    #[serde(default)]
    pub rp_id: Option<String>,
    #[serde(default)]
    pub rp_name: Option<String>,
    #[serde(default)]
    pub rp_origins: Vec<String>,
    #[serde(flatten)]
    pub credential_policy: CredentialPolicy,
    /// Keys this layer doesn't recognize, preserved for a component that
    /// consumes a sub-tree this struct doesn't name.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Config {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Loads from `path`, dispatching on extension: `.toml` parses as
    /// TOML, anything else as JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        if path.extension().and_then(|e| e.to_str()) == Some("toml") {
            Self::from_toml_str(&content).map_err(|source| ConfigError::Toml { path: path.to_path_buf(), source })
        } else {
            Self::from_json_str(&content).map_err(|source| ConfigError::Json { path: path.to_path_buf(), source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_recognized_kebab_case_keys_from_json() {
        let cfg = Config::from_json_str(
            r#"{"name":"node-a","node-id":"/node-a","buffer-size":4096,"timeout":30,"rp-origins":["https://race.example"]}"#,
        )
        .unwrap();
        assert_eq!(cfg.name.as_deref(), Some("node-a"));
        assert_eq!(cfg.node_id.as_deref(), Some("/node-a"));
        assert_eq!(cfg.buffer_size, Some(4096));
        assert_eq!(cfg.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(cfg.rp_origins, vec!["https://race.example".to_string()]);
    }

    #[test]
    fn unrecognized_keys_land_in_extra() {
        let cfg: Config = serde_json::from_str(r#"{"name":"node-a","some-future-key":42}"#).unwrap();
        assert_eq!(cfg.name.as_deref(), Some("node-a"));
        assert_eq!(cfg.extra.get("some-future-key").and_then(|v| v.as_i64()), Some(42));
    }

    #[test]
    fn parses_from_toml() {
        let cfg = Config::from_toml_str("name = \"node-a\"\nbuffer_size = 2048\n").unwrap();
        assert_eq!(cfg.name.as_deref(), Some("node-a"));
        assert_eq!(cfg.buffer_size, Some(2048));
    }

    #[test]
    fn credential_policy_defaults_to_permissive() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.credential_policy.authenticator_attachment, AuthenticatorAttachment::Any);
        assert_eq!(cfg.credential_policy.user_verification, UserVerification::Preferred);
    }
}
