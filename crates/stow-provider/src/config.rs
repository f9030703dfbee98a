use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stow_types::CidScheme;

use crate::error::{ProviderError, ProviderResult};

/// Default store root, relative to the working directory.
pub const DEFAULT_ROOT: &str = ".stowage";

/// Which substrate holds a provider's state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-local maps; state is lost on drop.
    Memory,
    /// `content/` and `tasks/` directories under a root.
    #[default]
    Filesystem,
}

/// Construction-time provider settings, usually read from a TOML file.
///
/// ```toml
/// backend = "filesystem"
/// root = "/var/lib/stowage"
/// cid_scheme = "blake3"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    pub backend: BackendKind,
    pub root: PathBuf,
    pub cid_scheme: CidScheme,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            root: PathBuf::from(DEFAULT_ROOT),
            cid_scheme: CidScheme::default(),
        }
    }
}

impl ProviderConfig {
    /// In-memory configuration.
    pub fn memory() -> Self {
        Self {
            backend: BackendKind::Memory,
            ..Self::default()
        }
    }

    /// Filesystem configuration rooted at `root`.
    pub fn filesystem(root: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendKind::Filesystem,
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn with_scheme(mut self, scheme: CidScheme) -> Self {
        self.cid_scheme = scheme;
        self
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> ProviderResult<Self> {
        toml::from_str(s).map_err(|e| ProviderError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ProviderError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    /// Render as a TOML document.
    pub fn to_toml_string(&self) -> ProviderResult<String> {
        toml::to_string(self).map_err(|e| ProviderError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ProviderConfig::default();
        assert_eq!(c.backend, BackendKind::Filesystem);
        assert_eq!(c.root, PathBuf::from(".stowage"));
        assert_eq!(c.cid_scheme, CidScheme::Blake3);
    }

    #[test]
    fn parses_full_document() {
        let c = ProviderConfig::from_toml_str(
            "backend = \"memory\"\nroot = \"/tmp/x\"\ncid_scheme = \"random\"\n",
        )
        .unwrap();
        assert_eq!(c.backend, BackendKind::Memory);
        assert_eq!(c.root, PathBuf::from("/tmp/x"));
        assert_eq!(c.cid_scheme, CidScheme::Random);
    }

    #[test]
    fn missing_keys_take_defaults() {
        let c = ProviderConfig::from_toml_str("root = \"data\"").unwrap();
        assert_eq!(c.backend, BackendKind::Filesystem);
        assert_eq!(c.root, PathBuf::from("data"));
        assert_eq!(c.cid_scheme, CidScheme::Blake3);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ProviderConfig::from_toml_str("bakend = \"memory\"").unwrap_err();
        assert!(matches!(err, ProviderError::Config(_)));
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ProviderConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn toml_roundtrip() {
        let c = ProviderConfig::filesystem("/srv/stow").with_scheme(CidScheme::Random);
        let back = ProviderConfig::from_toml_str(&c.to_toml_string().unwrap()).unwrap();
        assert_eq!(back, c);
    }
}
