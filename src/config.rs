//! Tree configuration.
//!
//! There is currently one setting: the limits a [`crate::path`] validates
//! against. It is read once at startup, not threaded through every call —
//! the tree itself has no notion of configuration at all, only [`path`]'s
//! two `const`s, which this module's [`TreeConfig::path_limits`] mirrors for
//! callers that want to surface or override them without editing source.

use serde::{Deserialize, Serialize};

/// Configurable limits on the path grammar. Mirrors
/// [`crate::path::MAX_PATH_LEN`] and [`crate::path::MAX_NAME_LEN`] as the
/// defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum length of a path, in bytes.
    #[serde(default = "default_max_path_len")]
    pub max_path_len: usize,
    /// Maximum length of a single folder name, in bytes.
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,
}

fn default_max_path_len() -> usize {
    crate::path::MAX_PATH_LEN
}

fn default_max_name_len() -> usize {
    crate::path::MAX_NAME_LEN
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            max_path_len: default_max_path_len(),
            max_name_len: default_max_name_len(),
        }
    }
}

/// Loads a [`TreeConfig`], layering (in increasing precedence) compiled-in
/// defaults, an optional YAML file, and `FOLDERTREE_`-prefixed environment
/// variables.
#[cfg(feature = "figment_config")]
pub fn load(yaml_path: Option<&std::path::Path>) -> Result<TreeConfig, figment::Error> {
    use figment::{
        providers::{Env, Format, Serialized, Yaml},
        Figment,
    };

    let mut figment = Figment::new().merge(Serialized::defaults(TreeConfig::default()));
    if let Some(path) = yaml_path {
        figment = figment.merge(Yaml::file(path));
    }
    figment.merge(Env::prefixed("FOLDERTREE_")).extract()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_path_constants() {
        let config = TreeConfig::default();
        assert_eq!(config.max_path_len, crate::path::MAX_PATH_LEN);
        assert_eq!(config.max_name_len, crate::path::MAX_NAME_LEN);
    }

    #[cfg(feature = "figment_config")]
    #[test]
    fn load_with_no_yaml_file_falls_back_to_defaults() {
        let config = load(None).unwrap();
        assert_eq!(config, TreeConfig::default());
    }
}
