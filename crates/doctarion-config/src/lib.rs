use doctarion_engine::EditorOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why the editor settings file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read editor settings from {settings_path}: {source}")]
    Unreadable {
        settings_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Editor settings in {settings_path} are not valid: {source}")]
    Malformed {
        settings_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Contents of `config.toml`. Every field may be left out.
///
/// ```toml
/// document_dir = "~/documents"
///
/// [editor]
/// delete_boundary_policy = "join"
/// history_limit = 100
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where relative document paths given to the CLI are looked up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_dir: Option<PathBuf>,
    pub editor: EditorOptions,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::Unreadable {
                settings_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::Malformed {
                settings_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the document directory
        config.document_dir = config
            .document_dir
            .map(|dir| Self::expand_path(&dir).unwrap_or(dir));

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/doctarion");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// `path` itself when absolute, otherwise joined onto `document_dir`
    /// (if there is one).
    pub fn resolve_document_path(&self, path: &Path) -> PathBuf {
        match &self.document_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctarion_engine::{BoundaryPolicy, FlowDirection};
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/doctarion/config.toml"));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.editor.history_limit, 500);
    }

    #[test]
    fn test_editor_section() {
        let config: Config = toml::from_str(
            r#"
[editor]
delete_boundary_policy = "move"
orphan_direction = "forward"
merge_adjacent_spans = false
"#,
        )
        .unwrap();

        assert_eq!(config.editor.delete_boundary_policy, BoundaryPolicy::Move);
        assert_eq!(config.editor.orphan_direction, FlowDirection::Forward);
        assert!(!config.editor.merge_adjacent_spans);
        assert!(config.editor.create_default_interactor);
        assert_eq!(config.document_dir, None);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path);

        assert!(expanded.is_some());
        let expanded = expanded.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("DOCTARION_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$DOCTARION_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path);

        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/subdir")));

        unsafe {
            env::remove_var("DOCTARION_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_path_with_absolute_path() {
        let path = PathBuf::from("/absolute/path");
        let expanded = Config::expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_reports_parse_errors_with_the_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[editor]\nhistory_limit = \"lots\"\n").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::Malformed { .. }));
        assert!(err.to_string().starts_with("Editor settings in"));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_load_reports_unreadable_settings() {
        let temp_dir = TempDir::new().unwrap();
        let not_a_file = temp_dir.path().join("config.toml");
        std::fs::create_dir(&not_a_file).unwrap();

        let err = Config::load_from_path(&not_a_file).unwrap_err();

        assert!(matches!(err, ConfigError::Unreadable { .. }));
        assert!(err.to_string().starts_with("Cannot read editor settings from"));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            document_dir: Some(PathBuf::from("/tmp/test-docs")),
            editor: EditorOptions {
                history_limit: 20,
                delete_boundary_policy: BoundaryPolicy::Join,
                ..Default::default()
            },
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_document_dir_with_env_var_in_toml() {
        unsafe {
            env::set_var("DOCTARION_DOCS_ROOT", "/custom/docs");
        }
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "document_dir = \"$DOCTARION_DOCS_ROOT/mine\"\n").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(config.document_dir, Some(PathBuf::from("/custom/docs/mine")));

        unsafe {
            env::remove_var("DOCTARION_DOCS_ROOT");
        }
    }

    #[test]
    fn test_resolve_document_path() {
        let config = Config {
            document_dir: Some(PathBuf::from("/docs")),
            ..Default::default()
        };

        assert_eq!(
            config.resolve_document_path(Path::new("a.json")),
            PathBuf::from("/docs/a.json")
        );
        assert_eq!(
            config.resolve_document_path(Path::new("/elsewhere/b.json")),
            PathBuf::from("/elsewhere/b.json")
        );
        assert_eq!(
            Config::default().resolve_document_path(Path::new("a.json")),
            PathBuf::from("a.json")
        );
    }
}
