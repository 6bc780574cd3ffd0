// src/config/loader.rs
//! Layered configuration loader
//!
//! Precedence, lowest first: built-in defaults, each TOML file in path
//! order, then `VITALSIM_<SECTION>__<KEY>` environment overrides.

use crate::config::{constants::paths, FixtureConfig};
use crate::utils::validation::ValidationError;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Configuration loader
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    /// Explicit paths must exist; discovered ones are optional
    require_files: bool,
    current_config: FixtureConfig,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Configuration validation error: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl ConfigLoader {
    /// Create a loader over the conventional config locations
    pub fn new() -> Self {
        Self {
            config_paths: Self::discover_config_paths(),
            require_files: false,
            current_config: FixtureConfig::default(),
        }
    }

    /// Create loader with explicit paths; each one has to exist
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            require_files: true,
            current_config: FixtureConfig::default(),
        }
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Load, merge and validate the configuration
    pub fn load_fixture_config(&mut self) -> Result<FixtureConfig, ConfigError> {
        let config = self.load_and_merge_configs()?;
        config.validate()?;

        info!(
            patients = config.patients.len(),
            seed = config.generation.seed,
            "configuration loaded"
        );
        self.current_config = config.clone();
        Ok(config)
    }

    /// Get current configuration
    pub fn current_config(&self) -> &FixtureConfig {
        &self.current_config
    }

    /// Validate a single file on top of the defaults without loading it
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let mut merged = Self::default_value()?;
        let file_config = self.load_config_file(path.as_ref())?;
        Self::merge_toml_values(&mut merged, file_config);

        let config: FixtureConfig = merged.try_into()?;
        config.validate()?;
        Ok(())
    }

    /// Export current configuration to file
    pub fn export_config<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        std::fs::write(path, self.export_toml()?)?;
        Ok(())
    }

    /// Current configuration as a TOML document
    pub fn export_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(&self.current_config).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn default_value() -> Result<toml::Value, ConfigError> {
        toml::Value::try_from(FixtureConfig::default()).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    fn load_and_merge_configs(&self) -> Result<FixtureConfig, ConfigError> {
        let mut merged_config = Self::default_value()?;

        for config_path in &self.config_paths {
            match self.load_config_file(config_path) {
                Ok(file_config) => {
                    debug!(path = %config_path.display(), "merging configuration file");
                    Self::merge_toml_values(&mut merged_config, file_config);
                }
                // Discovered locations are optional
                Err(ConfigError::FileNotFound(_)) if !self.require_files => continue,
                Err(e) => return Err(e),
            }
        }

        Self::apply_environment_overrides(&mut merged_config, std::env::vars());

        let config: FixtureConfig = merged_config
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

        Ok(config)
    }

    fn load_config_file(&self, path: &Path) -> Result<toml::Value, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: toml::Value = toml::from_str(&content)?;

        Ok(config)
    }

    /// Tables merge key by key; everything else, arrays included, is replaced
    fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
        match (base, overlay) {
            (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
                for (key, value) in overlay_table {
                    if let Some(base_value) = base_table.get_mut(&key) {
                        Self::merge_toml_values(base_value, value);
                    } else {
                        base_table.insert(key, value);
                    }
                }
            }
            (base_value, overlay_value) => {
                *base_value = overlay_value;
            }
        }
    }

    fn apply_environment_overrides<I>(config: &mut toml::Value, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(paths::ENV_PREFIX) {
                let segments: Vec<String> = stripped
                    .to_lowercase()
                    .split("__")
                    .map(str::to_string)
                    .collect();

                if segments.iter().any(|segment| segment.is_empty()) {
                    warn!(variable = %key, "environment override has an empty key segment");
                    continue;
                }

                debug!(variable = %key, "applying environment override");
                if let Err(reason) = Self::set_nested_value(config, &segments, &value) {
                    warn!(variable = %key, reason, "environment override not applied");
                }
            }
        }
    }

    /// Numbers and booleans are typed unless the key already holds a string
    fn parse_env_value(value: &str, existing: Option<&toml::Value>) -> toml::Value {
        if let Some(toml::Value::String(_)) = existing {
            return toml::Value::String(value.to_string());
        }

        if let Ok(int_val) = value.parse::<i64>() {
            toml::Value::Integer(int_val)
        } else if let Ok(float_val) = value.parse::<f64>() {
            toml::Value::Float(float_val)
        } else if let Ok(bool_val) = value.parse::<bool>() {
            toml::Value::Boolean(bool_val)
        } else {
            toml::Value::String(value.to_string())
        }
    }

    fn set_nested_value(config: &mut toml::Value, path: &[String], raw: &str) -> Result<(), &'static str> {
        let Some((last, parents)) = path.split_last() else {
            return Err("empty key path");
        };

        let mut current = config;
        for part in parents {
            let toml::Value::Table(table) = current else {
                return Err("key path crosses a non-table value");
            };
            current = table
                .entry(part.clone())
                .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
        }

        let toml::Value::Table(table) = current else {
            return Err("key path crosses a non-table value");
        };
        let value = Self::parse_env_value(raw, table.get(last));
        table.insert(last.clone(), value);
        Ok(())
    }

    fn discover_config_paths() -> Vec<PathBuf> {
        // In order of precedence
        vec![
            PathBuf::from(paths::DEFAULT_CONFIG_FILE),
            PathBuf::from(paths::PROJECT_CONFIG_FILE),
            PathBuf::from(paths::LOCAL_CONFIG_FILE),
        ]
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "{}", content).unwrap();
        temp_file
    }

    #[test]
    fn test_config_loader_creation() {
        let loader = ConfigLoader::new();
        assert_eq!(loader.config_paths().len(), 3);
        assert_eq!(loader.current_config(), &FixtureConfig::default());
    }

    #[test]
    #[serial]
    fn test_file_overrides_defaults() {
        let temp_file = write_config(
            r#"
[generation]
seed = 7
parallel = true

[channels.load]
sensor_error_probability = 0.0
        "#,
        );

        let mut loader = ConfigLoader::with_paths(vec![temp_file.path().to_path_buf()]);
        let config = loader.load_fixture_config().unwrap();

        assert_eq!(config.generation.seed, 7);
        assert!(config.generation.parallel);
        assert_eq!(config.channels.load.sensor_error_probability, 0.0);
        assert_eq!(config.channels.load.hr_derived_probability, 0.7);
        assert_eq!(config.patients.len(), 3);
    }

    #[test]
    #[serial]
    fn test_later_files_win_and_patients_replace() {
        let base = write_config(
            r#"
[generation]
seed = 1
output_dir = "first"
        "#,
        );
        let overlay = write_config(
            r#"
[generation]
seed = 2

[[patients]]
id = "patient_solo"
activity_pattern = "resting"
duration_hours = 0.25
        "#,
        );

        let mut loader = ConfigLoader::with_paths(vec![
            base.path().to_path_buf(),
            overlay.path().to_path_buf(),
        ]);
        let config = loader.load_fixture_config().unwrap();

        assert_eq!(config.generation.seed, 2);
        assert_eq!(config.generation.output_dir, PathBuf::from("first"));
        assert_eq!(config.patients.len(), 1);
        assert_eq!(config.patients[0].id, "patient_solo");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let mut loader = ConfigLoader::with_paths(vec![PathBuf::from("/nonexistent/vitalsim.toml")]);
        assert!(matches!(
            loader.load_fixture_config(),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_config_validation() {
        let loader = ConfigLoader::new();

        let invalid = write_config(
            r#"
[channels.heart_rate.step]
min_s = 0.0
max_s = 1.0
        "#,
        );
        assert!(matches!(
            loader.validate_config_file(invalid.path()),
            Err(ConfigError::ValidationError(_))
        ));

        let valid = write_config(
            r#"
[channels.heart_rate]
dropout_probability = 0.5
        "#,
        );
        assert!(loader.validate_config_file(valid.path()).is_ok());
    }

    #[test]
    fn test_parse_error_reported() {
        let loader = ConfigLoader::new();
        let broken = write_config("[generation\nseed = ");
        assert!(matches!(
            loader.validate_config_file(broken.path()),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_environment_override_paths() {
        let mut value = toml::Value::try_from(FixtureConfig::default()).unwrap();
        let vars = vec![
            ("VITALSIM_GENERATION__SEED".to_string(), "4000".to_string()),
            ("VITALSIM_CHANNELS__HEART_RATE__CLOCK_DRIFT_MAX".to_string(), "0".to_string()),
            ("VITALSIM_GENERATION__OUTPUT_DIR".to_string(), "fixtures".to_string()),
            ("OTHER_GENERATION__SEED".to_string(), "1".to_string()),
            ("VITALSIM___".to_string(), "ignored".to_string()),
        ];
        ConfigLoader::apply_environment_overrides(&mut value, vars);

        let config: FixtureConfig = value.try_into().unwrap();
        assert_eq!(config.generation.seed, 4000);
        assert_eq!(config.channels.heart_rate.clock_drift_max, 0.0);
        assert_eq!(config.generation.output_dir, PathBuf::from("fixtures"));
    }

    #[test]
    fn test_numeric_environment_value_for_string_field() {
        let mut value = toml::Value::try_from(FixtureConfig::default()).unwrap();
        let vars = vec![
            ("VITALSIM_GENERATION__OUTPUT_DIR".to_string(), "2024".to_string()),
            ("VITALSIM_GENERATION__SEED".to_string(), "5".to_string()),
        ];
        ConfigLoader::apply_environment_overrides(&mut value, vars);

        let config: FixtureConfig = value.try_into().unwrap();
        assert_eq!(config.generation.output_dir, PathBuf::from("2024"));
        assert_eq!(config.generation.seed, 5);
    }

    #[test]
    fn test_override_through_patient_array_is_skipped() {
        let mut value = toml::Value::try_from(FixtureConfig::default()).unwrap();
        let path = vec!["patients".to_string(), "duration_hours".to_string()];
        assert!(ConfigLoader::set_nested_value(&mut value, &path, "1.0").is_err());

        let config: FixtureConfig = value.try_into().unwrap();
        assert_eq!(config, FixtureConfig::default());
    }

    #[test]
    #[serial]
    fn test_environment_override() {
        std::env::set_var("VITALSIM_GENERATION__PARALLEL", "true");

        let mut loader = ConfigLoader::with_paths(Vec::new());
        let config = loader.load_fixture_config().unwrap();

        assert!(config.generation.parallel);

        std::env::remove_var("VITALSIM_GENERATION__PARALLEL");
    }

    #[test]
    fn test_config_export() {
        let loader = ConfigLoader::new();
        let temp_file = NamedTempFile::new().unwrap();

        assert!(loader.export_config(temp_file.path()).is_ok());

        let content = std::fs::read_to_string(temp_file.path()).unwrap();
        assert!(content.contains("[generation]"));
        assert!(content.contains("[[patients]]"));

        let reparsed: FixtureConfig = toml::from_str(&content).unwrap();
        assert_eq!(&reparsed, loader.current_config());
    }
}
