use std::path::Path;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

const DEFAULT_CONFIG: &str = include_str!("default.toml");

const ENV_PREFIX: &str = "TERN__";

/// Names a TOML file layered between the defaults and the environment.
pub const CONFIG_FILE_ENV: &str = "TERN_CONFIG_FILE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub telemetry: TelemetryConfig,
    pub data: DataConfig,
    pub split: SplitConfig,
    pub features: FeatureConfig,
    pub regression: RegressionConfig,
    pub output: OutputConfig,
}

impl AppConfig {
    /// Loads the built-in defaults overridden by `TERN__*` environment variables.
    pub fn load() -> CommonResult<Self> {
        Self::extract(Figment::from(Toml::string(DEFAULT_CONFIG)))
    }

    /// Loads the configuration for the binary, using the file named by
    /// `TERN_CONFIG_FILE` when that variable is set.
    pub fn from_env() -> CommonResult<Self> {
        Self::load_optional_file(std::env::var_os(CONFIG_FILE_ENV))
    }

    pub fn load_optional_file(path: Option<impl AsRef<Path>>) -> CommonResult<Self> {
        match path {
            Some(path) => Self::load_file(path),
            None => Self::load(),
        }
    }

    /// Loads the built-in defaults, then the given TOML file, then the environment.
    pub fn load_file(path: impl AsRef<Path>) -> CommonResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CommonError::invalid(format!(
                "configuration file not found: {}",
                path.display()
            )));
        }
        Self::extract(Figment::from(Toml::string(DEFAULT_CONFIG)).merge(Toml::file(path)))
    }

    fn extract(figment: Figment) -> CommonResult<Self> {
        figment
            .merge(Env::prefixed(ENV_PREFIX).map(|p| p.as_str().replace("__", ".").into()))
            .extract()
            .map_err(|e| CommonError::InvalidArgument(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub batch_size: usize,
    pub target_partitions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Parquet,
    Csv,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub path: String,
    pub format: DataFormat,
    pub csv_has_header: bool,
    pub csv_delimiter: char,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    pub seed: i64,
    pub weights: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidHandling {
    Error,
    Skip,
    Keep,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub input_columns: Vec<String>,
    pub output_column: String,
    pub handle_invalid: InvalidHandling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    Auto,
    Normal,
    Sgd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionConfig {
    pub label_column: String,
    pub prediction_column: String,
    pub solver: SolverKind,
    pub max_iter: usize,
    pub learning_rate: f64,
    pub tolerance: f64,
    pub fit_intercept: bool,
    pub reg_param: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub show_rows: usize,
    pub display_columns: Vec<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Figment::from(Toml::string(DEFAULT_CONFIG))
            .extract::<AppConfig>()
            .unwrap();
        assert_eq!(config.split.seed, 42);
        assert_eq!(config.split.weights, vec![0.8, 0.2]);
        assert_eq!(config.features.input_columns, vec!["bedrooms".to_string()]);
        assert_eq!(config.features.output_column, "features");
        assert_eq!(config.features.handle_invalid, InvalidHandling::Error);
        assert_eq!(config.regression.label_column, "price");
        assert_eq!(config.regression.prediction_column, "prediction");
        assert_eq!(config.regression.solver, SolverKind::Auto);
        assert_eq!(config.data.format, DataFormat::Parquet);
        assert_eq!(config.data.csv_delimiter, ',');
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[split]\nseed = 7\nweights = [0.5, 0.5]\n\n[data]\nformat = \"csv\""
        )
        .unwrap();
        let config = AppConfig::load_file(file.path()).unwrap();
        assert_eq!(config.split.weights, vec![0.5, 0.5]);
        assert_eq!(config.data.format, DataFormat::Csv);
        assert_eq!(config.regression.label_column, "price");
    }

    #[test]
    fn test_optional_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[regression]\nsolver = \"sgd\"").unwrap();
        let config = AppConfig::load_optional_file(Some(file.path())).unwrap();
        assert_eq!(config.regression.solver, SolverKind::Sgd);

        let config = AppConfig::load_optional_file(None::<&Path>).unwrap();
        assert_eq!(config.regression.solver, SolverKind::Auto);

        let result = AppConfig::load_optional_file(Some("/nonexistent/tern.toml"));
        assert!(matches!(result, Err(CommonError::InvalidArgument(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = AppConfig::load_file("/nonexistent/tern.toml");
        assert!(matches!(result, Err(CommonError::InvalidArgument(_))));
    }

    #[test]
    fn test_invalid_enum_value() {
        let result = Figment::from(Toml::string(DEFAULT_CONFIG))
            .merge(Toml::string("[regression]\nsolver = \"lbfgs\""))
            .extract::<AppConfig>();
        assert!(result.is_err());
    }
}
