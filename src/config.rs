use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::types::{ColumnMatch, EventAggregation, NumericAggregation, PlotDisplay, TimestampUnit};

/// 应用配置管理模块
/// 集中管理所有配置项，默认值即原始实验脚本中的硬编码值

/// 主配置结构
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Bucket widths in milliseconds, one full pass per entry
    pub granularities_ms: Vec<u64>,
    pub timestamp_unit: TimestampUnit,
    pub paths: PathsConfig,
    pub sources: Vec<SourceConfig>,
    pub plot: PlotConfig,
    pub statistics: StatisticsConfig,
}

/// 路径配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub dataset_dir: PathBuf,
    pub result_dir: PathBuf,
    pub result_file: String,
    pub summary_file: String,
    pub figures_dir: PathBuf,
}

/// A source file added to the dataset, in the order it is listed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SourceConfig {
    Numerical {
        file: String,
        timestamp_col: String,
        value_cols: Vec<String>,
        aggregation: NumericAggregation,
        prefix: String,
    },
    Event {
        file: String,
        start_col: String,
        end_col: String,
        value_col: String,
        aggregation: EventAggregation,
        prefix: String,
    },
}

/// 绘图配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub enabled: bool,
    pub width: u32,
    pub height: u32,
    pub point_size: u32,
    pub boxplot_columns: Vec<String>,
    /// Series colours, cycled per panel
    pub palette: Vec<[u8; 3]>,
    pub panels: Vec<PanelConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelConfig {
    pub prefix: String,
    pub matching: ColumnMatch,
    pub display: PlotDisplay,
}

/// 统计输出配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    pub describe: bool,
    pub latex_comparison: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            granularities_ms: vec![15000, 100],
            timestamp_unit: TimestampUnit::Nanoseconds,
            paths: PathsConfig::default(),
            sources: default_sources(),
            plot: PlotConfig::default(),
            statistics: StatisticsConfig::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dataset_dir: PathBuf::from("./datasets/own/"),
            result_dir: PathBuf::from("./intermediate_datafiles_own/"),
            result_file: "chapter2_result_own.csv".to_string(),
            summary_file: "run_summary.json".to_string(),
            figures_dir: PathBuf::from("./figures/crowdsignals_ch2_own/"),
        }
    }
}

fn default_sources() -> Vec<SourceConfig> {
    let xyz = || vec!["x".to_string(), "y".to_string(), "z".to_string()];
    let numerical = |file: &str, prefix: &str| SourceConfig::Numerical {
        file: file.to_string(),
        timestamp_col: "timestamps".to_string(),
        value_cols: xyz(),
        aggregation: NumericAggregation::Avg,
        prefix: prefix.to_string(),
    };

    // 顺序决定网格：第一个数据源的时间范围定义整张表
    vec![
        numerical("accelerometer.csv", "acc_phone_"),
        numerical("gyroscope.csv", "gyr_phone_"),
        SourceConfig::Event {
            file: "labelsOwn.csv".to_string(),
            start_col: "label_start".to_string(),
            end_col: "label_end".to_string(),
            value_col: "label".to_string(),
            aggregation: EventAggregation::Binary,
            prefix: "label".to_string(),
        },
        numerical("magnetometer.csv", "mag_phone_"),
    ]
}

impl Default for PlotConfig {
    fn default() -> Self {
        let panel = |prefix: &str, display: PlotDisplay| PanelConfig {
            prefix: prefix.to_string(),
            matching: ColumnMatch::Like,
            display,
        };

        Self {
            enabled: true,
            width: 1200,
            height: 900,
            boxplot_columns: vec![
                "acc_phone_x".to_string(),
                "acc_phone_y".to_string(),
                "acc_phone_z".to_string(),
            ],
            panels: vec![
                panel("acc_", PlotDisplay::Line),
                panel("gyr_", PlotDisplay::Line),
                panel("mag_", PlotDisplay::Line),
                panel("label", PlotDisplay::Points),
            ],
            palette: vec![
                [31, 119, 180],  // 蓝
                [44, 160, 44],   // 绿
                [214, 39, 40],   // 红
                [23, 190, 207],  // 青
                [148, 103, 189], // 紫
                [188, 189, 34],  // 黄
                [0, 0, 0],       // 黑
            ],
            point_size: 2,
        }
    }
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            describe: true,
            latex_comparison: true,
        }
    }
}

impl SourceConfig {
    pub fn file(&self) -> &str {
        match self {
            SourceConfig::Numerical { file, .. } | SourceConfig::Event { file, .. } => file,
        }
    }
}

impl AppConfig {
    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(ConfigError::IoError)?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(ConfigError::ParseError)?;

        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(ConfigError::SerializeError)?;

        std::fs::write(path, content)
            .map_err(ConfigError::IoError)?;

        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.granularities_ms.is_empty() {
            return Err(ConfigError::ValidationError("At least one granularity is required".to_string()));
        }

        if self.granularities_ms.iter().any(|&g| g == 0) {
            return Err(ConfigError::ValidationError("Granularities must be positive".to_string()));
        }

        if self.sources.is_empty() {
            return Err(ConfigError::ValidationError("At least one source file is required".to_string()));
        }

        for source in &self.sources {
            if let SourceConfig::Numerical { file, value_cols, .. } = source {
                if value_cols.is_empty() {
                    return Err(ConfigError::ValidationError(format!("Source {} lists no value columns", file)));
                }
            }
        }

        if self.paths.result_file.trim().is_empty() {
            return Err(ConfigError::ValidationError("Result file name must not be empty".to_string()));
        }

        if self.plot.enabled {
            if self.plot.width == 0 || self.plot.height == 0 {
                return Err(ConfigError::ValidationError("Plot dimensions must be positive".to_string()));
            }
            if self.plot.palette.is_empty() {
                return Err(ConfigError::ValidationError("Plot palette must not be empty".to_string()));
            }
        }

        Ok(())
    }

    /// 获取结果文件路径
    pub fn get_result_path(&self) -> PathBuf {
        self.paths.result_dir.join(&self.paths.result_file)
    }

    pub fn get_summary_path(&self) -> PathBuf {
        self.paths.result_dir.join(&self.paths.summary_file)
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(toml::de::Error),
    #[error("Serialize error: {0}")]
    SerializeError(toml::ser::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// 配置管理器
pub struct ConfigManager {
    config: AppConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// 创建配置管理器
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            config_path: None,
        }
    }

    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let config = AppConfig::load_from_file(&path)?;
        Ok(Self {
            config,
            config_path: Some(path.as_ref().to_path_buf()),
        })
    }

    /// 获取当前配置
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// 获取可变配置
    pub fn get_config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    pub fn config_path(&self) -> Option<&std::path::Path> {
        self.config_path.as_deref()
    }

    /// 保存配置到指定文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), ConfigError> {
        self.config.save_to_file(path)
    }

    pub fn into_config(self) -> AppConfig {
        self.config
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_recording_setup() {
        let config = AppConfig::default();
        assert_eq!(config.granularities_ms, vec![15000, 100]);
        assert_eq!(config.sources.len(), 4);
        assert_eq!(config.sources[2].file(), "labelsOwn.csv");
        assert_eq!(config.get_result_path(), PathBuf::from("./intermediate_datafiles_own/chapter2_result_own.csv"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn round_trips_through_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensegrid.toml");

        let mut config = AppConfig::default();
        config.granularities_ms = vec![250];
        config.timestamp_unit = TimestampUnit::Milliseconds;
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            granularities_ms = [60000, 250]
            timestamp_unit = "ms"

            [plot]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.granularities_ms, vec![60000, 250]);
        assert_eq!(config.timestamp_unit, TimestampUnit::Milliseconds);
        assert!(!config.plot.enabled);
        assert_eq!(config.plot.panels.len(), 4);
        assert_eq!(config.sources, AppConfig::default().sources);
    }

    #[test]
    fn parses_tagged_sources() {
        let config: AppConfig = toml::from_str(
            r#"
            [[sources]]
            kind = "event"
            file = "labels.csv"
            start_col = "start"
            end_col = "end"
            value_col = "activity"
            aggregation = "sum"
            prefix = "act_"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.sources,
            vec![SourceConfig::Event {
                file: "labels.csv".to_string(),
                start_col: "start".to_string(),
                end_col: "end".to_string(),
                value_col: "activity".to_string(),
                aggregation: EventAggregation::Sum,
                prefix: "act_".to_string(),
            }]
        );
    }

    #[test]
    fn rejects_zero_granularity() {
        let mut config = AppConfig::default();
        config.granularities_ms = vec![100, 0];
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn manager_keeps_the_loaded_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        AppConfig::default().save_to_file(&path).unwrap();

        let manager = ConfigManager::load_from_file(&path).unwrap();
        assert_eq!(manager.config_path(), Some(path.as_path()));
        assert_eq!(manager.get_config(), &AppConfig::default());
    }
}
