use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub verbose: bool,
    /// 交互界面占用终端时，日志写到这里
    pub log_file: Option<PathBuf>,
    /// 探测后剔除的管理器
    pub disabled_managers: Vec<String>,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    /// 单个管理器的搜索超时，0 表示不限
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose: false,
            log_file: None,
            disabled_managers: Vec::new(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            timeout_secs: 20,
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        home_dir().join(".config/lazyinstaller/config.toml")
    }

    pub fn default_log_path() -> PathBuf {
        home_dir().join(".cache/lazyinstaller/lazyinstaller.log")
    }

    /// 日志文件：显式配置优先；交互界面下没有配置时用默认路径，避免写进终端
    pub fn log_path(&self, interactive: bool) -> Option<PathBuf> {
        match &self.log_file {
            Some(path) => Some(path.clone()),
            None if interactive => Some(Self::default_log_path()),
            None => None,
        }
    }

    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// 显式指定的路径必须存在
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.search.debounce_ms)
    }

    pub fn search_timeout(&self) -> Option<Duration> {
        match self.search.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".to_string()))
}
