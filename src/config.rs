use crate::runner::RunOptions;
use crate::{ApiflowError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// `apiflow.toml` 的内容
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiflowConfig {
    pub run: RunSection,

    /// 运行开始前写入值存储的初始值
    pub variables: BTreeMap<String, String>,
}

/// `[run]` 段
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    pub concurrency: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub report_unschedulable: Option<bool>,
}

impl ApiflowConfig {
    /// 在默认值之上应用配置文件中的设置
    pub fn run_options(&self) -> RunOptions {
        let mut options = RunOptions::default();
        if let Some(concurrency) = self.run.concurrency {
            options.concurrency = Some(concurrency);
        }
        if let Some(timeout_ms) = self.run.timeout_ms {
            options.timeout = Duration::from_millis(timeout_ms);
        }
        if let Some(report) = self.run.report_unschedulable {
            options.report_unschedulable = report;
        }
        options
    }
}

/// 配置文件加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 配置文件名
    const CONFIG_FILE: &'static str = "apiflow.toml";

    /// 从指定路径加载配置文件
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<ApiflowConfig> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ApiflowError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: ApiflowConfig = toml::from_str(&content)?;
        if config.run.timeout_ms == Some(0) {
            return Err(ApiflowError::ConfigError(
                "run.timeout_ms must be positive".to_string(),
            ));
        }
        Ok(config)
    }

    /// 查找并加载配置文件
    /// 查找顺序：
    /// 1. 当前目录
    /// 2. 父目录递归查找
    /// 3. 用户配置目录 ~/.config/apiflow/
    ///
    /// 找到但无法解析的文件返回错误。
    pub fn find_and_load() -> Result<Option<ApiflowConfig>> {
        let found = std::env::current_dir()
            .ok()
            .and_then(|dir| Self::find_from(&dir))
            .or_else(Self::user_config_path);

        match found {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading config file");
                Self::load_from_path(&path).map(Some)
            }
            None => Ok(None),
        }
    }

    /// 从 `start` 开始向上查找配置文件
    pub fn find_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(Self::CONFIG_FILE))
            .find(|path| path.is_file())
    }

    fn user_config_path() -> Option<PathBuf> {
        let home = dirs::home_dir()?;
        let config_path = home.join(".config").join("apiflow").join(Self::CONFIG_FILE);
        config_path.is_file().then_some(config_path)
    }

    /// 解析 CLI 变量参数 "key=value"
    pub fn parse_cli_var(s: &str) -> Option<(String, String)> {
        s.split_once('=')
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .filter(|(k, _)| !k.is_empty())
    }
}
