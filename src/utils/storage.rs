//! JsonFileStorage：独立运行时的宿主替身，把设置保存为 JSON 文件

use std::path::{Path, PathBuf};

use crate::model::settings::{Settings, SettingsError};
use crate::utils::fs::{read_settings_file, write_settings_file};
use crate::vm::context::PluginContext;

/// 默认设置文件名（位于当前工作目录）
pub const DEFAULT_SETTINGS_FILE: &str = "qwenmt_settings.json";

/// 指定设置文件路径的环境变量
pub const SETTINGS_PATH_ENV: &str = "QWENMT_SETTINGS";

/// 解析设置文件路径：命令行参数 > 环境变量 > 默认文件名
pub fn resolve_settings_path(cli_path: Option<PathBuf>, env_path: Option<String>) -> PathBuf {
    cli_path
        .or_else(|| env_path.filter(|p| !p.trim().is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
}

#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 加载设置；文件不存在时返回默认设置
    pub fn load(&self) -> Result<Settings, SettingsError> {
        let settings = read_settings_file(&self.path)?;
        tracing::info!("设置已加载: {}", self.path.display());
        Ok(settings)
    }
}

impl PluginContext for JsonFileStorage {
    fn save_setting_storage(&self, settings: &Settings) {
        match write_settings_file(&self.path, settings) {
            Ok(()) => tracing::info!("设置已保存: {}", self.path.display()),
            Err(e) => tracing::error!("设置保存失败: {}: {}", self.path.display(), e),
        }
    }
}
