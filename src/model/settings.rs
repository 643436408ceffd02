//! Settings：插件持久化设置记录与术语条目

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 默认选中的模型
pub const DEFAULT_MODEL: &str = "qwen-mt-turbo";

/// 默认可选模型列表
pub const DEFAULT_MODELS: [&str; 2] = ["qwen-mt-turbo", "qwen-mt-plus"];

/// 宿主持久化的设置记录（仅存数据，无行为）
///
/// 字段名按 camelCase 写出；读取时兼容宿主写入的 PascalCase 字段名，缺失字段回落到默认值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    #[serde(alias = "ApiKey")]
    pub api_key: String,
    #[serde(alias = "Model")]
    pub model: String,
    #[serde(alias = "Models")]
    pub models: Vec<String>,
    #[serde(alias = "IsEnableTerms")]
    pub is_enable_terms: bool,
    #[serde(alias = "IsEnableDomains")]
    pub is_enable_domains: bool,
    /// 术语列表
    #[serde(alias = "Terms")]
    pub terms: Vec<Term>,
    /// 领域提示
    #[serde(alias = "Domains")]
    pub domains: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            is_enable_terms: false,
            is_enable_domains: false,
            terms: Vec::new(),
            domains: String::new(),
        }
    }
}

/// 术语条目的纯数据形式：持久化与导入导出共用
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Term {
    #[serde(alias = "SourceText")]
    pub source_text: String,
    #[serde(alias = "TargetText")]
    pub target_text: String,
}

impl Term {
    pub fn new(source_text: impl Into<String>, target_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            target_text: target_text.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
}
