//! VM桥接层：连接设置面板与宿主/文件对话框的公共常量
//!
//! 这里只提供常量，避免命令与对话框实现中出现魔法值

// === 常量定义（消除魔法值） ===
pub const DEFAULT_TERMS_FILE_NAME: &str = "qwen_terms.json";
pub const JSON_EXTENSION: &str = "json";
pub const JSON_FILTER_NAME: &str = "JSON文件";
pub const ALL_FILES_FILTER_NAME: &str = "所有文件";
pub const EXPORT_DIALOG_TITLE: &str = "导出术语表";
pub const IMPORT_DIALOG_TITLE: &str = "导入术语表";
pub const EXPORT_ERROR_PREFIX: &str = "导出术语失败: ";
pub const IMPORT_ERROR_PREFIX: &str = "导入术语失败: ";
