//! 宿主协作者：保存设置、记录错误、选择文件

use std::path::{Path, PathBuf};

use crate::model::settings::{Settings, SettingsError};
use crate::vm::bridge::*;

/// 宿主插件上下文
pub trait PluginContext {
    /// 持久化当前设置快照；失败由宿主自行处理
    fn save_setting_storage(&self, settings: &Settings);

    fn log_error(&self, error: &SettingsError, message: &str) {
        tracing::error!("{} ({:?})", message, error);
    }
}

/// 文件选择对话框；返回 None 表示用户取消
pub trait FilePicker {
    fn pick_save_path(&self, default_file_name: &str) -> Option<PathBuf>;
    fn pick_open_path(&self) -> Option<PathBuf>;
}

/// 用户输入的文件名没有扩展名时补上 .json
pub fn with_json_extension(path: &Path) -> PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().is_none() {
        path.set_extension(JSON_EXTENSION);
    }
    path
}

/// 基于 rfd 的原生文件对话框
#[derive(Debug, Default, Clone, Copy)]
pub struct RfdFilePicker;

impl FilePicker for RfdFilePicker {
    fn pick_save_path(&self, default_file_name: &str) -> Option<PathBuf> {
        use rfd::FileDialog;

        let file_path = FileDialog::new()
            .add_filter(JSON_FILTER_NAME, &[JSON_EXTENSION])
            .add_filter(ALL_FILES_FILTER_NAME, &["*"])
            .set_title(EXPORT_DIALOG_TITLE)
            .set_file_name(default_file_name)
            .save_file()
            .map(|path| with_json_extension(&path));

        match file_path {
            Some(path) => {
                tracing::info!("用户选择了导出路径: {}", path.display());
                Some(path)
            }
            None => {
                tracing::info!("用户取消了导出");
                None
            }
        }
    }

    fn pick_open_path(&self) -> Option<PathBuf> {
        use rfd::FileDialog;

        let file_path = FileDialog::new()
            .add_filter(JSON_FILTER_NAME, &[JSON_EXTENSION])
            .add_filter(ALL_FILES_FILTER_NAME, &["*"])
            .set_title(IMPORT_DIALOG_TITLE)
            .pick_file();

        match file_path {
            Some(path) => {
                tracing::info!("用户选择了导入文件: {}", path.display());
                Some(path)
            }
            None => {
                tracing::info!("用户取消了导入");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_path_gets_json_extension() {
        assert_eq!(
            with_json_extension(Path::new("/tmp/qwen_terms")),
            PathBuf::from("/tmp/qwen_terms.json")
        );
        assert_eq!(
            with_json_extension(Path::new("/tmp/terms.json")),
            PathBuf::from("/tmp/terms.json")
        );
        assert_eq!(
            with_json_extension(Path::new("/tmp/terms.txt")),
            PathBuf::from("/tmp/terms.txt"),
            "已有扩展名应保留"
        );
    }
}
