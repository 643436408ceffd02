//! QwenMt 翻译插件设置库
//!
//! 设置面板编辑镜像（SettingsViewModel）↔ 宿主持久化设置（Settings）↔ 术语表文件
//! 遵循MVVM架构模式：model 只存数据与观察者原语，vm 负责同步与持久化请求

pub mod model;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use model::observable::{ListChange, Notifier, ObservableList, ReadOnlyList, SubscriptionId};
pub use model::settings::{Settings, SettingsError, Term};
pub use model::term::{TermField, TermItem, TermRef};
pub use utils::storage::JsonFileStorage;
pub use vm::context::{FilePicker, PluginContext, RfdFilePicker};
pub use vm::settings_vm::{SettingsField, SettingsViewModel};
