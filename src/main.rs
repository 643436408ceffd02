//! 程序入口：初始化日志、加载设置文件，通过设置面板执行一条命令并持久化

use std::{cell::RefCell, path::PathBuf, rc::Rc};

use anyhow::{anyhow, bail, Context, Result};
use tracing_subscriber::fmt::SubscriberBuilder;

use qwenmt_settings::utils::storage::{resolve_settings_path, SETTINGS_PATH_ENV};
use qwenmt_settings::{JsonFileStorage, Settings, SettingsViewModel};

const USAGE: &str = "用法: qwenmt-settings [--settings <文件>] <命令> [参数]

命令:
  show                        显示当前设置
  add-model <名称>            添加并选中模型
  delete-model <名称>         删除模型
  set-api-key <密钥>          设置 API Key
  set-model <名称>            选择当前模型
  set-domains <文本>          设置领域提示
  enable-terms <true|false>   启用/停用术语
  enable-domains <true|false> 启用/停用领域提示
  add-term <源文> <译文>      追加一条术语
  clear-terms                 清空术语
  export-terms [文件]         导出术语（省略文件时弹出对话框）
  import-terms [文件]         导入术语（省略文件时弹出对话框）";

#[derive(Debug, PartialEq)]
enum Command {
    Show,
    AddModel(String),
    DeleteModel(String),
    SetApiKey(String),
    SetModel(String),
    SetDomains(String),
    EnableTerms(bool),
    EnableDomains(bool),
    AddTerm(String, String),
    ClearTerms,
    ExportTerms(Option<PathBuf>),
    ImportTerms(Option<PathBuf>),
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Ok(true),
        "false" | "0" | "off" | "no" => Ok(false),
        other => bail!("无法识别的布尔值: {}", other),
    }
}

/// 解析命令行参数（不含程序名）
fn parse_args(args: Vec<String>) -> Result<(Option<PathBuf>, Command)> {
    let mut settings_path = None;
    let mut rest = Vec::new();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--settings" {
            let path = iter.next().ok_or_else(|| anyhow!("--settings 需要文件路径"))?;
            settings_path = Some(PathBuf::from(path));
        } else {
            rest.push(arg);
        }
    }

    let mut rest = rest.into_iter();
    let name = rest.next().ok_or_else(|| anyhow!("缺少命令\n\n{}", USAGE))?;
    let operands: Vec<String> = rest.collect();
    let required = |index: usize, what: &str| {
        operands
            .get(index)
            .cloned()
            .ok_or_else(|| anyhow!("{} 缺少参数: {}", name, what))
    };
    let optional_path = || operands.first().map(PathBuf::from);

    let command = match name.as_str() {
        "show" => Command::Show,
        "add-model" => Command::AddModel(required(0, "名称")?),
        "delete-model" => Command::DeleteModel(required(0, "名称")?),
        "set-api-key" => Command::SetApiKey(required(0, "密钥")?),
        "set-model" => Command::SetModel(required(0, "名称")?),
        "set-domains" => Command::SetDomains(required(0, "文本")?),
        "enable-terms" => Command::EnableTerms(parse_bool(&required(0, "true|false")?)?),
        "enable-domains" => Command::EnableDomains(parse_bool(&required(0, "true|false")?)?),
        "add-term" => {
            let source = required(0, "源文")?;
            let target = required(1, "译文")?;
            Command::AddTerm(source, target)
        }
        "clear-terms" => Command::ClearTerms,
        "export-terms" => Command::ExportTerms(optional_path()),
        "import-terms" => Command::ImportTerms(optional_path()),
        other => bail!("未知命令: {}\n\n{}", other, USAGE),
    };
    Ok((settings_path, command))
}

// 过短的密钥整体遮盖
const MASK_PREFIX_MIN_LEN: usize = 8;

fn mask_api_key(key: &str) -> String {
    if key.is_empty() {
        return String::new();
    }
    if key.chars().count() < MASK_PREFIX_MIN_LEN {
        return "***".to_string();
    }
    let prefix: String = key.chars().take(3).collect();
    format!("{}***", prefix)
}

fn show(settings: &Settings) -> Result<()> {
    let mut shown = settings.clone();
    shown.api_key = mask_api_key(&settings.api_key);
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}

fn run(vm: &SettingsViewModel, command: Command) -> Result<()> {
    match command {
        Command::Show => show(&vm.settings().borrow())?,
        Command::AddModel(name) => vm.add_model(&name),
        Command::DeleteModel(name) => vm.delete_model(&name),
        Command::SetApiKey(key) => vm.set_api_key(key),
        Command::SetModel(name) => vm.set_model(name),
        Command::SetDomains(text) => vm.set_domains(text),
        Command::EnableTerms(on) => vm.set_is_enable_terms(on),
        Command::EnableDomains(on) => vm.set_is_enable_domains(on),
        Command::AddTerm(source, target) => {
            let term = vm.terms_add();
            term.set_source_text(source);
            term.set_target_text(target);
        }
        Command::ClearTerms => vm.terms_clear(),
        Command::ExportTerms(Some(path)) => vm
            .export_terms_to(&path)
            .with_context(|| format!("导出术语到 {} 失败", path.display()))?,
        Command::ExportTerms(None) => vm.terms_export(),
        Command::ImportTerms(Some(path)) => {
            vm.import_terms_from(&path)
                .with_context(|| format!("从 {} 导入术语失败", path.display()))?;
        }
        Command::ImportTerms(None) => vm.terms_import(),
    }
    Ok(())
}

fn main() -> Result<()> {
    // 初始化日志输出
    let _ = SubscriberBuilder::default()
        .with_max_level(tracing::Level::INFO)
        .try_init();

    let (cli_path, command) = parse_args(std::env::args().skip(1).collect())?;
    let path = resolve_settings_path(cli_path, std::env::var(SETTINGS_PATH_ENV).ok());

    let storage = Rc::new(JsonFileStorage::new(path));
    let settings = storage
        .load()
        .with_context(|| format!("读取设置文件 {} 失败", storage.path().display()))?;

    let vm = SettingsViewModel::new(storage.clone(), Rc::new(RefCell::new(settings)));
    run(&vm, command)?;
    vm.dispose();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qwenmt_settings::Term;
    use qwenmt_settings::PluginContext;
    use tempfile::tempdir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_args(args(&["show"])).unwrap(), (None, Command::Show));
        assert_eq!(
            parse_args(args(&["--settings", "a.json", "add-model", "qwen-mt-max"])).unwrap(),
            (Some(PathBuf::from("a.json")), Command::AddModel("qwen-mt-max".into()))
        );
        assert_eq!(
            parse_args(args(&["enable-terms", "on"])).unwrap().1,
            Command::EnableTerms(true)
        );
        assert_eq!(
            parse_args(args(&["add-term", "通义", "Tongyi"])).unwrap().1,
            Command::AddTerm("通义".into(), "Tongyi".into())
        );
        assert_eq!(parse_args(args(&["export-terms"])).unwrap().1, Command::ExportTerms(None));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["frobnicate"])).is_err());
        assert!(parse_args(args(&["add-model"])).is_err());
        assert!(parse_args(args(&["enable-domains", "maybe"])).is_err());
        assert!(parse_args(args(&["show", "--settings"])).is_err());
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key(""), "");
        assert_eq!(mask_api_key("sk-abcdef"), "sk-***");
        assert_eq!(mask_api_key("abc"), "***", "短密钥不应泄露任何字符");
        assert_eq!(mask_api_key("sk-1234"), "***");
    }

    #[test]
    fn test_run_persists_through_storage() {
        let dir = tempdir().unwrap();
        let storage = Rc::new(JsonFileStorage::new(dir.path().join("settings.json")));
        let vm = SettingsViewModel::new(storage.clone(), Rc::new(RefCell::new(Settings::default())));

        run(&vm, Command::AddModel("qwen-mt-max".into())).unwrap();
        run(&vm, Command::AddTerm("千问".into(), "Qwen".into())).unwrap();
        vm.dispose();

        let saved = storage.load().unwrap();
        assert_eq!(saved.model, "qwen-mt-max");
        assert_eq!(saved.terms, vec![Term::new("千问", "Qwen")]);

        // 直接保存也走同一文件
        storage.save_setting_storage(&Settings::default());
        assert_eq!(storage.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_run_import_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let storage = Rc::new(JsonFileStorage::new(dir.path().join("settings.json")));
        let vm = SettingsViewModel::new(storage, Rc::new(RefCell::new(Settings::default())));

        let result = run(&vm, Command::ImportTerms(Some(dir.path().join("missing.json"))));
        assert!(result.is_err());
    }
}
