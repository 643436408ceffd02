//! IO helper: 术语表与设置文件的 JSON 读写

use std::{fs, fs::File, io::BufReader, io::Write, path::Path};

use serde::Serialize;

use crate::model::settings::{Settings, SettingsError, Term};

/// 读取术语表文件；内容为 JSON `null` 时返回 None
pub fn read_terms_file(p: &Path) -> Result<Option<Vec<Term>>, SettingsError> {
    let text = fs::read_to_string(p)?;
    // 兼容带 BOM 的 UTF-8 文件
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    let terms: Option<Vec<Term>> = serde_json::from_str(text)?;
    Ok(terms)
}

/// 将术语表写为缩进的 JSON 数组（非ASCII字符原样写出）
pub fn write_terms_file(p: &Path, terms: &[Term]) -> Result<(), SettingsError> {
    write_json_atomic(p, terms)
}

/// 读取设置文件；文件不存在时返回默认设置
pub fn read_settings_file(p: &Path) -> Result<Settings, SettingsError> {
    if !p.exists() {
        return Ok(Settings::default());
    }
    let f = File::open(p)?;
    let rdr = BufReader::new(f);
    let settings: Settings = serde_json::from_reader(rdr)?;
    Ok(settings)
}

/// 将设置保存到文件（格式化输出）
pub fn write_settings_file(p: &Path, settings: &Settings) -> Result<(), SettingsError> {
    if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_json_atomic(p, settings)
}

// 先写临时文件再重命名，失败时目标路径不会留下半截文件
fn write_json_atomic<T: Serialize + ?Sized>(p: &Path, value: &T) -> Result<(), SettingsError> {
    let json = serde_json::to_string_pretty(value)?;
    let mut tmp_name = p.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = Path::new(&tmp_name);

    let result = File::create(tmp_path).and_then(|mut f| {
        f.write_all(json.as_bytes())?;
        f.flush()
    });
    if let Err(e) = result.and_then(|_| fs::rename(tmp_path, p)) {
        let _ = fs::remove_file(tmp_path);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_terms_file_literal_unicode_and_indent() {
        let dir = tempdir().expect("创建临时目录失败");
        let path = dir.path().join("qwen_terms.json");
        let terms = vec![Term::new("通义千问", "Qwen"), Term::new("", "")];

        write_terms_file(&path, &terms).expect("写入术语表失败");
        let text = fs::read_to_string(&path).unwrap();

        assert!(text.contains("\"sourceText\": \"通义千问\""), "中文应原样写出且带缩进: {}", text);
        assert!(text.starts_with("[\n"), "应为缩进的数组");
        assert!(!dir.path().join("qwen_terms.json.tmp").exists(), "临时文件应被重命名");
        assert_eq!(read_terms_file(&path).unwrap(), Some(terms));
    }

    #[test]
    fn test_read_terms_accepts_pascal_case_and_missing_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        fs::write(
            &path,
            r#"[{"SourceText": "模型", "TargetText": "model"}, {"sourceText": "仅源文", "extra": 1}]"#,
        )
        .unwrap();

        let terms = read_terms_file(&path).unwrap().unwrap();
        assert_eq!(terms, vec![Term::new("模型", "model"), Term::new("仅源文", "")]);
    }

    #[test]
    fn test_read_terms_with_bom() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bom.json");
        fs::write(&path, "\u{feff}[{\"sourceText\": \"词\", \"targetText\": \"word\"}]").unwrap();

        assert_eq!(read_terms_file(&path).unwrap(), Some(vec![Term::new("词", "word")]));
    }

    #[test]
    fn test_read_terms_null_and_malformed() {
        let dir = tempdir().unwrap();
        let null_path = dir.path().join("null.json");
        let bad_path = dir.path().join("bad.json");
        fs::write(&null_path, "null").unwrap();
        fs::write(&bad_path, r#"[{"sourceText": "缺少括号""#).unwrap();

        assert_eq!(read_terms_file(&null_path).unwrap(), None);
        assert!(matches!(read_terms_file(&bad_path), Err(SettingsError::Parse(_))));
        assert!(matches!(
            read_terms_file(&dir.path().join("missing.json")),
            Err(SettingsError::Io(_))
        ));
    }

    #[test]
    fn test_write_into_missing_directory_fails_cleanly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("terms.json");

        let result = write_terms_file(&path, &[Term::new("a", "b")]);
        assert!(matches!(result, Err(SettingsError::Io(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_settings_file_defaults_and_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        assert_eq!(read_settings_file(&path).unwrap(), Settings::default());

        let mut settings = Settings::default();
        settings.api_key = "sk-test".into();
        settings.terms.push(Term::new("术语", "term"));
        write_settings_file(&path, &settings).unwrap();

        assert_eq!(read_settings_file(&path).unwrap(), settings);
    }
}
