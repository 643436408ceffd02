//! 性能基准测试模块
//!
//! 单个术语字段的修改会写回整张术语表，这里测量大术语表下编辑、导出、导入的开销

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

use crate::model::settings::{Settings, Term};
use crate::vm::context::PluginContext;
use crate::vm::settings_vm::SettingsViewModel;

/// 性能测试结果
#[derive(Debug)]
pub struct PerformanceResult {
    pub operation: String,
    pub duration_ms: u128,
    pub success: bool,
    pub details: String,
}

impl PerformanceResult {
    pub fn new(operation: &str, duration_ms: u128, success: bool, details: &str) -> Self {
        Self {
            operation: operation.to_string(),
            duration_ms,
            success,
            details: details.to_string(),
        }
    }
}

/// 只计数、不落盘的宿主
#[derive(Debug, Default)]
struct CountingContext {
    saves: Cell<usize>,
    saved_terms: Cell<usize>,
}

impl PluginContext for CountingContext {
    fn save_setting_storage(&self, settings: &Settings) {
        self.saves.set(self.saves.get() + 1);
        self.saved_terms.set(settings.terms.len());
    }
}

/// 生成指定条数的中英术语表
pub fn generate_glossary(count: usize) -> Vec<Term> {
    (0..count)
        .map(|i| Term::new(format!("术语_{}", i), format!("term_{}", i)))
        .collect()
}

fn view_model_with(glossary: Vec<Term>) -> (Rc<CountingContext>, SettingsViewModel) {
    let ctx = Rc::new(CountingContext::default());
    let mut settings = Settings::default();
    settings.terms = glossary;
    let vm = SettingsViewModel::new(ctx.clone(), Rc::new(RefCell::new(settings)));
    (ctx, vm)
}

/// 测试单个术语字段修改的写回开销
pub fn benchmark_term_edit(count: usize) -> PerformanceResult {
    let (ctx, vm) = view_model_with(generate_glossary(count));
    let Some(last) = vm.terms().get(count.saturating_sub(1)) else {
        return PerformanceResult::new("术语编辑", 0, false, "术语表为空");
    };

    let start = Instant::now();
    last.set_target_text("edited");
    let duration = start.elapsed();

    let success = ctx.saves.get() == 1 && ctx.saved_terms.get() == count;
    PerformanceResult::new(
        &format!("术语编辑({})", count),
        duration.as_millis(),
        success,
        &format!("保存 {} 次，写回 {} 条", ctx.saves.get(), ctx.saved_terms.get()),
    )
}

/// 测试导出与导入开销
pub fn benchmark_export_import(count: usize, dir: &Path) -> Vec<PerformanceResult> {
    let mut results = Vec::new();
    let path = dir.join(format!("glossary_{}.json", count));
    let (_ctx, vm) = view_model_with(generate_glossary(count));

    let start = Instant::now();
    let export_result = vm.export_terms_to(&path);
    let duration = start.elapsed();
    results.push(match export_result {
        Ok(()) => PerformanceResult::new(
            &format!("术语导出({})", count),
            duration.as_millis(),
            true,
            &format!("导出了 {} 条术语", count),
        ),
        Err(e) => PerformanceResult::new(
            &format!("术语导出({})", count),
            duration.as_millis(),
            false,
            &format!("导出失败: {}", e),
        ),
    });

    let (ctx, target) = view_model_with(Vec::new());
    let start = Instant::now();
    let import_result = target.import_terms_from(&path);
    let duration = start.elapsed();
    results.push(match import_result {
        Ok(imported) => PerformanceResult::new(
            &format!("术语导入({})", count),
            duration.as_millis(),
            imported == count && ctx.saves.get() == 1,
            &format!("导入了 {} 条术语，保存 {} 次", imported, ctx.saves.get()),
        ),
        Err(e) => PerformanceResult::new(
            &format!("术语导入({})", count),
            duration.as_millis(),
            false,
            &format!("导入失败: {}", e),
        ),
    });

    results
}

/// 运行综合性能测试
pub fn run_performance_suite(dir: &Path) -> Vec<PerformanceResult> {
    let mut results = Vec::new();

    // 小型、中型、大型术语表
    for count in [10, 1_000, 10_000] {
        tracing::info!("测试规模：{} 条术语", count);
        results.push(benchmark_term_edit(count));
        results.extend(benchmark_export_import(count, dir));
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generate_glossary() {
        let glossary = generate_glossary(3);
        assert_eq!(glossary.len(), 3);
        assert_eq!(glossary[2], Term::new("术语_2", "term_2"));
    }

    #[test]
    fn test_term_edit_writes_back_full_list() {
        let result = benchmark_term_edit(500);
        assert!(result.success, "{}", result.details);
        assert!(result.duration_ms < 1000); // 应该在1秒内完成
    }

    #[test]
    fn test_empty_glossary_edit_reports_failure() {
        assert!(!benchmark_term_edit(0).success);
    }

    #[test]
    fn test_export_import_benchmarks() {
        let dir = tempdir().unwrap();
        let results = benchmark_export_import(2_000, dir.path());

        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(result.success, "{}: {}", result.operation, result.details);
            assert!(result.duration_ms < 2000);
        }
    }
}
