//! SettingsViewModel：设置面板的编辑镜像
//!
//! 构造时从 Settings 复制全部字段；此后任何标量字段、模型列表、术语列表或单个术语字段的变化，
//! 都会写回共享的 Settings 并请求宿主持久化。反方向（Settings → 面板）只在构造时发生。

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

use crate::model::observable::{ListChange, Notifier, ObservableList, ReadOnlyList, SubscriptionId};
use crate::model::settings::{Settings, SettingsError, Term};
use crate::model::term::{TermItem, TermRef};
use crate::utils::fs::{read_terms_file, write_terms_file};
use crate::vm::bridge::*;
use crate::vm::context::{FilePicker, PluginContext, RfdFilePicker};

/// 面板上的标量字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    ApiKey,
    Model,
    IsEnableTerms,
    IsEnableDomains,
    Domains,
}

#[derive(Debug, Default)]
struct Fields {
    api_key: String,
    model: String,
    is_enable_terms: bool,
    is_enable_domains: bool,
    domains: String,
}

/// 监听者通过 Weak 引用访问的共享状态
struct Shared {
    context: Rc<dyn PluginContext>,
    settings: Rc<RefCell<Settings>>,
    fields: RefCell<Fields>,
    property_changed: Notifier<SettingsField>,
    models: Rc<ObservableList<String>>,
    terms: Rc<ObservableList<TermRef>>,
    term_listeners: RefCell<Vec<(TermRef, SubscriptionId)>>,
    /// 模型复合编辑进行中
    editing_models: Cell<bool>,
    /// 复合编辑期间被推迟的持久化请求
    save_deferred: Cell<bool>,
}

impl Shared {
    fn request_save(&self) {
        if self.editing_models.get() {
            self.save_deferred.set(true);
            return;
        }
        self.context.save_setting_storage(&self.settings.borrow());
    }

    fn on_property_changed(&self, field: SettingsField) {
        {
            let fields = self.fields.borrow();
            let mut settings = self.settings.borrow_mut();
            match field {
                SettingsField::ApiKey => settings.api_key = fields.api_key.clone(),
                SettingsField::Model => settings.model = fields.model.clone(),
                SettingsField::IsEnableTerms => settings.is_enable_terms = fields.is_enable_terms,
                SettingsField::IsEnableDomains => {
                    settings.is_enable_domains = fields.is_enable_domains
                }
                SettingsField::Domains => settings.domains = fields.domains.clone(),
            }
        }
        self.request_save();
    }

    fn on_models_changed(&self) {
        self.settings.borrow_mut().models = self.models.snapshot();
        self.request_save();
    }

    fn on_terms_changed(self: &Rc<Self>, change: &ListChange<TermRef>) {
        for item in change.removed() {
            self.detach_term(item);
        }
        for item in change.added() {
            self.attach_term(item);
        }
        self.sync_terms();
        self.request_save();
    }

    // 单个字段变化也写回整张术语表
    fn on_term_changed(&self) {
        self.sync_terms();
        self.request_save();
    }

    fn sync_terms(&self) {
        let terms: Vec<Term> = self.terms.with(|items| items.iter().map(|t| t.to_term()).collect());
        self.settings.borrow_mut().terms = terms;
    }

    fn attach_term(self: &Rc<Self>, item: &TermRef) {
        let weak = Rc::downgrade(self);
        let id = item.subscribe(move |_| {
            if let Some(shared) = weak.upgrade() {
                shared.on_term_changed();
            }
        });
        self.term_listeners.borrow_mut().push((Rc::clone(item), id));
    }

    fn detach_term(&self, item: &TermRef) {
        let mut listeners = self.term_listeners.borrow_mut();
        if let Some(pos) = listeners.iter().position(|(t, _)| Rc::ptr_eq(t, item)) {
            let (term, id) = listeners.remove(pos);
            term.unsubscribe(id);
        }
    }
}

pub struct SettingsViewModel {
    shared: Rc<Shared>,
    file_picker: Rc<dyn FilePicker>,
    property_subscription: SubscriptionId,
    models_subscription: SubscriptionId,
    terms_subscription: SubscriptionId,
}

impl SettingsViewModel {
    /// 从 Settings 复制字段并挂接全部监听
    pub fn new(context: Rc<dyn PluginContext>, settings: Rc<RefCell<Settings>>) -> Self {
        let (fields, models, terms) = {
            let s = settings.borrow();
            let fields = Fields {
                api_key: s.api_key.clone(),
                model: s.model.clone(),
                is_enable_terms: s.is_enable_terms,
                is_enable_domains: s.is_enable_domains,
                domains: s.domains.clone(),
            };
            let terms: Vec<TermRef> = s.terms.iter().cloned().map(TermItem::new).collect();
            (fields, s.models.clone(), terms)
        };

        let shared = Rc::new(Shared {
            context,
            settings,
            fields: RefCell::new(fields),
            property_changed: Notifier::new(),
            models: Rc::new(ObservableList::new(models)),
            terms: Rc::new(ObservableList::new(terms)),
            term_listeners: RefCell::new(Vec::new()),
            editing_models: Cell::new(false),
            save_deferred: Cell::new(false),
        });

        let property_subscription = {
            let weak = Rc::downgrade(&shared);
            shared.property_changed.subscribe(move |field| {
                if let Some(shared) = weak.upgrade() {
                    shared.on_property_changed(*field);
                }
            })
        };
        let models_subscription = {
            let weak = Rc::downgrade(&shared);
            shared.models.subscribe(move |_| {
                if let Some(shared) = weak.upgrade() {
                    shared.on_models_changed();
                }
            })
        };
        let terms_subscription = {
            let weak = Rc::downgrade(&shared);
            shared.terms.subscribe(move |change| {
                if let Some(shared) = weak.upgrade() {
                    shared.on_terms_changed(change);
                }
            })
        };
        for item in shared.terms.snapshot() {
            shared.attach_term(&item);
        }

        tracing::info!(
            "设置面板已初始化: {} 个模型, {} 条术语",
            shared.models.len(),
            shared.terms.len()
        );

        Self {
            shared,
            file_picker: Rc::new(RfdFilePicker),
            property_subscription,
            models_subscription,
            terms_subscription,
        }
    }

    /// 替换默认的原生文件对话框
    pub fn with_file_picker(mut self, picker: Rc<dyn FilePicker>) -> Self {
        self.file_picker = picker;
        self
    }

    /// 共享的设置记录
    pub fn settings(&self) -> Rc<RefCell<Settings>> {
        Rc::clone(&self.shared.settings)
    }

    /// 标量字段变化通知（界面刷新用）
    pub fn subscribe_property_changed<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&SettingsField) + 'static,
    {
        self.shared.property_changed.subscribe(listener)
    }

    pub fn unsubscribe_property_changed(&self, id: SubscriptionId) -> bool {
        self.shared.property_changed.unsubscribe(id)
    }

    // === 标量字段 ===

    pub fn api_key(&self) -> String {
        self.shared.fields.borrow().api_key.clone()
    }

    pub fn set_api_key(&self, value: impl Into<String>) {
        let value = value.into();
        self.set_field(SettingsField::ApiKey, |f| replace_if_changed(&mut f.api_key, value));
    }

    pub fn model(&self) -> String {
        self.shared.fields.borrow().model.clone()
    }

    pub fn set_model(&self, value: impl Into<String>) {
        let value = value.into();
        self.set_field(SettingsField::Model, |f| replace_if_changed(&mut f.model, value));
    }

    pub fn is_enable_terms(&self) -> bool {
        self.shared.fields.borrow().is_enable_terms
    }

    pub fn set_is_enable_terms(&self, value: bool) {
        self.set_field(SettingsField::IsEnableTerms, |f| {
            replace_if_changed(&mut f.is_enable_terms, value)
        });
    }

    pub fn is_enable_domains(&self) -> bool {
        self.shared.fields.borrow().is_enable_domains
    }

    pub fn set_is_enable_domains(&self, value: bool) {
        self.set_field(SettingsField::IsEnableDomains, |f| {
            replace_if_changed(&mut f.is_enable_domains, value)
        });
    }

    /// 领域提示
    pub fn domains(&self) -> String {
        self.shared.fields.borrow().domains.clone()
    }

    pub fn set_domains(&self, value: impl Into<String>) {
        let value = value.into();
        self.set_field(SettingsField::Domains, |f| replace_if_changed(&mut f.domains, value));
    }

    fn set_field(&self, field: SettingsField, apply: impl FnOnce(&mut Fields) -> bool) {
        let changed = apply(&mut self.shared.fields.borrow_mut());
        if changed {
            self.shared.property_changed.notify(&field);
        }
    }

    // === 模型列表 ===

    /// 可绑定的模型列表
    pub fn models(&self) -> Rc<ObservableList<String>> {
        Rc::clone(&self.shared.models)
    }

    pub fn is_editing_models(&self) -> bool {
        self.shared.editing_models.get()
    }

    /// 追加模型并选中它；空白名、重名或复合编辑进行中时忽略
    pub fn add_model(&self, name: &str) {
        if self.is_editing_models() || name.trim().is_empty() {
            return;
        }
        if self.shared.models.contains(&name.to_string()) {
            return;
        }

        self.edit_models(|vm| {
            vm.shared.models.push(name.to_string());
            vm.set_model(name);
        });
        tracing::info!("已添加模型: {}", name);
    }

    /// 删除模型；若删除的是当前模型，改选第一个剩余模型，没有剩余则置空
    pub fn delete_model(&self, name: &str) {
        if self.is_editing_models() {
            return;
        }
        if self.shared.models.position(|m| m == name).is_none() {
            return;
        }

        // 先按值删除再改选，监听者在改选时修改列表也不会删错
        self.edit_models(|vm| {
            let was_selected = vm.model() == name;
            if let Some(index) = vm.shared.models.position(|m| m == name) {
                vm.shared.models.remove_at(index);
            }
            if was_selected {
                let next = vm
                    .shared
                    .models
                    .with(|models| models.iter().find(|m| *m != name).cloned())
                    .unwrap_or_default();
                vm.set_model(next);
            }
        });
        tracing::info!("已删除模型: {}", name);
    }

    /// 模型列表与当前模型的复合编辑：期间的持久化请求推迟，结束后至多保存一次
    fn edit_models(&self, edit: impl FnOnce(&Self)) {
        let shared = &self.shared;
        if shared.editing_models.replace(true) {
            return;
        }
        shared.save_deferred.set(false);
        edit(self);
        shared.editing_models.set(false);
        if shared.save_deferred.replace(false) {
            shared.request_save();
        }
    }

    // === 术语列表 ===

    /// 术语列表的只读同步视图（界面展示用）
    pub fn terms(&self) -> ReadOnlyList<TermRef> {
        ReadOnlyList::new(Rc::clone(&self.shared.terms))
    }

    /// 追加一条空术语，返回新条目
    pub fn terms_add(&self) -> TermRef {
        let item = TermItem::empty();
        self.shared.terms.push(Rc::clone(&item));
        item
    }

    /// 按实例删除选中的术语，合并为一次变更
    pub fn terms_delete(&self, selected: &[TermRef]) {
        if selected.is_empty() {
            return;
        }
        let removed = self
            .shared
            .terms
            .remove_where(|t| selected.iter().any(|s| Rc::ptr_eq(s, t)));
        if !removed.is_empty() {
            tracing::info!("已删除 {} 条术语", removed.len());
        }
    }

    pub fn terms_clear(&self) {
        if self.shared.terms.is_empty() {
            return;
        }
        self.shared.terms.clear();
        tracing::info!("术语列表已清空");
    }

    /// 弹出保存对话框并导出术语；失败只记录日志
    pub fn terms_export(&self) {
        let Some(path) = self.file_picker.pick_save_path(DEFAULT_TERMS_FILE_NAME) else {
            return;
        };
        if let Err(e) = self.export_terms_to(&path) {
            self.report_error(EXPORT_ERROR_PREFIX, &e);
        }
    }

    /// 弹出打开对话框并导入术语；失败只记录日志，原列表保持不变
    pub fn terms_import(&self) {
        let Some(path) = self.file_picker.pick_open_path() else {
            return;
        };
        if let Err(e) = self.import_terms_from(&path) {
            self.report_error(IMPORT_ERROR_PREFIX, &e);
        }
    }

    /// 将当前术语表写到指定路径
    pub fn export_terms_to(&self, path: &Path) -> Result<(), SettingsError> {
        let terms: Vec<Term> = self
            .shared
            .terms
            .with(|items| items.iter().map(|t| t.to_term()).collect());
        write_terms_file(path, &terms)?;
        tracing::info!("已导出 {} 条术语到: {}", terms.len(), path.display());
        Ok(())
    }

    /// 从指定路径读取术语并整体替换当前列表，返回导入条数；文件内容为 null 时不做修改
    pub fn import_terms_from(&self, path: &Path) -> Result<usize, SettingsError> {
        let Some(terms) = read_terms_file(path)? else {
            tracing::warn!("术语文件内容为空: {}", path.display());
            return Ok(0);
        };
        let count = terms.len();
        let items: Vec<TermRef> = terms.into_iter().map(TermItem::new).collect();
        self.shared.terms.replace_all(items);
        tracing::info!("已从 {} 导入 {} 条术语", path.display(), count);
        Ok(count)
    }

    fn report_error(&self, prefix: &str, error: &SettingsError) {
        let message = format!("{}{}", prefix, error);
        self.shared.context.log_error(error, &message);
    }

    /// 释放面板：摘除全部监听
    pub fn dispose(self) {}

    fn detach_listeners(&self) {
        let shared = &self.shared;
        shared.property_changed.unsubscribe(self.property_subscription);
        shared.models.unsubscribe(self.models_subscription);
        shared.terms.unsubscribe(self.terms_subscription);
        for (item, id) in shared.term_listeners.borrow_mut().drain(..) {
            item.unsubscribe(id);
        }
    }
}

impl Drop for SettingsViewModel {
    fn drop(&mut self) {
        self.detach_listeners();
        tracing::info!("设置面板已释放");
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
