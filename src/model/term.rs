//! TermItem：可观察的术语条目，身份按实例（Rc 指针）而非内容区分

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::model::observable::{Notifier, SubscriptionId};
use crate::model::settings::Term;

/// 术语条目中发生变化的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermField {
    SourceText,
    TargetText,
}

/// 共享的术语条目句柄
pub type TermRef = Rc<TermItem>;

pub struct TermItem {
    data: RefCell<Term>,
    changed: Notifier<TermField>,
}

impl fmt::Debug for TermItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.borrow();
        f.debug_struct("TermItem")
            .field("source_text", &data.source_text)
            .field("target_text", &data.target_text)
            .finish()
    }
}

impl TermItem {
    pub fn new(term: Term) -> TermRef {
        Rc::new(Self {
            data: RefCell::new(term),
            changed: Notifier::new(),
        })
    }

    /// 源文与译文都为空的新条目
    pub fn empty() -> TermRef {
        Self::new(Term::default())
    }

    pub fn source_text(&self) -> String {
        self.data.borrow().source_text.clone()
    }

    pub fn target_text(&self) -> String {
        self.data.borrow().target_text.clone()
    }

    pub fn set_source_text(&self, value: impl Into<String>) {
        self.update(TermField::SourceText, value.into());
    }

    pub fn set_target_text(&self, value: impl Into<String>) {
        self.update(TermField::TargetText, value.into());
    }

    pub fn to_term(&self) -> Term {
        self.data.borrow().clone()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&TermField) + 'static,
    {
        self.changed.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.changed.unsubscribe(id)
    }

    pub fn listener_count(&self) -> usize {
        self.changed.listener_count()
    }

    // 值未变化时不通知
    fn update(&self, field: TermField, value: String) {
        let changed = {
            let mut data = self.data.borrow_mut();
            let slot = match field {
                TermField::SourceText => &mut data.source_text,
                TermField::TargetText => &mut data.target_text,
            };
            if *slot == value {
                false
            } else {
                *slot = value;
                true
            }
        };
        if changed {
            self.changed.notify(&field);
        }
    }
}
