//! 观察者原语：显式订阅/退订，变更完成并释放借用之后才通知监听者

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// 订阅句柄，用于退订
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<E> = Rc<dyn Fn(&E)>;

/// 监听者登记表
pub struct Notifier<E> {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(SubscriptionId, Listener<E>)>>,
}

impl<E> Default for Notifier<E> {
    fn default() -> Self {
        Self {
            next_id: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
        }
    }
}

impl<E> fmt::Debug for Notifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl<E> Notifier<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&E) + 'static,
    {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// 退订；句柄不存在时返回 false
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(current, _)| *current != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// 按订阅顺序通知；先取快照，监听者内部可以继续订阅或退订
    pub fn notify(&self, event: &E) {
        let snapshot: Vec<Listener<E>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }
}

/// 列表结构变更（成员的增删替换）
#[derive(Debug, Clone, PartialEq)]
pub enum ListChange<T> {
    Added { index: usize, items: Vec<T> },
    Removed { items: Vec<T> },
    Replaced { index: usize, old: T, new: T },
    Reset { old: Vec<T>, new: Vec<T> },
}

impl<T> ListChange<T> {
    /// 本次变更新加入列表的元素
    pub fn added(&self) -> &[T] {
        match self {
            ListChange::Added { items, .. } => items,
            ListChange::Removed { .. } => &[],
            ListChange::Replaced { new, .. } => std::slice::from_ref(new),
            ListChange::Reset { new, .. } => new,
        }
    }

    /// 本次变更移出列表的元素
    pub fn removed(&self) -> &[T] {
        match self {
            ListChange::Added { .. } => &[],
            ListChange::Removed { items } => items,
            ListChange::Replaced { old, .. } => std::slice::from_ref(old),
            ListChange::Reset { old, .. } => old,
        }
    }
}

/// 可观察列表：每个公开的变更方法至多产生一次结构变更通知
#[derive(Debug)]
pub struct ObservableList<T> {
    items: RefCell<Vec<T>>,
    changed: Notifier<ListChange<T>>,
}

impl<T> Default for ObservableList<T> {
    fn default() -> Self {
        Self {
            items: RefCell::new(Vec::new()),
            changed: Notifier::new(),
        }
    }
}

impl<T: Clone> ObservableList<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: RefCell::new(items),
            changed: Notifier::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.items.borrow().get(index).cloned()
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.items.borrow().clone()
    }

    /// 只读访问当前元素；闭包内不得修改本列表
    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.items.borrow())
    }

    pub fn position(&self, predicate: impl FnMut(&T) -> bool) -> Option<usize> {
        self.items.borrow().iter().position(predicate)
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ListChange<T>) + 'static,
    {
        self.changed.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.changed.unsubscribe(id)
    }

    pub fn listener_count(&self) -> usize {
        self.changed.listener_count()
    }

    pub fn push(&self, item: T) {
        let index = {
            let mut items = self.items.borrow_mut();
            items.push(item.clone());
            items.len() - 1
        };
        self.changed.notify(&ListChange::Added {
            index,
            items: vec![item],
        });
    }

    /// 批量追加，作为一次变更通知；空输入不通知
    pub fn extend(&self, new_items: Vec<T>) {
        if new_items.is_empty() {
            return;
        }
        let index = {
            let mut items = self.items.borrow_mut();
            let index = items.len();
            items.extend(new_items.iter().cloned());
            index
        };
        self.changed.notify(&ListChange::Added {
            index,
            items: new_items,
        });
    }

    pub fn remove_at(&self, index: usize) -> Option<T> {
        let removed = {
            let mut items = self.items.borrow_mut();
            if index >= items.len() {
                return None;
            }
            items.remove(index)
        };
        self.changed.notify(&ListChange::Removed {
            items: vec![removed.clone()],
        });
        Some(removed)
    }

    /// 移除所有满足条件的元素，作为一次变更通知；无命中时不通知
    pub fn remove_where(&self, mut predicate: impl FnMut(&T) -> bool) -> Vec<T> {
        let removed = {
            let mut items = self.items.borrow_mut();
            let mut removed = Vec::new();
            let mut kept = Vec::with_capacity(items.len());
            for item in items.drain(..) {
                if predicate(&item) {
                    removed.push(item);
                } else {
                    kept.push(item);
                }
            }
            *items = kept;
            removed
        };
        if !removed.is_empty() {
            self.changed.notify(&ListChange::Removed {
                items: removed.clone(),
            });
        }
        removed
    }

    pub fn set(&self, index: usize, item: T) -> Option<T> {
        let old = {
            let mut items = self.items.borrow_mut();
            let slot = items.get_mut(index)?;
            std::mem::replace(slot, item.clone())
        };
        self.changed.notify(&ListChange::Replaced {
            index,
            old: old.clone(),
            new: item,
        });
        Some(old)
    }

    /// 清空列表；已为空时不通知
    pub fn clear(&self) {
        let old = std::mem::take(&mut *self.items.borrow_mut());
        if old.is_empty() {
            return;
        }
        self.changed.notify(&ListChange::Reset {
            old,
            new: Vec::new(),
        });
    }

    /// 整体替换列表内容，作为一次变更通知
    pub fn replace_all(&self, new_items: Vec<T>) {
        let old = std::mem::replace(&mut *self.items.borrow_mut(), new_items.clone());
        self.changed.notify(&ListChange::Reset {
            old,
            new: new_items,
        });
    }
}

impl<T: Clone + PartialEq> ObservableList<T> {
    pub fn contains(&self, item: &T) -> bool {
        self.items.borrow().contains(item)
    }
}

/// 列表只读视图：供界面展示与刷新订阅，不暴露变更方法
#[derive(Debug)]
pub struct ReadOnlyList<T> {
    inner: Rc<ObservableList<T>>,
}

impl<T> Clone for ReadOnlyList<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone> ReadOnlyList<T> {
    pub fn new(inner: Rc<ObservableList<T>>) -> Self {
        Self { inner }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.get(index)
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.inner.snapshot()
    }

    pub fn with<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        self.inner.with(f)
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ListChange<T>) + 'static,
    {
        self.inner.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorded<T: Clone + 'static>(list: &ObservableList<T>) -> Rc<RefCell<Vec<ListChange<T>>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        list.subscribe(move |change: &ListChange<T>| sink.borrow_mut().push(change.clone()));
        events
    }

    #[test]
    fn test_notifier_unsubscribe() {
        let notifier: Notifier<u32> = Notifier::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let id = notifier.subscribe(move |v| counter.set(counter.get() + *v));

        notifier.notify(&2);
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id), "重复退订应返回 false");
        notifier.notify(&5);

        assert_eq!(hits.get(), 2, "退订后不应再收到通知");
        assert_eq!(notifier.listener_count(), 0);
    }

    #[test]
    fn test_listener_sees_post_mutation_state() {
        let list = Rc::new(ObservableList::new(vec![1, 2]));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (weak, sink) = (Rc::downgrade(&list), Rc::clone(&seen));
        list.subscribe(move |_| {
            if let Some(list) = weak.upgrade() {
                sink.borrow_mut().push(list.snapshot());
            }
        });

        list.push(3);
        list.remove_at(0);

        assert_eq!(*seen.borrow(), vec![vec![1, 2, 3], vec![2, 3]]);
    }

    #[test]
    fn test_remove_where_is_single_event() {
        let list = ObservableList::new(vec!["a", "b", "c", "d"]);
        let events = recorded(&list);

        let removed = list.remove_where(|s| *s == "b" || *s == "d");

        assert_eq!(removed, vec!["b", "d"]);
        assert_eq!(list.snapshot(), vec!["a", "c"]);
        assert_eq!(events.borrow().len(), 1, "批量删除应合并为一次通知");
        assert!(list.remove_where(|s| *s == "zzz").is_empty());
        assert_eq!(events.borrow().len(), 1, "无命中时不应通知");
    }

    #[test]
    fn test_clear_and_replace_all() {
        let list = ObservableList::new(vec![1, 2, 3]);
        let events = recorded(&list);

        list.clear();
        list.clear();
        list.replace_all(vec![7, 8]);

        let events = events.borrow();
        assert_eq!(events.len(), 2, "空列表再次清空不应通知");
        assert_eq!(events[0], ListChange::Reset { old: vec![1, 2, 3], new: vec![] });
        assert_eq!(events[1].added(), &[7, 8]);
        assert_eq!(list.snapshot(), vec![7, 8]);
    }

    #[test]
    fn test_set_reports_old_and_new() {
        let list = ObservableList::new(vec!["x".to_string()]);
        let events = recorded(&list);

        assert_eq!(list.set(0, "y".to_string()), Some("x".to_string()));
        assert_eq!(list.set(5, "z".to_string()), None);

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].removed(), &["x".to_string()]);
        assert_eq!(events[0].added(), &["y".to_string()]);
    }

    #[test]
    fn test_read_only_view_tracks_source() {
        let list = Rc::new(ObservableList::new(vec![1]));
        let view = ReadOnlyList::new(Rc::clone(&list));

        list.extend(vec![2, 3]);
        list.extend(Vec::new());

        assert_eq!(view.len(), 3);
        assert_eq!(view.get(2), Some(3));
        assert_eq!(view.with(|items| items.iter().sum::<i32>()), 6);
    }
}
