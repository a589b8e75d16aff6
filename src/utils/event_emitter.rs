//! 事件分发器
//! 单线程监听器注册表，按注册顺序分发事件，支持按ID注销

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// 监听器ID（同一分发器内唯一）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

type Listener<T> = Rc<dyn Fn(&T)>;

/// 事件分发器
pub struct EventEmitter<T> {
    listeners: RefCell<Vec<(ListenerId, Listener<T>)>>,
    next_id: Cell<u64>,
}

impl<T> EventEmitter<T> {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    /// 注册监听器，返回用于注销的ID
    pub fn on<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T) + 'static,
    {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// 注销监听器，返回是否存在
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// 分发事件，返回被调用的监听器数量
    ///
    /// 调用前先复制监听器列表，监听器内部可以安全地注册/注销监听器。
    pub fn emit(&self, event: &T) -> usize {
        let snapshot: Vec<Listener<T>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();

        for listener in &snapshot {
            listener(event);
        }
        snapshot.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// 移除全部监听器
    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }
}

impl<T> Default for EventEmitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventEmitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
