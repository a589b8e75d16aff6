//! 等待就绪的文档队列
//! 每个挂起项持有一个取消令牌以及就绪、卸载两个监听；
//! 就绪、文档卸载、mod 销毁三者任一发生都会作废令牌并移除两个监听，
//! 迟到的宿主事件必然是空操作

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::host::{LoadEvent, WindowId, WindowRef};
use crate::utils::ListenerId;

/// 取消令牌（克隆共享同一状态）
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// 单个挂起的就绪监听
struct PendingLoad {
    ticket: u64,
    window: WindowRef,
    event: LoadEvent,
    ready: Option<ListenerId>,
    unload: Option<ListenerId>,
    token: CancellationToken,
}

impl PendingLoad {
    fn detach_listeners(&self) {
        if let Some(listener) = self.ready {
            self.window.remove_load_listener(self.event, listener);
        }
        if let Some(listener) = self.unload {
            self.window.remove_load_listener(LoadEvent::Unload, listener);
        }
    }
}

/// 挂起队列
#[derive(Default)]
pub struct PendingQueue {
    entries: RefCell<Vec<PendingLoad>>,
    next_ticket: Cell<u64>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记挂起项，返回票据与令牌；监听注册后需调用 `attach_listeners`
    pub fn enqueue(&self, window: WindowRef, event: LoadEvent) -> (u64, CancellationToken) {
        let ticket = self.next_ticket.get() + 1;
        self.next_ticket.set(ticket);
        let token = CancellationToken::new();
        self.entries.borrow_mut().push(PendingLoad {
            ticket,
            window,
            event,
            ready: None,
            unload: None,
            token: token.clone(),
        });
        (ticket, token)
    }

    pub fn attach_listeners(&self, ticket: u64, ready: ListenerId, unload: ListenerId) {
        if let Some(entry) = self
            .entries
            .borrow_mut()
            .iter_mut()
            .find(|e| e.ticket == ticket)
        {
            entry.ready = Some(ready);
            entry.unload = Some(unload);
        }
    }

    fn take(&self, ticket: u64) -> Option<PendingLoad> {
        let mut entries = self.entries.borrow_mut();
        let index = entries.iter().position(|e| e.ticket == ticket)?;
        Some(entries.remove(index))
    }

    /// 就绪事件触发：出队并移除监听，返回对应窗口
    pub fn complete(&self, ticket: u64) -> Option<WindowRef> {
        let entry = self.take(ticket)?;
        entry.detach_listeners();
        Some(entry.window)
    }

    /// 文档在就绪前卸载：作废令牌、移除监听并出队
    pub fn abandon(&self, ticket: u64) -> bool {
        let Some(entry) = self.take(ticket) else {
            return false;
        };
        entry.token.cancel();
        entry.detach_listeners();
        true
    }

    /// 作废全部令牌并移除全部监听，返回取消数量
    pub fn cancel_all(&self) -> usize {
        let entries = std::mem::take(&mut *self.entries.borrow_mut());
        for entry in &entries {
            entry.token.cancel();
            entry.detach_listeners();
        }
        entries.len()
    }

    pub fn contains_window(&self, window: WindowId) -> bool {
        self.entries.borrow().iter().any(|e| e.window.id() == window)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
