//! 测试用内存宿主
//! 实现全部协作接口，并记录调用以便断言

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use serde_json::Value;

use super::*;
use crate::error::{PageModError, PageModResult};
use crate::utils::ListenerId;

static NEXT_WINDOW_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) struct FakeWindow {
    id: WindowId,
    url: RefCell<String>,
    ready: Cell<ReadyState>,
    top: bool,
    private: bool,
    frames: RefCell<Vec<Rc<FakeWindow>>>,
    injected: Cell<bool>,
    listeners: RefCell<Vec<(LoadEvent, ListenerId, LoadListener)>>,
    next_listener: Cell<u64>,
}

impl FakeWindow {
    fn build(url: &str, top: bool, private: bool) -> Rc<Self> {
        Rc::new(Self {
            id: NEXT_WINDOW_ID.fetch_add(1, Ordering::Relaxed),
            url: RefCell::new(url.to_string()),
            ready: Cell::new(ReadyState::Loading),
            top,
            private,
            frames: RefCell::new(Vec::new()),
            injected: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(1),
        })
    }

    pub fn top(url: &str) -> Rc<Self> {
        Self::build(url, true, false)
    }

    pub fn frame(url: &str) -> Rc<Self> {
        Self::build(url, false, false)
    }

    pub fn private_top(url: &str) -> Rc<Self> {
        Self::build(url, true, true)
    }

    pub fn add_frame(&self, frame: Rc<FakeWindow>) {
        self.frames.borrow_mut().push(frame);
    }

    pub fn as_window(self: &Rc<Self>) -> WindowRef {
        self.clone()
    }

    /// 推进就绪状态并触发对应的加载事件（事件来源为自身）
    pub fn advance(&self, state: ReadyState) {
        let previous = self.ready.replace(state);
        if previous < ReadyState::Interactive && state >= ReadyState::Interactive {
            self.dispatch(LoadEvent::DomContentLoaded, self.id);
        }
        if previous < ReadyState::Complete && state == ReadyState::Complete {
            self.dispatch(LoadEvent::Load, self.id);
        }
    }

    /// 关闭文档：分发 unload 事件（事件来源为自身）
    pub fn close(&self) {
        self.dispatch(LoadEvent::Unload, self.id);
    }

    /// 在本窗口上分发事件，target 可以是其他窗口（模拟冒泡）
    pub fn dispatch(&self, event: LoadEvent, target: WindowId) {
        let snapshot: Vec<LoadListener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(e, _, _)| *e == event)
            .map(|(_, _, l)| l.clone())
            .collect();
        let info = LoadEventInfo { event, target };
        for listener in snapshot {
            listener(&info);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl ContentWindow for FakeWindow {
    fn id(&self) -> WindowId {
        self.id
    }

    fn url(&self) -> String {
        self.url.borrow().clone()
    }

    fn ready_state(&self) -> ReadyState {
        self.ready.get()
    }

    fn is_top(&self) -> bool {
        self.top
    }

    fn is_private(&self) -> bool {
        self.private
    }

    fn frames(&self) -> Vec<WindowRef> {
        let mut all = Vec::new();
        for frame in self.frames.borrow().iter() {
            all.push(frame.as_window());
            all.extend(frame.frames());
        }
        all
    }

    fn is_injected(&self) -> bool {
        self.injected.get()
    }

    fn mark_injected(&self) {
        self.injected.set(true);
    }

    fn add_load_listener(&self, event: LoadEvent, listener: LoadListener) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((event, id, listener));
        id
    }

    fn remove_load_listener(&self, event: LoadEvent, id: ListenerId) {
        self.listeners
            .borrow_mut()
            .retain(|(e, lid, _)| !(*e == event && *lid == id));
    }
}

#[derive(Default)]
pub(crate) struct FakeTabs {
    tabs: RefCell<Vec<Rc<FakeWindow>>>,
    known: RefCell<HashSet<WindowId>>,
}

impl FakeTabs {
    /// 打开标签页，连同已挂载的子框架一起登记
    pub fn open(&self, window: &Rc<FakeWindow>) {
        self.tabs.borrow_mut().push(window.clone());
        let mut known = self.known.borrow_mut();
        known.insert(window.id);
        for frame in window.frames() {
            known.insert(frame.id());
        }
    }
}

impl TabProvider for FakeTabs {
    fn all_tabs(&self) -> Vec<Tab> {
        self.tabs
            .borrow()
            .iter()
            .map(|window| Tab {
                url: window.url(),
                content_window: window.as_window(),
            })
            .collect()
    }

    fn has_tab_for(&self, window: &dyn ContentWindow) -> bool {
        self.known.borrow().contains(&window.id())
    }
}

#[derive(Default)]
pub(crate) struct FakeBus {
    handlers: RefCell<Vec<(ListenerId, DocumentHandler)>>,
    next: Cell<u64>,
}

impl FakeBus {
    pub fn create_document(&self, window: &Rc<FakeWindow>) {
        self.emit(&CreatedDocument {
            url: window.url(),
            window: Some(window.as_window()),
        });
    }

    pub fn emit(&self, document: &CreatedDocument) {
        let snapshot: Vec<DocumentHandler> =
            self.handlers.borrow().iter().map(|(_, h)| h.clone()).collect();
        for handler in snapshot {
            handler(document);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

impl DocumentEventBus for FakeBus {
    fn subscribe(&self, handler: DocumentHandler) -> ListenerId {
        let id = ListenerId(self.next.get() + 1);
        self.next.set(id.0);
        self.handlers.borrow_mut().push((id, handler));
        id
    }

    fn unsubscribe(&self, id: ListenerId) {
        self.handlers.borrow_mut().retain(|(lid, _)| *lid != id);
    }
}

pub(crate) struct FakeWorker {
    window_id: WindowId,
    pub options: Option<Value>,
    pub content_script: Vec<String>,
    on_error: ErrorCallback,
    detach: RefCell<Option<Box<dyn FnOnce()>>>,
    destroyed: Cell<u32>,
}

impl FakeWorker {
    /// 模拟文档卸载
    pub fn detach(&self) {
        let callback = self.detach.borrow_mut().take();
        if let Some(callback) = callback {
            callback();
        }
    }

    /// 模拟脚本抛出异常
    pub fn throw(&self, message: &str) {
        (self.on_error)(PageModError::InjectionRuntime(message.to_string()));
    }

    pub fn destroy_count(&self) -> u32 {
        self.destroyed.get()
    }
}

impl Worker for FakeWorker {
    fn window_id(&self) -> WindowId {
        self.window_id
    }

    fn once_detach(&self, callback: Box<dyn FnOnce()>) {
        *self.detach.borrow_mut() = Some(callback);
    }

    fn destroy(&self) {
        self.destroyed.set(self.destroyed.get() + 1);
    }
}

#[derive(Default)]
pub(crate) struct FakeWorkerFactory {
    created: RefCell<Vec<Rc<FakeWorker>>>,
    pub fail: Cell<bool>,
}

impl FakeWorkerFactory {
    pub fn created(&self) -> Vec<Rc<FakeWorker>> {
        self.created.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.created.borrow().len()
    }
}

impl WorkerFactory for FakeWorkerFactory {
    fn create(&self, options: WorkerOptions) -> PageModResult<WorkerRef> {
        if self.fail.get() {
            return Err(PageModError::InjectionRuntime("沙箱创建失败".to_string()));
        }
        let worker = Rc::new(FakeWorker {
            window_id: options.window.id(),
            options: options.content_script_options,
            content_script: options.content_script,
            on_error: options.on_error,
            detach: RefCell::new(None),
            destroyed: Cell::new(0),
        });
        self.created.borrow_mut().push(worker.clone());
        Ok(worker)
    }
}

#[derive(Default)]
pub(crate) struct FakeStyles {
    registered: RefCell<Vec<(String, SheetType)>>,
    pub registrations: Cell<u32>,
    pub unregistrations: Cell<u32>,
    pub reject: Cell<bool>,
}

impl FakeStyles {
    pub fn registered(&self) -> Vec<String> {
        self.registered.borrow().iter().map(|(uri, _)| uri.clone()).collect()
    }
}

impl StyleSheetService for FakeStyles {
    fn load_and_register(&self, uri: &str, sheet_type: SheetType) -> PageModResult<()> {
        if self.reject.get() {
            return Err(PageModError::StyleRegistration(uri.to_string()));
        }
        self.registrations.set(self.registrations.get() + 1);
        self.registered.borrow_mut().push((uri.to_string(), sheet_type));
        Ok(())
    }

    fn is_registered(&self, uri: &str, sheet_type: SheetType) -> bool {
        self.registered
            .borrow()
            .iter()
            .any(|(u, t)| u == uri && *t == sheet_type)
    }

    fn unregister(&self, uri: &str, sheet_type: SheetType) -> PageModResult<()> {
        self.unregistrations.set(self.unregistrations.get() + 1);
        self.registered
            .borrow_mut()
            .retain(|(u, t)| !(u == uri && *t == sheet_type));
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeResources {
    files: RefCell<HashMap<String, String>>,
}

impl FakeResources {
    pub fn insert(&self, uri: &str, content: &str) {
        self.files
            .borrow_mut()
            .insert(uri.to_string(), content.to_string());
    }
}

impl ResourceReader for FakeResources {
    fn read(&self, uri: &str) -> PageModResult<String> {
        self.files
            .borrow()
            .get(uri)
            .cloned()
            .ok_or_else(|| PageModError::Resource {
                uri: uri.to_string(),
                reason: "文件不存在".to_string(),
            })
    }
}

/// 内存宿主
#[derive(Default)]
pub(crate) struct FakeHost {
    pub tabs: Rc<FakeTabs>,
    pub bus: Rc<FakeBus>,
    pub workers: Rc<FakeWorkerFactory>,
    pub styles: Rc<FakeStyles>,
    pub resources: Rc<FakeResources>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn services(&self) -> HostServices {
        HostServices {
            tabs: self.tabs.clone(),
            documents: self.bus.clone(),
            workers: self.workers.clone(),
            styles: self.styles.clone(),
            resources: self.resources.clone(),
        }
    }

    /// 在新标签页中打开窗口并触发文档创建事件
    pub fn open(&self, window: &Rc<FakeWindow>) {
        self.tabs.open(window);
        self.bus.create_document(window);
        for frame in window.frames.borrow().iter() {
            self.created_recursive(frame);
        }
    }

    fn created_recursive(&self, window: &Rc<FakeWindow>) {
        self.bus.create_document(window);
        for frame in window.frames.borrow().iter() {
            self.created_recursive(frame);
        }
    }
}
