//! PageMod 核心
//! 单个注入策略：规则集合 + 排除规则 + 注入目标 + 注入时机 + 脚本/样式载荷
//! 负责逐文档判定是否注入、何时注入，以及 Worker 的创建与销毁

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, error, warn};

use super::pending::PendingQueue;
use super::style::StyleInjector;
use crate::compiler::MatchPattern;
use crate::config::{AttachTo, ContentScriptWhen, ModConfig, ModOptions};
use crate::engine::{EngineContext, ModId};
use crate::error::{PageModError, PageModResult};
use crate::host::{
    ErrorCallback, HostServices, LoadEvent, LoadEventInfo, LoadListener, ReadyState, WindowId,
    WindowRef, WorkerOptions, WorkerRef,
};
use crate::rule::{RuleEvent, RuleSet};
use crate::utils::{EventEmitter, ListenerId};

/// PageMod 句柄（克隆共享同一实例）
#[derive(Clone)]
pub struct PageMod {
    inner: Rc<ModInner>,
}

struct ModInner {
    id: ModId,
    ctx: Weak<EngineContext>,
    host: HostServices,
    config: ModConfig,
    include: RuleSet,
    exclude: Vec<MatchPattern>,
    style: RefCell<Option<Rc<StyleInjector>>>,
    workers: RefCell<Vec<WorkerRef>>,
    pending: PendingQueue,
    attach_events: EventEmitter<WorkerRef>,
    error_events: EventEmitter<PageModError>,
    destroyed: Cell<bool>,
}

impl PageMod {
    /// 构造并注册 mod
    ///
    /// 任一步骤失败都会回滚已订阅的规则，不会留下半注册的 mod。
    pub(crate) fn new(ctx: &Rc<EngineContext>, options: ModOptions) -> PageModResult<Self> {
        if ctx.is_unloaded() {
            return Err(PageModError::EngineUnloaded);
        }

        let config = ModConfig::from_options(&options)?;
        let exclude = config
            .exclude
            .iter()
            .map(|rule| MatchPattern::compile(rule))
            .collect::<PageModResult<Vec<_>>>()?;
        let style_text = load_style(&ctx.host, &config)?;

        let id = ctx.next_mod_id();
        let inner = Rc::new(ModInner {
            id,
            ctx: Rc::downgrade(ctx),
            host: ctx.host.clone(),
            include: RuleSet::new(id, ctx.rules.clone()),
            config,
            exclude,
            style: RefCell::new(None),
            workers: RefCell::new(Vec::new()),
            pending: PendingQueue::new(),
            attach_events: EventEmitter::new(),
            error_events: EventEmitter::new(),
            destroyed: Cell::new(false),
        });

        if let Some(handler) = options.on_attach {
            inner.attach_events.on(move |worker| handler(worker));
        }
        if let Some(handler) = options.on_error {
            inner.error_events.on(move |error| handler(error));
        }

        inner.include.add(&inner.config.include)?;

        if !style_text.is_empty() {
            let style = Rc::new(StyleInjector::new(
                style_text,
                ctx.config.sheet_type,
                ctx.host.styles.clone(),
            ));
            if let Err(e) = style.register(&inner.include.patterns()) {
                inner.include.clear();
                return Err(e);
            }

            let weak = Rc::downgrade(&inner);
            let listener = inner.include.events().on(move |_: &RuleEvent| {
                if let Some(inner) = weak.upgrade() {
                    inner.refresh_style();
                }
            });
            style.set_listener(listener);
            *inner.style.borrow_mut() = Some(style);
        }

        let page_mod = PageMod { inner };
        ctx.registry.borrow_mut().add(page_mod.clone());
        debug!(
            "{} 注册完成，规则：{:?}，时机：{}",
            id,
            page_mod.include().to_vec(),
            page_mod.content_script_when()
        );

        if page_mod.attach_to().existing {
            page_mod.apply_on_existing();
        }
        Ok(page_mod)
    }

    pub fn id(&self) -> ModId {
        self.inner.id
    }

    /// 包含规则集合（可在运行期增删）
    pub fn include(&self) -> &RuleSet {
        &self.inner.include
    }

    pub fn exclude(&self) -> Vec<String> {
        self.inner
            .exclude
            .iter()
            .map(|pattern| pattern.rule().to_string())
            .collect()
    }

    pub fn config(&self) -> &ModConfig {
        &self.inner.config
    }

    pub fn content_script_when(&self) -> ContentScriptWhen {
        self.inner.config.content_script_when
    }

    pub fn attach_to(&self) -> AttachTo {
        self.inner.config.attach_to
    }

    /// 订阅 attach 事件
    pub fn on_attach<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&WorkerRef) + 'static,
    {
        self.inner.attach_events.on(listener)
    }

    /// 订阅 error 事件；存在订阅者时错误不再写入日志
    pub fn on_error<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&PageModError) + 'static,
    {
        self.inner.error_events.on(listener)
    }

    pub fn off_attach(&self, id: ListenerId) -> bool {
        self.inner.attach_events.off(id)
    }

    pub fn off_error(&self, id: ListenerId) -> bool {
        self.inner.error_events.off(id)
    }

    /// 存活的 Worker
    pub fn workers(&self) -> Vec<WorkerRef> {
        self.inner.workers.borrow().clone()
    }

    pub fn worker_count(&self) -> usize {
        self.inner.workers.borrow().len()
    }

    /// 等待就绪事件的文档数
    pub fn pending_count(&self) -> usize {
        self.inner.pending.len()
    }

    /// 当前注册的样式表 URI
    pub fn style_uri(&self) -> Option<String> {
        let style = self.inner.style.borrow().clone();
        style.and_then(|style| style.registered_uri())
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.get()
    }

    /// 处理匹配到的文档
    pub(crate) fn on_content(&self, window: WindowRef) {
        self.inner.on_content(window);
    }

    /// 对已打开的文档补做注入，返回送入判定流程的文档数
    ///
    /// 只在构造时调用一次；已挂载或正在等待的文档不会重复注入。
    pub(crate) fn apply_on_existing(&self) -> usize {
        let attach_to = self.attach_to();
        let private_browsing = self
            .inner
            .ctx
            .upgrade()
            .is_some_and(|ctx| ctx.config.private_browsing);
        let tabs = self.inner.host.tabs.all_tabs();

        let mut fed = 0;
        for tab in tabs {
            let window = tab.content_window;
            if window.is_private() && !private_browsing {
                continue;
            }
            if !self.inner.include.matches(&tab.url) {
                continue;
            }
            if attach_to.top {
                self.inner.on_content(window.clone());
                fed += 1;
            }
            if attach_to.frame {
                for frame in window.frames() {
                    self.inner.on_content(frame);
                    fed += 1;
                }
            }
        }
        debug!("{} 对已有文档补做注入：{}", self.inner.id, fed);
        fed
    }

    /// 销毁 mod：注销样式表，逐条移除规则，退出注册表，
    /// 作废挂起的就绪监听并销毁存活的 Worker。重复调用为空操作。
    pub fn destroy(&self) {
        self.inner.destroy();
    }
}

impl fmt::Debug for PageMod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageMod")
            .field("id", &self.inner.id)
            .field("include", &self.inner.include.to_vec())
            .field("exclude", &self.exclude())
            .field("destroyed", &self.inner.destroyed.get())
            .finish()
    }
}

impl ModInner {
    fn on_content(self: &Rc<Self>, window: WindowRef) {
        // 排除规则优先于包含规则
        let url = window.url();
        if self.exclude.iter().any(|pattern| pattern.test(&url)) {
            return;
        }

        if !self.is_registered() {
            return;
        }

        let attach_to = self.config.attach_to;
        let is_top = window.is_top();
        if (is_top && !attach_to.top) || (!is_top && !attach_to.frame) {
            return;
        }

        // 同一文档只挂载一次
        if self.is_attached(window.id()) {
            return;
        }

        let when = self.config.content_script_when;
        let state = window.ready_state();
        if when == ContentScriptWhen::Start
            || state == ReadyState::Complete
            || (when == ContentScriptWhen::Ready && state == ReadyState::Interactive)
        {
            self.create_worker(window);
            return;
        }

        let event = match when {
            ContentScriptWhen::End => LoadEvent::Load,
            _ => LoadEvent::DomContentLoaded,
        };
        self.wait_for(window, event);
    }

    fn is_attached(&self, window: WindowId) -> bool {
        self.pending.contains_window(window)
            || self.workers.borrow().iter().any(|w| w.window_id() == window)
    }

    /// 注册一次性就绪监听，只响应来源为该窗口本身的事件；
    /// 文档在就绪前卸载时挂起项随之出队
    fn wait_for(self: &Rc<Self>, window: WindowRef, event: LoadEvent) {
        let window_id = window.id();
        let (ticket, token) = self.pending.enqueue(window.clone(), event);

        let weak = Rc::downgrade(self);
        let ready_token = token.clone();
        let ready: LoadListener = Rc::new(move |info: &LoadEventInfo| {
            if ready_token.is_cancelled() || info.target != window_id {
                return;
            }
            let Some(inner) = weak.upgrade() else {
                return;
            };
            if let Some(window) = inner.pending.complete(ticket) {
                inner.create_worker(window);
            }
        });

        let weak = Rc::downgrade(self);
        let unload: LoadListener = Rc::new(move |info: &LoadEventInfo| {
            if token.is_cancelled() || info.target != window_id {
                return;
            }
            if let Some(inner) = weak.upgrade() {
                if inner.pending.abandon(ticket) {
                    debug!("{} 文档在就绪前卸载，放弃等待", inner.id);
                }
            }
        });

        let ready_id = window.add_load_listener(event, ready);
        let unload_id = window.add_load_listener(LoadEvent::Unload, unload);
        self.pending.attach_listeners(ticket, ready_id, unload_id);
        debug!("{} 等待文档就绪：{}，事件：{:?}", self.id, window.url(), event);
    }

    fn create_worker(self: &Rc<Self>, window: WindowRef) {
        if self.destroyed.get() {
            return;
        }

        let weak = Rc::downgrade(self);
        let on_error: ErrorCallback = Rc::new(move |error: PageModError| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_error(error);
            }
        });
        let options = WorkerOptions {
            window: window.clone(),
            content_script: self.config.content_script.clone(),
            content_script_file: self.config.content_script_file.clone(),
            content_script_options: self.config.content_script_options.clone(),
            on_error,
        };

        // 单个文档的注入失败不影响 mod 和其他文档
        let worker = match self.host.workers.create(options) {
            Ok(worker) => worker,
            Err(e) => {
                self.handle_error(e);
                return;
            }
        };

        self.workers.borrow_mut().push(worker.clone());
        debug!("{} Worker 已挂载：{}", self.id, window.url());
        self.attach_events.emit(&worker);

        let weak = Rc::downgrade(self);
        let key = worker_key(&worker);
        worker.once_detach(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.release_worker(key);
            }
        }));
    }

    /// 文档卸载时销毁 Worker；已被 mod 销毁流程处理过的 Worker 不再重复销毁
    fn release_worker(&self, key: *const ()) {
        let worker = {
            let mut workers = self.workers.borrow_mut();
            workers
                .iter()
                .position(|w| worker_key(w) == key)
                .map(|index| workers.remove(index))
        };
        if let Some(worker) = worker {
            worker.destroy();
            debug!("{} Worker 已随文档卸载销毁", self.id);
        }
    }

    fn handle_error(&self, e: PageModError) {
        if self.destroyed.get() {
            return;
        }
        if self.error_events.listener_count() == 0 {
            error!("{} 未处理的错误：{}", self.id, e);
        } else {
            self.error_events.emit(&e);
        }
    }

    fn refresh_style(&self) {
        let style = self.style.borrow().clone();
        let Some(style) = style else {
            return;
        };
        if let Err(e) = style.register(&self.include.patterns()) {
            error!("{} 规则变更后样式表重新注册失败：{}", self.id, e);
        }
    }

    fn is_registered(&self) -> bool {
        self.ctx
            .upgrade()
            .is_some_and(|ctx| ctx.is_registered(self.id))
    }

    fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }

        let style = self.style.borrow_mut().take();
        if let Some(style) = style {
            if let Some(listener) = style.take_listener() {
                self.include.events().off(listener);
            }
            if let Err(e) = style.unregister() {
                warn!("{} 样式表注销失败：{}", self.id, e);
            }
        }

        self.include.close();

        if let Some(ctx) = self.ctx.upgrade() {
            let removed = ctx.registry.borrow_mut().remove(self.id);
            drop(removed);
        }

        let cancelled = self.pending.cancel_all();

        let workers = std::mem::take(&mut *self.workers.borrow_mut());
        for worker in &workers {
            worker.destroy();
        }

        self.attach_events.clear();
        self.error_events.clear();
        debug!(
            "{} 已销毁，取消等待：{}，销毁 Worker：{}",
            self.id,
            cancelled,
            workers.len()
        );
    }
}

fn worker_key(worker: &WorkerRef) -> *const () {
    Rc::as_ptr(worker) as *const ()
}

/// 样式文本：先拼接样式文件内容，再拼接内联样式
fn load_style(host: &HostServices, config: &ModConfig) -> PageModResult<String> {
    let mut text = config
        .content_style_file
        .iter()
        .map(|uri| host.resources.read(uri))
        .collect::<PageModResult<Vec<_>>>()?
        .concat();
    text.push_str(&config.content_style.concat());
    Ok(text)
}
