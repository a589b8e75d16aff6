//! 文档/窗口/标签页协作接口
//! 引擎只依赖这些接口，不实现浏览器本身

use std::rc::Rc;

use crate::utils::ListenerId;

/// 内容窗口ID
pub type WindowId = u64;

/// 文档就绪状态（loading → interactive → complete）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

/// 文档加载阶段事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadEvent {
    /// 结构解析完成（interactive）
    DomContentLoaded,
    /// 完全加载（complete）
    Load,
    /// 文档关闭或导航离开
    Unload,
}

/// 加载阶段事件信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadEventInfo {
    pub event: LoadEvent,
    /// 事件来源窗口（子框架的事件可能冒泡到父窗口）
    pub target: WindowId,
}

pub type LoadListener = Rc<dyn Fn(&LoadEventInfo)>;

/// 内容窗口（承载一个文档）
pub trait ContentWindow {
    fn id(&self) -> WindowId;

    /// 当前文档URL
    fn url(&self) -> String;

    fn ready_state(&self) -> ReadyState;

    /// 是否为顶层文档（否则为子框架）
    fn is_top(&self) -> bool;

    /// 是否为隐私浏览窗口
    fn is_private(&self) -> bool;

    /// 全部后代框架（递归）
    fn frames(&self) -> Vec<WindowRef>;

    /// 注入标记：引擎首次匹配该文档时设置，防止重复投递
    fn is_injected(&self) -> bool;
    fn mark_injected(&self);

    fn add_load_listener(&self, event: LoadEvent, listener: LoadListener) -> ListenerId;
    fn remove_load_listener(&self, event: LoadEvent, id: ListenerId);
}

pub type WindowRef = Rc<dyn ContentWindow>;

/// 文档创建通知（全进程唯一的事件源）
#[derive(Clone)]
pub struct CreatedDocument {
    pub url: String,
    /// XML等无窗口文档为 None
    pub window: Option<WindowRef>,
}

pub type DocumentHandler = Rc<dyn Fn(&CreatedDocument)>;

/// 文档创建事件总线
pub trait DocumentEventBus {
    fn subscribe(&self, handler: DocumentHandler) -> ListenerId;
    fn unsubscribe(&self, id: ListenerId);
}

/// 标签页
#[derive(Clone)]
pub struct Tab {
    pub url: String,
    pub content_window: WindowRef,
}

/// 标签页枚举接口
pub trait TabProvider {
    /// 所有浏览器窗口中的全部标签页
    fn all_tabs(&self) -> Vec<Tab>;

    /// 窗口是否属于某个标签页（顶层文档或其子框架）
    fn has_tab_for(&self, window: &dyn ContentWindow) -> bool;
}
