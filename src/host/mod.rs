//! 宿主协作接口：窗口/标签页、文档事件、Worker、样式表、资源读取
pub mod window;
pub mod worker;
pub mod style;

#[cfg(test)]
pub(crate) mod fake;

use std::rc::Rc;

pub use self::window::{
    ContentWindow, CreatedDocument, DocumentEventBus, DocumentHandler, LoadEvent, LoadEventInfo,
    LoadListener, ReadyState, Tab, TabProvider, WindowId, WindowRef,
};
pub use self::worker::{ErrorCallback, Worker, WorkerFactory, WorkerOptions, WorkerRef};
pub use self::style::{ResourceReader, SheetType, StyleSheetService};

/// 引擎依赖的宿主服务集合
#[derive(Clone)]
pub struct HostServices {
    pub tabs: Rc<dyn TabProvider>,
    pub documents: Rc<dyn DocumentEventBus>,
    pub workers: Rc<dyn WorkerFactory>,
    pub styles: Rc<dyn StyleSheetService>,
    pub resources: Rc<dyn ResourceReader>,
}
