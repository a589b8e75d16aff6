//! 脚本执行上下文（Worker）协作接口

use std::rc::Rc;
use serde_json::Value;

use super::window::{WindowId, WindowRef};
use crate::error::{PageModError, PageModResult};

/// 脚本运行时错误回调
pub type ErrorCallback = Rc<dyn Fn(PageModError)>;

/// 创建 Worker 的参数
#[derive(Clone)]
pub struct WorkerOptions {
    pub window: WindowRef,
    pub content_script: Vec<String>,
    pub content_script_file: Vec<String>,
    pub content_script_options: Option<Value>,
    pub on_error: ErrorCallback,
}

/// 绑定到单个文档的脚本执行上下文
pub trait Worker {
    fn window_id(&self) -> WindowId;

    /// 文档卸载/导航离开时触发一次
    fn once_detach(&self, callback: Box<dyn FnOnce()>);

    fn destroy(&self);
}

pub type WorkerRef = Rc<dyn Worker>;

/// Worker 工厂
pub trait WorkerFactory {
    fn create(&self, options: WorkerOptions) -> PageModResult<WorkerRef>;
}
