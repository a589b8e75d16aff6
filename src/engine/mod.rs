//! 引擎模块：共享上下文、文档监听、mod 注册表与引擎入口
pub mod registry;
pub mod watcher;
pub mod engine;
pub(crate) mod context;

pub use self::registry::{ModId, ModRegistry};
pub use self::watcher::DocumentWatcher;
pub use self::engine::Engine;
pub(crate) use self::context::EngineContext;
