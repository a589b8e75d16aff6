//! rspagemod - 基于URL规则的内容脚本与样式注入引擎

// 导出全局错误类型
pub use self::error::{PageModError, PageModResult};

// 导出配置模块
pub use self::config::{
    AttachTo, ConfigManager, ContentScriptWhen, EngineConfig, EngineConfigBuilder, ModConfig,
    ModOptions, ModOptionsBuilder, OneOrMany,
};

// 导出编译模块核心接口
pub use self::compiler::{MatchPattern, PatternCompiler, PatternKind};

// 导出规则模块核心接口
pub use self::rule::{RuleEvent, RuleSet, RuleTable, SharedRuleTable};

// 导出宿主协作接口
pub use self::host::{
    ContentWindow, CreatedDocument, DocumentEventBus, HostServices, LoadEvent, LoadEventInfo,
    ReadyState, ResourceReader, SheetType, StyleSheetService, Tab, TabProvider, WindowId,
    WindowRef, Worker, WorkerFactory, WorkerOptions, WorkerRef,
};

// 导出引擎与 mod
pub use self::engine::{DocumentWatcher, Engine, ModId, ModRegistry};
pub use self::page_mod::{CancellationToken, PageMod, StyleInjector};

// 导出工具模块核心接口
pub use self::utils::{EventEmitter, ListenerId, UriEncoder};

// 声明所有子模块
pub mod config;
pub mod error;
pub mod compiler;
pub mod rule;
pub mod host;
pub mod engine;
pub mod page_mod;
pub mod utils;
