//! 配置模块：引擎全局配置与 PageMod 构造选项
pub mod engine;
pub mod options;

pub use self::engine::{ConfigManager, EngineConfig, EngineConfigBuilder};
pub use self::options::{
    AttachHandler, AttachTo, ContentScriptWhen, ErrorHandler, ModConfig, ModOptions,
    ModOptionsBuilder, OneOrMany, VALID_ATTACH_TO,
};
