//! 引擎全局配置

use crate::host::SheetType;

/// 引擎配置
#[derive(Debug, Clone)]
pub struct EngineConfig {
    // 是否允许向隐私浏览窗口注入
    pub private_browsing: bool,
    // 样式表注册级别
    pub sheet_type: SheetType,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            private_browsing: false,
            sheet_type: SheetType::User,
        }
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> EngineConfig {
        EngineConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }
}

/// 配置构建器
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn private_browsing(mut self, enabled: bool) -> Self {
        self.config.private_browsing = enabled;
        self
    }

    pub fn sheet_type(mut self, sheet_type: SheetType) -> Self {
        self.config.sheet_type = sheet_type;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}
