//! 全局错误类型定义

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PageModError {
    // 构造相关错误
    #[error("配置错误：{0}")]
    Configuration(String),
    #[error("资源读取失败：{uri}，原因：{reason}")]
    Resource { uri: String, reason: String },

    // 规则相关错误
    #[error("无效规则：{rule}，原因：{reason}")]
    InvalidPattern { rule: String, reason: String },

    // mod 状态错误
    #[error("mod 已销毁：{0}")]
    Destroyed(String),

    // 注入相关错误
    #[error("内容脚本执行失败：{0}")]
    InjectionRuntime(String),
    #[error("样式表注册失败：{0}")]
    StyleRegistration(String),

    // 引擎状态错误
    #[error("引擎已卸载")]
    EngineUnloaded,
}

impl PageModError {
    /// 构造规则错误
    pub fn invalid_pattern(rule: &str, reason: impl Into<String>) -> Self {
        PageModError::InvalidPattern {
            rule: rule.to_string(),
            reason: reason.into(),
        }
    }
}

// 全局Result类型
pub type PageModResult<T> = Result<T, PageModError>;
