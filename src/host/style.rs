//! 样式表服务与资源读取协作接口

use crate::error::PageModResult;

/// 样式表级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SheetType {
    Agent,
    #[default]
    User,
    Author,
}

/// 全局样式表注册服务
pub trait StyleSheetService {
    fn load_and_register(&self, uri: &str, sheet_type: SheetType) -> PageModResult<()>;
    fn is_registered(&self, uri: &str, sheet_type: SheetType) -> bool;
    fn unregister(&self, uri: &str, sheet_type: SheetType) -> PageModResult<()>;
}

/// 本地/扩展包内资源读取（同步）
pub trait ResourceReader {
    fn read(&self, uri: &str) -> PageModResult<String>;
}
