//! 编译模块：将规则字符串编译为可执行的URL匹配模式
pub mod pattern;
pub mod compiler;

pub use self::pattern::{MatchPattern, PatternKind};
pub use self::compiler::PatternCompiler;
