//! PageMod 模块：注入判定与时机控制、挂起队列、样式注入
pub mod page_mod;
pub mod pending;
pub mod style;

pub use self::page_mod::PageMod;
pub use self::pending::{CancellationToken, PendingQueue};
pub use self::style::StyleInjector;
