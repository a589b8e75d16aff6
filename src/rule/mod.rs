//! 规则模块：共享规则表与每个 mod 的规则集合
pub mod table;
pub mod rule_set;

pub use self::table::{RuleTable, SharedRuleTable};
pub use self::rule_set::{RuleEvent, RuleSet};
