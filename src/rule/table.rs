//! 共享规则表
//! 规则字符串 -> 编译后模式 + 订阅者集合，同一规则被多个 mod 使用时只编译一次
//! 首个订阅者创建条目，最后一个订阅者退订时删除条目

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use tracing::{debug, warn};

use crate::compiler::MatchPattern;
use crate::engine::ModId;

/// 共享规则表句柄（单线程）
pub type SharedRuleTable = Rc<RefCell<RuleTable>>;

/// 规则表条目
#[derive(Debug)]
struct RuleEntry {
    pattern: Rc<MatchPattern>,
    subscribers: Vec<ModId>,
}

/// 共享规则表
#[derive(Debug, Default)]
pub struct RuleTable {
    entries: HashMap<String, RuleEntry>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedRuleTable {
        Rc::new(RefCell::new(Self::new()))
    }

    /// 获取已编译的模式
    pub fn pattern(&self, rule: &str) -> Option<Rc<MatchPattern>> {
        self.entries.get(rule).map(|entry| entry.pattern.clone())
    }

    pub fn contains(&self, rule: &str) -> bool {
        self.entries.contains_key(rule)
    }

    /// 规则的引用计数（订阅者数量），不存在时为0
    pub fn ref_count(&self, rule: &str) -> usize {
        self.entries
            .get(rule)
            .map(|entry| entry.subscribers.len())
            .unwrap_or(0)
    }

    /// 订阅规则：条目不存在时用给定模式创建；同一订阅者重复订阅不增加计数
    /// 返回是否为新增订阅
    pub fn subscribe(&mut self, pattern: Rc<MatchPattern>, subscriber: ModId) -> bool {
        let rule = pattern.rule().to_string();
        let entry = self.entries.entry(rule).or_insert_with(|| {
            debug!("规则注册到共享规则表：{}", pattern);
            RuleEntry {
                pattern,
                subscribers: Vec::new(),
            }
        });

        if entry.subscribers.contains(&subscriber) {
            return false;
        }
        entry.subscribers.push(subscriber);
        true
    }

    /// 退订规则：无订阅者时删除条目，释放编译后的模式
    /// 返回是否确实存在该订阅
    pub fn unsubscribe(&mut self, rule: &str, subscriber: ModId) -> bool {
        let Some(entry) = self.entries.get_mut(rule) else {
            warn!("退订不存在的规则：{}", rule);
            return false;
        };

        let before = entry.subscribers.len();
        entry.subscribers.retain(|id| *id != subscriber);
        let removed = entry.subscribers.len() != before;

        if entry.subscribers.is_empty() {
            self.entries.remove(rule);
            debug!("规则已无订阅者，从共享规则表移除：{}", rule);
        }
        removed
    }

    /// 匹配URL的全部规则
    pub fn matching_rules(&self, url: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.pattern.test(url))
            .map(|(rule, _)| rule.clone())
            .collect()
    }

    /// 给定规则的订阅者并集（按 ModId 排序去重）
    pub fn subscribers_of(&self, rules: &[String]) -> BTreeSet<ModId> {
        rules
            .iter()
            .filter_map(|rule| self.entries.get(rule))
            .flat_map(|entry| entry.subscribers.iter().copied())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 清空规则表，返回被清除的条目数
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }
}
