//! 规则集合
//! 单个 mod 拥有的有序去重规则列表，增删规则时同步共享规则表并分发 add/remove 事件

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::table::SharedRuleTable;
use crate::compiler::MatchPattern;
use crate::engine::ModId;
use crate::error::{PageModError, PageModResult};
use crate::utils::EventEmitter;

/// 规则变更事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleEvent {
    Add(String),
    Remove(String),
}

impl RuleEvent {
    pub fn rule(&self) -> &str {
        match self {
            RuleEvent::Add(rule) | RuleEvent::Remove(rule) => rule,
        }
    }
}

/// 规则集合
#[derive(Debug)]
pub struct RuleSet {
    owner: ModId,
    table: SharedRuleTable,
    rules: RefCell<Vec<String>>,
    events: EventEmitter<RuleEvent>,
    closed: Cell<bool>,
}

impl RuleSet {
    pub fn new(owner: ModId, table: SharedRuleTable) -> Self {
        Self {
            owner,
            table,
            rules: RefCell::new(Vec::new()),
            events: EventEmitter::new(),
            closed: Cell::new(false),
        }
    }

    /// 添加规则，已存在的规则直接跳过（不分发事件）
    ///
    /// 整批原子生效：先编译全部新规则，任一规则非法则一条都不添加。
    /// 返回实际新增的规则数。集合关闭后一律返回 `Destroyed`。
    pub fn add<I, S>(&self, rules: I) -> PageModResult<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.closed.get() {
            return Err(PageModError::Destroyed(self.owner.to_string()));
        }

        let mut pending: Vec<Rc<MatchPattern>> = Vec::new();
        for rule in rules {
            let rule = rule.as_ref();
            if self.has(rule) || pending.iter().any(|p| p.rule() == rule) {
                continue;
            }
            // 共享表中已有则复用，否则编译
            let compiled = self.table.borrow().pattern(rule);
            let pattern = match compiled {
                Some(pattern) => pattern,
                None => Rc::new(MatchPattern::compile(rule)?),
            };
            pending.push(pattern);
        }

        for pattern in &pending {
            let rule = pattern.rule().to_string();
            self.table.borrow_mut().subscribe(pattern.clone(), self.owner);
            self.rules.borrow_mut().push(rule.clone());
            self.events.emit(&RuleEvent::Add(rule));
        }
        Ok(pending.len())
    }

    /// 移除规则，不存在的规则直接跳过；返回实际移除的规则数
    pub fn remove<I, S>(&self, rules: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut removed = 0;
        for rule in rules {
            let rule = rule.as_ref();
            let position = self.rules.borrow().iter().position(|r| r == rule);
            let Some(position) = position else {
                continue;
            };

            self.rules.borrow_mut().remove(position);
            self.table.borrow_mut().unsubscribe(rule, self.owner);
            self.events.emit(&RuleEvent::Remove(rule.to_string()));
            removed += 1;
        }
        removed
    }

    /// 逐条移除全部规则（每条单独退订并分发 remove 事件）
    pub fn clear(&self) -> usize {
        let rules = self.to_vec();
        self.remove(rules)
    }

    /// 关闭集合并移除全部规则，此后 `add` 不再向共享表订阅
    pub fn close(&self) -> usize {
        self.closed.set(true);
        self.clear()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    pub fn has(&self, rule: &str) -> bool {
        self.rules.borrow().iter().any(|r| r == rule)
    }

    pub fn len(&self) -> usize {
        self.rules.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.borrow().is_empty()
    }

    /// 规则快照（插入顺序）
    pub fn to_vec(&self) -> Vec<String> {
        self.rules.borrow().clone()
    }

    /// 当前规则在共享表中的编译模式（插入顺序，缺失条目跳过）
    pub fn patterns(&self) -> Vec<Rc<MatchPattern>> {
        let table = self.table.borrow();
        self.rules
            .borrow()
            .iter()
            .filter_map(|rule| table.pattern(rule))
            .collect()
    }

    /// 任一规则匹配URL
    pub fn matches(&self, url: &str) -> bool {
        self.patterns().iter().any(|pattern| pattern.test(url))
    }

    /// 规则变更事件
    pub fn events(&self) -> &EventEmitter<RuleEvent> {
        &self.events
    }

    pub fn owner(&self) -> ModId {
        self.owner
    }
}
