//! 引擎共享上下文
//! 共享规则表、mod 注册表与宿主服务，显式传入 watcher 和每个 mod

use std::cell::{Cell, RefCell};

use super::registry::{ModId, ModRegistry};
use crate::config::EngineConfig;
use crate::host::HostServices;
use crate::rule::{RuleTable, SharedRuleTable};

pub struct EngineContext {
    pub(crate) config: EngineConfig,
    pub(crate) host: HostServices,
    pub(crate) rules: SharedRuleTable,
    pub(crate) registry: RefCell<ModRegistry>,
    next_mod_id: Cell<u64>,
    unloaded: Cell<bool>,
}

impl EngineContext {
    pub(crate) fn new(config: EngineConfig, host: HostServices) -> Self {
        Self {
            config,
            host,
            rules: RuleTable::shared(),
            registry: RefCell::new(ModRegistry::new()),
            next_mod_id: Cell::new(1),
            unloaded: Cell::new(false),
        }
    }

    pub(crate) fn next_mod_id(&self) -> ModId {
        let id = self.next_mod_id.get();
        self.next_mod_id.set(id + 1);
        ModId(id)
    }

    pub(crate) fn is_unloaded(&self) -> bool {
        self.unloaded.get()
    }

    /// 标记卸载，返回此前是否已卸载
    pub(crate) fn mark_unloaded(&self) -> bool {
        self.unloaded.replace(true)
    }

    pub(crate) fn is_registered(&self, id: ModId) -> bool {
        self.registry.borrow().has(id)
    }
}
