//! 注入引擎入口
//! 持有共享上下文，订阅文档创建事件，负责 mod 构造与整体卸载

use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, warn};

use super::context::EngineContext;
use super::registry::ModId;
use super::watcher::DocumentWatcher;
use crate::config::{ConfigManager, EngineConfig, ModOptions};
use crate::error::PageModResult;
use crate::host::{CreatedDocument, HostServices};
use crate::page_mod::PageMod;
use crate::utils::ListenerId;

/// 注入引擎
pub struct Engine {
    ctx: Rc<EngineContext>,
    watcher: DocumentWatcher,
    subscription: Cell<Option<ListenerId>>,
}

impl Engine {
    /// 创建引擎并订阅文档创建事件
    pub fn new(config: EngineConfig, host: HostServices) -> Self {
        let ctx = Rc::new(EngineContext::new(config, host));
        let watcher = DocumentWatcher::new(&ctx);

        let handler = watcher.clone();
        let subscription = ctx
            .host
            .documents
            .subscribe(Rc::new(move |document: &CreatedDocument| {
                handler.on_document_created(document);
            }));
        debug!("引擎初始化完成，隐私窗口注入：{}", ctx.config.private_browsing);

        Self {
            ctx,
            watcher,
            subscription: Cell::new(Some(subscription)),
        }
    }

    /// 使用默认配置创建引擎
    pub fn with_default_config(host: HostServices) -> Self {
        Self::new(ConfigManager::get_default(), host)
    }

    /// 构造并注册 mod
    pub fn page_mod(&self, options: ModOptions) -> PageModResult<PageMod> {
        PageMod::new(&self.ctx, options)
    }

    pub fn watcher(&self) -> &DocumentWatcher {
        &self.watcher
    }

    pub fn config(&self) -> &EngineConfig {
        &self.ctx.config
    }

    /// 已注册的 mod（注册顺序）
    pub fn mods(&self) -> Vec<ModId> {
        self.ctx.registry.borrow().ids()
    }

    pub fn get_mod(&self, id: ModId) -> Option<PageMod> {
        self.ctx.registry.borrow().get(id)
    }

    pub fn mod_count(&self) -> usize {
        self.ctx.registry.borrow().len()
    }

    /// 共享规则表条目数
    pub fn rule_count(&self) -> usize {
        self.ctx.rules.borrow().len()
    }

    /// 规则的订阅者数量
    pub fn rule_ref_count(&self, rule: &str) -> usize {
        self.ctx.rules.borrow().ref_count(rule)
    }

    pub fn is_unloaded(&self) -> bool {
        self.ctx.is_unloaded()
    }

    /// 卸载引擎：退订文档事件，逐个销毁 mod，清空共享规则表
    ///
    /// 各 mod 的销毁互不影响；重复调用为空操作。
    pub fn unload(&self) {
        if self.ctx.mark_unloaded() {
            return;
        }

        if let Some(subscription) = self.subscription.take() {
            self.ctx.host.documents.unsubscribe(subscription);
        }

        let mods = self.ctx.registry.borrow_mut().drain();
        for page_mod in &mods {
            page_mod.destroy();
        }

        let leftover = self.ctx.rules.borrow_mut().clear();
        if leftover > 0 {
            warn!("卸载时共享规则表仍有 {} 条规则", leftover);
        }
        debug!("引擎已卸载，销毁 mod：{}", mods.len());
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.unload();
    }
}
