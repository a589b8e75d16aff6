//! 文档监听器
//! 订阅全进程唯一的“文档创建”事件，按共享规则表匹配后投递给订阅的 mod

use std::rc::{Rc, Weak};
use tracing::debug;

use super::context::EngineContext;
use super::registry::ModId;
use crate::host::CreatedDocument;
use crate::page_mod::PageMod;

/// 文档监听器
#[derive(Clone)]
pub struct DocumentWatcher {
    ctx: Weak<EngineContext>,
}

impl DocumentWatcher {
    pub(crate) fn new(ctx: &Rc<EngineContext>) -> Self {
        Self {
            ctx: Rc::downgrade(ctx),
        }
    }

    /// 处理新创建的文档，返回收到通知的 mod 数量
    ///
    /// 跳过：无窗口的文档、不属于任何标签页的窗口、无权限的隐私窗口、已标记注入的文档。
    /// 匹配任一规则时先全局标记一次，再向全部匹配规则的订阅者并集各投递一次。
    pub fn on_document_created(&self, document: &CreatedDocument) -> usize {
        let Some(ctx) = self.ctx.upgrade() else {
            return 0;
        };
        if ctx.is_unloaded() {
            return 0;
        }

        let Some(window) = document.window.as_ref() else {
            return 0;
        };
        if !ctx.host.tabs.has_tab_for(window.as_ref()) {
            return 0;
        }
        if window.is_private() && !ctx.config.private_browsing {
            debug!("隐私窗口文档被忽略：{}", document.url);
            return 0;
        }
        if window.is_injected() {
            return 0;
        }

        let subscribers = {
            let table = ctx.rules.borrow();
            let matched = table.matching_rules(&document.url);
            if matched.is_empty() {
                return 0;
            }
            debug!("文档匹配规则：{}，规则：{:?}", document.url, matched);
            table.subscribers_of(&matched)
        };

        window.mark_injected();

        let targets: Vec<PageMod> = {
            let registry = ctx.registry.borrow();
            subscribers
                .into_iter()
                .filter_map(|id| registry.get(id))
                .collect()
        };

        for page_mod in &targets {
            page_mod.on_content(window.clone());
        }
        targets.len()
    }

    /// 取消 mod 对规则的订阅，无订阅者时删除共享表条目
    ///
    /// 已注册的 mod 经由其规则集合移除（同步分发 remove 事件）。
    pub fn off(&self, rule: &str, mod_id: ModId) -> bool {
        let Some(ctx) = self.ctx.upgrade() else {
            return false;
        };
        let page_mod = ctx.registry.borrow().get(mod_id);
        match page_mod {
            Some(page_mod) => page_mod.include().remove([rule]) > 0,
            None => ctx.rules.borrow_mut().unsubscribe(rule, mod_id),
        }
    }
}
