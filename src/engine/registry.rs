//! mod 注册表
//! 记录全部存活的 PageMod，用于重复注册检查与卸载时的批量销毁

use std::fmt;

use crate::page_mod::PageMod;

/// mod 唯一ID（按创建顺序递增）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModId(pub u64);

impl fmt::Display for ModId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mod#{}", self.0)
    }
}

/// mod 注册表（按注册顺序）
#[derive(Default)]
pub struct ModRegistry {
    mods: Vec<PageMod>,
}

impl ModRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册 mod；已注册时返回 false
    pub fn add(&mut self, page_mod: PageMod) -> bool {
        if self.has(page_mod.id()) {
            return false;
        }
        self.mods.push(page_mod);
        true
    }

    pub fn has(&self, id: ModId) -> bool {
        self.mods.iter().any(|m| m.id() == id)
    }

    pub fn get(&self, id: ModId) -> Option<PageMod> {
        self.mods.iter().find(|m| m.id() == id).cloned()
    }

    pub fn remove(&mut self, id: ModId) -> Option<PageMod> {
        let index = self.mods.iter().position(|m| m.id() == id)?;
        Some(self.mods.remove(index))
    }

    /// 取出全部 mod（卸载时使用）
    pub fn drain(&mut self) -> Vec<PageMod> {
        std::mem::take(&mut self.mods)
    }

    pub fn ids(&self) -> Vec<ModId> {
        self.mods.iter().map(|m| m.id()).collect()
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }
}
