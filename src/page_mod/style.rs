//! 样式注入
//! 将 mod 的样式文本与当前规则合并为一个文档限定样式表，规则变化时整体替换

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, warn};

use crate::compiler::{MatchPattern, PatternKind};
use crate::error::PageModResult;
use crate::host::{SheetType, StyleSheetService};
use crate::utils::{ListenerId, UriEncoder};

/// 任意网页对应的文档选择子句
const ANY_WEB_PAGE_CLAUSE: &str = "regexp(\"^(https?|ftp)://.*?\")";

/// 样式注入器
pub struct StyleInjector {
    style: String,
    sheet_type: SheetType,
    service: Rc<dyn StyleSheetService>,
    // 当前已注册的 data URI
    registered: RefCell<Option<String>>,
    // 规则变更监听
    listener: Cell<Option<ListenerId>>,
}

impl StyleInjector {
    pub fn new(style: String, sheet_type: SheetType, service: Rc<dyn StyleSheetService>) -> Self {
        Self {
            style,
            sheet_type,
            service,
            registered: RefCell::new(None),
            listener: Cell::new(None),
        }
    }

    pub fn style(&self) -> &str {
        &self.style
    }

    /// 模式对应的文档选择子句
    pub fn document_clause(pattern: &MatchPattern) -> String {
        match pattern.kind() {
            PatternKind::Regex { source, .. } => format!("regexp(\"{}\")", source),
            PatternKind::ExactUrl(url) => format!("url({})", url),
            PatternKind::Domain(domain) => format!("domain({})", domain),
            PatternKind::UrlPrefix(prefix) => format!("url-prefix({})", prefix),
            PatternKind::AnyWebPage => ANY_WEB_PAGE_CLAUSE.to_string(),
        }
    }

    /// 生成样式表文本；无规则时样式不加限定
    pub fn build_sheet(&self, patterns: &[Rc<MatchPattern>]) -> String {
        let clauses: Vec<String> = patterns
            .iter()
            .map(|pattern| Self::document_clause(pattern))
            .collect();

        if clauses.is_empty() {
            self.style.clone()
        } else {
            format!("@-moz-document {} {{{}}}", clauses.join(","), self.style)
        }
    }

    /// 先注销旧样式表，再注册按当前规则生成的新样式表
    pub fn register(&self, patterns: &[Rc<MatchPattern>]) -> PageModResult<String> {
        self.unregister()?;

        let uri = UriEncoder::css_data_uri(&self.build_sheet(patterns));
        self.service.load_and_register(&uri, self.sheet_type)?;
        debug!("样式表注册完成，规则数：{}", patterns.len());
        *self.registered.borrow_mut() = Some(uri.clone());
        Ok(uri)
    }

    /// 注销当前样式表（未注册时为空操作）
    pub fn unregister(&self) -> PageModResult<()> {
        let uri = self.registered.borrow_mut().take();
        let Some(uri) = uri else {
            return Ok(());
        };
        if self.service.is_registered(&uri, self.sheet_type) {
            self.service.unregister(&uri, self.sheet_type)?;
        } else {
            warn!("样式表已不在注册服务中：{}", uri);
        }
        Ok(())
    }

    pub fn registered_uri(&self) -> Option<String> {
        self.registered.borrow().clone()
    }

    pub(crate) fn set_listener(&self, id: ListenerId) {
        self.listener.set(Some(id));
    }

    pub(crate) fn take_listener(&self) -> Option<ListenerId> {
        self.listener.take()
    }
}
