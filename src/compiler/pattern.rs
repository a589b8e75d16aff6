//! 编译后模式模型
//! URL匹配规则编译后的结构，编译完成后不可变

use std::fmt;
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use super::compiler::PatternCompiler;
use crate::error::PageModResult;

/// 任意网页：http / https / ftp
pub(crate) static ANY_WEB_PAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?|ftp)://").unwrap()
});

/// 模式类型（编译时按语法确定，匹配时不再重新判断）
#[derive(Debug, Clone)]
pub enum PatternKind {
    ExactUrl(String),  // 完整URL，字符串全等
    Domain(String),    // *.example.com，主机名相等或为子域名
    UrlPrefix(String), // http://example.com/*，字面前缀
    Regex {
        regex: Regex,
        source: String, // 去除分隔符与标志后的正则源码
    },
    AnyWebPage, // *
}

/// 编译后的URL匹配模式
#[derive(Debug, Clone)]
pub struct MatchPattern {
    rule: String,
    kind: PatternKind,
}

impl MatchPattern {
    pub(crate) fn new(rule: &str, kind: PatternKind) -> Self {
        Self {
            rule: rule.to_string(),
            kind,
        }
    }

    /// 编译规则字符串
    pub fn compile(rule: &str) -> PageModResult<Self> {
        PatternCompiler::compile(rule)
    }

    /// 原始规则字符串
    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn kind(&self) -> &PatternKind {
        &self.kind
    }

    /// 判断URL是否匹配；无法解析为URL的输入一律不匹配
    pub fn test(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };

        match &self.kind {
            // 正则必须匹配整个URL
            PatternKind::Regex { regex, .. } => regex
                .find(url)
                .is_some_and(|m| m.start() == 0 && m.end() == url.len()),
            PatternKind::AnyWebPage => ANY_WEB_PAGE.is_match(url),
            PatternKind::ExactUrl(exact) => exact == url,
            PatternKind::Domain(domain) => parsed.host_str().is_some_and(|host| {
                let host = host.to_ascii_lowercase();
                host == *domain
                    || host
                        .strip_suffix(domain.as_str())
                        .is_some_and(|rest| rest.ends_with('.'))
            }),
            PatternKind::UrlPrefix(prefix) => url.starts_with(prefix.as_str()),
        }
    }

    /// 模式类型描述
    pub fn describe(&self) -> &'static str {
        match &self.kind {
            PatternKind::ExactUrl(_) => "exact",
            PatternKind::Domain(_) => "domain",
            PatternKind::UrlPrefix(_) => "prefix",
            PatternKind::Regex { .. } => "regexp",
            PatternKind::AnyWebPage => "any",
        }
    }
}

impl fmt::Display for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.describe(), self.rule)
    }
}
