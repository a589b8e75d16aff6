//! 规则编译器核心
//! 仅负责将规则字符串编译为 MatchPattern，模式类型完全由语法决定

use regex::RegexBuilder;
use tracing::debug;

use super::pattern::{MatchPattern, PatternKind};
use crate::error::{PageModError, PageModResult};

/// 规则编译器
pub struct PatternCompiler;

impl PatternCompiler {
    /// 编译单条规则
    ///
    /// 支持的语法：
    /// - `*`：任意网页（http/https/ftp）
    /// - `*.example.com`：域名及其子域名
    /// - `http://example.com/`：完整URL
    /// - `http://example.com/*`：URL前缀
    /// - `/^https?:.*$/i`：正则字面量（仅支持 `i` 标志，必须匹配整个URL）
    pub fn compile(rule: &str) -> PageModResult<MatchPattern> {
        let pattern = if rule.starts_with('/') {
            Self::compile_regex_literal(rule)?
        } else {
            Self::compile_wildcard(rule)?
        };

        debug!("规则编译完成：{}", pattern);
        Ok(pattern)
    }

    /// 编译正则字面量 `/source/flags`
    fn compile_regex_literal(rule: &str) -> PageModResult<MatchPattern> {
        let close = rule.rfind('/').filter(|&i| i > 0).ok_or_else(|| {
            PageModError::invalid_pattern(rule, "正则字面量缺少结束分隔符 `/`")
        })?;

        let source = &rule[1..close];
        let flags = &rule[close + 1..];
        if source.is_empty() {
            return Err(PageModError::invalid_pattern(rule, "正则表达式为空"));
        }

        let mut case_insensitive = false;
        for flag in flags.chars() {
            match flag {
                'i' => case_insensitive = true,
                'g' => {
                    return Err(PageModError::invalid_pattern(
                        rule,
                        "不支持全局匹配标志 `g`",
                    ));
                }
                'm' => {
                    return Err(PageModError::invalid_pattern(
                        rule,
                        "不支持多行匹配标志 `m`",
                    ));
                }
                other => {
                    return Err(PageModError::invalid_pattern(
                        rule,
                        format!("未知的正则标志 `{}`", other),
                    ));
                }
            }
        }

        let regex = RegexBuilder::new(source)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| PageModError::invalid_pattern(rule, e.to_string()))?;

        Ok(MatchPattern::new(
            rule,
            PatternKind::Regex {
                regex,
                source: source.to_string(),
            },
        ))
    }

    /// 编译通配符规则（最多一个 `*`，只能位于开头或结尾）
    fn compile_wildcard(rule: &str) -> PageModResult<MatchPattern> {
        let first = rule.find('*');
        let last = rule.rfind('*');
        if first != last {
            return Err(PageModError::invalid_pattern(
                rule,
                "通配符中最多只能包含一个 `*`",
            ));
        }

        match first {
            Some(0) => {
                if rule.len() == 1 {
                    return Ok(MatchPattern::new(rule, PatternKind::AnyWebPage));
                }
                let Some(domain) = rule.strip_prefix("*.") else {
                    return Err(PageModError::invalid_pattern(
                        rule,
                        "以 `*` 开头的规则必须是 `*.` 形式",
                    ));
                };
                if domain.is_empty() {
                    return Err(PageModError::invalid_pattern(rule, "域名为空"));
                }
                Ok(MatchPattern::new(
                    rule,
                    PatternKind::Domain(domain.to_ascii_lowercase()),
                ))
            }
            _ if !rule.contains(':') => Err(PageModError::invalid_pattern(
                rule,
                "非 `*.example.org` 形式的规则必须是完整URL或URL前缀",
            )),
            None => Ok(MatchPattern::new(rule, PatternKind::ExactUrl(rule.to_string()))),
            Some(pos) if pos == rule.len() - 1 => Ok(MatchPattern::new(
                rule,
                PatternKind::UrlPrefix(rule[..pos].to_string()),
            )),
            Some(_) => Err(PageModError::invalid_pattern(
                rule,
                "`*` 只能作为规则的第一个或最后一个字符",
            )),
        }
    }
}
