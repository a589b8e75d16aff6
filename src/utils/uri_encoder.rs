//! URI编码工具
//! 将样式文本编码为 data URI，编码规则与 encodeURIComponent 一致

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// 样式表 data URI 前缀
pub const CSS_DATA_URI_PREFIX: &str = "data:text/css;charset=utf-8,";

/// encodeURIComponent 的编码集：除字母数字与 - _ . ! ~ * ' ( ) 外全部编码
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// URI编码工具
pub struct UriEncoder;

impl UriEncoder {
    /// 按 encodeURIComponent 规则编码，非ASCII字符按UTF-8字节输出 %XX（大写）
    pub fn encode_component(input: &str) -> String {
        utf8_percent_encode(input, COMPONENT).to_string()
    }

    /// 生成 CSS data URI
    pub fn css_data_uri(css: &str) -> String {
        format!("{}{}", CSS_DATA_URI_PREFIX, Self::encode_component(css))
    }
}
