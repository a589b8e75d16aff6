//! PageMod 构造选项
//! ModOptions 为原始选项记录（可从JSON反序列化），ModConfig 为校验后的配置

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::{PageModError, PageModResult};
use crate::host::WorkerRef;

/// `attachTo` 合法取值
pub const VALID_ATTACH_TO: [&str; 3] = ["existing", "top", "frame"];

/// `contentStyleFile` 允许的本地URL协议
const LOCAL_SCHEMES: [&str; 5] = ["resource", "file", "data", "chrome", "jar"];

pub type AttachHandler = Rc<dyn Fn(&WorkerRef)>;
pub type ErrorHandler = Rc<dyn Fn(&PageModError)>;

/// 单值或列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            OneOrMany::One(s) => vec![s.clone()],
            OneOrMany::Many(v) => v.clone(),
        }
    }

    fn push(self, item: String) -> Self {
        let mut items = self.to_vec();
        items.push(item);
        OneOrMany::Many(items)
    }
}

/// 注入时机（反序列化经由 `FromStr` 校验）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ContentScriptWhen {
    /// 任何内容解析之前
    Start,
    /// 结构解析完成后（interactive）
    Ready,
    /// 完全加载后（complete）
    #[default]
    End,
}

impl FromStr for ContentScriptWhen {
    type Err = PageModError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(ContentScriptWhen::Start),
            "ready" => Ok(ContentScriptWhen::Ready),
            "end" => Ok(ContentScriptWhen::End),
            other => Err(PageModError::Configuration(format!(
                "`contentScriptWhen` 选项只接受 start、ready、end，实际为：{}",
                other
            ))),
        }
    }
}

impl TryFrom<String> for ContentScriptWhen {
    type Error = PageModError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ContentScriptWhen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ContentScriptWhen::Start => "start",
            ContentScriptWhen::Ready => "ready",
            ContentScriptWhen::End => "end",
        };
        f.write_str(s)
    }
}

/// 注入目标（顶层文档 / 子框架 / 已存在文档）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttachTo {
    pub existing: bool,
    pub top: bool,
    pub frame: bool,
}

impl Default for AttachTo {
    fn default() -> Self {
        Self {
            existing: false,
            top: true,
            frame: true,
        }
    }
}

impl AttachTo {
    /// 解析 `attachTo` 选项：字符串或字符串数组，至少包含 top 或 frame
    pub fn parse(value: Option<&Value>) -> PageModResult<Self> {
        let Some(value) = value else {
            return Ok(Self::default());
        };

        let items: Vec<&Value> = match value {
            Value::String(_) => vec![value],
            Value::Array(items) => items.iter().collect(),
            _ => {
                return Err(PageModError::Configuration(
                    "`attachTo` 选项必须是字符串或字符串数组".to_string(),
                ));
            }
        };

        let mut attach_to = Self {
            existing: false,
            top: false,
            frame: false,
        };
        for item in items {
            match item.as_str() {
                Some("existing") => attach_to.existing = true,
                Some("top") => attach_to.top = true,
                Some("frame") => attach_to.frame = true,
                _ => {
                    return Err(PageModError::Configuration(format!(
                        "`attachTo` 选项只接受以下取值：{}",
                        VALID_ATTACH_TO.join(", ")
                    )));
                }
            }
        }

        if !attach_to.top && !attach_to.frame {
            return Err(PageModError::Configuration(
                "`attachTo` 选项必须至少包含 `top` 或 `frame`".to_string(),
            ));
        }
        Ok(attach_to)
    }
}

/// PageMod 构造选项（字段名与JSON选项一致，camelCase）
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModOptions {
    pub content_script: Option<OneOrMany>,
    pub content_script_file: Option<OneOrMany>,
    pub content_script_options: Option<Value>,
    pub content_script_when: Option<ContentScriptWhen>,
    pub content_style: Option<Value>,
    pub content_style_file: Option<Value>,
    pub include: Option<OneOrMany>,
    pub exclude: Option<OneOrMany>,
    pub attach_to: Option<Value>,
    #[serde(skip)]
    pub on_attach: Option<AttachHandler>,
    #[serde(skip)]
    pub on_error: Option<ErrorHandler>,
}

impl ModOptions {
    pub fn builder() -> ModOptionsBuilder {
        ModOptionsBuilder::new()
    }

    /// 从JSON选项记录解析（回调需另行设置）
    pub fn from_json(json: &str) -> PageModResult<Self> {
        serde_json::from_str(json).map_err(invalid_options)
    }

    pub fn from_value(value: Value) -> PageModResult<Self> {
        serde_json::from_value(value).map_err(invalid_options)
    }
}

impl fmt::Debug for ModOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModOptions")
            .field("content_script", &self.content_script)
            .field("content_script_file", &self.content_script_file)
            .field("content_script_options", &self.content_script_options)
            .field("content_script_when", &self.content_script_when)
            .field("content_style", &self.content_style)
            .field("content_style_file", &self.content_style_file)
            .field("include", &self.include)
            .field("exclude", &self.exclude)
            .field("attach_to", &self.attach_to)
            .field("on_attach", &self.on_attach.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// 选项构建器
#[derive(Default)]
pub struct ModOptionsBuilder {
    options: ModOptions,
}

impl ModOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn append(list: Option<OneOrMany>, item: String) -> Option<OneOrMany> {
        Some(match list {
            Some(list) => list.push(item),
            None => OneOrMany::One(item),
        })
    }

    fn append_value(value: Option<Value>, item: String) -> Option<Value> {
        let mut items = match value {
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
            None => Vec::new(),
        };
        items.push(Value::String(item));
        Some(Value::Array(items))
    }

    pub fn include(mut self, rule: impl Into<String>) -> Self {
        self.options.include = Self::append(self.options.include.take(), rule.into());
        self
    }

    pub fn exclude(mut self, rule: impl Into<String>) -> Self {
        self.options.exclude = Self::append(self.options.exclude.take(), rule.into());
        self
    }

    pub fn content_script(mut self, source: impl Into<String>) -> Self {
        self.options.content_script =
            Self::append(self.options.content_script.take(), source.into());
        self
    }

    pub fn content_script_file(mut self, uri: impl Into<String>) -> Self {
        self.options.content_script_file =
            Self::append(self.options.content_script_file.take(), uri.into());
        self
    }

    pub fn content_script_options(mut self, options: Value) -> Self {
        self.options.content_script_options = Some(options);
        self
    }

    pub fn content_script_when(mut self, when: ContentScriptWhen) -> Self {
        self.options.content_script_when = Some(when);
        self
    }

    pub fn content_style(mut self, css: impl Into<String>) -> Self {
        self.options.content_style =
            Self::append_value(self.options.content_style.take(), css.into());
        self
    }

    pub fn content_style_file(mut self, uri: impl Into<String>) -> Self {
        self.options.content_style_file =
            Self::append_value(self.options.content_style_file.take(), uri.into());
        self
    }

    pub fn attach_to<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let targets = targets
            .into_iter()
            .map(|t| Value::String(t.into()))
            .collect();
        self.options.attach_to = Some(Value::Array(targets));
        self
    }

    pub fn on_attach<F>(mut self, handler: F) -> Self
    where
        F: Fn(&WorkerRef) + 'static,
    {
        self.options.on_attach = Some(Rc::new(handler));
        self
    }

    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&PageModError) + 'static,
    {
        self.options.on_error = Some(Rc::new(handler));
        self
    }

    pub fn build(self) -> ModOptions {
        self.options
    }
}

/// 校验后的 mod 配置
#[derive(Debug, Clone)]
pub struct ModConfig {
    pub content_script: Vec<String>,
    pub content_script_file: Vec<String>,
    pub content_script_options: Option<Value>,
    pub content_script_when: ContentScriptWhen,
    pub content_style: Vec<String>,
    pub content_style_file: Vec<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub attach_to: AttachTo,
}

impl ModConfig {
    /// 校验选项；不产生任何副作用
    pub fn from_options(options: &ModOptions) -> PageModResult<Self> {
        let content_style = string_list(
            options.content_style.as_ref(),
            "`contentStyle` 选项必须是字符串或字符串数组",
        )?;

        let content_style_file_message = "`contentStyleFile` 选项必须是本地URL或本地URL数组";
        let content_style_file =
            string_list(options.content_style_file.as_ref(), content_style_file_message)?;
        if !content_style_file.iter().all(|uri| is_local_url(uri)) {
            return Err(PageModError::Configuration(
                content_style_file_message.to_string(),
            ));
        }

        let content_script_file = list(&options.content_script_file);
        if !content_script_file.iter().all(|uri| is_local_url(uri)) {
            return Err(PageModError::Configuration(
                "`contentScriptFile` 选项必须是本地URL或本地URL数组".to_string(),
            ));
        }

        let attach_to = AttachTo::parse(options.attach_to.as_ref())?;

        let include = options
            .include
            .as_ref()
            .map(OneOrMany::to_vec)
            .ok_or_else(|| {
                PageModError::Configuration("缺少 `include` 选项".to_string())
            })?;

        Ok(Self {
            content_script: list(&options.content_script),
            content_script_file,
            content_script_options: options.content_script_options.clone(),
            content_script_when: options.content_script_when.unwrap_or_default(),
            content_style,
            content_style_file,
            include,
            exclude: list(&options.exclude),
            attach_to,
        })
    }
}

/// 选项记录结构不合法（类型错误、取值非法）同样属于配置错误
fn invalid_options(e: serde_json::Error) -> PageModError {
    PageModError::Configuration(format!("选项解析失败：{}", e))
}

fn list(value: &Option<OneOrMany>) -> Vec<String> {
    value.as_ref().map(OneOrMany::to_vec).unwrap_or_default()
}

/// 字符串或字符串数组
fn string_list(value: Option<&Value>, message: &str) -> PageModResult<Vec<String>> {
    let invalid = || PageModError::Configuration(message.to_string());
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        Some(_) => Err(invalid()),
    }
}

fn is_local_url(uri: &str) -> bool {
    Url::parse(uri)
        .map(|url| LOCAL_SCHEMES.contains(&url.scheme()))
        .unwrap_or(false)
}
