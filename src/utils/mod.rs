//! 工具模块：事件分发、URI编码
pub mod event_emitter;
pub mod uri_encoder;

pub use self::event_emitter::{EventEmitter, ListenerId};
pub use self::uri_encoder::{UriEncoder, CSS_DATA_URI_PREFIX};
