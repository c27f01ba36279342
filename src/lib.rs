//! ConfKeeper - 配置文件读写与同步库
//!
//! 这是一个用Rust编写的配置管理库，支持：
//! - 配置类注册与带约束的字段校验
//! - JSON/YAML/TOML 三种格式的读写，嵌套配置类实例自动重建
//! - autosave / autoreload 周期同步
//! - 结构化日志记录

pub mod cli;
pub mod codec;
pub mod error;
pub mod logging;
pub mod schema;
pub mod sync;
pub mod value;

// 重新导出主要类型
pub use codec::{ConfigCodec, Format};
pub use error::{ConfKeeperError, Location, ParseError, Result, ValidationError};
pub use schema::{
    ClassBuilder, ClassDescriptor, ClassRegistry, ConfigInstance, Constraints, FieldKind,
    FieldSpec, ValidatedField, CLASS_MARKER,
};
pub use sync::{open_config, ConfigSync, SyncEvent, SyncMode, SyncOptions};
pub use value::{Mapping, Snapshot, Value};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
