//! 配置同步模块
//!
//! 提供 static / autosave / autoreload 三种模式的配置文件同步

pub mod engine;
pub mod options;

pub use engine::{open_config, ConfigSync, SyncEvent};
pub use options::{SyncMode, SyncOptions, DEFAULT_EVENT_CAPACITY, DEFAULT_TICK_INTERVAL};
