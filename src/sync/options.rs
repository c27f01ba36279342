//! 同步选项

use crate::codec::Format;
use crate::error::{ConfKeeperError, Result};
use std::fmt;
use std::time::Duration;

/// 默认同步周期
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

/// 默认事件通道容量
pub const DEFAULT_EVENT_CAPACITY: usize = 32;

/// 同步模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// 只在打开时读取一次
    Static,
    /// 周期性将内存中的修改写回文件
    AutoSave,
    /// 周期性从文件重新加载
    AutoReload,
}

impl SyncMode {
    /// 是否需要后台任务
    pub fn is_periodic(&self) -> bool {
        !matches!(self, SyncMode::Static)
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncMode::Static => write!(f, "static"),
            SyncMode::AutoSave => write!(f, "autosave"),
            SyncMode::AutoReload => write!(f, "autoreload"),
        }
    }
}

/// 打开配置文件时的选项
#[derive(Debug, Clone)]
pub struct SyncOptions {
    format: Option<Format>,
    autosave: bool,
    autoreload: bool,
    tick_interval: Duration,
    event_capacity: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            format: None,
            autosave: false,
            autoreload: false,
            tick_interval: DEFAULT_TICK_INTERVAL,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl SyncOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 显式指定格式，覆盖扩展名推断
    pub fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn autosave(mut self, enabled: bool) -> Self {
        self.autosave = enabled;
        self
    }

    pub fn autoreload(mut self, enabled: bool) -> Self {
        self.autoreload = enabled;
        self
    }

    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn explicit_format(&self) -> Option<Format> {
        self.format
    }

    pub fn interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn capacity(&self) -> usize {
        self.event_capacity.max(1)
    }

    /// 解析同步模式
    ///
    /// # 返回
    /// * `Result<SyncMode>` - 同时启用 autosave 与 autoreload，或周期为零时返回 `Configuration`
    pub fn mode(&self) -> Result<SyncMode> {
        let mode = match (self.autosave, self.autoreload) {
            (true, true) => {
                return Err(ConfKeeperError::Configuration(
                    "autosave 与 autoreload 不能同时启用".to_string(),
                ))
            }
            (true, false) => SyncMode::AutoSave,
            (false, true) => SyncMode::AutoReload,
            (false, false) => SyncMode::Static,
        };

        if mode.is_periodic() && self.tick_interval.is_zero() {
            return Err(ConfKeeperError::Configuration(
                "同步周期必须大于0".to_string(),
            ));
        }

        Ok(mode)
    }
}
