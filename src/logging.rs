//! 日志系统模块
//!
//! 基于 `tracing` 的结构化日志，`log` 门面的记录通过 `tracing-log` 桥接。
//! 全局订阅者每个进程只安装一次，重复调用只更新记录的配置。

use anyhow::{anyhow, Context};
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer};

/// 日志配置
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// 默认日志级别
    pub level: LevelFilter,
    /// 日志文件路径，仅在不输出到控制台时使用
    pub file_path: Option<PathBuf>,
    /// 是否输出到控制台（stderr）
    pub console: bool,
    /// 是否使用JSON格式
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            file_path: None,
            console: true,
            json_format: false,
        }
    }
}

impl LogConfig {
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    pub fn json(mut self, enabled: bool) -> Self {
        self.json_format = enabled;
        self
    }

    /// 写入文件而非控制台
    pub fn to_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.file_path = Some(path.into());
        self.console = false;
        self
    }

    /// 写入文件时关闭控制台输出，`None` 保持原样
    pub fn log_file<P: Into<PathBuf>>(self, path: Option<P>) -> Self {
        match path {
            Some(path) => self.to_file(path),
            None => self,
        }
    }

    /// 构建过滤器：`RUST_LOG` 打底，配置中的级别覆盖其上
    fn env_filter(&self) -> EnvFilter {
        EnvFilter::from_default_env().add_directive(level_directive(self.level))
    }
}

/// 全局日志初始化状态
#[derive(Debug, Default)]
struct GlobalLoggingState {
    installed: bool,
    current_config: Option<LogConfig>,
}

static GLOBAL_LOGGING_STATE: OnceLock<Mutex<GlobalLoggingState>> = OnceLock::new();

fn global_state() -> &'static Mutex<GlobalLoggingState> {
    GLOBAL_LOGGING_STATE.get_or_init(|| Mutex::new(GlobalLoggingState::default()))
}

/// 日志系统
#[derive(Debug, Clone)]
pub struct LoggingSystem {
    config: LogConfig,
}

impl LoggingSystem {
    /// 初始化日志系统
    ///
    /// # 参数
    /// * `config` - 日志配置
    ///
    /// # 返回
    /// * `anyhow::Result<LoggingSystem>` - 已安装订阅者时直接返回成功
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<Self> {
        let mut state = global_state()
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if !state.installed {
            Self::install(&config)?;
            state.installed = true;
        }
        state.current_config = Some(config.clone());

        Ok(Self { config })
    }

    fn install(config: &LogConfig) -> anyhow::Result<()> {
        init_log_tracer()?;

        let filter = config.env_filter();
        let layer = match (&config.file_path, config.console) {
            (Some(path), false) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("创建日志文件失败: {}", path.display()))?;
                let layer = fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_timer(fmt::time::ChronoUtc::rfc_3339());
                if config.json_format {
                    layer.json().boxed()
                } else {
                    layer.boxed()
                }
            }
            _ => {
                let layer = fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_timer(fmt::time::ChronoUtc::rfc_3339())
                    .with_target(true);
                if config.json_format {
                    layer.json().boxed()
                } else {
                    layer.with_ansi(true).boxed()
                }
            }
        };

        match registry().with(filter).with(layer).try_init() {
            Ok(()) => {
                tracing::debug!("日志系统初始化完成: {:?}", config);
                Ok(())
            }
            // 全局订阅者或 log 桥接已被安装
            Err(e) if is_already_installed(&e.to_string()) => Ok(()),
            Err(e) => Err(anyhow!("tracing subscriber初始化失败: {e}")),
        }
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// 检查日志系统是否已初始化
    pub fn is_initialized() -> bool {
        GLOBAL_LOGGING_STATE.get().is_some_and(|state| {
            state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .installed
        })
    }

    /// 获取最近一次初始化使用的配置
    pub fn current_config() -> Option<LogConfig> {
        GLOBAL_LOGGING_STATE.get().and_then(|state| {
            state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .current_config
                .clone()
        })
    }

    /// 清除记录的配置（主要用于测试），已安装的订阅者不会被卸载
    #[cfg(test)]
    pub(crate) fn reset_for_testing() {
        if let Some(state) = GLOBAL_LOGGING_STATE.get() {
            state
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .current_config = None;
        }
    }
}

fn is_already_installed(message: &str) -> bool {
    message.contains("already been set") || message.contains("already initialized")
}

/// `log` crate 到 tracing 的桥接，只初始化一次
fn init_log_tracer() -> anyhow::Result<()> {
    static LOG_TRACER_INIT: OnceLock<Result<(), String>> = OnceLock::new();

    LOG_TRACER_INIT
        .get_or_init(|| tracing_log::LogTracer::init().map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|e| anyhow!("LogTracer初始化失败: {e}"))?;
    Ok(())
}

fn level_directive(level: LevelFilter) -> Directive {
    match level {
        LevelFilter::Off => tracing_subscriber::filter::LevelFilter::OFF.into(),
        LevelFilter::Error => tracing::Level::ERROR.into(),
        LevelFilter::Warn => tracing::Level::WARN.into(),
        LevelFilter::Info => tracing::Level::INFO.into(),
        LevelFilter::Debug => tracing::Level::DEBUG.into(),
        LevelFilter::Trace => tracing::Level::TRACE.into(),
    }
}
