//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use crate::codec::Format;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ConfKeeper - 配置文件读写与同步工具
#[derive(Parser, Debug, Clone)]
#[command(
    name = "confkeeper",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 日志级别
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        global = true,
        env = "CONFKEEPER_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// 以JSON格式输出日志
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// 日志写入该文件而非标准错误
    #[arg(long, global = true, env = "CONFKEEPER_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// 子命令
    #[command(subcommand)]
    pub command: Commands,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

/// 命令行中的格式参数
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Json,
    #[value(alias = "yml")]
    Yaml,
    Toml,
}

impl From<FormatArg> for Format {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => Format::Json,
            FormatArg::Yaml => Format::Yaml,
            FormatArg::Toml => Format::Toml,
        }
    }
}

/// 子命令
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 解析配置文件并输出
    Show {
        /// 配置文件路径
        file: PathBuf,

        /// 输入格式，默认按扩展名推断
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// 输出格式，默认与输入相同
        #[arg(short, long, value_enum)]
        to: Option<FormatArg>,
    },

    /// 在格式之间转换配置文件
    Convert {
        /// 输入文件
        input: PathBuf,

        /// 输出文件
        output: PathBuf,

        /// 输入格式，默认按扩展名推断
        #[arg(long, value_enum)]
        from: Option<FormatArg>,

        /// 输出格式，默认按扩展名推断
        #[arg(long, value_enum)]
        to: Option<FormatArg>,
    },

    /// 检查配置文件能否解析，并列出其中的配置类标记
    Check {
        /// 配置文件路径
        file: PathBuf,

        /// 输入格式，默认按扩展名推断
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
    },

    /// 监视配置文件，每次重新加载时输出内容
    Watch {
        /// 配置文件路径
        file: PathBuf,

        /// 输入格式，默认按扩展名推断
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,

        /// 检查周期（毫秒）
        #[arg(short, long, default_value_t = 1000)]
        interval_ms: u64,
    },
}
