//! 命令处理逻辑
//!
//! 各子命令只是对编解码器与同步引擎的薄封装。命令行没有注册任何配置类，
//! 因此 `show`、`convert`、`check` 读取时保留类标记原样输出。

use crate::cli::args::Commands;
use crate::codec::{self, Format};
use crate::schema::ClassRegistry;
use crate::sync::{ConfigSync, SyncEvent, SyncOptions};
use crate::value::Snapshot;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self) -> Result<()>;
}

impl Commands {
    /// 转换为对应的命令处理器
    pub fn into_command(self) -> Box<dyn Command> {
        match self {
            Commands::Show { file, format, to } => Box::new(ShowCommand {
                file,
                format: format.map(Format::from),
                to: to.map(Format::from),
            }),
            Commands::Convert {
                input,
                output,
                from,
                to,
            } => Box::new(ConvertCommand {
                input,
                output,
                from: from.map(Format::from),
                to: to.map(Format::from),
            }),
            Commands::Check { file, format } => Box::new(CheckCommand {
                file,
                format: format.map(Format::from),
            }),
            Commands::Watch {
                file,
                format,
                interval_ms,
            } => Box::new(WatchCommand {
                file,
                format: format.map(Format::from),
                interval: Duration::from_millis(interval_ms),
            }),
        }
    }
}

/// 输出配置文件内容
#[derive(Debug, Clone)]
pub struct ShowCommand {
    pub file: PathBuf,
    pub format: Option<Format>,
    pub to: Option<Format>,
}

impl ShowCommand {
    /// 生成输出文本
    pub async fn render(&self) -> Result<String> {
        let input = Format::resolve(&self.file, self.format)?;
        let snapshot = codec::read_file_raw(&self.file, Some(input))
            .await
            .with_context(|| format!("读取配置文件失败: {}", self.file.display()))?;
        let output = self.to.unwrap_or(input);
        Ok(codec::encode(&snapshot, output)?)
    }
}

#[async_trait]
impl Command for ShowCommand {
    async fn execute(&self) -> Result<()> {
        print_document(&self.render().await?);
        Ok(())
    }
}

/// 转换配置文件格式
#[derive(Debug, Clone)]
pub struct ConvertCommand {
    pub input: PathBuf,
    pub output: PathBuf,
    pub from: Option<Format>,
    pub to: Option<Format>,
}

#[async_trait]
impl Command for ConvertCommand {
    async fn execute(&self) -> Result<()> {
        let snapshot = codec::read_file_raw(&self.input, self.from)
            .await
            .with_context(|| format!("读取配置文件失败: {}", self.input.display()))?;
        let to = Format::resolve(&self.output, self.to)?;
        codec::write_file(&self.output, &snapshot, Some(to))
            .await
            .with_context(|| format!("写入配置文件失败: {}", self.output.display()))?;

        info!(
            "已转换 {} -> {} ({})",
            self.input.display(),
            self.output.display(),
            to
        );
        Ok(())
    }
}

/// 检查配置文件
#[derive(Debug, Clone)]
pub struct CheckCommand {
    pub file: PathBuf,
    pub format: Option<Format>,
}

impl CheckCommand {
    /// 生成检查报告
    pub async fn report(&self) -> Result<String> {
        let format = Format::resolve(&self.file, self.format)?;
        let snapshot = codec::read_file_raw(&self.file, Some(format))
            .await
            .with_context(|| format!("配置文件无效: {}", self.file.display()))?;

        let mut report = format!(
            "{}: {} 格式有效，顶层键 {} 个\n",
            self.file.display(),
            format,
            snapshot.len()
        );
        let markers = codec::class_markers(&snapshot);
        if markers.is_empty() {
            report.push_str("未发现配置类标记\n");
        } else {
            report.push_str("配置类标记:\n");
            for name in markers {
                report.push_str(&format!("  - {name}\n"));
            }
        }
        Ok(report)
    }
}

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self) -> Result<()> {
        print!("{}", self.report().await?);
        Ok(())
    }
}

/// 监视配置文件
#[derive(Debug, Clone)]
pub struct WatchCommand {
    pub file: PathBuf,
    pub format: Option<Format>,
    pub interval: Duration,
}

#[async_trait]
impl Command for WatchCommand {
    async fn execute(&self) -> Result<()> {
        let mut options = SyncOptions::new()
            .autoreload(true)
            .tick_interval(self.interval);
        if let Some(format) = self.format {
            options = options.format(format);
        }

        let mut engine = ConfigSync::open(&self.file, Arc::new(ClassRegistry::new()), options)
            .await
            .with_context(|| format!("打开配置文件失败: {}", self.file.display()))?;
        let mut events = engine.subscribe();

        print_snapshot(&engine.snapshot().await, engine.format())?;
        info!("正在监视 {}，按 Ctrl+C 退出", self.file.display());

        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal.context("监听中断信号失败")?;
                    info!("收到中断信号，停止监视");
                    break;
                }
                event = events.recv() => match event {
                    Ok(SyncEvent::Reloaded { version }) => {
                        info!("配置已变更，版本: {}", version);
                        print_snapshot(&engine.snapshot().await, engine.format())?;
                    }
                    Ok(SyncEvent::Saved { .. }) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("跳过了 {} 个同步事件", skipped);
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        engine.stop().await;
        Ok(())
    }
}

fn print_snapshot(snapshot: &Snapshot, format: Format) -> Result<()> {
    print_document(&codec::encode(snapshot, format)?);
    Ok(())
}

/// JSON 输出不带结尾换行，补齐后再打印
fn print_document(text: &str) {
    if text.ends_with('\n') {
        print!("{text}");
    } else {
        println!("{text}");
    }
}
