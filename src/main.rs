//! ConfKeeper 主程序入口

use anyhow::{Context, Result};
use clap::Parser;
use confkeeper::cli::Args;
use confkeeper::logging::{LogConfig, LoggingSystem};
use tracing::{debug, error};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_config = LogConfig::default()
        .with_level(args.log_level.into())
        .json(args.json_logs)
        .log_file(args.log_file.clone());
    LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    debug!("ConfKeeper v{} 启动", confkeeper::VERSION);

    let command = args.command.into_command();
    if let Err(e) = command.execute().await {
        error!("命令执行失败: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
