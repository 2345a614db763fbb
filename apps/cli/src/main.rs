//! # COGIP Planner
//!
//! 规划器命令行入口。入站事件从标准输入逐行读取（JSON），
//! 出站事件逐行写到标准输出，日志写到标准错误。
//!
//! ```bash
//! # 使用默认配置
//! cogip-planner
//!
//! # 指定配置文件并覆盖机器人宽度
//! cogip-planner --config planner.toml --robot-width 250 --debug
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::thread;
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod io;

use cogip_planner::Planner;
use config::PropertyOverrides;

/// COGIP 规划器
#[derive(Parser, Debug)]
#[command(name = "cogip-planner")]
#[command(about = "Action scheduler and path planner for COGIP robots", long_about = None)]
#[command(version)]
struct Cli {
    /// 配置文件（TOML）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long)]
    debug: bool,

    #[command(flatten)]
    overrides: PropertyOverrides,
}

fn init_logging(debug: bool) -> Result<()> {
    let level = if debug { "debug" } else { "info" };
    let mut filter = EnvFilter::from_default_env();
    for target in ["cogip_cli", "cogip_planner", "cogip_avoidance"] {
        filter = filter.add_directive(format!("{target}={level}").parse()?);
    }
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug)?;

    let properties = config::load_properties(cli.config.as_deref(), &cli.overrides)?;
    info!("Properties: {:?}", properties);

    let planner = Planner::new(properties);
    let outbox = planner.outbox();
    let (planner_tx, planner_rx) = mpsc::unbounded_channel();
    let router = planner.router(planner_tx);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        eprintln!("\nReceived interrupt signal. Shutting down...");
        let _ = shutdown_tx.send(true);
    })
    .context("Failed to set signal handler")?;

    // 标准输入 EOF 时路由被丢弃，规划器随之退出
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || io::read_inbound(std::io::stdin().lock(), router))
        .context("Failed to spawn input thread")?;
    let writer = tokio::spawn(io::write_outbound(outbox));

    planner.run(planner_rx, shutdown_rx).await?;
    writer.await??;
    info!("Planner stopped");
    Ok(())
}
