//! # Screenshot Rounder — 应用入口
//!
//! 本文件仅负责 CLI 参数解析、日志初始化与生命周期托管。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use screenshot_rounder::config::AppConfig;
use screenshot_rounder::orchestrator::Orchestrator;

#[derive(Parser, Debug)]
#[command(
    name = "screenshot-rounder",
    version,
    about = "监控截图目录与剪贴板，自动为新图片添加圆角"
)]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// 处理单个文件后退出（绕过监控循环与静置延迟）
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// 禁用监控循环
    #[arg(long)]
    no_monitor: bool,

    /// 仅验证启动条件后退出
    #[arg(long)]
    test: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            log::error!("❌ 加载配置失败：{}", err);
            return ExitCode::FAILURE;
        }
    };

    let orchestrator = match Orchestrator::new(config) {
        Ok(orchestrator) => orchestrator,
        Err(err) => {
            log::error!("❌ 启动验证失败：{}", err);
            return ExitCode::FAILURE;
        }
    };

    if cli.test {
        log::info!("✅ 启动条件验证通过");
        return ExitCode::SUCCESS;
    }

    if let Some(file) = cli.file {
        return match orchestrator.process_single_file(&file) {
            Ok(artifact) => {
                log::info!("🎉 单文件处理完成：{}", artifact.path.display());
                ExitCode::SUCCESS
            }
            Err(err) => {
                log::error!("❌ 单文件处理失败：{}", err);
                ExitCode::FAILURE
            }
        };
    }

    if cli.no_monitor {
        log::info!("📴 监控已禁用，使用 --file 处理单个文件");
        return ExitCode::SUCCESS;
    }

    if let Err(err) = orchestrator.start() {
        log::error!("❌ 启动监控失败：{}", err);
        return ExitCode::FAILURE;
    }
    log::info!("🎯 Screenshot Rounder 正在运行，按 Ctrl+C 停止");

    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("❌ 等待停止信号失败：{}", err);
    }

    orchestrator.stop();
    ExitCode::SUCCESS
}
