//! # 文件系统触发器模块
//!
//! ## 设计思路
//!
//! 目录监听回调只做两件事：过滤创建事件、把路径送进有界队列。
//! 真正的处理放在独立消费线程里，事件突发被队列吸收，
//! 回调永远不会被慢速处理拖住。
//!
//! 消费线程按顺序执行：文件名模式过滤 → 静置延迟（等截图程序写完）→
//! 通过派发守卫取票 → 把变换丢到工作线程执行。变换在工作线程上运行，
//! 单张图片卡住只占用它自己的身份槽位，不影响后续事件的检测与跳过。
//!
//! 已知空档：静置延迟结束后不会重新校验文件完整性，写入方慢于延迟时
//! 仍可能读到半写文件。
//!
//! ## 实现思路
//!
//! - `notify` 推荐监听器 + `mpsc::sync_channel` 有界队列，队列满时丢弃并告警。
//! - 消费线程带超时收取，停止令牌在一个收取周期内生效；静置延迟同样
//!   复用令牌等待，停止时不会被延迟卡住。
//! - 工作线程持有 RAII 票据，成功失败乃至 panic 都会释放身份。

mod patterns;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::clipboard::{ClipboardBridge, ClipboardCapability};
use crate::config::AppConfig;
use crate::dispatch::DispatchGuard;
use crate::error::AppError;
use crate::processor::RoundedImageService;
use crate::shutdown::ShutdownToken;

use patterns::PatternSet;

/// 有界事件队列容量，吸收截图程序的突发写入。
const EVENT_QUEUE_CAPACITY: usize = 256;
/// 消费线程检查停止信号的节拍。
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// 文件系统触发器：监听器与消费线程的组合。
pub struct FilesystemTrigger {
    watcher: RecommendedWatcher,
    worker: JoinHandle<()>,
}

impl FilesystemTrigger {
    /// 启动目录监听与消费线程。
    pub fn start(
        config: AppConfig,
        guard: Arc<DispatchGuard>,
        service: Arc<RoundedImageService>,
        bridge: Arc<ClipboardBridge>,
        capability: ClipboardCapability,
        shutdown: ShutdownToken,
    ) -> Result<Self, AppError> {
        let folder = config.screenshot_folder_path();
        let pattern_set = PatternSet::compile(&config.file_patterns);

        let (tx, rx) = mpsc::sync_channel::<PathBuf>(EVENT_QUEUE_CAPACITY);

        // 回调只做过滤与入队，处理全部交给消费线程
        let mut watcher = notify::recommended_watcher(
            move |result: Result<Event, notify::Error>| match result {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Create(_)) {
                        return;
                    }
                    for path in event.paths {
                        match tx.try_send(path) {
                            Ok(()) => {}
                            Err(mpsc::TrySendError::Full(path)) => {
                                log::warn!("⚠️ 事件队列已满，丢弃：{}", path.display());
                            }
                            Err(mpsc::TrySendError::Disconnected(_)) => {}
                        }
                    }
                }
                Err(err) => log::error!("❌ 文件系统监听错误：{}", err),
            },
        )
        .map_err(|e| AppError::Setup(format!("创建文件系统监听失败：{}", e)))?;

        watcher
            .watch(&folder, RecursiveMode::NonRecursive)
            .map_err(|e| {
                AppError::Setup(format!("监听目录失败：{}（{}）", folder.display(), e))
            })?;

        log::info!("🔍 文件系统监听已启动：{}", folder.display());
        log::info!("🎯 文件名模式：{:?}", pattern_set.describe());

        let worker = thread::Builder::new()
            .name("fs-trigger".to_string())
            .spawn(move || {
                consume_events(rx, pattern_set, config, guard, service, bridge, capability, shutdown);
            })
            .map_err(|e| AppError::Setup(format!("启动文件事件处理线程失败：{}", e)))?;

        Ok(Self { watcher, worker })
    }

    /// 停止监听并等待消费线程真正退出。
    ///
    /// 调用方需要先发出停止信号；这里负责释放监听器并 join 消费线程。
    pub fn join(self) {
        drop(self.watcher);
        if self.worker.join().is_err() {
            log::error!("❌ 文件事件处理线程异常退出");
        }
    }
}

/// 消费线程主循环。
#[allow(clippy::too_many_arguments)]
fn consume_events(
    rx: Receiver<PathBuf>,
    pattern_set: PatternSet,
    config: AppConfig,
    guard: Arc<DispatchGuard>,
    service: Arc<RoundedImageService>,
    bridge: Arc<ClipboardBridge>,
    capability: ClipboardCapability,
    shutdown: ShutdownToken,
) {
    let settle_delay = Duration::from_millis(config.processing_delay_ms);

    loop {
        if shutdown.is_signalled() {
            break;
        }

        let path = match rx.recv_timeout(SHUTDOWN_POLL_INTERVAL) {
            Ok(path) => path,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !pattern_set.matches(file_name) {
            log::debug!("⏭️ 文件名未命中任何模式：{}", file_name);
            continue;
        }
        log::info!("📸 检测到新截图：{}", file_name);

        // 等待截图程序完成写入；等待期间收到停止信号则直接退出
        if !settle_delay.is_zero() && shutdown.wait_timeout(settle_delay) {
            break;
        }

        dispatch_path(path, &config, &guard, &service, &bridge, capability);
    }

    log::info!("🔍 文件事件处理线程已停止");
}

/// 取票并把变换交给工作线程。
fn dispatch_path(
    path: PathBuf,
    config: &AppConfig,
    guard: &Arc<DispatchGuard>,
    service: &Arc<RoundedImageService>,
    bridge: &Arc<ClipboardBridge>,
    capability: ClipboardCapability,
) {
    let Some(ticket) = guard.acquire(&path) else {
        log::debug!("⏭️ 同一路径已在处理中，跳过：{}", path.display());
        return;
    };

    let service = Arc::clone(service);
    let bridge = Arc::clone(bridge);
    let auto_copy =
        config.auto_copy_to_clipboard && capability == ClipboardCapability::Capable;

    let spawn_result = thread::Builder::new()
        .name("transform".to_string())
        .spawn(move || {
            // 票据随线程结束释放，成功失败皆然
            let _ticket = ticket;

            if !path.exists() {
                log::warn!("⚠️ 文件已不存在：{}", path.display());
                return;
            }

            match service.transform_file(&path) {
                Ok(artifact) => {
                    if auto_copy {
                        if let Err(err) = bridge.write_image_file(&artifact.path) {
                            log::error!(
                                "❌ 写入剪贴板失败：{}（stage=clipboard, path={}）",
                                err,
                                artifact.path.display()
                            );
                        }
                    }
                    if artifact.ephemeral {
                        if let Err(err) = std::fs::remove_file(&artifact.path) {
                            log::warn!(
                                "⚠️ 清理临时产物失败：{}（{}）",
                                artifact.path.display(),
                                err
                            );
                        }
                    }
                    log::info!("🎉 截图处理完成：{}", path.display());
                }
                Err(err) => {
                    log::error!(
                        "❌ 处理截图失败：{}（stage=transform, path={}）",
                        err,
                        path.display()
                    );
                }
            }
        });

    if let Err(err) = spawn_result {
        log::error!("❌ 启动处理线程失败：{}", err);
    }
}
