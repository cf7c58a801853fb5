//! # 生命周期编排模块
//!
//! ## 设计思路
//!
//! `Orchestrator` 把配置、剪贴板桥、派发守卫与处理服务组装起来，
//! 统一管理两条触发循环的启动与停止：
//! - 构造时完成启动验证（监控目录缺失是致命错误）与一次性的
//!   剪贴板能力探测；能力缺失时剪贴板触发器整条不启动，
//!   文件系统触发路径也不再尝试写回。
//! - `start` 对已启动状态是 no-op；`stop` 发出停止令牌后
//!   join 两条循环，等它们真正退出才返回。
//! - 在途变换不会被强行打断，只占用各自身份的守卫槽位。
//!
//! ## 实现思路
//!
//! 运行态（令牌 + 两个句柄）集中放在一个 `Mutex<Option<...>>` 里，
//! 启动与停止天然互斥，重复调用的判定也只看这一处状态。

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use crate::clipboard::poller::ClipboardTrigger;
use crate::clipboard::{ClipboardBridge, ClipboardCapability};
use crate::config::AppConfig;
use crate::dispatch::DispatchGuard;
use crate::error::AppError;
use crate::processor::{OutputArtifact, RoundedImageService};
use crate::shutdown::ShutdownToken;
use crate::watcher::FilesystemTrigger;

/// 正在运行的触发循环句柄。
struct RunningTriggers {
    shutdown: ShutdownToken,
    filesystem: Option<FilesystemTrigger>,
    clipboard: Option<JoinHandle<()>>,
}

/// 应用编排器。
pub struct Orchestrator {
    config: AppConfig,
    capability: ClipboardCapability,
    bridge: Arc<ClipboardBridge>,
    guard: Arc<DispatchGuard>,
    service: Arc<RoundedImageService>,
    running: Mutex<Option<RunningTriggers>>,
}

impl Orchestrator {
    /// 创建编排器并完成启动验证与能力探测。
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        validate_setup(&config)?;

        let capability = ClipboardBridge::probe_capability();
        if capability == ClipboardCapability::Capable {
            log::info!("✅ 剪贴板功能可用");
        }

        Ok(Self {
            service: Arc::new(RoundedImageService::new(config.clone())),
            bridge: Arc::new(ClipboardBridge::new()),
            guard: Arc::new(DispatchGuard::new()),
            config,
            capability,
            running: Mutex::new(None),
        })
    }

    /// 当前剪贴板能力。
    pub fn capability(&self) -> ClipboardCapability {
        self.capability
    }

    fn lock_running(&self) -> MutexGuard<'_, Option<RunningTriggers>> {
        match self.running.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("运行态锁中毒，继续使用恢复数据");
                poisoned.into_inner()
            }
        }
    }

    /// 启动两条触发循环；对已启动状态重复调用是 no-op。
    pub fn start(&self) -> Result<(), AppError> {
        let mut running = self.lock_running();
        if running.is_some() {
            log::debug!("触发循环已在运行，忽略重复启动");
            return Ok(());
        }

        let shutdown = ShutdownToken::new();

        let filesystem = if self.config.monitor_enabled {
            Some(FilesystemTrigger::start(
                self.config.clone(),
                Arc::clone(&self.guard),
                Arc::clone(&self.service),
                Arc::clone(&self.bridge),
                self.capability,
                shutdown.clone(),
            )?)
        } else {
            log::info!("📴 文件系统监控在配置中被禁用");
            None
        };

        let clipboard = if should_start_clipboard_trigger(self.capability, &self.config) {
            let trigger = ClipboardTrigger::new(
                self.config.clone(),
                Arc::clone(&self.bridge),
                Arc::clone(&self.guard),
                Arc::clone(&self.service),
                shutdown.clone(),
            );
            match thread::Builder::new()
                .name("clipboard-poll".to_string())
                .spawn(move || trigger.run())
            {
                Ok(handle) => Some(handle),
                Err(err) => {
                    log::error!("❌ 启动剪贴板轮询线程失败：{}", err);
                    None
                }
            }
        } else {
            if self.config.monitor_clipboard {
                log::warn!("📴 剪贴板能力缺失，剪贴板监控不启动");
            } else {
                log::info!("📴 剪贴板监控在配置中被禁用");
            }
            None
        };

        *running = Some(RunningTriggers {
            shutdown,
            filesystem,
            clipboard,
        });
        Ok(())
    }

    /// 停止两条触发循环并等待它们真正退出。
    pub fn stop(&self) {
        let Some(triggers) = self.lock_running().take() else {
            return;
        };

        log::info!("⏹️ 正在停止监控...");
        triggers.shutdown.signal();

        if let Some(filesystem) = triggers.filesystem {
            filesystem.join();
        }
        if let Some(clipboard) = triggers.clipboard {
            if clipboard.join().is_err() {
                log::error!("❌ 剪贴板轮询线程异常退出");
            }
        }

        log::info!("✅ 监控已停止");
    }

    /// 手动处理单个文件：同步执行完整变换，按配置写回剪贴板。
    ///
    /// 与触发循环共用同一派发守卫，身份为规范化后的绝对路径。
    pub fn process_single_file(&self, path: &Path) -> Result<OutputArtifact, AppError> {
        if !path.exists() {
            return Err(AppError::Setup(format!("文件不存在：{}", path.display())));
        }
        let identity = path.canonicalize()?;

        let Some(_ticket) = self.guard.acquire(&identity) else {
            return Err(AppError::AlreadyInFlight(identity.display().to_string()));
        };

        let artifact = self.service.transform_file(&identity)?;

        if self.config.auto_copy_to_clipboard && self.capability == ClipboardCapability::Capable {
            self.bridge.write_image_file(&artifact.path)?;
        }

        if artifact.ephemeral {
            if let Err(err) = std::fs::remove_file(&artifact.path) {
                log::warn!("⚠️ 清理临时产物失败：{}（{}）", artifact.path.display(), err);
            }
        }

        Ok(artifact)
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// 启动验证：监控目录必须存在，输出目录按需创建。
fn validate_setup(config: &AppConfig) -> Result<(), AppError> {
    log::info!("🔍 验证启动条件...");

    let screenshot_folder = config.screenshot_folder_path();
    if !screenshot_folder.is_dir() {
        return Err(AppError::Setup(format!(
            "截图目录不存在：{}",
            screenshot_folder.display()
        )));
    }
    log::info!("✅ 截图目录存在：{}", screenshot_folder.display());

    if config.save_to_desktop && !config.replace_original {
        let output_folder = config.output_folder_path();
        std::fs::create_dir_all(&output_folder)?;
        log::info!("✅ 输出目录就绪：{}", output_folder.display());
    }

    Ok(())
}

/// 剪贴板轮询是否应当启动：配置开启且能力可用，缺一不可。
pub(crate) fn should_start_clipboard_trigger(
    capability: ClipboardCapability,
    config: &AppConfig,
) -> bool {
    config.monitor_clipboard && capability == ClipboardCapability::Capable
}
