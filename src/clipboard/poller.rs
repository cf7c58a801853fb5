//! # 剪贴板轮询触发器
//!
//! ## 设计思路
//!
//! 单线程循环按固定间隔读取剪贴板，通过与“上次已见负载”的字节比对
//! 判断是否出现新图片。已见状态是触发器实例自己的字段，可以注入初始值
//! 做确定性测试，也允许多个实例并存。
//!
//! 回环防护是这里的核心不变量：处理结果写回剪贴板后，写回内容会立刻
//! 被记为已见，下一拍轮询不会把自己的输出当作外部新图片再次派发。
//! 来自文件系统触发路径的写回则通过桥上的自写入记账识别。
//!
//! ## 实现思路
//!
//! - 状态机：`空闲 → 轮询 →（未变化：回到空闲）|（变化：暂存 → 派发 → 空闲）`。
//! - 检测到变化时先更新已见状态再派发，处理失败也不会对同一内容反复重试。
//! - 剪贴板来源的处理在循环内同步执行，保证写回与已见状态更新的顺序。
//! - 节拍等待复用停止令牌，停止信号在一个轮询间隔内生效。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use image::{ImageBuffer, ImageFormat, RgbaImage};

use crate::config::AppConfig;
use crate::dispatch::DispatchGuard;
use crate::processor::{ProcessError, RoundedImageService};
use crate::shutdown::ShutdownToken;

use super::{ClipboardBridge, ClipboardImage};

/// 单次轮询的分类结果。
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PollDecision {
    /// 无图片，或内容与上次已见一致。
    Unchanged,
    /// 本应用写回的内容，吸收为已见状态，不派发。
    OwnWriteBack,
    /// 外部新图片，进入暂存与派发。
    Dispatch,
}

/// 纯分类逻辑：只依赖当前负载、已见状态与自写入标记。
pub(crate) fn classify_poll(
    current: Option<&ClipboardImage>,
    last_seen: Option<&ClipboardImage>,
    is_self_write: bool,
) -> PollDecision {
    let Some(payload) = current else {
        return PollDecision::Unchanged;
    };
    if last_seen == Some(payload) {
        return PollDecision::Unchanged;
    }
    if is_self_write {
        return PollDecision::OwnWriteBack;
    }
    PollDecision::Dispatch
}

/// 剪贴板轮询触发器。
pub struct ClipboardTrigger {
    config: AppConfig,
    bridge: Arc<ClipboardBridge>,
    guard: Arc<DispatchGuard>,
    service: Arc<RoundedImageService>,
    shutdown: ShutdownToken,
    last_seen: Option<ClipboardImage>,
}

impl ClipboardTrigger {
    pub fn new(
        config: AppConfig,
        bridge: Arc<ClipboardBridge>,
        guard: Arc<DispatchGuard>,
        service: Arc<RoundedImageService>,
        shutdown: ShutdownToken,
    ) -> Self {
        Self {
            config,
            bridge,
            guard,
            service,
            shutdown,
            last_seen: None,
        }
    }

    /// 注入初始已见状态，启动后第一拍不会把既有内容当作新图片。
    pub fn with_last_seen(mut self, payload: ClipboardImage) -> Self {
        self.last_seen = Some(payload);
        self
    }

    /// 轮询主循环，收到停止信号后在一个间隔内退出。
    pub fn run(mut self) {
        let interval = Duration::from_millis(self.config.clipboard_poll_interval_ms.max(1));
        log::info!("📋 剪贴板轮询已启动（间隔 {}ms）", interval.as_millis());

        loop {
            if self.shutdown.wait_timeout(interval) {
                break;
            }
            self.poll_once();
        }

        log::info!("📋 剪贴板轮询已停止");
    }

    fn poll_once(&mut self) {
        let current = self.bridge.read_image();
        let is_self_write = match current.as_ref() {
            Some(payload) => self.bridge.is_self_write(payload),
            None => false,
        };

        let decision = classify_poll(current.as_ref(), self.last_seen.as_ref(), is_self_write);
        let Some(payload) = current else {
            return;
        };

        match decision {
            PollDecision::Unchanged => {}
            PollDecision::OwnWriteBack => {
                log::debug!("⏭️ 吸收本应用写回的剪贴板内容");
                self.last_seen = Some(payload);
            }
            PollDecision::Dispatch => {
                log::info!(
                    "📋 检测到剪贴板新图片（{}x{}）",
                    payload.width,
                    payload.height
                );
                // 先记为已见再派发：处理失败也不会对同一内容反复重试
                self.last_seen = Some(payload.clone());
                self.process_payload(payload);
            }
        }
    }

    /// 暂存负载、派发处理并按需写回。
    fn process_payload(&mut self, payload: ClipboardImage) {
        let staged = match stage_to_temp_file(&payload) {
            Ok(path) => path,
            Err(err) => {
                log::error!("❌ 暂存剪贴板图片失败：{}（stage=stage）", err);
                return;
            }
        };

        self.transform_staged(&staged);

        if let Err(err) = std::fs::remove_file(&staged) {
            log::warn!("⚠️ 清理暂存文件失败：{}（{}）", staged.display(), err);
        }
    }

    fn transform_staged(&mut self, staged: &std::path::Path) {
        let Some(_ticket) = self.guard.acquire(staged) else {
            log::debug!("⏭️ 同一暂存路径已在处理中，跳过：{}", staged.display());
            return;
        };

        match self.service.transform_file(staged) {
            Ok(artifact) => {
                if self.config.auto_copy_to_clipboard {
                    match self.bridge.write_image_file(&artifact.path) {
                        Ok(written) => {
                            // 写回内容立即记为已见，下一拍不会再次触发
                            self.last_seen = Some(written);
                        }
                        Err(err) => {
                            log::error!(
                                "❌ 写回剪贴板失败：{}（stage=clipboard, path={}）",
                                err,
                                artifact.path.display()
                            );
                        }
                    }
                }
                // 剪贴板来源的产物只作桥接用途，消费完即删除
                if artifact.path != staged {
                    if let Err(err) = std::fs::remove_file(&artifact.path) {
                        log::warn!(
                            "⚠️ 清理输出文件失败：{}（{}）",
                            artifact.path.display(),
                            err
                        );
                    }
                }
                log::info!("🎉 剪贴板图片处理完成");
            }
            Err(err) => {
                log::error!(
                    "❌ 处理剪贴板图片失败：{}（stage=transform, path={}）",
                    err,
                    staged.display()
                );
            }
        }
    }
}

/// 将 RGBA 负载编码为 PNG 暂存文件，返回保留下来的路径。
fn stage_to_temp_file(payload: &ClipboardImage) -> Result<PathBuf, ProcessError> {
    let rgba: RgbaImage = ImageBuffer::from_raw(
        payload.width as u32,
        payload.height as u32,
        payload.bytes.clone(),
    )
    .ok_or_else(|| ProcessError::InvalidFormat("剪贴板像素数据长度异常".to_string()))?;

    let temp = tempfile::Builder::new()
        .prefix("clipboard_")
        .suffix(".png")
        .tempfile()
        .map_err(|e| ProcessError::FileSystem(format!("创建暂存文件失败：{}", e)))?;
    let (_file, path) = temp
        .keep()
        .map_err(|e| ProcessError::FileSystem(format!("保留暂存文件失败：{}", e)))?;

    if let Err(err) = rgba.save_with_format(&path, ImageFormat::Png) {
        let _ = std::fs::remove_file(&path);
        return Err(ProcessError::Write(format!("写入暂存文件失败：{}", err)));
    }

    log::debug!("📋 剪贴板图片已暂存：{}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(fill: u8) -> ClipboardImage {
        ClipboardImage {
            width: 2,
            height: 2,
            bytes: vec![fill; 16],
        }
    }

    #[test]
    fn empty_clipboard_is_unchanged() {
        assert_eq!(classify_poll(None, None, false), PollDecision::Unchanged);
        assert_eq!(
            classify_poll(None, Some(&payload(1)), false),
            PollDecision::Unchanged
        );
    }

    #[test]
    fn identical_payload_is_unchanged() {
        let seen = payload(1);
        assert_eq!(
            classify_poll(Some(&payload(1)), Some(&seen), false),
            PollDecision::Unchanged
        );
    }

    #[test]
    fn new_external_payload_dispatches() {
        assert_eq!(classify_poll(Some(&payload(2)), None, false), PollDecision::Dispatch);
        assert_eq!(
            classify_poll(Some(&payload(2)), Some(&payload(1)), false),
            PollDecision::Dispatch
        );
    }

    #[test]
    fn own_write_back_is_absorbed_not_dispatched() {
        assert_eq!(
            classify_poll(Some(&payload(3)), Some(&payload(1)), true),
            PollDecision::OwnWriteBack
        );
    }

    #[test]
    fn write_back_then_next_poll_is_unchanged() {
        // 回环不变量：写回内容被记为已见后，下一拍同内容不再触发
        let written = payload(7);
        let mut last_seen: Option<ClipboardImage> = Some(payload(1));

        match classify_poll(Some(&written), last_seen.as_ref(), true) {
            PollDecision::OwnWriteBack => last_seen = Some(written.clone()),
            other => panic!("expected OwnWriteBack, got {:?}", other),
        }

        assert_eq!(
            classify_poll(Some(&written), last_seen.as_ref(), true),
            PollDecision::Unchanged
        );
        assert_eq!(
            classify_poll(Some(&written), last_seen.as_ref(), false),
            PollDecision::Unchanged
        );
    }

    #[test]
    fn staged_file_round_trips_through_png() {
        let source = ClipboardImage {
            width: 3,
            height: 2,
            bytes: vec![200; 24],
        };
        let staged = stage_to_temp_file(&source).expect("staging should succeed");

        let decoded = image::open(&staged).expect("staged file decodes").to_rgba8();
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(0, 0).0, [200, 200, 200, 200]);

        std::fs::remove_file(&staged).expect("cleanup staged file");
    }

    #[test]
    fn staging_rejects_mismatched_byte_length() {
        let bad = ClipboardImage {
            width: 4,
            height: 4,
            bytes: vec![0; 7],
        };
        assert!(matches!(
            stage_to_temp_file(&bad),
            Err(ProcessError::InvalidFormat(_))
        ));
    }
}
