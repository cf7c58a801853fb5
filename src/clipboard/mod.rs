//! # 剪贴板模块
//!
//! ## 设计思路
//!
//! 统一管理与系统剪贴板的全部交互：
//! - **能力探测**：启动时探测一次，探测失败则整个运行期间降级为
//!   仅磁盘模式，调用方不再逐次重试剪贴板操作。
//! - **读写桥**：`ClipboardBridge` 负责图片负载的读取与写回。
//! - **自写入记账**：写回与记账在同一临界区内完成，轮询循环据此
//!   识别本应用自己写回的内容，避免把处理结果误判为外部新图片。
//!
//! ## 实现思路
//!
//! - 读写均通过 `arboard`，负载统一为 RGBA 字节（`width * height * 4`）。
//! - 记账状态归桥实例所有，不使用进程级全局变量，
//!   多个独立实例互不干扰，测试时可单独构造。
//! - 轮询触发器在子模块 `poller` 中。

pub mod poller;

use std::borrow::Cow;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use arboard::Clipboard;

use crate::processor::ProcessError;

/// 剪贴板能力，启动时探测一次后全程不变。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardCapability {
    /// 剪贴板可用，允许读取触发与结果写回。
    Capable,
    /// 剪贴板不可用（无显示环境等），整个运行降级为仅磁盘模式。
    Unavailable,
}

/// 剪贴板图片负载（RGBA 字节）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardImage {
    pub width: usize,
    pub height: usize,
    pub bytes: Vec<u8>,
}

/// 剪贴板读写桥。
pub struct ClipboardBridge {
    /// 最近一次由本应用写回的负载，用于轮询侧的回环识别。
    last_written: Mutex<Option<ClipboardImage>>,
}

impl ClipboardBridge {
    pub fn new() -> Self {
        Self {
            last_written: Mutex::new(None),
        }
    }

    /// 启动时探测一次剪贴板能力。
    pub fn probe_capability() -> ClipboardCapability {
        match Clipboard::new() {
            Ok(_) => ClipboardCapability::Capable,
            Err(err) => {
                log::warn!("⚠️ 剪贴板不可用，本次运行降级为仅磁盘模式：{}", err);
                ClipboardCapability::Unavailable
            }
        }
    }

    fn lock_last_written(&self) -> MutexGuard<'_, Option<ClipboardImage>> {
        match self.last_written.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("剪贴板记账锁中毒，继续使用恢复数据");
                poisoned.into_inner()
            }
        }
    }

    /// 读取当前剪贴板图片，无图片内容时返回 `None`。
    pub fn read_image(&self) -> Option<ClipboardImage> {
        let mut clipboard = match Clipboard::new() {
            Ok(clipboard) => clipboard,
            Err(err) => {
                log::debug!("剪贴板打开失败：{}", err);
                return None;
            }
        };

        match clipboard.get_image() {
            Ok(image) => Some(ClipboardImage {
                width: image.width,
                height: image.height,
                bytes: image.bytes.into_owned(),
            }),
            Err(_) => None,
        }
    }

    /// 将处理结果文件写入剪贴板，返回实际写入的负载。
    ///
    /// 旧内容（包括非图片内容）会被整体覆盖。
    pub fn write_image_file(&self, path: &Path) -> Result<ClipboardImage, ProcessError> {
        let decoded = image::open(path)
            .map_err(|e| ProcessError::Decode(format!("读取待复制图片失败：{}", e)))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();

        let payload = ClipboardImage {
            width: width as usize,
            height: height as usize,
            bytes: rgba.into_raw(),
        };
        self.write_payload(&payload)?;

        log::info!("✅ 已复制到剪贴板：{}", path.display());
        Ok(payload)
    }

    /// 写入负载并同步记账。
    ///
    /// 写入与记账在同一临界区内，轮询循环在下一拍读取时必然能看到记账结果。
    fn write_payload(&self, payload: &ClipboardImage) -> Result<(), ProcessError> {
        let mut last_written = self.lock_last_written();

        let mut clipboard = Clipboard::new()
            .map_err(|e| ProcessError::Clipboard(format!("无法访问剪贴板：{}", e)))?;
        clipboard
            .set_image(arboard::ImageData {
                width: payload.width,
                height: payload.height,
                bytes: Cow::Borrowed(&payload.bytes),
            })
            .map_err(|e| ProcessError::Clipboard(format!("复制失败：{}", e)))?;

        *last_written = Some(payload.clone());
        Ok(())
    }

    /// 判断负载是否为本应用最近写回的内容。
    pub fn is_self_write(&self, payload: &ClipboardImage) -> bool {
        self.lock_last_written().as_ref() == Some(payload)
    }

    /// 直接登记一条自写入负载，测试注入用。
    #[cfg(test)]
    fn note_self_write(&self, payload: ClipboardImage) {
        *self.lock_last_written() = Some(payload);
    }
}

impl Default for ClipboardBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(width: usize, height: usize, fill: u8) -> ClipboardImage {
        ClipboardImage {
            width,
            height,
            bytes: vec![fill; width * height * 4],
        }
    }

    #[test]
    fn payload_equality_is_byte_identity() {
        assert_eq!(payload(2, 2, 7), payload(2, 2, 7));
        assert_ne!(payload(2, 2, 7), payload(2, 2, 8));
        assert_ne!(payload(2, 2, 7), payload(4, 1, 7));
    }

    #[test]
    fn self_write_bookkeeping_matches_exact_payload() {
        let bridge = ClipboardBridge::new();
        assert!(!bridge.is_self_write(&payload(2, 2, 1)));

        bridge.note_self_write(payload(2, 2, 1));
        assert!(bridge.is_self_write(&payload(2, 2, 1)));
        assert!(!bridge.is_self_write(&payload(2, 2, 2)));

        // 新的写入覆盖旧记账
        bridge.note_self_write(payload(3, 3, 9));
        assert!(!bridge.is_self_write(&payload(2, 2, 1)));
        assert!(bridge.is_self_write(&payload(3, 3, 9)));
    }
}
