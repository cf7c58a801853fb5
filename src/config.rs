use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// 应用配置。
///
/// 字段覆盖了目录监控、半径策略、输出行为与剪贴板联动四个方面。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 被监控的截图目录（支持 `~` 前缀）。
    pub screenshot_folder: String,
    /// 处理结果的输出目录（支持 `~` 前缀）。
    pub output_folder: String,
    /// 固定像素半径（`use_percentage = false` 时生效）。
    pub corner_radius: u32,
    /// 按短边百分比计算半径（`use_percentage = true` 时生效）。
    pub corner_radius_percentage: f32,
    /// 半径模式开关：true 按百分比，false 按固定像素。
    pub use_percentage: bool,
    /// 处理完成后是否自动复制到剪贴板。
    pub auto_copy_to_clipboard: bool,
    /// 是否用处理结果覆盖原文件。
    pub replace_original: bool,
    /// 是否将结果持久化到磁盘；关闭后仅走剪贴板链路。
    pub save_to_desktop: bool,
    /// 是否启用文件系统监控。
    pub monitor_enabled: bool,
    /// 是否启用剪贴板监控。
    pub monitor_clipboard: bool,
    /// 文件名通配符列表，命中任一即视为截图。
    pub file_patterns: Vec<String>,
    /// 检测到新文件后的静置延迟（毫秒），等待截图程序完成写入。
    pub processing_delay_ms: u64,
    /// 剪贴板轮询间隔（毫秒）。
    pub clipboard_poll_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            screenshot_folder: "~/Desktop".to_string(),
            output_folder: "~/Desktop/rounded_screenshots".to_string(),
            corner_radius: 20,
            corner_radius_percentage: 0.05,
            use_percentage: true,
            auto_copy_to_clipboard: true,
            replace_original: false,
            save_to_desktop: true,
            monitor_enabled: true,
            monitor_clipboard: true,
            file_patterns: vec![
                "Screenshot*.png".to_string(),
                "CleanShot*.png".to_string(),
                "Screen Shot*.png".to_string(),
            ],
            processing_delay_ms: 500,
            clipboard_poll_interval_ms: 500,
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置。
    ///
    /// 文件不存在时返回默认配置并打印警告；解析失败返回 `AppError::Config`。
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            log::warn!("⚠️ 配置文件不存在：{}，使用默认配置", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("解析配置文件失败：{}", e)))?;

        log::info!("✅ 配置已加载：{}", path.display());
        Ok(config)
    }

    /// 展开后的截图目录路径。
    pub fn screenshot_folder_path(&self) -> PathBuf {
        expand_user_path(&self.screenshot_folder)
    }

    /// 展开后的输出目录路径。
    pub fn output_folder_path(&self) -> PathBuf {
        expand_user_path(&self.output_folder)
    }
}

/// 将 `~` 前缀展开为用户主目录；无法获取主目录时原样返回。
pub(crate) fn expand_user_path(raw: &str) -> PathBuf {
    if let Some(stripped) = raw.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            let relative = stripped.trim_start_matches(['/', '\\']);
            if relative.is_empty() {
                return home;
            }
            return home.join(relative);
        }
    }
    PathBuf::from(raw)
}
