//! # 处理编排模块
//!
//! ## 设计思路
//!
//! `RoundedImageService` 只负责流程编排与落盘，不关心触发来源。
//! 处理链路固定为：
//! 1. 读取并解码源文件，统一转换为 RGBA
//! 2. 按配置计算圆角半径
//! 3. 生成蒙版并替换 alpha 通道
//! 4. 解析输出目的地并以无损 PNG 编码写出
//!
//! ## 实现思路
//!
//! - 完整解码前先从图片头读出尺寸做像素上限检查，尽快拒绝异常输入。
//! - 写出失败时尽力移除半写状态的文件，调用方不会看到损坏输出。
//! - 记录 `decode/mask/encode/total` 阶段耗时，便于性能诊断。
//! - 服务本身无可变状态，不同来源的处理请求可以并发执行。

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Instant;

use image::{ImageFormat, RgbaImage};

use crate::config::AppConfig;

use super::error::ProcessError;
use super::output::{self, OutputDestination};
use super::{mask, radius};

/// 解码后的像素上限（宽 × 高），防止异常大图拖垮常驻进程。
const MAX_DECODED_PIXELS: u64 = 40_000_000;

/// 一次处理的输出产物。
#[derive(Debug, Clone)]
pub struct OutputArtifact {
    /// 产物所在路径。
    pub path: PathBuf,
    /// 是否为临时产物（消费完应删除）。
    pub ephemeral: bool,
}

/// 圆角处理服务。
pub struct RoundedImageService {
    config: AppConfig,
}

impl RoundedImageService {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// 处理主入口：对单个源文件执行完整圆角变换。
    pub fn transform_file(&self, source: &Path) -> Result<OutputArtifact, ProcessError> {
        log::info!("🔄 开始处理图片：{}", source.display());
        let total_start = Instant::now();

        let decode_start = Instant::now();
        let mut rgba = self.decode_rgba(source)?;
        let decode_elapsed = decode_start.elapsed();

        let (width, height) = rgba.dimensions();
        log::info!("📸 图片已载入：{}x{} 像素", width, height);

        let corner_radius = radius::corner_radius_for(width, height, &self.config);
        log::debug!(
            "📐 圆角半径：{}px（use_percentage={}）",
            corner_radius,
            self.config.use_percentage
        );

        let mask_start = Instant::now();
        let rounded = mask::rounded_mask(width, height, corner_radius);
        mask::apply_mask(&mut rgba, &rounded);
        let mask_elapsed = mask_start.elapsed();

        let encode_start = Instant::now();
        let artifact = self.write_output(source, &rgba)?;
        let encode_elapsed = encode_start.elapsed();

        log::info!(
            "✅ 图片处理完成 - decode={}ms mask={}ms encode={}ms total={}ms",
            decode_elapsed.as_millis(),
            mask_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(artifact)
    }

    /// 读取源文件并解码为 RGBA。
    fn decode_rgba(&self, source: &Path) -> Result<RgbaImage, ProcessError> {
        let bytes = std::fs::read(source)
            .map_err(|e| ProcessError::FileSystem(format!("无法读取图片文件：{}", e)))?;

        let (header_width, header_height) = inspect_dimensions(&bytes)?;
        validate_pixel_limit(header_width, header_height)?;

        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| ProcessError::Decode(format!("图片解码失败：{}", e)))?;

        // 无论来源是否带 alpha，统一转为 RGBA 再走蒙版替换
        Ok(decoded.to_rgba8())
    }

    /// 解析目的地并编码写出。
    fn write_output(
        &self,
        source: &Path,
        rgba: &RgbaImage,
    ) -> Result<OutputArtifact, ProcessError> {
        match output::resolve_output_path(source, &self.config) {
            OutputDestination::Persistent(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)
                        .map_err(|e| ProcessError::Write(format!("创建输出目录失败：{}", e)))?;
                }
                encode_png(rgba, &path)?;
                log::info!("💾 已保存：{}", path.display());
                Ok(OutputArtifact {
                    path,
                    ephemeral: false,
                })
            }
            OutputDestination::Ephemeral => {
                let temp = tempfile::Builder::new()
                    .prefix("rounded_")
                    .suffix(".png")
                    .tempfile()
                    .map_err(|e| ProcessError::Write(format!("创建临时文件失败：{}", e)))?;
                let (_file, path) = temp
                    .keep()
                    .map_err(|e| ProcessError::Write(format!("保留临时文件失败：{}", e)))?;
                encode_png(rgba, &path)?;
                log::debug!("📋 已写入临时文件（仅剪贴板模式）：{}", path.display());
                Ok(OutputArtifact {
                    path,
                    ephemeral: true,
                })
            }
        }
    }
}

/// 仅通过图片头信息读取宽高，用于完整解码前的上限检查。
fn inspect_dimensions(bytes: &[u8]) -> Result<(u32, u32), ProcessError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ProcessError::InvalidFormat(format!("无法识别图片格式：{}", e)))?;

    reader
        .into_dimensions()
        .map_err(|e| ProcessError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
}

/// 校验像素数量是否超过上限。
fn validate_pixel_limit(width: u32, height: u32) -> Result<(), ProcessError> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels > MAX_DECODED_PIXELS {
        return Err(ProcessError::ResourceLimit(format!(
            "图片像素过大：{} 像素（限制：{} 像素）",
            pixels, MAX_DECODED_PIXELS
        )));
    }
    Ok(())
}

/// 无损 PNG 编码写出；失败时移除半写文件。
fn encode_png(rgba: &RgbaImage, path: &Path) -> Result<(), ProcessError> {
    if let Err(err) = rgba.save_with_format(path, ImageFormat::Png) {
        let _ = std::fs::remove_file(path);
        return Err(ProcessError::Write(format!("保存图片失败：{}", err)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn write_test_png(path: &Path, width: u32, height: u32) {
        let image = RgbaImage::from_pixel(width, height, Rgba([120, 80, 40, 255]));
        image
            .save_with_format(path, ImageFormat::Png)
            .expect("failed to write test image");
    }

    #[test]
    fn corrupt_input_reports_decode_stage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not a png").expect("write");

        let service = RoundedImageService::new(AppConfig::default());
        let result = service.transform_file(&path);
        assert!(matches!(
            result,
            Err(ProcessError::Decode(_)) | Err(ProcessError::InvalidFormat(_))
        ));
    }

    #[test]
    fn missing_input_reports_filesystem_error() {
        let service = RoundedImageService::new(AppConfig::default());
        let result = service.transform_file(Path::new("/nonexistent/shot.png"));
        assert!(matches!(result, Err(ProcessError::FileSystem(_))));
    }

    #[test]
    fn pixel_limit_rejects_oversized_headers() {
        assert!(validate_pixel_limit(1920, 1080).is_ok());
        assert!(matches!(
            validate_pixel_limit(100_000, 100_000),
            Err(ProcessError::ResourceLimit(_))
        ));
    }

    #[test]
    fn transform_writes_rounded_output_into_output_folder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("Screenshot.png");
        write_test_png(&input, 64, 48);

        let config = AppConfig {
            output_folder: dir.path().join("out").to_string_lossy().into_owned(),
            use_percentage: false,
            corner_radius: 8,
            auto_copy_to_clipboard: false,
            ..AppConfig::default()
        };

        let artifact = RoundedImageService::new(config)
            .transform_file(&input)
            .expect("transform should succeed");

        assert!(!artifact.ephemeral);
        assert_eq!(
            artifact.path.file_name().and_then(|n| n.to_str()),
            Some("Screenshot_rounded.png")
        );

        let rounded = image::open(&artifact.path).expect("output decodes").to_rgba8();
        assert_eq!(rounded.dimensions(), (64, 48));
        assert_eq!(rounded.get_pixel(0, 0).0[3], 0);
        assert_eq!(rounded.get_pixel(32, 24).0[3], 255);
    }

    #[test]
    fn ephemeral_mode_writes_a_temp_artifact() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("shot.png");
        write_test_png(&input, 32, 32);

        let config = AppConfig {
            save_to_desktop: false,
            output_folder: dir.path().join("never-created").to_string_lossy().into_owned(),
            ..AppConfig::default()
        };

        let artifact = RoundedImageService::new(config)
            .transform_file(&input)
            .expect("transform should succeed");

        assert!(artifact.ephemeral);
        assert!(artifact.path.exists());
        assert!(!dir.path().join("never-created").exists());

        std::fs::remove_file(&artifact.path).expect("cleanup temp artifact");
    }
}
