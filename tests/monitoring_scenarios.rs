//! 监控生命周期场景：真实目录监听下的检测、处理与停止。

use std::path::Path;
use std::time::{Duration, Instant};

use image::{ImageFormat, Rgba, RgbaImage};

use screenshot_rounder::config::AppConfig;
use screenshot_rounder::orchestrator::Orchestrator;

fn write_fixture(path: &Path, width: u32, height: u32) {
    let image = RgbaImage::from_pixel(width, height, Rgba([50, 60, 70, 255]));
    image
        .save_with_format(path, ImageFormat::Png)
        .expect("failed to write fixture image");
}

fn wait_for(path: &Path, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if path.exists() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    path.exists()
}

/// 剪贴板能力缺失（无显示环境）或被禁用时，文件系统触发路径必须独立工作。
#[test]
fn filesystem_trigger_processes_new_screenshots_end_to_end() {
    let dir = tempfile::tempdir().expect("tempdir");
    let watch_dir = dir.path().join("shots");
    std::fs::create_dir_all(&watch_dir).expect("create watch dir");

    let config = AppConfig {
        screenshot_folder: watch_dir.to_string_lossy().into_owned(),
        output_folder: dir.path().join("rounded").to_string_lossy().into_owned(),
        auto_copy_to_clipboard: false,
        monitor_clipboard: false,
        processing_delay_ms: 50,
        ..AppConfig::default()
    };

    let orchestrator = Orchestrator::new(config).expect("setup should pass");
    orchestrator.start().expect("start monitoring");

    // 监听器就绪后再落盘新文件
    std::thread::sleep(Duration::from_millis(200));
    write_fixture(&watch_dir.join("Screenshot 2026-08-04.png"), 100, 80);

    let output = dir
        .path()
        .join("rounded")
        .join("Screenshot 2026-08-04_rounded.png");
    assert!(
        wait_for(&output, Duration::from_secs(10)),
        "rounded output should appear"
    );

    let rounded = image::open(&output).expect("output decodes").to_rgba8();
    assert_eq!(rounded.get_pixel(0, 0).0[3], 0);

    // 不匹配的文件名不会被处理
    write_fixture(&watch_dir.join("vacation photo.png"), 100, 80);
    std::thread::sleep(Duration::from_millis(600));
    assert!(!dir
        .path()
        .join("rounded")
        .join("vacation photo_rounded.png")
        .exists());

    orchestrator.stop();
}

#[test]
fn stop_returns_promptly_after_loops_exit() {
    let dir = tempfile::tempdir().expect("tempdir");

    let config = AppConfig {
        screenshot_folder: dir.path().to_string_lossy().into_owned(),
        output_folder: dir.path().join("rounded").to_string_lossy().into_owned(),
        auto_copy_to_clipboard: false,
        monitor_clipboard: false,
        ..AppConfig::default()
    };

    let orchestrator = Orchestrator::new(config).expect("setup should pass");
    orchestrator.start().expect("start monitoring");
    std::thread::sleep(Duration::from_millis(100));

    let stop_start = Instant::now();
    orchestrator.stop();
    // 消费线程按 250ms 节拍检查停止信号，join 应当很快返回
    assert!(stop_start.elapsed() < Duration::from_secs(5));
}
