//! 并发派发场景：同一路径的重复事件只允许一次变换。

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use image::{ImageFormat, Rgba, RgbaImage};

use screenshot_rounder::config::AppConfig;
use screenshot_rounder::dispatch::DispatchGuard;
use screenshot_rounder::processor::RoundedImageService;

fn write_fixture(path: &Path) {
    let image = RgbaImage::from_pixel(64, 64, Rgba([30, 30, 30, 255]));
    image
        .save_with_format(path, ImageFormat::Png)
        .expect("failed to write fixture image");
}

#[test]
fn duplicate_events_for_the_same_path_run_exactly_one_transform() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("Screenshot.png");
    write_fixture(&input);

    let config = AppConfig {
        screenshot_folder: dir.path().to_string_lossy().into_owned(),
        output_folder: dir.path().join("rounded").to_string_lossy().into_owned(),
        auto_copy_to_clipboard: false,
        ..AppConfig::default()
    };

    let guard = DispatchGuard::new();
    let service = Arc::new(RoundedImageService::new(config));
    let transforms = Arc::new(AtomicUsize::new(0));

    // 第一条事件先取到票据并保持在途
    let first_ticket = guard.acquire(&input).expect("first event gets the ticket");

    // 第二条事件在第一条尚未完成时到达，被拒绝而不是排队
    {
        let guard = guard.clone();
        let input = input.clone();
        let transforms = Arc::clone(&transforms);
        let service = Arc::clone(&service);
        let second = thread::spawn(move || {
            if let Some(_ticket) = guard.acquire(&input) {
                service.transform_file(&input).expect("transform");
                transforms.fetch_add(1, Ordering::SeqCst);
            }
        });
        second.join().expect("second event thread");
    }
    assert_eq!(transforms.load(Ordering::SeqCst), 0);

    // 第一条事件正常完成
    service.transform_file(&input).expect("transform");
    transforms.fetch_add(1, Ordering::SeqCst);
    drop(first_ticket);

    assert_eq!(transforms.load(Ordering::SeqCst), 1);
    assert_eq!(guard.in_flight_count(), 0);
    assert!(dir.path().join("rounded").join("Screenshot_rounded.png").exists());
}

#[test]
fn distinct_paths_transform_concurrently() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = dir.path().join("Screenshot A.png");
    let second = dir.path().join("Screenshot B.png");
    write_fixture(&first);
    write_fixture(&second);

    let config = AppConfig {
        screenshot_folder: dir.path().to_string_lossy().into_owned(),
        output_folder: dir.path().join("rounded").to_string_lossy().into_owned(),
        auto_copy_to_clipboard: false,
        ..AppConfig::default()
    };

    let guard = DispatchGuard::new();
    let service = Arc::new(RoundedImageService::new(config));

    let handles: Vec<_> = [first, second]
        .into_iter()
        .map(|path| {
            let guard = guard.clone();
            let service = Arc::clone(&service);
            thread::spawn(move || {
                let _ticket = guard.acquire(&path).expect("distinct identity gets a ticket");
                service.transform_file(&path).expect("transform");
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker thread");
    }

    assert_eq!(guard.in_flight_count(), 0);
    assert!(dir.path().join("rounded").join("Screenshot A_rounded.png").exists());
    assert!(dir.path().join("rounded").join("Screenshot B_rounded.png").exists());
}
