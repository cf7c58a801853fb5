//! # 圆角蒙版模块
//!
//! ## 设计思路
//!
//! 蒙版是与原图等尺寸的单通道灰度图：圆角矩形内部完全不透明，
//! 四个角的圆弧之外完全透明，弧线边界按距离做一像素宽的过渡抗锯齿。
//! 套用方式为 alpha 直接替换而非相乘，对已经圆角化的图片再处理一次
//! 不会进一步侵蚀边界。
//!
//! ## 实现思路
//!
//! - 只有四个 `radius × radius` 的角区需要计算到圆心的距离，
//!   其余像素直接置为不透明。
//! - 半径先收紧到短边的一半，四个圆弧在退化情形下相接而不会越界。
//! - 角区覆盖率为 `clamp(radius - distance, 0, 1)`：半径为 1 时
//!   四个顶点像素（到圆心距离 √2）即完全透明。

use image::{GrayImage, Luma, RgbaImage};

/// 单个像素在角区内的覆盖率，[0, 1] 区间，边界一像素过渡。
fn corner_coverage(distance: f32, radius: f32) -> f32 {
    (radius - distance).clamp(0.0, 1.0)
}

/// 生成圆角矩形蒙版。
///
/// 半径超过短边一半时收紧到一半，退化为两端半圆相接的形状，不会崩溃或回绕。
pub(crate) fn rounded_mask(width: u32, height: u32, radius: u32) -> GrayImage {
    let radius = radius.min(width.min(height) / 2);
    let r = radius as f32;
    let max_x = width.saturating_sub(1) as f32;
    let max_y = height.saturating_sub(1) as f32;

    GrayImage::from_fn(width, height, |x, y| {
        let fx = x as f32;
        let fy = y as f32;

        let cx = if fx < r {
            r
        } else if fx > max_x - r {
            max_x - r
        } else {
            return Luma([255]);
        };
        let cy = if fy < r {
            r
        } else if fy > max_y - r {
            max_y - r
        } else {
            return Luma([255]);
        };

        let distance = ((fx - cx).powi(2) + (fy - cy).powi(2)).sqrt();
        Luma([(corner_coverage(distance, r) * 255.0).round() as u8])
    })
}

/// 将蒙版套用为图片的 alpha 通道（直接替换）。
pub(crate) fn apply_mask(image: &mut RgbaImage, mask: &GrayImage) {
    debug_assert_eq!(image.dimensions(), mask.dimensions());
    for (pixel, mask_pixel) in image.pixels_mut().zip(mask.pixels()) {
        pixel.0[3] = mask_pixel.0[0];
    }
}
