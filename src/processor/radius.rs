//! # 半径策略模块
//!
//! ## 设计思路
//!
//! 半径只由图片尺寸与配置决定，是一个全定义域的纯函数：
//! 百分比模式按短边取整，固定模式直接取配置值，
//! 任何越界输入（百分比为零、负数或 NaN）最终都被下限收紧到 1。

use crate::config::AppConfig;

/// 计算给定尺寸下的圆角半径（像素）。
pub(crate) fn corner_radius_for(width: u32, height: u32, config: &AppConfig) -> u32 {
    let radius = if config.use_percentage {
        let min_dimension = width.min(height);
        // 负数与 NaN 百分比在取整转换后落到 0，由下方 max(1) 兜底
        (min_dimension as f32 * config.corner_radius_percentage).floor() as u32
    } else {
        config.corner_radius
    };

    radius.max(1)
}
