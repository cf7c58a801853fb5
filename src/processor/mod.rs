//! # 图片处理模块（processor）
//!
//! ## 设计思路
//!
//! 该模块将“解码校验 → 半径计算 → 蒙版合成 → 输出落盘”按职责拆分为
//! 多个子模块，纯计算与带副作用的编排分离，便于单独测试。
//!
//! - `radius`：半径策略（纯函数）
//! - `mask`：圆角蒙版的生成与套用（纯函数）
//! - `output`：输出目的地解析（纯函数）
//! - `service`：承载配置的编排器，负责真正的读写
//! - `error`：处理链路统一错误
//!
//! ## 调用链
//!
//! ```text
//! 触发器（watcher / clipboard::poller / 手动入口）
//!    ↓
//! service.rs（decode → radius → mask → encode，阶段耗时日志）
//!    ├─ radius.rs（百分比 / 固定像素，下限收紧到 1）
//!    ├─ mask.rs（圆弧抗锯齿，alpha 直接替换）
//!    └─ output.rs（覆盖原文件 / 输出目录 / 仅临时文件）
//! ```

mod error;
mod mask;
mod output;
mod radius;
mod service;

pub use error::ProcessError;
pub use service::{OutputArtifact, RoundedImageService};
