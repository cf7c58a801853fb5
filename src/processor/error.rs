//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载处理链路中的所有错误来源，调用侧可按分支匹配。
//! 通过 `thiserror` 保持人类可读错误消息。所有分支都只影响当次处理请求，
//! 由触发循环记录日志后继续运行。

/// 图片处理统一错误类型。
///
/// 该类型会在入口层被上转为 `AppError`。
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("解码错误：{0}")]
    Decode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("写入错误：{0}")]
    Write(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("剪贴板错误：{0}")]
    Clipboard(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),
}
