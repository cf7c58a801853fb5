//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义应用级 `AppError` 枚举，承载启动验证、配置加载与单文件入口的失败。
//! 处理链路内部的错误（解码 / 写入 / 剪贴板）由 `processor::ProcessError`
//! 表达，通过 `From` 上转，无需手动 map。
//!
//! 致命与非致命的边界：`Setup` 只在启动阶段出现并终止进程；
//! `Process` 的各分支都只影响单个处理请求，触发循环收到后记录日志并继续运行。

use crate::processor::ProcessError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 启动条件不满足（监控目录缺失等），仅在启动阶段出现
    #[error("初始化错误：{0}")]
    Setup(String),

    /// 配置文件无法解析
    #[error("配置错误：{0}")]
    Config(String),

    /// 同一文件已有在途处理请求
    #[error("任务已在进行中：{0}")]
    AlreadyInFlight(String),

    /// 图片处理链路错误（解码 / 蒙版 / 写入 / 剪贴板）
    #[error("{0}")]
    Process(#[from] ProcessError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误：{0}")]
    Io(#[from] std::io::Error),
}
