//! # 输出目的地模块
//!
//! ## 设计思路
//!
//! 目的地解析是纯函数：只根据输入路径与配置推导结果，不触碰文件系统。
//! 目录创建等副作用全部留给编排层，解析逻辑因此可以穷举测试。
//!
//! 优先级：覆盖原文件 > 输出目录 > 仅临时文件（磁盘持久化被关闭时）。

use std::path::{Path, PathBuf};

use crate::config::AppConfig;

/// 解析后的输出目的地。
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OutputDestination {
    /// 持久化到固定路径。
    Persistent(PathBuf),
    /// 不做持久化，结果只写入新建的临时文件。
    Ephemeral,
}

/// 根据配置解析输出目的地。
pub(crate) fn resolve_output_path(input: &Path, config: &AppConfig) -> OutputDestination {
    if config.replace_original {
        return OutputDestination::Persistent(input.to_path_buf());
    }

    if !config.save_to_desktop {
        return OutputDestination::Ephemeral;
    }

    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let file_name = match input.extension() {
        Some(ext) => format!("{}_rounded.{}", stem, ext.to_string_lossy()),
        None => format!("{}_rounded", stem),
    };

    OutputDestination::Persistent(config.output_folder_path().join(file_name))
}
