//! # Screenshot Rounder — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     入口 (main.rs)                        │
//! │        CLI 参数解析 ── 配置加载 ── Ctrl+C 等待            │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕          orchestrator（生命周期编排）             │
//! │                                                          │
//! │  ┌─ watcher ──── 目录创建事件 → 有界队列 → 消费线程       │
//! │  │   └─ patterns      文件名通配符匹配（RegexSet）        │
//! │  │                                                       │
//! │  ├─ clipboard ── ClipboardBridge（读写 + 自写入记账）     │
//! │  │   └─ poller       固定间隔轮询 + 回环防护              │
//! │  │                                                       │
//! │  ├─ dispatch ─── DispatchGuard（同一身份互斥，RAII 票据） │
//! │  │                                                       │
//! │  ├─ processor ── 解码 → 半径策略 → 圆角蒙版 → 编码落盘    │
//! │  │                                                       │
//! │  ├─ shutdown ─── 显式停止令牌（signal + join）            │
//! │  ├─ config ───── JSON 配置加载与路径展开                  │
//! │  └─ error ────── AppError（统一应用级错误）               │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，启动失败与单文件入口的返回类型 |
//! | [`config`] | 配置文件加载、默认值、`~` 路径展开 |
//! | [`processor`] | 图片解码、圆角半径策略、蒙版合成、输出落盘 |
//! | [`clipboard`] | 剪贴板读写桥、能力探测、轮询触发器 |
//! | [`watcher`] | 目录创建事件监听、文件名模式过滤、静置延迟派发 |
//! | [`dispatch`] | 同一图片身份的互斥派发守卫（RAII 自动释放） |
//! | [`shutdown`] | 跨线程停止令牌，停止时等待循环真正退出 |
//! | [`orchestrator`] | 组装各组件、启动/停止两条触发循环、手动单文件入口 |

pub mod clipboard;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod orchestrator;
pub mod processor;
pub mod shutdown;
pub mod watcher;
