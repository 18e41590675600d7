//! # 图片压缩工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 外壳 (main.rs / 宿主应用)                 │
//! │   settings ── CompressorContext ── CompressorService     │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓ Result<CompressedImage, CompressError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↓            核心 (Rust)                           │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ compressor ─ 规划·降采样解码·缩放·方向·编码·模糊检测 │
//! │  │                                                       │
//! │  ├─ storage            输出目录 (返回 Result)             │
//! │  └─ settings           JSON 设置文件 → CompressConfig     │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，外壳层的返回类型 |
//! | [`compressor`] | 图片压缩链路与模糊检测 |
//! | [`storage`] | 输出目录的获取与自动创建 |
//! | [`settings`] | 设置文件读写 |

pub mod error;
pub mod compressor;
pub mod storage;
pub mod settings;
