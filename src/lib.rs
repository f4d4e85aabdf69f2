//! # Lan (澜)
//!
//! 纯 Rust 实现的 HEVC/H.265 解码图像缓冲核心.
//!
//! Lan 提供多线程 HEVC 解码器共享的图像状态层:
//! - **采样平面**: 带边界分配与一致性裁剪窗口的 Y/Cb/Cr 存储
//! - **块元数据**: CTB/CB/PB/TU/去块 五级网格, 像素坐标 O(1) 寻址
//! - **进度同步**: 逐 CTB 解码进度与任务计数, 支撑波前/帧级并行
//! - **生命周期**: 参考状态、输出标志、完整性追踪与缓冲复用
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use lan::core::ChromaFormat;
//! use lan::hevc::{Picture, SequenceParams};
//!
//! let params = SequenceParams::new(1920, 1080, ChromaFormat::Yuv420, 6, 3, 2, 2)?;
//! let mut pic = Picture::alloc(&params, 64)?;
//! pic.poc = 0;
//! # Ok::<(), lan::core::LanError>(())
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `lan-core` | 核心类型与错误 |
//! | `lan-hevc` | HEVC 图像缓冲、元数据网格与同步 |

/// 核心类型与错误
pub use lan_core as core;

/// HEVC 图像缓冲核心
pub use lan_hevc as hevc;

/// 获取 Lan 版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
