//! HEVC 解码图像缓冲核心.
//!
//! 提供 HEVC/H.265 解码器所需的图像缓冲层:
//!
//! - 带边界与一致性裁剪窗口的采样平面存储 ([`plane`])
//! - CTB/CB/PB/TU/去块 五级块元数据网格, 像素坐标 O(1) 寻址
//!   ([`grid`], [`picture`] 的访问器)
//! - 逐 CTB 解码进度与任务计数同步, 支撑波前/帧级并行
//!   ([`picture::PictureSync`])
//! - 图像生命周期: 参考状态、输出标志、完整性追踪与缓冲复用
//!
//! 码流解析、预测、重建与环内滤波是外部协作方的职责, 本 crate
//! 只负责它们共享的那块状态.

pub mod grid;
pub mod params;
pub mod picture;
pub mod plane;
pub mod sao;

pub use grid::BlockGrid;
pub use params::SequenceParams;
pub use picture::{
    CbInfo, CtbInfo, CtbProgress, DeblockFlags, Integrity, MotionVector, PartMode, PbMotion,
    Picture, PictureSync, PredMode, ReferenceState, SeiHashResult,
};
pub use plane::{Plane, PlaneView, PlaneViewMut};
pub use sao::{SaoChannelParams, SaoInfo, SaoMode};
