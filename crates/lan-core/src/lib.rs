//! # lan-core
//!
//! Lan HEVC 图像缓冲核心的基础库, 提供基础类型定义与错误处理.
//!
//! 本 crate 为整个 Lan 项目提供底层基础设施, 对标 libde265
//! 公共头文件中与具体解码算法无关的部分.

pub mod chroma_format;
pub mod error;
pub mod timestamp;

// 重导出常用类型
pub use chroma_format::ChromaFormat;
pub use error::{LanError, LanResult};
