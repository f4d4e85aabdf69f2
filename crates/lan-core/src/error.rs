//! 统一错误类型定义.
//!
//! 所有 Lan crate 共用的错误类型, 支持跨模块传播.
//!
//! 注意错误分两层: 这里的 `LanError` 只覆盖可恢复/可上报的
//! 条件 (分配失败、非法配置参数等). 粒度推导不一致导致的索引
//! 越界、任务计数变负、进度回退等属于上游逻辑错误, 以断言直接
//! 终止, 不作为错误值返回.

use thiserror::Error;

/// Lan 框架统一错误类型
#[derive(Debug, Error)]
pub enum LanError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 无效的平面分量索引 (仅 0/1/2 合法)
    #[error("无效的平面分量索引: {0}")]
    InvalidComponent(usize),

    /// 无效数据
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// 内存分配失败
    #[error("内存分配失败: {0}")]
    OutOfMemory(String),

    /// 不支持的操作
    #[error("不支持的操作: {0}")]
    Unsupported(String),

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

/// Lan 框架统一 Result 类型
pub type LanResult<T> = Result<T, LanError>;
