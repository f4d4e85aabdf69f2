//! 时间戳定义.

/// 未定义时间戳的哨兵值 (对标 FFmpeg 的 `AV_NOPTS_VALUE`)
pub const NOPTS_VALUE: i64 = i64::MIN;

/// 时间戳是否有效
#[inline]
pub const fn is_valid(pts: i64) -> bool {
    pts != NOPTS_VALUE
}
