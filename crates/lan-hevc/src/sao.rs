//! SAO (采样自适应偏移) 参数.
//!
//! 对标 libde265 的 `sao_info`: 每个 CTB 为三个分量各记录一组
//! SAO 模式与偏移, 由环内滤波协作方读取. 本核心只负责存储.

/// 单分量 SAO 模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaoMode {
    /// 不做 SAO
    #[default]
    Off,
    /// 边带偏移
    Band,
    /// 边缘偏移
    Edge,
}

/// 单分量 SAO 参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaoChannelParams {
    /// SAO 模式
    pub mode: SaoMode,
    /// edge 模式的边缘类别 (0..=3)
    pub type_idx: u8,
    /// band 模式的起始边带 (0..=31)
    pub band_position: u8,
    /// 四个偏移值
    pub offset: [i8; 4],
}

/// 每 CTB 的 SAO 参数 (Y/Cb/Cr 各一组)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaoInfo {
    /// 按分量索引 (0=Y, 1=Cb, 2=Cr)
    pub channel: [SaoChannelParams; 3],
}
