//! 序列级参数.
//!
//! 对标 libde265 `seq_parameter_set` 中与图像缓冲相关的子集:
//! 图像尺寸、色度格式与各级块划分粒度. 序列/图像参数集的
//! 码流解析属于外部协作方, 这里只接收推导结果并做一致性校验.

use lan_core::{ChromaFormat, LanError, LanResult};

/// 序列参数 (图像缓冲所需子集)
///
/// 各粒度 log2 值在图像分配后不可再变化, 所有像素坐标到
/// 单元索引的换算都依赖它们.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceParams {
    /// 亮度宽度 (像素)
    pub width: u32,
    /// 亮度高度 (像素)
    pub height: u32,
    /// 色度格式
    pub chroma_format: ChromaFormat,
    /// CTB 尺寸 log2 (4..=6, 即 16/32/64)
    pub log2_ctb_size: u8,
    /// 最小编码块 (CB) 尺寸 log2 (3..=log2_ctb_size)
    pub log2_min_cb_size: u8,
    /// 最小预测块 (PU) 尺寸 log2 (2..=log2_min_cb_size)
    pub log2_min_pu_size: u8,
    /// 最小变换块 (TU) 尺寸 log2 (2..=min(5, log2_min_cb_size))
    pub log2_min_tu_size: u8,
}

impl SequenceParams {
    /// 创建并校验序列参数
    pub fn new(
        width: u32,
        height: u32,
        chroma_format: ChromaFormat,
        log2_ctb_size: u8,
        log2_min_cb_size: u8,
        log2_min_pu_size: u8,
        log2_min_tu_size: u8,
    ) -> LanResult<Self> {
        if width == 0 || height == 0 {
            return Err(LanError::InvalidArgument(format!(
                "HEVC: 图像尺寸非法: {}x{}",
                width, height
            )));
        }
        if !(4..=6).contains(&log2_ctb_size) {
            return Err(LanError::InvalidArgument(format!(
                "HEVC: log2_ctb_size={} 超出 [4, 6]",
                log2_ctb_size
            )));
        }
        if !(3..=log2_ctb_size).contains(&log2_min_cb_size) {
            return Err(LanError::InvalidArgument(format!(
                "HEVC: log2_min_cb_size={} 超出 [3, {}]",
                log2_min_cb_size, log2_ctb_size
            )));
        }
        if !(2..=log2_min_cb_size).contains(&log2_min_pu_size) {
            return Err(LanError::InvalidArgument(format!(
                "HEVC: log2_min_pu_size={} 超出 [2, {}]",
                log2_min_pu_size, log2_min_cb_size
            )));
        }
        let max_tu = log2_min_cb_size.min(5);
        if !(2..=max_tu).contains(&log2_min_tu_size) {
            return Err(LanError::InvalidArgument(format!(
                "HEVC: log2_min_tu_size={} 超出 [2, {}]",
                log2_min_tu_size, max_tu
            )));
        }
        Ok(Self {
            width,
            height,
            chroma_format,
            log2_ctb_size,
            log2_min_cb_size,
            log2_min_pu_size,
            log2_min_tu_size,
        })
    }

    /// 以 CTB 为单位的图像宽度 (向上取整)
    pub fn pic_width_in_ctbs(&self) -> usize {
        ceil_shift(self.width, self.log2_ctb_size)
    }

    /// 以 CTB 为单位的图像高度 (向上取整)
    pub fn pic_height_in_ctbs(&self) -> usize {
        ceil_shift(self.height, self.log2_ctb_size)
    }

    /// 整幅图像的 CTB 总数
    pub fn ctbs_in_picture(&self) -> usize {
        self.pic_width_in_ctbs() * self.pic_height_in_ctbs()
    }

    /// 以最小 CB 为单位的图像宽度
    pub fn pic_width_in_min_cbs(&self) -> usize {
        ceil_shift(self.width, self.log2_min_cb_size)
    }

    /// 以最小 PU 为单位的图像宽度
    pub fn pic_width_in_min_pus(&self) -> usize {
        ceil_shift(self.width, self.log2_min_pu_size)
    }

    /// 以最小 TU 为单位的图像宽度
    pub fn pic_width_in_min_tus(&self) -> usize {
        ceil_shift(self.width, self.log2_min_tu_size)
    }

    /// CTB 单元坐标到光栅扫描索引
    pub fn ctb_raster_index(&self, ctb_x: usize, ctb_y: usize) -> usize {
        ctb_x + ctb_y * self.pic_width_in_ctbs()
    }
}

/// 按 log2 粒度向上取整的单元数
#[inline]
pub(crate) fn ceil_shift(v: u32, log2: u8) -> usize {
    ((v as usize) + (1usize << log2) - 1) >> log2
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params_64() -> SequenceParams {
        SequenceParams::new(64, 64, ChromaFormat::Yuv420, 5, 3, 2, 2).unwrap()
    }

    #[test]
    fn derived_unit_counts() {
        let sp = params_64();
        assert_eq!(sp.pic_width_in_ctbs(), 2);
        assert_eq!(sp.pic_height_in_ctbs(), 2);
        assert_eq!(sp.ctbs_in_picture(), 4);
        assert_eq!(sp.pic_width_in_min_cbs(), 8);
        assert_eq!(sp.pic_width_in_min_pus(), 16);
        assert_eq!(sp.pic_width_in_min_tus(), 16);
    }

    #[test]
    fn non_aligned_dims_round_up() {
        let sp = SequenceParams::new(176, 144, ChromaFormat::Yuv420, 6, 3, 2, 2).unwrap();
        // 176/64 = 2.75 -> 3 列 CTB
        assert_eq!(sp.pic_width_in_ctbs(), 3);
        assert_eq!(sp.pic_height_in_ctbs(), 3);
        assert_eq!(sp.ctb_raster_index(2, 1), 5);
    }

    #[test]
    fn rejects_bad_granularities() {
        assert!(SequenceParams::new(0, 64, ChromaFormat::Yuv420, 5, 3, 2, 2).is_err());
        assert!(SequenceParams::new(64, 64, ChromaFormat::Yuv420, 7, 3, 2, 2).is_err());
        assert!(SequenceParams::new(64, 64, ChromaFormat::Yuv420, 4, 5, 2, 2).is_err());
        assert!(SequenceParams::new(64, 64, ChromaFormat::Yuv420, 5, 3, 4, 2).is_err());
        assert!(SequenceParams::new(64, 64, ChromaFormat::Yuv420, 5, 3, 2, 4).is_err());
    }
}
