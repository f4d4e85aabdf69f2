//! 色度格式定义.
//!
//! 对标 libde265 的 `de265_chroma`, 描述亮度与色度平面之间的
//! 子采样关系.

use std::fmt;

/// 色度采样格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChromaFormat {
    /// 仅亮度平面, 无色度
    Monochrome,
    /// YUV 4:2:0, 色度分辨率为亮度的 1/2 x 1/2 (HEVC Main Profile 默认)
    #[default]
    Yuv420,
    /// YUV 4:2:2, 色度水平分辨率为亮度的 1/2
    Yuv422,
    /// YUV 4:4:4, 色度与亮度同分辨率
    Yuv444,
}

impl ChromaFormat {
    /// log2 水平子采样
    pub const fn sub_width_log2(&self) -> u32 {
        match self {
            Self::Yuv420 | Self::Yuv422 => 1,
            Self::Monochrome | Self::Yuv444 => 0,
        }
    }

    /// log2 垂直子采样
    pub const fn sub_height_log2(&self) -> u32 {
        match self {
            Self::Yuv420 => 1,
            Self::Monochrome | Self::Yuv422 | Self::Yuv444 => 0,
        }
    }

    /// 是否携带色度平面
    pub const fn has_chroma(&self) -> bool {
        !matches!(self, Self::Monochrome)
    }

    /// 由亮度宽度导出色度宽度 (向上取整; 单色格式返回 0)
    pub const fn chroma_width(&self, luma_width: u32) -> u32 {
        if !self.has_chroma() {
            return 0;
        }
        let shift = self.sub_width_log2();
        (luma_width + (1 << shift) - 1) >> shift
    }

    /// 由亮度高度导出色度高度 (向上取整; 单色格式返回 0)
    pub const fn chroma_height(&self, luma_height: u32) -> u32 {
        if !self.has_chroma() {
            return 0;
        }
        let shift = self.sub_height_log2();
        (luma_height + (1 << shift) - 1) >> shift
    }
}

impl fmt::Display for ChromaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Monochrome => "monochrome",
            Self::Yuv420 => "4:2:0",
            Self::Yuv422 => "4:2:2",
            Self::Yuv444 => "4:4:4",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chroma_dims_420() {
        let f = ChromaFormat::Yuv420;
        assert_eq!(f.chroma_width(64), 32);
        assert_eq!(f.chroma_height(64), 32);
        // 奇数尺寸向上取整
        assert_eq!(f.chroma_width(65), 33);
        assert_eq!(f.chroma_height(1), 1);
    }

    #[test]
    fn chroma_dims_other_formats() {
        assert_eq!(ChromaFormat::Yuv422.chroma_width(64), 32);
        assert_eq!(ChromaFormat::Yuv422.chroma_height(64), 64);
        assert_eq!(ChromaFormat::Yuv444.chroma_width(64), 64);
        assert_eq!(ChromaFormat::Monochrome.chroma_width(64), 0);
        assert!(!ChromaFormat::Monochrome.has_chroma());
    }
}
