//! 采样平面存储.
//!
//! 对标 `de265_image` 中的 y/cb/cr 缓冲: 四周带边界 (border)
//! 的完整分配, 外加一个指向逻辑 (0,0) 首像素的视图. 原实现的
//! 裸指针 + 偏移在这里以切片视图替代; 边界区域的访问是单独的
//! 显式能力 (`view_full`), 普通视图不会暴露边界行.

use lan_core::{LanError, LanResult};

/// 单个采样平面
///
/// 不变式: stride = 逻辑宽度 + 2 * border.
#[derive(Debug, Clone, Default)]
pub struct Plane {
    data: Vec<u8>,
    width: usize,
    height: usize,
    stride: usize,
    border: usize,
}

/// 平面只读视图: 数据切片 + 行跨度
///
/// `data[0]` 即视图原点处的采样; 行与行之间相距 `stride` 字节.
#[derive(Debug, Clone, Copy)]
pub struct PlaneView<'a> {
    /// 以视图原点为首像素的数据切片
    pub data: &'a [u8],
    /// 行跨度 (字节)
    pub stride: usize,
    /// 可见宽度 (像素)
    pub width: usize,
    /// 可见高度 (像素)
    pub height: usize,
}

impl<'a> PlaneView<'a> {
    /// 第 y 行的可见部分
    pub fn row(&self, y: usize) -> &'a [u8] {
        &self.data[y * self.stride..y * self.stride + self.width]
    }

    /// 读取单个采样
    pub fn sample(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }
}

/// 平面可写视图
#[derive(Debug)]
pub struct PlaneViewMut<'a> {
    /// 以视图原点为首像素的数据切片
    pub data: &'a mut [u8],
    /// 行跨度 (字节)
    pub stride: usize,
    /// 可见宽度 (像素)
    pub width: usize,
    /// 可见高度 (像素)
    pub height: usize,
}

impl PlaneViewMut<'_> {
    /// 第 y 行的可见部分
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        &mut self.data[y * self.stride..y * self.stride + self.width]
    }

    /// 写入单个采样
    pub fn set_sample(&mut self, x: usize, y: usize, v: u8) {
        self.data[y * self.stride + x] = v;
    }
}

impl Plane {
    /// 分配平面, 四周各保留 border 像素边界, 内容清零
    pub fn alloc(width: usize, height: usize, border: usize) -> LanResult<Self> {
        let stride = width + 2 * border;
        let full_height = height + 2 * border;
        let len = stride * full_height;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| {
            LanError::OutOfMemory(format!(
                "平面分配失败: {}x{} border={}",
                width, height, border
            ))
        })?;
        data.resize(len, 0);
        Ok(Self {
            data,
            width,
            height,
            stride,
            border,
        })
    }

    /// 空平面 (单色图像的色度占位)
    pub fn empty() -> Self {
        Self::default()
    }

    /// 平面是否为空
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 逻辑宽度 (像素, 不含边界)
    pub fn width(&self) -> usize {
        self.width
    }

    /// 逻辑高度 (像素, 不含边界)
    pub fn height(&self) -> usize {
        self.height
    }

    /// 行跨度 (字节)
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// 边界宽度 (像素)
    pub fn border(&self) -> usize {
        self.border
    }

    /// 逻辑 (0,0) 在缓冲中的偏移
    #[inline]
    fn origin(&self) -> usize {
        self.border * self.stride + self.border
    }

    /// 以逻辑 (0,0) 为原点的只读视图
    pub fn view(&self) -> PlaneView<'_> {
        PlaneView {
            data: &self.data[self.origin()..],
            stride: self.stride,
            width: self.width,
            height: self.height,
        }
    }

    /// 以逻辑 (0,0) 为原点的可写视图
    pub fn view_mut(&mut self) -> PlaneViewMut<'_> {
        let origin = self.origin();
        PlaneViewMut {
            data: &mut self.data[origin..],
            stride: self.stride,
            width: self.width,
            height: self.height,
        }
    }

    /// 含边界的完整视图 (显式能力, 供去块/插值协作方使用)
    pub fn view_full(&self) -> PlaneView<'_> {
        PlaneView {
            data: &self.data,
            stride: self.stride,
            width: self.stride,
            height: self.height + 2 * self.border,
        }
    }

    /// 填充整个缓冲 (含边界)
    pub fn fill(&mut self, value: u8) {
        self.data.fill(value);
    }

    /// 从同尺寸平面整体复制 (含边界)
    pub fn copy_from(&mut self, other: &Plane) -> LanResult<()> {
        if self.width != other.width || self.height != other.height || self.border != other.border
        {
            return Err(LanError::InvalidArgument(format!(
                "平面复制尺寸不匹配: {}x{}+{} <- {}x{}+{}",
                self.width, self.height, self.border, other.width, other.height, other.border
            )));
        }
        self.data.copy_from_slice(&other.data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_invariant() {
        let p = Plane::alloc(64, 32, 8).unwrap();
        assert_eq!(p.stride(), 64 + 2 * 8);
        assert!(p.stride() >= p.width() + 2 * p.border());
        let v = p.view();
        assert_eq!(v.width, 64);
        assert_eq!(v.height, 32);
    }

    #[test]
    fn view_origin_lands_on_first_real_sample() {
        let mut p = Plane::alloc(16, 16, 4).unwrap();
        p.fill(0x55);
        p.view_mut().set_sample(0, 0, 0xaa);
        // 逻辑原点写入落在完整缓冲的 (border, border) 处
        let full = p.view_full();
        assert_eq!(full.sample(4, 4), 0xaa);
        assert_eq!(full.sample(3, 4), 0x55);
        assert_eq!(p.view().sample(0, 0), 0xaa);
    }

    #[test]
    fn logical_writes_leave_border_untouched() {
        let mut p = Plane::alloc(8, 8, 2).unwrap();
        p.fill(0x10);
        let mut v = p.view_mut();
        for y in 0..8 {
            v.row_mut(y).fill(0xff);
        }
        let full = p.view_full();
        // 四角边界采样仍是 fill 的值
        assert_eq!(full.sample(0, 0), 0x10);
        assert_eq!(full.sample(full.width - 1, full.height - 1), 0x10);
        assert_eq!(full.sample(1, 5), 0x10);
    }

    #[test]
    fn copy_requires_matching_dims() {
        let mut a = Plane::alloc(16, 16, 2).unwrap();
        let mut b = Plane::alloc(16, 16, 2).unwrap();
        b.fill(9);
        a.copy_from(&b).unwrap();
        assert_eq!(a.view().sample(3, 3), 9);

        let c = Plane::alloc(8, 16, 2).unwrap();
        assert!(a.copy_from(&c).is_err());
    }

    #[test]
    fn empty_plane_views_are_empty() {
        let p = Plane::empty();
        assert!(p.is_empty());
        let v = p.view();
        assert_eq!(v.width, 0);
        assert!(v.data.is_empty());
    }
}
