//! 块元数据网格.
//!
//! 对标 libde265 image.h 中的 `SET_CB_BLK` / `OR_TU_BLK` 宏:
//! CTB/CB/PB/TU/去块 五级元数据共用同一个按粒度参数化的泛型
//! 网格, 像素坐标右移粒度 log2 即得单元索引, O(1) 寻址.
//!
//! 未写入的单元读出构造时给定的显式默认值, 不依赖分配器的
//! 零填充语义.

use std::ops::BitOrAssign;

use lan_core::{LanError, LanResult};

use crate::params::ceil_shift;

/// 按固定粒度划分的二维元数据网格
///
/// 数组长度固定为两个方向上 ceil(图像尺寸 / 单元粒度) 的乘积,
/// 粒度在分配后不可变化. 像素级越界由调用方负责, 但换算出的
/// 单元索引必须落在数组内, 否则视为上游参数推导错误直接断言.
#[derive(Debug, Clone)]
pub struct BlockGrid<T> {
    cells: Vec<T>,
    default: T,
    log2_unit: u8,
    width_units: usize,
    height_units: usize,
}

impl<T: Copy> BlockGrid<T> {
    /// 按图像尺寸与单元粒度分配网格, 全部单元填入默认值
    pub fn new(pic_width: u32, pic_height: u32, log2_unit: u8, default: T) -> LanResult<Self> {
        let width_units = ceil_shift(pic_width, log2_unit);
        let height_units = ceil_shift(pic_height, log2_unit);
        let len = width_units * height_units;
        let mut cells = Vec::new();
        cells.try_reserve_exact(len).map_err(|_| {
            LanError::OutOfMemory(format!("块网格分配失败: {}x{} 单元", width_units, height_units))
        })?;
        cells.resize(len, default);
        Ok(Self {
            cells,
            default,
            log2_unit,
            width_units,
            height_units,
        })
    }

    /// 单元粒度 log2
    pub fn log2_unit(&self) -> u8 {
        self.log2_unit
    }

    /// 横向单元数 (即行跨度)
    pub fn width_units(&self) -> usize {
        self.width_units
    }

    /// 纵向单元数
    pub fn height_units(&self) -> usize {
        self.height_units
    }

    /// 单元总数
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// 是否为空网格
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// 单元坐标到数组索引; 越界即断言终止
    #[inline]
    fn index_units(&self, xu: usize, yu: usize) -> usize {
        assert!(
            xu < self.width_units && yu < self.height_units,
            "块网格索引越界: 单元 ({}, {}) 超出 {}x{}",
            xu,
            yu,
            self.width_units,
            self.height_units
        );
        xu + yu * self.width_units
    }

    /// 像素坐标到数组索引
    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        self.index_units(
            (x >> self.log2_unit) as usize,
            (y >> self.log2_unit) as usize,
        )
    }

    /// 读取像素坐标所在单元
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> T {
        self.cells[self.index(x, y)]
    }

    /// 以单元坐标读取
    #[inline]
    pub fn get_units(&self, xu: usize, yu: usize) -> T {
        self.cells[self.index_units(xu, yu)]
    }

    /// 以光栅扫描索引读取
    #[inline]
    pub fn get_at(&self, idx: usize) -> T {
        assert!(idx < self.cells.len(), "块网格光栅索引越界: {}", idx);
        self.cells[idx]
    }

    /// 写入像素坐标所在的单个单元
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, v: T) {
        let idx = self.index(x, y);
        self.cells[idx] = v;
    }

    /// 更新像素坐标所在的单个单元
    #[inline]
    pub fn update(&mut self, x: u32, y: u32, f: impl FnOnce(&mut T)) {
        let idx = self.index(x, y);
        f(&mut self.cells[idx]);
    }

    /// 以单元坐标更新单个单元
    #[inline]
    pub fn update_units(&mut self, xu: usize, yu: usize, f: impl FnOnce(&mut T)) {
        let idx = self.index_units(xu, yu);
        f(&mut self.cells[idx]);
    }

    /// 对一个 2^log2_blk_size 见方的块做覆盖写 (扇出写)
    ///
    /// 值被复制进块覆盖到的每一个最小单元; 之后对区域内任意
    /// 像素坐标的读取都会得到该值, 区域外单元不受影响.
    pub fn set_blk(&mut self, x: u32, y: u32, log2_blk_size: u8, v: T) {
        self.update_blk(x, y, log2_blk_size, |cell| *cell = v);
    }

    /// 对块覆盖到的每个最小单元执行一次更新
    pub fn update_blk(&mut self, x: u32, y: u32, log2_blk_size: u8, f: impl Fn(&mut T)) {
        debug_assert!(
            log2_blk_size >= self.log2_unit,
            "块尺寸 log2 {} 小于网格粒度 {}",
            log2_blk_size,
            self.log2_unit
        );
        let x0 = (x >> self.log2_unit) as usize;
        let y0 = (y >> self.log2_unit) as usize;
        let n = 1usize << (log2_blk_size - self.log2_unit);
        // 先校验右下角单元, 让越界在写入前暴露
        self.index_units(x0 + n - 1, y0 + n - 1);
        for yu in y0..y0 + n {
            for xu in x0..x0 + n {
                f(&mut self.cells[xu + yu * self.width_units]);
            }
        }
    }

    /// 对一个任意宽高的像素矩形做覆盖写
    ///
    /// 供非正方形块 (如 2NxN 预测块) 使用; 矩形以像素计,
    /// 覆盖到的每个最小单元都写入同一值.
    pub fn set_rect(&mut self, x: u32, y: u32, w: u32, h: u32, v: T) {
        if w == 0 || h == 0 {
            return;
        }
        let x0 = (x >> self.log2_unit) as usize;
        let y0 = (y >> self.log2_unit) as usize;
        let x1 = ((x + w - 1) >> self.log2_unit) as usize;
        let y1 = ((y + h - 1) >> self.log2_unit) as usize;
        self.index_units(x1, y1);
        for yu in y0..=y1 {
            for xu in x0..=x1 {
                self.cells[xu + yu * self.width_units] = v;
            }
        }
    }

    /// 全部单元重置为默认值
    pub fn clear(&mut self) {
        let d = self.default;
        self.cells.fill(d);
    }
}

impl<T: Copy + BitOrAssign> BlockGrid<T> {
    /// 对单个单元按位或
    #[inline]
    pub fn or(&mut self, x: u32, y: u32, v: T) {
        let idx = self.index(x, y);
        self.cells[idx] |= v;
    }

    /// 对块覆盖到的每个最小单元按位或 (扇出或)
    ///
    /// 只置位不清位: 同一单元中已置的其他位保持不变.
    pub fn or_blk(&mut self, x: u32, y: u32, log2_blk_size: u8, v: T) {
        self.update_blk(x, y, log2_blk_size, |cell| *cell |= v);
    }
}
