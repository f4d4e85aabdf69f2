//! 图像块元数据访问器.
//!
//! 对标 image.h 的内联访问器集合 (`set_pred_mode` /
//! `get_log2CbSize` / `set_deblk_bS` ...). 所有坐标都是亮度
//! 像素坐标, 除非另有说明; 读取一律落在对应层级的最小单元上,
//! 与写入时的块尺寸无关. 写入按原位域的取值范围做 debug 断言.

use bitflags::bitflags;

use crate::sao::SaoInfo;

use super::{PartMode, PbMotion, Picture, PredMode};

/// TU 位域: 非零系数标志位
pub const TU_FLAG_NONZERO_COEFF: u8 = 1 << 7;
/// TU 位域: 各深度 split_transform 位掩码 (bit0..=4 对应深度 0..=4)
pub const TU_FLAG_SPLIT_TRANSFORM_MASK: u8 = 0x1f;

/// 去块 4x4 单元中边界强度占用的低 2 位
pub const DEBLOCK_BS_MASK: u8 = 0x03;

bitflags! {
    /// 去块 4x4 单元的标志位 (低 2 位保留给边界强度)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DeblockFlags: u8 {
        /// 存在垂直变换边
        const VERTICAL_EDGE = 1 << 4;
        /// 存在水平变换边
        const HORIZONTAL_EDGE = 1 << 5;
        /// 存在垂直预测块边
        const PB_EDGE_VERTICAL = 1 << 6;
        /// 存在水平预测块边
        const PB_EDGE_HORIZONTAL = 1 << 7;
    }
}

// ============================================================
// CB 元数据
// ============================================================

impl Picture {
    /// 对一个 CB 覆盖区域写入预测模式
    pub fn set_pred_mode(&mut self, x: u32, y: u32, log2_blk_size: u8, mode: PredMode) {
        self.cb_info
            .update_blk(x, y, log2_blk_size, |cb| cb.pred_mode = mode);
    }

    /// 读取预测模式
    pub fn get_pred_mode(&self, x: u32, y: u32) -> PredMode {
        self.cb_info.get(x, y).pred_mode
    }

    /// cu_skip_flag: 预测模式为 Skip
    pub fn get_cu_skip_flag(&self, x: u32, y: u32) -> bool {
        self.get_pred_mode(x, y) == PredMode::Skip
    }

    /// 对一个 CB 覆盖区域置 PCM 标志
    pub fn set_pcm_flag(&mut self, x: u32, y: u32, log2_blk_size: u8) {
        self.cb_info
            .update_blk(x, y, log2_blk_size, |cb| cb.pcm_flag = true);
    }

    /// 读取 PCM 标志
    pub fn get_pcm_flag(&self, x: u32, y: u32) -> bool {
        self.cb_info.get(x, y).pcm_flag
    }

    /// 对一个 CB 覆盖区域置变换量化旁路标志
    pub fn set_cu_transquant_bypass(&mut self, x: u32, y: u32, log2_blk_size: u8) {
        self.cb_info
            .update_blk(x, y, log2_blk_size, |cb| cb.cu_transquant_bypass = true);
    }

    /// 读取变换量化旁路标志
    pub fn get_cu_transquant_bypass(&self, x: u32, y: u32) -> bool {
        self.cb_info.get(x, y).cu_transquant_bypass
    }

    /// 记录 CB 尺寸 log2, 只写在 CB 左上角单元
    ///
    /// 其余被覆盖单元保持默认值 0 (未设置), 读取方据此区分
    /// 左上角与块内部.
    pub fn set_log2_cb_size(&mut self, x0: u32, y0: u32, log2_cb_size: u8) {
        debug_assert!(log2_cb_size <= 6, "log2_cb_size={} 超出范围", log2_cb_size);
        self.cb_info
            .update(x0, y0, |cb| cb.log2_cb_size = log2_cb_size);
    }

    /// 读取 CB 尺寸 log2 (0 表示该单元不是 CB 左上角)
    pub fn get_log2_cb_size(&self, x0: u32, y0: u32) -> u8 {
        self.cb_info.get(x0, y0).log2_cb_size
    }

    /// 以最小 CB 单元坐标读取 CB 尺寸 log2
    pub fn get_log2_cb_size_cb_units(&self, cb_x: usize, cb_y: usize) -> u8 {
        self.cb_info.get_units(cb_x, cb_y).log2_cb_size
    }

    /// 记录划分模式, 只写在 CB 左上角单元
    pub fn set_part_mode(&mut self, x: u32, y: u32, mode: PartMode) {
        self.cb_info.update(x, y, |cb| cb.part_mode = mode);
    }

    /// 读取划分模式
    pub fn get_part_mode(&self, x: u32, y: u32) -> PartMode {
        self.cb_info.get(x, y).part_mode
    }

    /// 对一个 CB 覆盖区域写入编码树深度
    pub fn set_ct_depth(&mut self, x: u32, y: u32, log2_blk_size: u8, depth: u8) {
        debug_assert!(depth <= 3, "ct_depth={} 超出范围", depth);
        self.cb_info
            .update_blk(x, y, log2_blk_size, |cb| cb.ct_depth = depth);
    }

    /// 读取编码树深度
    pub fn get_ct_depth(&self, x: u32, y: u32) -> u8 {
        self.cb_info.get(x, y).ct_depth
    }

    /// 对一个 CB 覆盖区域写入亮度量化参数
    pub fn set_qp_y(&mut self, x: u32, y: u32, log2_blk_size: u8, qp_y: i8) {
        assert!(
            x < self.width && y < self.height,
            "set_qp_y 坐标越界: ({}, {})",
            x,
            y
        );
        self.cb_info
            .update_blk(x, y, log2_blk_size, |cb| cb.qp_y = qp_y);
    }

    /// 读取亮度量化参数
    pub fn get_qp_y(&self, x0: u32, y0: u32) -> i8 {
        self.cb_info.get(x0, y0).qp_y
    }
}

// ============================================================
// PB 运动信息与帧内模式
// ============================================================

impl Picture {
    /// 对一个 w x h 像素的预测块写入运动信息
    ///
    /// 预测块可以是非正方形 (2NxN 等), 按矩形扇出到覆盖的
    /// 每个最小 PU 单元.
    pub fn set_pb_motion(&mut self, x: u32, y: u32, w: u32, h: u32, motion: &PbMotion) {
        self.pb_info.set_rect(x, y, w, h, *motion);
    }

    /// 读取运动信息
    pub fn get_pb_motion(&self, x: u32, y: u32) -> PbMotion {
        self.pb_info.get(x, y)
    }

    /// 对一个块覆盖区域写入亮度帧内预测模式 (0..=34)
    pub fn set_intra_pred_mode(&mut self, x: u32, y: u32, log2_blk_size: u8, mode: u8) {
        debug_assert!(mode <= 34, "帧内预测模式 {} 超出范围", mode);
        self.intra_pred_mode.set_blk(x, y, log2_blk_size, mode);
    }

    /// 读取亮度帧内预测模式
    pub fn get_intra_pred_mode(&self, x: u32, y: u32) -> u8 {
        self.intra_pred_mode.get(x, y)
    }
}

// ============================================================
// TU 位域
// ============================================================

impl Picture {
    /// 在某变换深度置 split_transform 位 (单个最小 TU 单元)
    pub fn set_split_transform_flag(&mut self, x0: u32, y0: u32, trafo_depth: u8) {
        debug_assert!(trafo_depth <= 4, "trafo_depth={} 超出范围", trafo_depth);
        self.tu_info.or(x0, y0, 1u8 << trafo_depth);
    }

    /// 读取某变换深度的 split_transform 位
    pub fn get_split_transform_flag(&self, x0: u32, y0: u32, trafo_depth: u8) -> bool {
        debug_assert!(trafo_depth <= 4, "trafo_depth={} 超出范围", trafo_depth);
        self.tu_info.get(x0, y0) & (1u8 << trafo_depth) != 0
    }

    /// 对一个 TU 覆盖区域置非零系数标志
    ///
    /// 按位或扇出: 不清除同单元中已置的 split_transform 位.
    pub fn set_nonzero_coefficient(&mut self, x: u32, y: u32, log2_trafo_size: u8) {
        self.tu_info
            .or_blk(x, y, log2_trafo_size, TU_FLAG_NONZERO_COEFF);
    }

    /// 读取非零系数标志
    pub fn get_nonzero_coefficient(&self, x: u32, y: u32) -> bool {
        self.tu_info.get(x, y) & TU_FLAG_NONZERO_COEFF != 0
    }
}

// ============================================================
// 去块滤波元数据 (固定 4x4 粒度)
// ============================================================

impl Picture {
    /// 按位或合入去块标志位
    ///
    /// 滤波器会探到图像右/下边缘之外一个单元, 越界坐标按原
    /// 实现静默忽略; 边界强度位不受影响.
    pub fn add_deblock_flags(&mut self, x0: u32, y0: u32, flags: DeblockFlags) {
        let xd = (x0 >> 2) as usize;
        let yd = (y0 >> 2) as usize;
        if xd < self.deblk_info.width_units() && yd < self.deblk_info.height_units() {
            self.deblk_info.or(x0, y0, flags.bits());
        }
    }

    /// 读取去块标志位 (不含边界强度位)
    pub fn get_deblock_flags(&self, x0: u32, y0: u32) -> DeblockFlags {
        DeblockFlags::from_bits_truncate(self.deblk_info.get(x0, y0))
    }

    /// 写入边界强度 (0..=3)
    ///
    /// 掩码读改写: 只替换低 2 位, 已置的边/预测块边标志保持
    /// 不变.
    pub fn set_deblock_bs(&mut self, x0: u32, y0: u32, bs: u8) {
        debug_assert!(bs <= 3, "边界强度 {} 超出范围", bs);
        self.deblk_info
            .update(x0, y0, |cell| *cell = (*cell & !DEBLOCK_BS_MASK) | bs);
    }

    /// 读取边界强度
    pub fn get_deblock_bs(&self, x0: u32, y0: u32) -> u8 {
        self.deblk_info.get(x0, y0) & DEBLOCK_BS_MASK
    }
}

// ============================================================
// CTB 元数据
// ============================================================

impl Picture {
    /// 以 CTB 单元坐标记录所属 slice 首 CTB 的光栅地址
    pub fn set_slice_addr_rs(&mut self, ctb_x: usize, ctb_y: usize, addr: u16) {
        self.ctb_info
            .update_units(ctb_x, ctb_y, |ctb| ctb.slice_addr_rs = addr);
    }

    /// 以 CTB 单元坐标读取所属 slice 首 CTB 的光栅地址
    pub fn get_slice_addr_rs(&self, ctb_x: usize, ctb_y: usize) -> u16 {
        self.ctb_info.get_units(ctb_x, ctb_y).slice_addr_rs
    }

    /// 以 CTB 光栅索引读取所属 slice 首 CTB 的光栅地址
    pub fn get_slice_addr_rs_at(&self, ctb_rs: usize) -> u16 {
        self.ctb_info.get_at(ctb_rs).slice_addr_rs
    }

    /// 以像素坐标记录 slice header 索引
    pub fn set_slice_header_index(&mut self, x: u32, y: u32, index: u16) {
        self.ctb_info
            .update(x, y, |ctb| ctb.slice_header_index = index);
    }

    /// 以像素坐标读取 slice header 索引
    pub fn get_slice_header_index(&self, x: u32, y: u32) -> u16 {
        self.ctb_info.get(x, y).slice_header_index
    }

    /// 以 CTB 单元坐标写入 SAO 参数
    pub fn set_sao_info(&mut self, ctb_x: usize, ctb_y: usize, sao: &SaoInfo) {
        let sao = *sao;
        self.ctb_info.update_units(ctb_x, ctb_y, |ctb| ctb.sao = sao);
    }

    /// 以 CTB 单元坐标读取 SAO 参数
    pub fn get_sao_info(&self, ctb_x: usize, ctb_y: usize) -> SaoInfo {
        self.ctb_info.get_units(ctb_x, ctb_y).sao
    }

    /// 记录解码该 CTB 的线程上下文 id
    pub fn set_ctb_task_context_id(&mut self, ctb_x: usize, ctb_y: usize, id: u16) {
        self.ctb_info
            .update_units(ctb_x, ctb_y, |ctb| ctb.task_context_id = id);
    }

    /// 读取解码该 CTB 的线程上下文 id
    pub fn get_ctb_task_context_id(&self, ctb_x: usize, ctb_y: usize) -> u16 {
        self.ctb_info.get_units(ctb_x, ctb_y).task_context_id
    }
}
