//! 解码图像缓冲.
//!
//! 对标 libde265 的 `de265_image`: 一幅图像同时承担三种角色 ——
//! 解码写入目标、其他图像的参考数据、待输出缓冲. 三种角色的
//! 保留规则不同, 仅当参考状态为 `Unused` 且输出标志为 false
//! 时缓冲才可回收复用.
//!
//! 图像独占其全部平面与元数据网格, 没有任何实体比图像活得更久;
//! 跨线程共享的只有 [`PictureSync`] 句柄.

mod meta;
mod sync;

use std::any::Any;
use std::sync::Arc;

use log::warn;

use lan_core::{ChromaFormat, LanError, LanResult, timestamp};

use crate::grid::BlockGrid;
use crate::params::SequenceParams;
use crate::plane::{Plane, PlaneView, PlaneViewMut};
use crate::sao::SaoInfo;

pub use meta::{
    DEBLOCK_BS_MASK, DeblockFlags, TU_FLAG_NONZERO_COEFF, TU_FLAG_SPLIT_TRANSFORM_MASK,
};
pub use sync::{CtbProgress, PictureSync};

// ============================================================
// 生命周期状态
// ============================================================

/// 参考状态 (对标 libde265 `PictureState`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceState {
    /// 不作为参考
    #[default]
    Unused,
    /// 短期参考
    ShortTerm,
    /// 长期参考
    LongTerm,
}

/// 完整性代码: 图像解码结果的质量分类
///
/// 判别值与原 `INTEGRITY_*` 常量一致. 解码质量问题只作为数据
/// 记录并沿参考链向前传播, 从不中断其他图像的解码.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Integrity {
    /// 解码正确
    #[default]
    Correct = 0,
    /// 依赖的参考图像缺失
    UnavailableReference = 1,
    /// 尚未解码
    NotDecoded = 2,
    /// 解码过程中出错
    DecodingErrors = 3,
    /// 由有问题的参考图像推导而来
    DerivedFromFaultyReference = 4,
}

/// SEI 哈希校验结果 (由解码后的校验协作方写入)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeiHashResult {
    /// 未校验
    #[default]
    Unchecked,
    /// 校验通过
    Correct,
    /// 校验失败
    Incorrect,
}

// ============================================================
// 元数据单元类型
// ============================================================

/// 预测模式 (对标 enum PredMode)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PredMode {
    /// 帧内预测
    #[default]
    Intra,
    /// 帧间预测
    Inter,
    /// 跳过 (帧间, 无残差无运动差分)
    Skip,
}

/// CB 划分模式 (对标 enum PartMode)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartMode {
    /// 不划分
    #[default]
    Part2Nx2N,
    /// 水平对半
    Part2NxN,
    /// 垂直对半
    PartNx2N,
    /// 四等分
    PartNxN,
    /// 非对称: 上 1/4
    Part2NxnU,
    /// 非对称: 下 1/4
    Part2NxnD,
    /// 非对称: 左 1/4
    PartnLx2N,
    /// 非对称: 右 1/4
    PartnRx2N,
}

/// 每 CTB 的元数据单元 (对标 `CTB_info`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CtbInfo {
    /// 所属 slice 首 CTB 的光栅扫描地址
    pub slice_addr_rs: u16,
    /// 所属 slice header 在解码器 slice 表中的索引
    pub slice_header_index: u16,
    /// SAO 参数
    pub sao: SaoInfo,
    /// 解码该 CTB 的线程上下文 id
    pub task_context_id: u16,
}

/// 每个最小 CB 单元的元数据 (对标 `CB_ref_info`)
///
/// 原实现为亚字节位域打包; 按设计改为普通聚合, 各字段的取值
/// 范围在写入访问器中以 debug 断言维持.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CbInfo {
    /// CB 尺寸 log2; 仅写在 CB 左上角单元, 0 表示未设置
    pub log2_cb_size: u8,
    /// 划分模式; 仅写在 CB 左上角单元
    pub part_mode: PartMode,
    /// 编码树深度 (0..=3)
    pub ct_depth: u8,
    /// 预测模式 (需要为后续图像保留)
    pub pred_mode: PredMode,
    /// PCM 标志
    pub pcm_flag: bool,
    /// 变换量化旁路标志
    pub cu_transquant_bypass: bool,
    /// 亮度量化参数
    pub qp_y: i8,
}

/// 运动向量 (1/4 像素精度)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotionVector {
    /// 水平分量
    pub x: i16,
    /// 垂直分量
    pub y: i16,
}

/// 每个最小 PU 单元的运动信息 (对标 `PredVectorInfo`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PbMotion {
    /// L0/L1 运动向量
    pub mv: [MotionVector; 2],
    /// L0/L1 参考索引; -1 表示该列表未使用
    pub ref_idx: [i8; 2],
}

impl Default for PbMotion {
    fn default() -> Self {
        Self {
            mv: [MotionVector::default(); 2],
            ref_idx: [-1, -1],
        }
    }
}

// ============================================================
// 图像缓冲
// ============================================================

/// 解码图像缓冲
pub struct Picture {
    // --- 采样平面 (0=Y, 1=Cb, 2=Cr) ---
    planes: [Plane; 3],
    chroma_format: ChromaFormat,
    width: u32,
    height: u32,
    chroma_width: u32,
    chroma_height: u32,
    border: u32,

    // --- 一致性裁剪窗口 (以亮度采样计) ---
    crop_left: u32,
    crop_right: u32,
    crop_top: u32,
    crop_bottom: u32,

    // --- 解码信息 ---
    /// 图像顺序号低位 (码流原值)
    pub poc_lsb: i32,
    /// 图像顺序号
    pub poc: i32,
    output_flag: bool,
    reference: ReferenceState,
    integrity: Integrity,
    sei_hash_result: SeiHashResult,

    // --- 块元数据网格 ---
    params: SequenceParams,
    ctb_info: BlockGrid<CtbInfo>,
    cb_info: BlockGrid<CbInfo>,
    pb_info: BlockGrid<PbMotion>,
    intra_pred_mode: BlockGrid<u8>,
    tu_info: BlockGrid<u8>,
    deblk_info: BlockGrid<u8>,

    // --- 元信息 ---
    /// 显示时间戳
    pub pts: i64,
    /// 调用方自定义负载
    pub user_data: Option<Box<dyn Any + Send + Sync>>,
    /// 承载该图像的 NAL 单元类型
    pub nal_unit_type: u8,
    /// NAL 时域层 id
    pub nuh_temporal_id: u8,

    // --- 多线程 ---
    sync: Arc<PictureSync>,
}

impl Picture {
    /// 按序列参数分配图像缓冲
    ///
    /// 三个平面与全部元数据网格一次性分配; 任一步失败直接返回
    /// 错误, 不会留下部分构造的图像. 新图像初始为
    /// `Unused` + 待输出, 完整性为 `Correct`.
    pub fn alloc(params: &SequenceParams, border: u32) -> LanResult<Self> {
        let width = params.width;
        let height = params.height;
        let chroma_format = params.chroma_format;
        let chroma_width = chroma_format.chroma_width(width);
        let chroma_height = chroma_format.chroma_height(height);
        // 色度边界按同样的子采样缩小
        let chroma_border = border >> chroma_format.sub_width_log2();

        let y = Plane::alloc(width as usize, height as usize, border as usize)?;
        let (cb, cr) = if chroma_format.has_chroma() {
            (
                Plane::alloc(
                    chroma_width as usize,
                    chroma_height as usize,
                    chroma_border as usize,
                )?,
                Plane::alloc(
                    chroma_width as usize,
                    chroma_height as usize,
                    chroma_border as usize,
                )?,
            )
        } else {
            (Plane::empty(), Plane::empty())
        };

        let ctb_info = BlockGrid::new(width, height, params.log2_ctb_size, CtbInfo::default())?;
        let cb_info = BlockGrid::new(width, height, params.log2_min_cb_size, CbInfo::default())?;
        let pb_info = BlockGrid::new(width, height, params.log2_min_pu_size, PbMotion::default())?;
        let intra_pred_mode = BlockGrid::new(width, height, params.log2_min_pu_size, 0u8)?;
        let tu_info = BlockGrid::new(width, height, params.log2_min_tu_size, 0u8)?;
        // 去块网格固定 4x4 粒度
        let deblk_info = BlockGrid::new(width, height, 2, 0u8)?;

        let sync = Arc::new(PictureSync::new(ctb_info.len()));

        Ok(Self {
            planes: [y, cb, cr],
            chroma_format,
            width,
            height,
            chroma_width,
            chroma_height,
            border,
            crop_left: 0,
            crop_right: 0,
            crop_top: 0,
            crop_bottom: 0,
            poc_lsb: 0,
            poc: 0,
            output_flag: true,
            reference: ReferenceState::Unused,
            integrity: Integrity::Correct,
            sei_hash_result: SeiHashResult::Unchecked,
            params: params.clone(),
            ctb_info,
            cb_info,
            pb_info,
            intra_pred_mode,
            tu_info,
            deblk_info,
            pts: timestamp::NOPTS_VALUE,
            user_data: None,
            nal_unit_type: 0,
            nuh_temporal_id: 0,
            sync,
        })
    }

    // ============================================================
    // 基本属性
    // ============================================================

    /// 亮度宽度 (像素)
    pub fn width(&self) -> u32 {
        self.width
    }

    /// 亮度高度 (像素)
    pub fn height(&self) -> u32 {
        self.height
    }

    /// 色度宽度 (像素)
    pub fn chroma_width(&self) -> u32 {
        self.chroma_width
    }

    /// 色度高度 (像素)
    pub fn chroma_height(&self) -> u32 {
        self.chroma_height
    }

    /// 边界宽度 (亮度像素)
    pub fn border(&self) -> u32 {
        self.border
    }

    /// 色度格式
    pub fn chroma_format(&self) -> ChromaFormat {
        self.chroma_format
    }

    /// 分配该图像所用的序列参数
    pub fn params(&self) -> &SequenceParams {
        &self.params
    }

    // ============================================================
    // 平面访问
    // ============================================================

    /// 按分量索引取只读平面视图 (0=Y, 1=Cb, 2=Cr)
    pub fn plane(&self, component: usize) -> LanResult<PlaneView<'_>> {
        self.planes
            .get(component)
            .map(Plane::view)
            .ok_or(LanError::InvalidComponent(component))
    }

    /// 按分量索引取可写平面视图
    pub fn plane_mut(&mut self, component: usize) -> LanResult<PlaneViewMut<'_>> {
        self.planes
            .get_mut(component)
            .map(Plane::view_mut)
            .ok_or(LanError::InvalidComponent(component))
    }

    /// 按分量索引取含边界的完整视图 (去块/插值的显式能力)
    pub fn plane_full(&self, component: usize) -> LanResult<PlaneView<'_>> {
        self.planes
            .get(component)
            .map(Plane::view_full)
            .ok_or(LanError::InvalidComponent(component))
    }

    /// 以固定值填充三个平面 (含边界)
    pub fn fill(&mut self, y: u8, cb: u8, cr: u8) {
        self.planes[0].fill(y);
        if self.chroma_format.has_chroma() {
            self.planes[1].fill(cb);
            self.planes[2].fill(cr);
        }
    }

    /// 从另一幅同规格图像复制采样与图像级元信息
    ///
    /// 参考状态与同步状态不复制: 两者描述的是各自缓冲当下的
    /// 角色, 不属于图像内容.
    pub fn copy_from(&mut self, other: &Picture) -> LanResult<()> {
        if self.width != other.width
            || self.height != other.height
            || self.chroma_format != other.chroma_format
            || self.border != other.border
        {
            return Err(LanError::InvalidArgument(format!(
                "图像复制规格不匹配: {}x{} {} <- {}x{} {}",
                self.width,
                self.height,
                self.chroma_format,
                other.width,
                other.height,
                other.chroma_format
            )));
        }
        for (dst, src) in self.planes.iter_mut().zip(other.planes.iter()) {
            if !dst.is_empty() {
                dst.copy_from(src)?;
            }
        }
        self.poc_lsb = other.poc_lsb;
        self.poc = other.poc;
        self.integrity = other.integrity;
        self.sei_hash_result = other.sei_hash_result;
        self.pts = other.pts;
        self.nal_unit_type = other.nal_unit_type;
        self.nuh_temporal_id = other.nuh_temporal_id;
        Ok(())
    }

    // ============================================================
    // 一致性裁剪窗口
    // ============================================================

    /// 设置一致性裁剪窗口 (以亮度采样计)
    ///
    /// 只收窄对外可见矩形, 不重新分配. 裁剪量吃掉整个图像属于
    /// 配置错误, 返回 `InvalidArgument`.
    pub fn set_conformance_window(
        &mut self,
        left: u32,
        right: u32,
        top: u32,
        bottom: u32,
    ) -> LanResult<()> {
        if left + right >= self.width || top + bottom >= self.height {
            return Err(LanError::InvalidArgument(format!(
                "一致性窗口非法: l={} r={} t={} b={} 对 {}x{}",
                left, right, top, bottom, self.width, self.height
            )));
        }
        self.crop_left = left;
        self.crop_right = right;
        self.crop_top = top;
        self.crop_bottom = bottom;
        Ok(())
    }

    /// 裁剪后的可见亮度宽度
    pub fn width_confwin(&self) -> u32 {
        self.width - self.crop_left - self.crop_right
    }

    /// 裁剪后的可见亮度高度
    pub fn height_confwin(&self) -> u32 {
        self.height - self.crop_top - self.crop_bottom
    }

    /// 裁剪后的可见色度宽度
    pub fn chroma_width_confwin(&self) -> u32 {
        if !self.chroma_format.has_chroma() {
            return 0;
        }
        let shift = self.chroma_format.sub_width_log2();
        self.chroma_width - (self.crop_left >> shift) - (self.crop_right >> shift)
    }

    /// 裁剪后的可见色度高度
    pub fn chroma_height_confwin(&self) -> u32 {
        if !self.chroma_format.has_chroma() {
            return 0;
        }
        let shift = self.chroma_format.sub_height_log2();
        self.chroma_height - (self.crop_top >> shift) - (self.crop_bottom >> shift)
    }

    /// 按分量索引取裁剪窗口内的只读视图
    ///
    /// 边界字节永远不会出现在裁剪视图中.
    pub fn confwin_view(&self, component: usize) -> LanResult<PlaneView<'_>> {
        let full = self.plane(component)?;
        if full.data.is_empty() {
            return Ok(full);
        }
        let (left, top, width, height) = if component == 0 {
            (
                self.crop_left,
                self.crop_top,
                self.width_confwin(),
                self.height_confwin(),
            )
        } else {
            (
                self.crop_left >> self.chroma_format.sub_width_log2(),
                self.crop_top >> self.chroma_format.sub_height_log2(),
                self.chroma_width_confwin(),
                self.chroma_height_confwin(),
            )
        };
        Ok(PlaneView {
            data: &full.data[top as usize * full.stride + left as usize..],
            stride: full.stride,
            width: width as usize,
            height: height as usize,
        })
    }

    // ============================================================
    // 生命周期与参考状态
    // ============================================================

    /// 缓冲是否空闲可回收 (不作参考且无待输出)
    pub fn is_free(&self) -> bool {
        self.reference == ReferenceState::Unused && !self.output_flag
    }

    /// 参考状态
    pub fn reference_state(&self) -> ReferenceState {
        self.reference
    }

    /// 由参考管理协作方设置参考状态
    pub fn set_reference_state(&mut self, state: ReferenceState) {
        self.reference = state;
    }

    /// 输出标志
    pub fn output_flag(&self) -> bool {
        self.output_flag
    }

    /// 设置输出标志 (输出重排队列发出图像后清除)
    pub fn set_output_flag(&mut self, flag: bool) {
        self.output_flag = flag;
    }

    /// 完整性代码
    pub fn integrity(&self) -> Integrity {
        self.integrity
    }

    /// 降级完整性代码
    ///
    /// 解码出错或依赖了有问题的参考时调用; 不允许自动升回
    /// `Correct` (重新解码前经由 [`Picture::clear_decoding_data`]
    /// 重置).
    pub fn downgrade_integrity(&mut self, code: Integrity) {
        if code == Integrity::Correct {
            return;
        }
        if self.integrity == Integrity::Correct {
            warn!("图像 poc={} 完整性降级: {:?}", self.poc, code);
        }
        self.integrity = code;
    }

    /// SEI 哈希校验结果
    pub fn sei_hash_result(&self) -> SeiHashResult {
        self.sei_hash_result
    }

    /// 记录 SEI 哈希校验结果 (校验协作方写入, 与完整性正交)
    pub fn set_sei_hash_result(&mut self, result: SeiHashResult) {
        self.sei_hash_result = result;
    }

    /// 清除全部逐 CTB 解码数据, 供缓冲复用
    ///
    /// 五级元数据网格回到显式默认值, 所有 CTB 进度回到未处理,
    /// 完整性与 SEI 校验结果重置. 要求没有仍在进行的解码任务.
    pub fn clear_decoding_data(&mut self) {
        self.ctb_info.clear();
        self.cb_info.clear();
        self.pb_info.clear();
        self.intra_pred_mode.clear();
        self.tu_info.clear();
        self.deblk_info.clear();
        self.sync.reset();
        self.integrity = Integrity::Correct;
        self.sei_hash_result = SeiHashResult::Unchecked;
    }

    // ============================================================
    // 同步操作 (委托给共享句柄)
    // ============================================================

    /// 共享同步句柄 (调度器与跨线程读者各自克隆)
    pub fn sync(&self) -> Arc<PictureSync> {
        Arc::clone(&self.sync)
    }

    /// 读取某 CTB 当前进度
    pub fn ctb_progress(&self, ctb_rs: usize) -> CtbProgress {
        self.sync.ctb_progress(ctb_rs)
    }

    /// 推进某 CTB 进度并唤醒等待者
    pub fn advance_ctb_progress(&self, ctb_rs: usize, state: CtbProgress) {
        self.sync.advance_ctb_progress(ctb_rs, state);
    }

    /// 阻塞直到某 CTB 进度达到 required
    pub fn wait_for_ctb_progress(&self, ctb_rs: usize, required: CtbProgress) {
        self.sync.wait_for_ctb_progress(ctb_rs, required);
    }

    /// 增加未完成任务计数
    pub fn increase_pending_tasks(&self, n: u32) {
        self.sync.increase_pending_tasks(n);
    }

    /// 减少未完成任务计数
    pub fn decrease_pending_tasks(&self, n: u32) {
        self.sync.decrease_pending_tasks(n);
    }

    /// 阻塞直到整幅图像解码完成
    pub fn wait_for_completion(&self) {
        self.sync.wait_for_completion();
    }
}
