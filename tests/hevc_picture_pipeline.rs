//! 图像缓冲全生命周期集成测试.
//!
//! 模拟一幅图像在多线程解码器中的完整旅程:
//! 分配 → 登记任务 → 各任务写采样/元数据并推进 CTB 进度 →
//! 整图完成 → 升为短期参考 → 输出 → 降为不参考 → 缓冲回收.

use std::thread;

use lan::core::ChromaFormat;
use lan::hevc::{
    CtbProgress, DeblockFlags, Integrity, MotionVector, PbMotion, Picture, PredMode,
    ReferenceState, SequenceParams,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 64x64, 4 个 32x32 CTB
fn build_test_picture() -> Picture {
    let params = SequenceParams::new(64, 64, ChromaFormat::Yuv420, 5, 3, 2, 2).unwrap();
    Picture::alloc(&params, 16).unwrap()
}

#[test]
fn full_decode_lifecycle() {
    init_logging();
    let mut pic = build_test_picture();
    pic.poc = 16;
    pic.pts = 40_000;

    // 每个 CTB 一个解码任务
    let ctb_count = pic.params().ctbs_in_picture();
    assert_eq!(ctb_count, 4);
    pic.increase_pending_tasks(ctb_count as u32);

    let sync = pic.sync();
    let workers: Vec<_> = (0..ctb_count)
        .map(|ctb| {
            let sync = sync.clone();
            thread::spawn(move || {
                sync.advance_ctb_progress(ctb, CtbProgress::Prefiltered);
                sync.advance_ctb_progress(ctb, CtbProgress::Filtered);
                sync.decrease_pending_tasks(1);
            })
        })
        .collect();

    pic.wait_for_completion();
    for w in workers {
        w.join().unwrap();
    }
    for ctb in 0..ctb_count {
        assert_eq!(pic.ctb_progress(ctb), CtbProgress::Filtered);
    }

    // 解码完成: 进入 DPB 作为短期参考, 等待输出
    pic.set_reference_state(ReferenceState::ShortTerm);
    assert!(!pic.is_free());

    // 输出重排队列发出图像
    pic.set_output_flag(false);
    assert!(!pic.is_free());

    // 参考管理将其标记为不再参考, 缓冲可回收
    pic.set_reference_state(ReferenceState::Unused);
    assert!(pic.is_free());

    // 回收复用: 清除逐 CTB 数据后进度与完整性回到初始
    pic.clear_decoding_data();
    assert_eq!(pic.ctb_progress(0), CtbProgress::None);
    assert_eq!(pic.integrity(), Integrity::Correct);
}

#[test]
fn metadata_written_during_decode_reads_back() {
    init_logging();
    let mut pic = build_test_picture();

    // 一个 16x16 帧间 CB, 划分为两个 16x8 预测块
    pic.set_log2_cb_size(0, 0, 4);
    pic.set_pred_mode(0, 0, 4, PredMode::Inter);
    pic.set_qp_y(0, 0, 4, 30);
    let top = PbMotion {
        mv: [MotionVector { x: 8, y: 0 }, MotionVector::default()],
        ref_idx: [0, -1],
    };
    let bottom = PbMotion {
        mv: [MotionVector { x: -4, y: 4 }, MotionVector::default()],
        ref_idx: [1, -1],
    };
    pic.set_pb_motion(0, 0, 16, 8, &top);
    pic.set_pb_motion(0, 8, 16, 8, &bottom);

    // 去块协作方记录边与强度
    pic.add_deblock_flags(0, 8, DeblockFlags::PB_EDGE_HORIZONTAL);
    pic.set_deblock_bs(0, 8, 1);

    assert_eq!(pic.get_pred_mode(12, 12), PredMode::Inter);
    assert_eq!(pic.get_qp_y(15, 15), 30);
    assert_eq!(pic.get_pb_motion(12, 4), top);
    assert_eq!(pic.get_pb_motion(12, 12), bottom);
    assert_eq!(pic.get_deblock_bs(0, 8), 1);
    assert!(
        pic.get_deblock_flags(0, 8)
            .contains(DeblockFlags::PB_EDGE_HORIZONTAL)
    );

    // 采样写入经由可写视图
    {
        let mut y = pic.plane_mut(0).unwrap();
        for row in 0..16 {
            y.row_mut(row)[..16].fill(128);
        }
    }
    assert_eq!(pic.plane(0).unwrap().sample(15, 15), 128);
    assert_eq!(pic.plane(0).unwrap().sample(16, 0), 0);
}

#[test]
fn faulty_reference_propagates_via_copy() {
    init_logging();
    let mut reference = build_test_picture();
    reference.downgrade_integrity(Integrity::DecodingErrors);

    // 错误隐藏: 以有问题的参考为底填充当前图像
    let mut current = build_test_picture();
    current.copy_from(&reference).unwrap();
    current.downgrade_integrity(Integrity::DerivedFromFaultyReference);

    assert_eq!(current.integrity(), Integrity::DerivedFromFaultyReference);
    // 参考自身的完整性不受影响
    assert_eq!(reference.integrity(), Integrity::DecodingErrors);
}
