//! CTB 进度与任务同步.
//!
//! 对标 libde265 的 `de265_progress_lock` 数组与图像级
//! mutex/finished_cond. 原实现给每个 CTB 配一把锁; 这里改为
//! 每单元一个原子进度值, 全图共用一对 Mutex/Condvar 合并所有
//! 进度等待者, 再用一对独立的 Mutex/Condvar 服务整图完成等待,
//! 避免按 CTB 数量创建操作系统同步原语.
//!
//! 内存序约定 (对所有调用方的显式保证): `advance_ctb_progress`
//! 以 Release 序发布进度, `wait_for_ctb_progress` / `ctb_progress`
//! 以 Acquire 序读取. 因此解码任务在推进进度之前对该 CTB 的
//! 全部采样与元数据写入, 对任何观察到新进度的线程都可见 ——
//! 进度发布就是该任务此前所有写入的发布屏障.

use std::sync::atomic::{AtomicI32, AtomicU8, Ordering};
use std::sync::{Condvar, Mutex};

use log::trace;

/// CTB 解码进度 (单调递增, 不允许回退)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum CtbProgress {
    /// 未处理
    #[default]
    None = 0,
    /// 重建完成, 尚未经过环内滤波
    Prefiltered = 1,
    /// 环内滤波完成
    Filtered = 2,
}

impl CtbProgress {
    fn from_raw(v: u8) -> Self {
        match v {
            0 => Self::None,
            1 => Self::Prefiltered,
            2 => Self::Filtered,
            _ => unreachable!("非法的 CTB 进度值: {}", v),
        }
    }
}

/// 图像级同步状态
///
/// 通过 `Arc` 在解码任务、预测读者与调度器之间共享, 所有
/// 操作只需 `&self`. 生命周期与所属图像一致.
pub struct PictureSync {
    /// 每 CTB 一个进度单元, 光栅扫描序
    ctb_progress: Vec<AtomicU8>,
    /// 全部进度等待者共用的锁与条件变量
    progress_lock: Mutex<()>,
    progress_cond: Condvar,
    /// 未完成解码任务计数
    tasks_pending: AtomicI32,
    /// 整图完成等待者共用的锁与条件变量
    completion_lock: Mutex<()>,
    completion_cond: Condvar,
}

impl PictureSync {
    pub fn new(ctb_count: usize) -> Self {
        Self {
            ctb_progress: (0..ctb_count).map(|_| AtomicU8::new(0)).collect(),
            progress_lock: Mutex::new(()),
            progress_cond: Condvar::new(),
            tasks_pending: AtomicI32::new(0),
            completion_lock: Mutex::new(()),
            completion_cond: Condvar::new(),
        }
    }

    /// CTB 数量
    pub fn ctb_count(&self) -> usize {
        self.ctb_progress.len()
    }

    #[inline]
    fn cell(&self, ctb_rs: usize) -> &AtomicU8 {
        assert!(
            ctb_rs < self.ctb_progress.len(),
            "CTB 进度索引越界: {} >= {}",
            ctb_rs,
            self.ctb_progress.len()
        );
        &self.ctb_progress[ctb_rs]
    }

    /// 读取某 CTB 当前进度 (Acquire)
    pub fn ctb_progress(&self, ctb_rs: usize) -> CtbProgress {
        CtbProgress::from_raw(self.cell(ctb_rs).load(Ordering::Acquire))
    }

    /// 推进某 CTB 的进度并唤醒全部进度等待者
    ///
    /// Release 发布: 以该调用为界, 任务此前对图像的全部写入
    /// 对随后观察到新进度的线程可见. 进度只允许前进, 回退说明
    /// 上游调度逻辑有误, 直接断言终止.
    pub fn advance_ctb_progress(&self, ctb_rs: usize, state: CtbProgress) {
        let prev = self.cell(ctb_rs).fetch_max(state as u8, Ordering::Release);
        assert!(
            prev <= state as u8,
            "CTB {} 进度回退: {} -> {}",
            ctb_rs,
            prev,
            state as u8
        );
        trace!("CTB {} 进度推进至 {:?}", ctb_rs, state);
        // 在锁内通知, 关闭等待者"检查后、睡眠前"的竞争窗口
        let _guard = self.progress_lock.lock().unwrap();
        self.progress_cond.notify_all();
    }

    /// 阻塞直到某 CTB 进度达到 required
    ///
    /// 进度已达标时立即返回. 返回后, 该 CTB 任务在发布此进度
    /// 之前的全部写入对调用线程可见 (见模块级内存序约定).
    pub fn wait_for_ctb_progress(&self, ctb_rs: usize, required: CtbProgress) {
        if self.ctb_progress(ctb_rs) >= required {
            return;
        }
        let mut guard = self.progress_lock.lock().unwrap();
        while self.ctb_progress(ctb_rs) < required {
            guard = self.progress_cond.wait(guard).unwrap();
        }
    }

    /// 增加未完成任务计数
    pub fn increase_pending_tasks(&self, n: u32) {
        let prev = self.tasks_pending.fetch_add(n as i32, Ordering::AcqRel);
        trace!("任务计数 {} -> {}", prev, prev + n as i32);
    }

    /// 减少未完成任务计数; 归零时唤醒全部完成等待者
    ///
    /// 计数变负说明 increase/decrease 配对有误, 直接断言终止.
    pub fn decrease_pending_tasks(&self, n: u32) {
        let prev = self.tasks_pending.fetch_sub(n as i32, Ordering::AcqRel);
        let now = prev - n as i32;
        assert!(now >= 0, "未完成任务计数变为负值: {}", now);
        trace!("任务计数 {} -> {}", prev, now);
        if now == 0 {
            let _guard = self.completion_lock.lock().unwrap();
            self.completion_cond.notify_all();
        }
    }

    /// 当前未完成任务数
    pub fn pending_tasks(&self) -> i32 {
        self.tasks_pending.load(Ordering::Acquire)
    }

    /// 阻塞直到全部任务完成
    ///
    /// 计数已为零时立即返回; 支持任意数量并发等待者, 包括在
    /// 归零之后才开始等待的线程.
    pub fn wait_for_completion(&self) {
        if self.pending_tasks() == 0 {
            return;
        }
        let mut guard = self.completion_lock.lock().unwrap();
        while self.tasks_pending.load(Ordering::Acquire) > 0 {
            guard = self.completion_cond.wait(guard).unwrap();
        }
    }

    /// 重置全部进度单元为未处理 (图像缓冲回收复用时调用)
    pub(crate) fn reset(&self) {
        assert_eq!(self.pending_tasks(), 0, "任务未完成, 不可重置 CTB 进度");
        for cell in &self.ctb_progress {
            cell.store(0, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_monotonic() {
        let sync = PictureSync::new(4);
        assert_eq!(sync.ctb_progress(0), CtbProgress::None);
        sync.advance_ctb_progress(0, CtbProgress::Prefiltered);
        sync.advance_ctb_progress(0, CtbProgress::Filtered);
        assert_eq!(sync.ctb_progress(0), CtbProgress::Filtered);
        // 其余单元不受影响
        assert_eq!(sync.ctb_progress(1), CtbProgress::None);
    }

    #[test]
    fn repeated_advance_to_same_state_is_allowed() {
        let sync = PictureSync::new(1);
        sync.advance_ctb_progress(0, CtbProgress::Prefiltered);
        sync.advance_ctb_progress(0, CtbProgress::Prefiltered);
        assert_eq!(sync.ctb_progress(0), CtbProgress::Prefiltered);
    }

    #[test]
    #[should_panic(expected = "进度回退")]
    fn progress_regression_is_fatal() {
        let sync = PictureSync::new(1);
        sync.advance_ctb_progress(0, CtbProgress::Filtered);
        sync.advance_ctb_progress(0, CtbProgress::Prefiltered);
    }

    #[test]
    fn wait_returns_immediately_when_satisfied() {
        let sync = PictureSync::new(2);
        sync.advance_ctb_progress(1, CtbProgress::Filtered);
        // 已达标, 不阻塞
        sync.wait_for_ctb_progress(1, CtbProgress::Prefiltered);
        sync.wait_for_ctb_progress(1, CtbProgress::Filtered);
    }

    #[test]
    fn completion_wait_after_zero_is_immediate() {
        let sync = PictureSync::new(1);
        sync.wait_for_completion();
        sync.increase_pending_tasks(2);
        sync.decrease_pending_tasks(2);
        sync.wait_for_completion();
    }

    #[test]
    #[should_panic(expected = "变为负值")]
    fn negative_task_count_is_fatal() {
        let sync = PictureSync::new(1);
        sync.increase_pending_tasks(1);
        sync.decrease_pending_tasks(2);
    }

    #[test]
    #[should_panic(expected = "进度索引越界")]
    fn out_of_range_ctb_is_fatal() {
        let sync = PictureSync::new(2);
        let _ = sync.ctb_progress(2);
    }
}
