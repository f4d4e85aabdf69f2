//! CTB 进度与任务同步的多线程集成测试.
//!
//! 验证 [`PictureSync`] 在真实线程间的行为: 完成等待者在计数
//! 归零前保持阻塞、多个等待者同时被唤醒、进度等待者被推进唤醒.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use lan::hevc::{CtbProgress, PictureSync};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn completion_waiter_blocks_until_last_task() {
    init_logging();
    let sync = Arc::new(PictureSync::new(4));
    sync.increase_pending_tasks(4);

    let (tx, rx) = mpsc::channel();
    let waiter = {
        let sync = Arc::clone(&sync);
        thread::spawn(move || {
            sync.wait_for_completion();
            tx.send(()).unwrap();
        })
    };

    // 前三次递减不应放行
    for _ in 0..3 {
        sync.decrease_pending_tasks(1);
        assert!(
            rx.recv_timeout(Duration::from_millis(50)).is_err(),
            "计数未归零, 等待者不应返回"
        );
    }

    sync.decrease_pending_tasks(1);
    rx.recv_timeout(Duration::from_secs(5))
        .expect("最后一次递减后等待者应被唤醒");
    waiter.join().unwrap();
}

#[test]
fn all_completion_waiters_are_released() {
    init_logging();
    let sync = Arc::new(PictureSync::new(1));
    sync.increase_pending_tasks(2);

    let waiters: Vec<_> = (0..4)
        .map(|_| {
            let sync = Arc::clone(&sync);
            thread::spawn(move || sync.wait_for_completion())
        })
        .collect();

    sync.decrease_pending_tasks(1);
    sync.decrease_pending_tasks(1);
    for w in waiters {
        w.join().unwrap();
    }

    // 归零之后才开始等待的线程立即返回
    sync.wait_for_completion();
}

#[test]
fn progress_waiter_wakes_on_advance() {
    init_logging();
    let sync = Arc::new(PictureSync::new(8));

    let (tx, rx) = mpsc::channel();
    let waiter = {
        let sync = Arc::clone(&sync);
        thread::spawn(move || {
            sync.wait_for_ctb_progress(3, CtbProgress::Filtered);
            tx.send(sync.ctb_progress(3)).unwrap();
        })
    };

    // 推进其他 CTB 或推进到不够高的档位都不放行
    sync.advance_ctb_progress(2, CtbProgress::Filtered);
    sync.advance_ctb_progress(3, CtbProgress::Prefiltered);
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

    sync.advance_ctb_progress(3, CtbProgress::Filtered);
    let seen = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(seen, CtbProgress::Filtered);
    waiter.join().unwrap();
}

#[test]
fn many_tasks_advance_concurrently() {
    init_logging();
    let sync = Arc::new(PictureSync::new(64));
    sync.increase_pending_tasks(8);

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let sync = Arc::clone(&sync);
            thread::spawn(move || {
                for ctb in (i * 8)..(i * 8 + 8) {
                    sync.advance_ctb_progress(ctb, CtbProgress::Prefiltered);
                    sync.advance_ctb_progress(ctb, CtbProgress::Filtered);
                }
                sync.decrease_pending_tasks(1);
            })
        })
        .collect();

    sync.wait_for_completion();
    for w in workers {
        w.join().unwrap();
    }
    for ctb in 0..64 {
        assert_eq!(sync.ctb_progress(ctb), CtbProgress::Filtered);
    }
    assert_eq!(sync.pending_tasks(), 0);
}
