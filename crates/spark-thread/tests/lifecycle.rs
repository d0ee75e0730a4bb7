//! 线程生命周期集成测试。
//!
//! # 教案级导览
//!
//! - **Why**：从 crate 外部验证创建、标识、计数、休眠与优先级的公开契约；
//! - **How**：每个测试构造独立的 `ThreadLifecycle`，计数器互不干扰，可并行运行；
//!   致命路径统一替换为 `PanickingReporter`，通过 `catch_unwind` 观察上报内容；
//! - **What**：新线程内外观测到的标识一致、计数在创建/退出后正确回落、休眠满足下限、
//!   优先级读写在不支持的平台上退化为固定值；非受管线程的退出请求只会致命上报，不会拖垮进程。

use std::{
    panic::{self, AssertUnwindSafe},
    sync::{Arc, mpsc},
    time::{Duration, Instant},
};

use spark_thread::{
    MIN_STACK_SIZE, ThreadConfig, ThreadHandle, ThreadIdentity, ThreadLifecycle, ThreadOptions, ThreadPriority,
    codes, current_identity, identity_equal, priority_supported,
    test_stubs::{PanickingReporter, RecordingReporter},
};

fn lifecycle() -> ThreadLifecycle {
    ThreadLifecycle::with_reporter(ThreadConfig::default(), Arc::new(PanickingReporter))
}

fn wait_for_live(lifecycle: &ThreadLifecycle, expected: usize) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while lifecycle.live_threads() != expected {
        assert!(
            Instant::now() < deadline,
            "live count stuck at {}, expected {expected}",
            lifecycle.live_threads()
        );
        spark_thread::sleep(1_000);
    }
}

/// 新线程内部观测到的标识必须等于创建方拿到的标识，且与创建方自身不同。
#[test]
fn identity_seen_inside_thread_matches_creator_view() {
    let lifecycle = lifecycle();
    let (identity_tx, identity_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();

    let spawned = lifecycle.create(
        |(lifecycle, identity_tx, release_rx): (
            ThreadLifecycle,
            mpsc::Sender<ThreadIdentity>,
            mpsc::Receiver<()>,
        )| {
            identity_tx
                .send(current_identity())
                .expect("creator is listening");
            let _ = release_rx.recv();
            lifecycle.exit_current(0)
        },
        (lifecycle.clone(), identity_tx, release_rx),
    );

    let inside = identity_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("thread reports its identity");
    assert!(identity_equal(&inside, &spawned.identity));
    assert_eq!(inside.numeric_hint(), spawned.identity.numeric_hint());
    assert!(!identity_equal(&current_identity(), &spawned.identity));

    release_tx.send(()).expect("thread is waiting for release");
    wait_for_live(&lifecycle, 0);
}

#[test]
fn identity_is_stable_on_the_same_thread() {
    assert!(identity_equal(&current_identity(), &current_identity()));
}

/// N 次创建且无退出时计数恰好增加 N；全部退出后回到初始值。
#[test]
fn counter_tracks_creation_and_exit() {
    const THREADS: usize = 6;
    let lifecycle = lifecycle();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let release_rx = Arc::new(parking_lot::Mutex::new(release_rx));
    let before = lifecycle.live_threads();

    for _ in 0..THREADS {
        lifecycle.create(
            |(lifecycle, release_rx): (
                ThreadLifecycle,
                Arc<parking_lot::Mutex<mpsc::Receiver<()>>>,
            )| {
                let _ = release_rx.lock().recv();
                lifecycle.exit_current(1)
            },
            (lifecycle.clone(), Arc::clone(&release_rx)),
        );
    }
    assert_eq!(lifecycle.live_threads(), before + THREADS);

    for _ in 0..THREADS {
        release_tx.send(()).expect("threads are waiting");
    }
    wait_for_live(&lifecycle, before);
}

/// 直接退出的启动例程不会导致重复递减。
#[test]
fn immediate_exit_does_not_double_decrement() {
    let lifecycle = lifecycle();
    for _ in 0..16 {
        lifecycle.create(
            |lifecycle: ThreadLifecycle| lifecycle.exit_current(0),
            lifecycle.clone(),
        );
    }
    wait_for_live(&lifecycle, 0);
    spark_thread::sleep(10_000);
    assert_eq!(lifecycle.live_threads(), 0);
}

#[test]
fn returning_normally_is_not_reflected_in_counter() {
    let lifecycle = lifecycle();
    let (done_tx, done_rx) = mpsc::channel();
    lifecycle.create(
        |done_tx: mpsc::Sender<()>| {
            let _ = done_tx.send(());
            42
        },
        done_tx,
    );
    done_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("start routine ran");
    assert_eq!(lifecycle.live_threads(), 1);
}

#[test]
fn sleep_honours_lower_bound() {
    let requested = Duration::from_micros(5_000);
    let started = Instant::now();
    spark_thread::sleep(5_000);
    assert!(started.elapsed() >= requested);
}

#[test]
fn zero_sleep_returns_promptly() {
    let started = Instant::now();
    spark_thread::sleep(0);
    spark_thread::yield_current();
    assert!(started.elapsed() < Duration::from_millis(500));
}

#[test]
fn priority_round_trip_on_current_thread() {
    let lifecycle = lifecycle();
    let handle = ThreadHandle::current();

    lifecycle.set_priority(handle, ThreadPriority::AboveNormal);
    let observed = lifecycle.get_priority(handle);
    if priority_supported() {
        assert_eq!(observed, ThreadPriority::AboveNormal);
    } else {
        assert_eq!(observed, ThreadPriority::Normal);
    }
    lifecycle.set_priority(handle, ThreadPriority::Normal);
}

#[test]
fn normalized_priority_is_applied_at_creation() {
    let lifecycle = ThreadLifecycle::with_reporter(
        ThreadConfig::default().with_normalized_priorities(true),
        Arc::new(PanickingReporter),
    );
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let spawned = lifecycle.create(
        |release_rx: mpsc::Receiver<()>| {
            let _ = release_rx.recv();
            0
        },
        release_rx,
    );
    assert_eq!(lifecycle.get_priority(spawned.handle), ThreadPriority::Normal);
    release_tx.send(()).expect("thread is waiting");
}

#[test]
fn out_of_range_priority_is_fatal() {
    let reporter = RecordingReporter::new();
    let lifecycle =
        ThreadLifecycle::with_reporter(ThreadConfig::default(), Arc::new(reporter.clone()));

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        lifecycle.set_priority_raw(ThreadHandle::current(), 42)
    }));
    assert!(outcome.is_err(), "fatal reporter must not return");

    let reports = reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].0, 0);
    assert!(reports[0].1.contains(codes::PRIORITY_INVALID));
}

#[test]
fn valid_raw_priority_is_accepted() {
    let lifecycle = lifecycle();
    lifecycle.set_priority_raw(ThreadHandle::current(), ThreadPriority::Normal.as_raw());
}

/// 操作系统拒绝创建时计数回滚，并以 OS 错误码致命上报。
#[cfg(all(unix, target_pointer_width = "64"))]
#[test]
fn spawn_failure_rolls_back_counter_and_reports() {
    let reporter = RecordingReporter::new();
    let lifecycle =
        ThreadLifecycle::with_reporter(ThreadConfig::default(), Arc::new(reporter.clone()));

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        lifecycle.create_with(
            ThreadOptions::new().stack_size(usize::MAX / 4),
            |_: ()| 0,
            (),
        )
    }));
    assert!(outcome.is_err(), "spawn failure must not return");
    assert_eq!(lifecycle.live_threads(), 0);

    let reports = reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_ne!(reports[0].0, 0, "OS error code is forwarded");
    assert!(reports[0].1.contains(codes::SPAWN_FAILED));
}

#[test]
fn explicit_thread_name_overrides_prefix() {
    let lifecycle = ThreadLifecycle::with_reporter(
        ThreadConfig::default().with_name_prefix("pool"),
        Arc::new(PanickingReporter),
    );
    let (name_tx, name_rx) = mpsc::channel();
    lifecycle.create_with(
        ThreadOptions::new().name("flusher"),
        |name_tx: mpsc::Sender<Option<String>>| {
            let _ = name_tx.send(std::thread::current().name().map(str::to_owned));
            0
        },
        name_tx,
    );
    let name = name_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("thread reports its name");
    assert_eq!(name.as_deref(), Some("flusher"));
}

/// 非本层创建的线程调用 `exit_current` 时致命上报，计数保持不变，进程继续运行。
#[test]
fn exit_from_foreign_thread_is_fatal_and_keeps_counter() {
    let reporter = RecordingReporter::new();
    let lifecycle =
        ThreadLifecycle::with_reporter(ThreadConfig::default(), Arc::new(reporter.clone()));
    let (release_tx, release_rx) = mpsc::channel::<()>();
    lifecycle.create(
        |release_rx: mpsc::Receiver<()>| {
            let _ = release_rx.recv();
            0
        },
        release_rx,
    );
    assert_eq!(lifecycle.live_threads(), 1);

    let foreign = {
        let lifecycle = lifecycle.clone();
        std::thread::spawn(move || {
            lifecycle.exit_current(0);
        })
    };
    assert!(foreign.join().is_err(), "fatal reporter must not return");
    assert_eq!(lifecycle.live_threads(), 1);

    let reports = reporter.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].0, 0);
    assert!(reports[0].1.contains(codes::EXIT_UNMANAGED));
    release_tx.send(()).expect("thread is waiting");
}

/// 由另一个管理器创建的线程不能经由本管理器退出，两边的计数都不受影响。
#[test]
fn exit_through_a_different_lifecycle_is_fatal() {
    let owner = lifecycle();
    let reporter = RecordingReporter::new();
    let stranger =
        ThreadLifecycle::with_reporter(ThreadConfig::default(), Arc::new(reporter.clone()));
    let (done_tx, done_rx) = mpsc::channel::<()>();

    owner.create(
        |(stranger, done_tx): (ThreadLifecycle, mpsc::Sender<()>)| {
            let _done = done_tx;
            stranger.exit_current(0)
        },
        (stranger.clone(), done_tx),
    );
    assert_eq!(
        done_rx.recv_timeout(Duration::from_secs(10)),
        Err(mpsc::RecvTimeoutError::Disconnected)
    );

    assert_eq!(owner.live_threads(), 1, "the thread ended by panicking");
    assert_eq!(stranger.live_threads(), 0);
    let reports = reporter.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].1.contains(codes::EXIT_UNMANAGED));
}

/// 启动例程拦截了退出载荷后再次退出，计数只递减一次，其他存活线程仍被计入。
#[test]
fn intercepted_exit_is_counted_once() {
    let lifecycle = lifecycle();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    lifecycle.create(
        |release_rx: mpsc::Receiver<()>| {
            let _ = release_rx.recv();
            0
        },
        release_rx,
    );

    let (resumed_tx, resumed_rx) = mpsc::channel();
    let (done_tx, done_rx) = mpsc::channel::<()>();
    lifecycle.create(
        |(lifecycle, resumed_tx, done_tx): (
            ThreadLifecycle,
            mpsc::Sender<bool>,
            mpsc::Sender<()>,
        )| {
            let _done = done_tx;
            let intercepted: Result<(), _> =
                panic::catch_unwind(AssertUnwindSafe(|| lifecycle.exit_current(0)));
            let _ = resumed_tx.send(intercepted.is_err());
            lifecycle.exit_current(0)
        },
        (lifecycle.clone(), resumed_tx, done_tx),
    );

    assert_eq!(resumed_rx.recv_timeout(Duration::from_secs(10)), Ok(true));
    assert_eq!(
        done_rx.recv_timeout(Duration::from_secs(10)),
        Err(mpsc::RecvTimeoutError::Disconnected)
    );
    assert_eq!(lifecycle.live_threads(), 1);

    release_tx.send(()).expect("thread is waiting");
}

/// 单次创建参数同样受最小栈大小约束，且拒绝发生在计数之前。
#[test]
fn undersized_per_call_stack_is_fatal() {
    let reporter = RecordingReporter::new();
    let lifecycle =
        ThreadLifecycle::with_reporter(ThreadConfig::default(), Arc::new(reporter.clone()));

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        lifecycle.create_with(
            ThreadOptions::new().stack_size(MIN_STACK_SIZE - 1),
            |_: ()| 0,
            (),
        )
    }));
    assert!(outcome.is_err(), "undersized stack must not spawn");
    assert_eq!(lifecycle.live_threads(), 0);

    let reports = reporter.reports();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].1.contains(codes::CONFIG_INVALID));
    assert!(reports[0].1.contains("stack_size"));
}
