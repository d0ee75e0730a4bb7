//! 线程生命周期冒烟探针。
//!
//! # 说明
//! - 用法：`cargo run -p spark-thread --features cli --bin thread_probe -- [--threads N] [--sleep-us D] [--config path.toml]`；
//! - 启动 N 个受管线程，每个线程休眠 D 微秒后经 `exit_current` 退出，
//!   主线程轮询存活计数直到归零，并打印每个线程的标识提示；
//! - 日志级别由 `RUST_LOG` 控制，例如 `RUST_LOG=spark_thread=debug`。

use std::{
    env, fs,
    sync::mpsc,
    time::{Duration, Instant},
};

use spark_thread::{ThreadConfig, ThreadIdentity, ThreadLifecycle, ThreadPriority};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

struct ProbeArgs {
    threads: usize,
    sleep_us: u64,
    config: Option<String>,
}

fn parse_args() -> Result<ProbeArgs, String> {
    let mut args = ProbeArgs {
        threads: 4,
        sleep_us: 1_000,
        config: None,
    };
    let mut iter = env::args().skip(1);
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .ok_or_else(|| format!("missing value for `{flag}`"))?;
        match flag.as_str() {
            "--threads" => {
                args.threads = value
                    .parse()
                    .map_err(|err| format!("invalid --threads `{value}`: {err}"))?;
            }
            "--sleep-us" => {
                args.sleep_us = value
                    .parse()
                    .map_err(|err| format!("invalid --sleep-us `{value}`: {err}"))?;
            }
            "--config" => args.config = Some(value),
            other => return Err(format!("unknown flag `{other}`")),
        }
    }
    Ok(args)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => ThreadConfig::from_toml_str(&fs::read_to_string(path)?)?,
        None => ThreadConfig::default().with_name_prefix("probe"),
    };

    let lifecycle = ThreadLifecycle::new(config);
    let (report_tx, report_rx) = mpsc::channel::<(ThreadIdentity, ThreadPriority)>();
    for _ in 0..args.threads {
        let context = (lifecycle.clone(), report_tx.clone(), args.sleep_us);
        lifecycle.create(
            |(lifecycle, report_tx, sleep_us): (ThreadLifecycle, mpsc::Sender<_>, u64)| {
                let priority = lifecycle.get_priority(spark_thread::current_handle());
                let _ = report_tx.send((spark_thread::current_identity(), priority));
                drop(report_tx);
                spark_thread::sleep(sleep_us);
                lifecycle.exit_current(0)
            },
            context,
        );
    }
    drop(report_tx);

    for (identity, priority) in report_rx {
        println!("{identity} priority={priority}");
    }

    let deadline = Instant::now() + Duration::from_secs(30);
    while lifecycle.live_threads() > 0 {
        if Instant::now() >= deadline {
            return Err(format!("{} threads still live", lifecycle.live_threads()).into());
        }
        spark_thread::sleep(1_000);
    }
    println!(
        "all {} threads exited; hint uniqueness: {:?}",
        args.threads,
        ThreadIdentity::hint_uniqueness()
    );
    lifecycle.shutdown();
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(error) = run() {
        eprintln!("thread_probe 失败: {error}");
        std::process::exit(1);
    }
}
