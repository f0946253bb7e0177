use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicI64, Ordering};

use assert_cmd::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::TempDir;

static USER_COUNTER: AtomicI64 = AtomicI64::new(1);

fn ticketbook(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ticketbook").expect("failed to locate ticketbook binary");
    cmd.arg("--data-dir").arg(data_dir.path()).arg("--quiet");
    cmd
}

fn create_event(data_dir: &TempDir, capacity: u32) -> String {
    let output = ticketbook(data_dir)
        .args(["event", "create", "--title", "Bench", "--admin"])
        .args(["--starts-at", "2099-01-01T19:00:00Z"])
        .args(["--capacity", &capacity.to_string()])
        .output()
        .expect("failed to execute ticketbook event create");
    assert!(output.status.success(), "ticketbook event create failed");
    String::from_utf8(output.stdout)
        .expect("event id is not UTF-8")
        .trim()
        .to_string()
}

fn reserve(data_dir: &TempDir, event: &str, user: i64) -> bool {
    ticketbook(data_dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .args(["reserve", "--event", event, "--as-user", &user.to_string()])
        .status()
        .expect("failed to execute ticketbook reserve")
        .success()
}

fn bench_cli_startup(c: &mut Criterion) {
    c.bench_function("cli_startup_version", |b| {
        b.iter(|| {
            let mut cmd =
                Command::cargo_bin("ticketbook").expect("failed to locate ticketbook binary");
            let output = cmd.arg("--version").output().expect("failed to run ticketbook");
            black_box(output);
        });
    });
}

fn bench_cli_reserve(c: &mut Criterion) {
    let data_dir = TempDir::new().expect("failed to create temp dir");
    let event = create_event(&data_dir, 1_000_000);

    c.bench_function("cli_reserve", |b| {
        b.iter(|| {
            let user = USER_COUNTER.fetch_add(1, Ordering::Relaxed);
            black_box(reserve(&data_dir, &event, user));
        });
    });
}

fn bench_cli_list(c: &mut Criterion) {
    c.bench_function("cli_list_event", |b| {
        b.iter_batched(
            || {
                let data_dir = TempDir::new().expect("failed to create temp dir");
                let event = create_event(&data_dir, 100);
                for user in 0..50 {
                    reserve(&data_dir, &event, user);
                }
                (data_dir, event)
            },
            |(data_dir, event)| {
                let output = ticketbook(&data_dir)
                    .args(["list", "--event", &event, "--admin", "--format", "json"])
                    .output()
                    .expect("failed to execute ticketbook list");
                black_box(output);
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    cli_benches,
    bench_cli_startup,
    bench_cli_reserve,
    bench_cli_list
);
criterion_main!(cli_benches);
