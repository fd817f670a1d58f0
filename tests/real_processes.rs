// tests/real_processes.rs
//
// End-to-end runs through the real executor. Commands are plain `sh`
// one-liners, so these only run on Unix.
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use sitepipe::config::parse_and_validate;
use sitepipe::context::{TaskContext, WatchSettings};
use sitepipe::dag::Sequence;
use sitepipe::engine::Sequencer;
use sitepipe::errors::SitepipeError;
use sitepipe::registry::Registry;
use sitepipe::types::TriggerWhileRunningBehaviour;

type TestResult = Result<(), Box<dyn Error>>;

const PIPELINE: &str = r#"
[config]
default_task = "build"

[task.clean]
action = "clean"
paths = ["_site"]

[task.build]
action = "command"
after = ["clean"]
cmd = "sh"
args = ["-c", "mkdir -p _site && echo built >> _site/log"]

[task.fail]
action = "command"
cmd = "sh"
args = ["-c", "exit 7"]

[task.after-fail]
action = "command"
cmd = "sh"
args = ["-c", "echo ran > after-fail"]

[task.broken]
action = "sequence"
steps = ["build", "fail", "after-fail"]

[task.env-check]
action = "command"
cmd = "sh"
args = ["-c", "test \"$JEKYLL_ENV\" = production"]
env = { JEKYLL_ENV = "production" }

[task.rebuild-on-change]
action = "watch"
rules = [{ patterns = ["src/*.txt"], reaction = { run = "build" } }]

[task.flaky]
action = "command"
cmd = "sh"
args = ["-c", "echo x >> hits; exit 4"]

[task.retry-on-change]
action = "watch"
rules = [{ patterns = ["src/*.txt"], reaction = { run = "flaky" } }]

[task.serve-forever]
action = "serve"

[task.serve-forever.server]
cmd = "sh"
args = ["-c", "echo $$ > server.pid; exec sleep 4242"]

[task.serve-forever.live_reload]
cmd = "sh"
args = ["-c", "echo $$ > proxy.pid; exec sleep 4343"]
reload_args = ["-c", "true"]
"#;

fn sequencer_in(root: &Path) -> Result<Sequencer, Box<dyn Error>> {
    let cfg = parse_and_validate(PIPELINE)?;
    let registry = Registry::from_config(&cfg)?;
    let ctx = TaskContext::new(root).with_watch_settings(WatchSettings {
        debounce: Duration::from_millis(50),
        behaviour: TriggerWhileRunningBehaviour::Queue,
    });
    Ok(Sequencer::new(Arc::new(registry), Arc::new(ctx)))
}

#[tokio::test]
async fn prerequisite_clean_runs_before_every_build() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    let seq = sequencer_in(dir.path())?;

    with_timeout(seq.run(&Sequence::single("build"))).await?;
    with_timeout(seq.run(&Sequence::single("build"))).await?;

    // `clean` wiped the first run's output, so only one line is left.
    assert_eq!(fs::read_to_string(dir.path().join("_site/log"))?, "built\n");
    Ok(())
}

#[tokio::test]
async fn failing_command_exit_code_ends_the_run() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    let seq = sequencer_in(dir.path())?;

    let err = with_timeout(seq.run(&Sequence::single("broken")))
        .await
        .unwrap_err();

    assert!(matches!(err, SitepipeError::TaskFailed { ref task, .. } if task == "fail"));
    assert_eq!(err.exit_code(), 7);
    assert!(dir.path().join("_site/log").is_file());
    assert!(!dir.path().join("after-fail").exists());
    Ok(())
}

#[tokio::test]
async fn per_task_env_reaches_the_child() -> TestResult {
    let dir = TempDir::new()?;
    let seq = sequencer_in(dir.path())?;

    with_timeout(seq.run_task("env-check")).await?;
    assert!(std::env::var("JEKYLL_ENV").is_err());
    Ok(())
}

#[tokio::test]
async fn watch_rule_reruns_its_task_on_change() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    fs::create_dir_all(dir.path().join("src"))?;
    let seq = sequencer_in(dir.path())?;

    let watcher = {
        let seq = seq.clone();
        tokio::spawn(async move { seq.run_task("rebuild-on-change").await })
    };

    // Give the watcher time to register before touching anything.
    tokio::time::sleep(Duration::from_millis(300)).await;
    fs::write(dir.path().join("src/post.txt"), "hello")?;

    let log = dir.path().join("_site/log");
    with_timeout(async {
        while !log.is_file() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;

    watcher.abort();
    Ok(())
}

fn line_count(path: &Path) -> usize {
    fs::read_to_string(path).map(|s| s.lines().count()).unwrap_or(0)
}

async fn wait_for_lines(path: &Path, at_least: usize) {
    with_timeout(async {
        while line_count(path) < at_least {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;
}

#[tokio::test]
async fn watch_keeps_running_after_a_failing_reaction() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    fs::create_dir_all(dir.path().join("src"))?;
    let seq = sequencer_in(dir.path())?;

    let watcher = {
        let seq = seq.clone();
        tokio::spawn(async move { seq.run_task("retry-on-change").await })
    };
    tokio::time::sleep(Duration::from_millis(300)).await;

    let hits = dir.path().join("hits");
    fs::write(dir.path().join("src/a.txt"), "one")?;
    wait_for_lines(&hits, 1).await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    fs::write(dir.path().join("src/b.txt"), "two")?;
    wait_for_lines(&hits, 2).await;

    assert!(!watcher.is_finished(), "watch task ended after a failing reaction");
    watcher.abort();
    Ok(())
}

/// Pid written by a `sh -c 'echo $$ > file; exec ...'` child.
async fn read_pid(path: &Path) -> u32 {
    with_timeout(async {
        loop {
            if let Some(pid) = fs::read_to_string(path)
                .ok()
                .and_then(|s| s.trim().parse().ok())
            {
                return pid;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
}

/// Gone or a zombie waiting to be reaped; either way no longer running.
fn is_running(pid: u32) -> bool {
    let out = Command::new("ps")
        .args(["-o", "stat=", "-p", &pid.to_string()])
        .output()
        .expect("ps");
    let stat = String::from_utf8_lossy(&out.stdout);
    let stat = stat.trim();
    out.status.success() && !stat.is_empty() && !stat.starts_with('Z')
}

#[test]
fn runtime_shutdown_kills_server_and_live_reload_proxy() -> TestResult {
    init_tracing();

    let dir = TempDir::new()?;
    let root = dir.path().to_path_buf();
    let seq = sequencer_in(&root)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let pids = rt.block_on(async {
        let serve = tokio::spawn(async move { seq.run_task("serve-forever").await });
        let server = read_pid(&root.join("server.pid")).await;
        let proxy = read_pid(&root.join("proxy.pid")).await;
        assert!(!serve.is_finished());
        [server, proxy]
    });
    assert!(pids.iter().all(|&pid| is_running(pid)));

    // What returning from `main` does: the runtime goes, and with it every
    // task still holding a child.
    drop(rt);

    for pid in pids {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while is_running(pid) && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(50));
        }
        assert!(!is_running(pid), "process {pid} outlived the runtime");
    }
    Ok(())
}
