// tests/sequencer_fake_executor.rs

mod common;
use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};
use crate::common::fake_executor::{FakeExecutor, executed, execution_log};
use crate::common::{init_tracing, shipped_config_path, with_timeout};

use std::error::Error;
use std::sync::Arc;

use sitepipe::config::load_and_validate;
use sitepipe::context::TaskContext;
use sitepipe::dag::{Sequence, Step};
use sitepipe::engine::{Sequencer, TaskFailure};
use sitepipe::errors::SitepipeError;
use sitepipe::registry::Registry;

type TestResult = Result<(), Box<dyn Error>>;

fn sequencer(registry: Registry) -> Sequencer {
    Sequencer::new(Arc::new(registry), Arc::new(TaskContext::new(".")))
}

/// Three independent commands A, B, C.
fn abc() -> Registry {
    ConfigFileBuilder::new()
        .with_task("A", TaskConfigBuilder::command("echo A").build())
        .with_task("B", TaskConfigBuilder::command("echo B").build())
        .with_task("C", TaskConfigBuilder::command("echo C").build())
        .build_registry()
}

fn steps(names: &[&[&str]]) -> Sequence {
    Sequence::from_steps(
        names
            .iter()
            .map(|step| match step {
                [one] => Step::Sequential(one.to_string()),
                many => Step::Parallel(many.iter().map(|s| s.to_string()).collect()),
            })
            .collect(),
    )
}

#[tokio::test]
async fn sequential_steps_run_in_order() -> TestResult {
    init_tracing();

    let seq = sequencer(abc());
    let log = execution_log();
    let exec_log = Arc::clone(&log);

    with_timeout(seq.run_with(&steps(&[&["A"], &["B"], &["C"]]), move |tx| {
        FakeExecutor::new(tx, exec_log)
    }))
    .await?;

    assert_eq!(executed(&log), vec!["A", "B", "C"]);
    Ok(())
}

#[tokio::test]
async fn unknown_task_fails_before_anything_runs() -> TestResult {
    init_tracing();

    let seq = sequencer(abc());
    let log = execution_log();
    let exec_log = Arc::clone(&log);

    let err = with_timeout(seq.run_with(&steps(&[&["A"], &["nope"]]), move |tx| {
        FakeExecutor::new(tx, exec_log)
    }))
    .await
    .unwrap_err();

    assert!(matches!(err, SitepipeError::TaskNotFound(ref n) if n == "nope"));
    assert!(err.is_config_error());
    assert!(executed(&log).is_empty());
    Ok(())
}

#[tokio::test]
async fn first_failure_stops_the_sequence() -> TestResult {
    init_tracing();

    let seq = sequencer(abc());
    let log = execution_log();
    let exec_log = Arc::clone(&log);

    let err = with_timeout(seq.run_with(&steps(&[&["A"], &["B"], &["C"]]), move |tx| {
        FakeExecutor::new(tx, exec_log).failing("A", 2)
    }))
    .await
    .unwrap_err();

    match &err {
        SitepipeError::TaskFailed { task, failure } => {
            assert_eq!(task, "A");
            assert!(matches!(failure, TaskFailure::Exit { code: Some(2), .. }));
        }
        other => panic!("expected TaskFailed, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 2);
    assert_eq!(executed(&log), vec!["A"]);
    Ok(())
}

#[tokio::test]
async fn parallel_group_waits_for_its_predecessor_and_all_members() -> TestResult {
    init_tracing();

    let registry = ConfigFileBuilder::new()
        .with_task("A", TaskConfigBuilder::command("echo A").build())
        .with_task("B", TaskConfigBuilder::command("echo B").build())
        .with_task("C", TaskConfigBuilder::command("echo C").build())
        .with_task("D", TaskConfigBuilder::command("echo D").build())
        .build_registry();
    let seq = sequencer(registry);
    let log = execution_log();
    let exec_log = Arc::clone(&log);

    with_timeout(seq.run_with(&steps(&[&["A"], &["B", "C"], &["D"]]), move |tx| {
        FakeExecutor::new(tx, exec_log)
    }))
    .await?;

    let ran = executed(&log);
    assert_eq!(ran.len(), 4);
    assert_eq!(ran[0], "A");
    let mut middle = ran[1..3].to_vec();
    middle.sort();
    assert_eq!(middle, vec!["B", "C"]);
    assert_eq!(ran[3], "D");
    Ok(())
}

#[tokio::test]
async fn failure_inside_a_parallel_group_skips_later_steps() -> TestResult {
    init_tracing();

    let seq = sequencer(abc());
    let log = execution_log();
    let exec_log = Arc::clone(&log);

    let err = with_timeout(seq.run_with(&steps(&[&["A", "B"], &["C"]]), move |tx| {
        FakeExecutor::new(tx, exec_log).failing("B", 1)
    }))
    .await
    .unwrap_err();

    assert!(matches!(err, SitepipeError::TaskFailed { ref task, .. } if task == "B"));
    assert!(!executed(&log).contains(&"C".to_string()));
    Ok(())
}

#[tokio::test]
async fn prerequisites_run_again_on_every_invocation() -> TestResult {
    init_tracing();

    let registry = ConfigFileBuilder::new()
        .with_task("clean-stale-css", TaskConfigBuilder::clean(&["_site/css/main.css"]).build())
        .with_task(
            "transpile-dev",
            TaskConfigBuilder::command("bundle exec sass ./_sass/_main.scss ./_site/css/main.css")
                .after("clean-stale-css")
                .build(),
        )
        .build_registry();
    let seq = sequencer(registry);
    let log = execution_log();
    let exec_log = Arc::clone(&log);

    with_timeout(
        seq.run_with(&steps(&[&["transpile-dev"], &["transpile-dev"]]), move |tx| {
            FakeExecutor::new(tx, exec_log)
        }),
    )
    .await?;

    assert_eq!(
        executed(&log),
        vec![
            "clean-stale-css",
            "transpile-dev",
            "clean-stale-css",
            "transpile-dev"
        ]
    );
    Ok(())
}

#[tokio::test]
async fn nested_sequences_are_inlined_not_dispatched() -> TestResult {
    init_tracing();

    let registry = ConfigFileBuilder::new()
        .with_task("A", TaskConfigBuilder::command("echo A").build())
        .with_task("B", TaskConfigBuilder::command("echo B").build())
        .with_task("inner", TaskConfigBuilder::sequence(&[&["A"], &["B"]]).build())
        .with_task("outer", TaskConfigBuilder::sequence(&[&["inner"], &["A"]]).build())
        .build_registry();
    let seq = sequencer(registry);
    let log = execution_log();
    let exec_log = Arc::clone(&log);

    with_timeout(seq.run_with(&Sequence::single("outer"), move |tx| {
        FakeExecutor::new(tx, exec_log)
    }))
    .await?;

    assert_eq!(executed(&log), vec!["A", "B", "A"]);
    Ok(())
}

#[tokio::test]
async fn release_pipeline_stops_at_the_failing_build() -> TestResult {
    init_tracing();

    let cfg = load_and_validate(shipped_config_path())?;
    let seq = sequencer(Registry::from_config(&cfg)?);
    let log = execution_log();
    let exec_log = Arc::clone(&log);

    let err = with_timeout(seq.run_with(&Sequence::single("release"), move |tx| {
        FakeExecutor::new(tx, exec_log).failing("jekyll-build-release", 3)
    }))
    .await
    .unwrap_err();

    assert_eq!(err.exit_code(), 3);
    let ran = executed(&log);
    assert_eq!(ran, vec!["clean", "jekyll-build-release"]);
    assert!(!ran.contains(&"styles-release".to_string()));
    assert!(!ran.contains(&"scripts-release".to_string()));
    assert!(!ran.contains(&"serve-release".to_string()));
    Ok(())
}

#[tokio::test]
async fn release_pipeline_runs_in_declared_order() -> TestResult {
    init_tracing();

    let cfg = load_and_validate(shipped_config_path())?;
    let seq = sequencer(Registry::from_config(&cfg)?);
    let log = execution_log();
    let exec_log = Arc::clone(&log);

    with_timeout(seq.run_with(&Sequence::single("release"), move |tx| {
        FakeExecutor::new(tx, exec_log)
    }))
    .await?;

    assert_eq!(
        executed(&log),
        vec![
            "clean",
            "jekyll-build-release",
            "styles-release",
            "scripts-release",
            "serve-release"
        ]
    );
    Ok(())
}
