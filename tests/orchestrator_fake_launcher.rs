use std::path::PathBuf;
use std::time::Duration;

use tokio::time::sleep;

use segexport::control::ControlRecord;
use segexport::engine::{prepare_batch, Batch, Orchestrator};
use segexport::errors::ExportError;
use segexport::exec::{cancel_pair, CancelSignal};
use segexport::fs::mock::MockFileSystem;
use segexport::types::{Interval, RunOutcome};
use segexport_test_utils::builders::{ProjectBuilder, SettingsBuilder};
use segexport_test_utils::fake_launcher::{FakeLauncher, FakeRun};
use segexport_test_utils::init_tracing;

/// Project `/proj/shot.casc` with the given markers, prepared into a batch.
fn project(markers: &[i64]) -> (MockFileSystem, ProjectBuilder, Batch) {
    let fs = MockFileSystem::new();
    let project = ProjectBuilder::new("/proj").markers(markers);
    let control = project.write_to(&fs);
    let batch = prepare_batch(&fs, &control).unwrap();
    (fs, project, batch)
}

#[tokio::test(start_paused = true)]
async fn test_three_marker_batch_exports_every_slice_in_order() {
    init_tracing();
    let (fs, project, batch) = project(&[10, 40, 90]);
    let launcher = FakeLauncher::new(fs.clone(), project.control_path());
    let launches = launcher.launches();
    let settings = SettingsBuilder::new().build();

    let mut orchestrator = Orchestrator::new(&settings, batch, launcher, fs.clone());
    let summary = orchestrator.run(CancelSignal::never()).await;

    assert_eq!(
        summary.outcomes(),
        vec![RunOutcome::Succeeded, RunOutcome::Succeeded, RunOutcome::Succeeded]
    );
    assert!(!summary.cancelled);
    assert_eq!(summary.launched(), 3);

    let names: Vec<String> = summary
        .reports
        .iter()
        .map(|r| r.artifact.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["shot_01.fbx", "shot_02.fbx", "shot_FULL.fbx"]);
    for report in &summary.reports {
        assert!(fs.paths().contains(&report.artifact));
    }

    // Each launch saw exactly its own interval in the control file.
    let seen: Vec<ControlRecord> = launches
        .lock()
        .unwrap()
        .iter()
        .map(|l| l.control.clone())
        .collect();
    let intervals: Vec<Interval> = seen.iter().map(ControlRecord::interval).collect();
    assert_eq!(
        intervals,
        vec![
            Interval::bounded(10, 39, 1),
            Interval::bounded(40, 89, 2),
            Interval::full_range(10, 89),
        ]
    );
    for record in &seen {
        assert_eq!(record.source_path, project.source_path());
        assert_eq!(record.output_dir, project.output_dir());
    }

    let invocation = &launches.lock().unwrap()[0].invocation;
    assert_eq!(invocation.args, vec!["--run-script", "commands.BatchExportFBXsegments"]);
}

#[tokio::test(start_paused = true)]
async fn test_second_run_is_idempotent() {
    init_tracing();
    let (fs, project, batch) = project(&[10, 40, 90]);
    let settings = SettingsBuilder::new().build();

    let first = FakeLauncher::new(fs.clone(), project.control_path());
    let mut orchestrator = Orchestrator::new(&settings, batch.clone(), first, fs.clone());
    let summary = orchestrator.run(CancelSignal::never()).await;
    assert_eq!(summary.succeeded(), 3);

    let second = FakeLauncher::new(fs.clone(), project.control_path());
    let launches = second.launches();
    let mut orchestrator = Orchestrator::new(&settings, batch, second, fs.clone());
    let summary = orchestrator.run(CancelSignal::never()).await;

    assert!(launches.lock().unwrap().is_empty());
    assert_eq!(summary.launched(), 0);
    assert_eq!(summary.skipped(), 3);
    assert!(summary.outcomes().iter().all(|o| *o == RunOutcome::Skipped));
    assert!(summary.reports.iter().all(|r| r.elapsed.is_none()));
}

#[tokio::test(start_paused = true)]
async fn test_partial_batch_resumes_where_it_stopped() {
    init_tracing();
    let (fs, project, batch) = project(&[0, 10, 20, 30]);
    fs.add_file(project.output_dir().join("shot_01.fbx"), b"fbx".to_vec());
    fs.add_file(project.output_dir().join("shot_02.fbx"), b"fbx".to_vec());

    let launcher = FakeLauncher::new(fs.clone(), project.control_path());
    let launches = launcher.launches();
    let settings = SettingsBuilder::new().build();
    let mut orchestrator = Orchestrator::new(&settings, batch, launcher, fs);
    let summary = orchestrator.run(CancelSignal::never()).await;

    assert_eq!(
        summary.outcomes(),
        vec![
            RunOutcome::Skipped,
            RunOutcome::Skipped,
            RunOutcome::Succeeded,
            RunOutcome::Succeeded,
        ]
    );
    let indices: Vec<i32> = launches.lock().unwrap().iter().map(|l| l.control.index).collect();
    assert_eq!(indices, vec![3, -1]);
}

#[tokio::test(start_paused = true)]
async fn test_resume_disabled_reexports_everything() {
    init_tracing();
    let (fs, project, batch) = project(&[10, 40, 90]);
    fs.add_file(project.output_dir().join("shot_01.fbx"), b"old".to_vec());

    let launcher = FakeLauncher::new(fs.clone(), project.control_path());
    let launches = launcher.launches();
    let settings = SettingsBuilder::new().resume(false).build();
    let mut orchestrator = Orchestrator::new(&settings, batch, launcher, fs);
    let summary = orchestrator.run(CancelSignal::never()).await;

    assert_eq!(launches.lock().unwrap().len(), 3);
    assert_eq!(summary.skipped(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failures_never_stop_the_batch() {
    init_tracing();
    let (fs, project, batch) = project(&[0, 10, 20, 30, 40]);
    let launcher = FakeLauncher::new(fs.clone(), project.control_path()).with_runs([
        FakeRun::succeed_without_artifact(),
        FakeRun::fail(3),
        FakeRun::hang(),
        FakeRun::unkillable(),
        FakeRun::succeed(),
    ]);
    let launches = launcher.launches();
    let settings = SettingsBuilder::new().timeout(Duration::from_secs(10)).build();
    let mut orchestrator = Orchestrator::new(&settings, batch, launcher, fs);
    let summary = orchestrator.run(CancelSignal::never()).await;

    assert_eq!(
        summary.outcomes(),
        vec![
            RunOutcome::FailedNoArtifact,
            RunOutcome::FailedExitCode(3),
            RunOutcome::TimedOut,
            RunOutcome::TimedOut,
            RunOutcome::Succeeded,
        ]
    );
    assert_eq!(launches.lock().unwrap().len(), 5);
    assert_eq!(summary.failed(), 4);
    assert_eq!(summary.reports[1].exit_code, Some(3));
    assert_eq!(summary.reports[3].termination_warnings.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_error_exit_with_artifact_is_still_a_failure() {
    init_tracing();
    let (fs, project, batch) = project(&[10, 40]);
    let broken = FakeRun {
        exit_code: 1,
        writes_artifact: true,
        ..FakeRun::succeed()
    };
    let launcher =
        FakeLauncher::new(fs.clone(), project.control_path()).with_runs([broken, FakeRun::succeed()]);
    let settings = SettingsBuilder::new().build();
    let mut orchestrator = Orchestrator::new(&settings, batch, launcher, fs.clone());
    let summary = orchestrator.run(CancelSignal::never()).await;

    assert_eq!(summary.outcomes()[0], RunOutcome::FailedExitCode(1));
    assert!(fs.paths().contains(&summary.reports[0].artifact));
}

#[tokio::test(start_paused = true)]
async fn test_launch_failures_are_recorded_per_interval() {
    init_tracing();
    let (fs, project, batch) = project(&[10, 40, 90]);
    let launcher = FakeLauncher::new(fs.clone(), project.control_path()).failing();
    let settings = SettingsBuilder::new().build();
    let mut orchestrator = Orchestrator::new(&settings, batch, launcher, fs);
    let summary = orchestrator.run(CancelSignal::never()).await;

    assert_eq!(summary.reports.len(), 3);
    for outcome in summary.outcomes() {
        assert!(matches!(outcome, RunOutcome::LaunchFailed(ref msg) if msg.contains("No such file")));
    }
    assert_eq!(summary.launched(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_escalates_and_stops_scheduling() {
    init_tracing();
    let (fs, project, batch) = project(&[0, 10, 20, 30]);
    let launcher = FakeLauncher::new(fs.clone(), project.control_path())
        .with_runs([FakeRun::succeed(), FakeRun::hang()]);
    let launches = launcher.launches();
    let signals = launcher.signals();
    let settings = SettingsBuilder::new().build();

    let (handle, cancel) = cancel_pair();
    tokio::spawn(async move {
        sleep(Duration::from_secs(10)).await;
        handle.cancel();
    });

    let mut orchestrator = Orchestrator::new(&settings, batch, launcher, fs);
    let summary = orchestrator.run(cancel).await;

    assert!(summary.cancelled);
    assert_eq!(
        summary.outcomes(),
        vec![RunOutcome::Succeeded, RunOutcome::Cancelled]
    );
    assert_eq!(launches.lock().unwrap().len(), 2);
    assert_eq!(signals.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_before_start_launches_nothing() {
    let (fs, project, batch) = project(&[10, 40, 90]);
    let launcher = FakeLauncher::new(fs.clone(), project.control_path());
    let launches = launcher.launches();
    let settings = SettingsBuilder::new().build();

    let (handle, cancel) = cancel_pair();
    handle.cancel();
    let mut orchestrator = Orchestrator::new(&settings, batch, launcher, fs);
    let summary = orchestrator.run(cancel).await;

    assert!(summary.cancelled);
    assert!(summary.reports.is_empty());
    assert!(launches.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_settle_delay_separates_launches() {
    init_tracing();
    let (fs, project, batch) = project(&[10, 40]);
    let launcher = FakeLauncher::new(fs.clone(), project.control_path());
    let settings = SettingsBuilder::new()
        .settle_delay(Duration::from_secs(2))
        .build();

    let started = tokio::time::Instant::now();
    let mut orchestrator = Orchestrator::new(&settings, batch, launcher, fs);
    let summary = orchestrator.run(CancelSignal::never()).await;

    // Two launches of 3 s each, each followed by a 2 s settle.
    assert_eq!(summary.succeeded(), 2);
    assert!(started.elapsed() >= Duration::from_secs(10));
}

#[test]
fn test_single_marker_fails_before_any_launch() {
    let fs = MockFileSystem::new();
    let project = ProjectBuilder::new("/proj").markers(&[5]);
    let control = project.write_to(&fs);

    match prepare_batch(&fs, &control) {
        Err(ExportError::InsufficientMarkers { found }) => assert_eq!(found, 1),
        other => panic!("Expected InsufficientMarkers, got: {:?}", other),
    }
}

#[test]
fn test_missing_source_project_is_fatal() {
    let fs = MockFileSystem::new();
    let project = ProjectBuilder::new("/proj").markers(&[10, 40]).without_source();
    let control = project.write_to(&fs);

    match prepare_batch(&fs, &control) {
        Err(ExportError::MissingInputFile(path)) => assert_eq!(path, PathBuf::from("/proj/shot.casc")),
        other => panic!("Expected MissingInputFile, got: {:?}", other),
    }
}

#[test]
fn test_missing_sidecar_is_fatal() {
    let fs = MockFileSystem::new();
    let project = ProjectBuilder::new("/proj");
    let control = project.write_to(&fs);

    match prepare_batch(&fs, &control) {
        Err(ExportError::MissingInputFile(path)) => assert_eq!(path, PathBuf::from("/proj/shot.txt")),
        other => panic!("Expected MissingInputFile, got: {:?}", other),
    }
}

#[test]
fn test_prepared_batch_contents() {
    let fs = MockFileSystem::new();
    let project = ProjectBuilder::new("/proj")
        .source_name("walk.casc")
        .sidecar_text("10 idle\n40 step\nnote\n90 stop\n");
    let control = project.write_to(&fs);

    let batch = prepare_batch(&fs, &control).unwrap();
    assert_eq!(batch.markers, vec![10, 40, 90]);
    assert_eq!(batch.sidecar, PathBuf::from("/proj/walk.txt"));
    assert_eq!(batch.intervals.len(), 3);
    assert_eq!(batch.seed.output_dir, PathBuf::from("/proj/out"));
}
