use std::time::Duration;

use tokio::time::{sleep, Instant};

use segexport::config::SupervisionSettings;
use segexport::control::{BatchSeed, ControlChannel, ControlRecord};
use segexport::exec::{cancel_pair, CancelSignal, Invocation, ProcessSupervisor, SupervisorState};
use segexport::fs::mock::MockFileSystem;
use segexport::types::Interval;
use segexport_test_utils::fake_launcher::{FakeLauncher, FakeRun, Signal};
use segexport_test_utils::init_tracing;

const CONTROL: &str = "/cfg/export_config.txt";

/// Tokio timers have millisecond resolution.
const TIMER_SLACK: Duration = Duration::from_millis(5);

fn settings() -> SupervisionSettings {
    SupervisionSettings {
        timeout: Duration::from_secs(120),
        poll_interval: Duration::from_secs(1),
        grace_period: Duration::from_secs(2),
        settle_delay: Duration::ZERO,
    }
}

fn invocation() -> Invocation {
    Invocation {
        program: "/opt/tool".into(),
        args: vec!["--run-script".into(), "commands.BatchExportFBXsegments".into()],
    }
}

/// A mock filesystem with a control record already in place.
fn fs_with_control() -> MockFileSystem {
    let fs = MockFileSystem::new();
    let seed = BatchSeed {
        source_path: "/p/shot.casc".into(),
        output_dir: "/out".into(),
    };
    let record = ControlRecord::for_interval(&seed, &Interval::bounded(10, 39, 1));
    ControlChannel::new(CONTROL).write(&fs, &record).unwrap();
    fs
}

#[tokio::test(start_paused = true)]
async fn test_clean_exit_completes_ok() {
    init_tracing();
    let fs = fs_with_control();
    let mut launcher = FakeLauncher::new(fs.clone(), CONTROL).with_runs([FakeRun::succeed()]);
    let supervisor = ProcessSupervisor::new(settings());

    let report = supervisor
        .supervise(&mut launcher, &invocation(), &mut CancelSignal::never())
        .await
        .unwrap();

    assert_eq!(report.state, SupervisorState::CompletedOk);
    assert_eq!(report.exit_code, Some(0));
    assert!(!report.cancelled);
    assert!(report.termination_warnings.is_empty());
    // Exit noticed on the first poll at or after 3 s.
    assert!(report.elapsed >= Duration::from_secs(3));
    assert!(report.elapsed <= Duration::from_secs(4) + TIMER_SLACK);
    assert!(launcher.signals().lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_hang_is_terminated_within_budget_plus_grace() {
    init_tracing();
    let fs = fs_with_control();
    let mut launcher = FakeLauncher::new(fs, CONTROL).with_runs([FakeRun::hang()]);
    let cfg = settings();
    let supervisor = ProcessSupervisor::new(cfg);

    let started = Instant::now();
    let report = supervisor
        .supervise(&mut launcher, &invocation(), &mut CancelSignal::never())
        .await
        .unwrap();
    let wall = started.elapsed();

    assert_eq!(report.state, SupervisorState::TimedOutTerminating);
    assert_eq!(report.exit_code, Some(-1));
    assert!(wall > cfg.timeout);
    assert!(wall <= cfg.timeout + cfg.grace_period + cfg.poll_interval + TIMER_SLACK);
    assert_eq!(*launcher.signals().lock().unwrap(), vec![Signal::Terminate]);
}

#[tokio::test(start_paused = true)]
async fn test_ignored_terminate_escalates_to_kill() {
    init_tracing();
    let fs = fs_with_control();
    let mut launcher =
        FakeLauncher::new(fs, CONTROL).with_runs([FakeRun::hang_ignoring_terminate()]);
    let cfg = settings();
    let supervisor = ProcessSupervisor::new(cfg);

    let report = supervisor
        .supervise(&mut launcher, &invocation(), &mut CancelSignal::never())
        .await
        .unwrap();

    assert_eq!(report.state, SupervisorState::Killed);
    assert_eq!(report.exit_code, None);
    assert!(report.elapsed <= cfg.timeout + cfg.grace_period + cfg.poll_interval + TIMER_SLACK);
    assert_eq!(
        *launcher.signals().lock().unwrap(),
        vec![Signal::Terminate, Signal::Kill]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_signals_are_reported_not_raised() {
    init_tracing();
    let fs = fs_with_control();
    let mut launcher = FakeLauncher::new(fs, CONTROL).with_runs([FakeRun::unkillable()]);
    let supervisor = ProcessSupervisor::new(settings());

    let report = supervisor
        .supervise(&mut launcher, &invocation(), &mut CancelSignal::never())
        .await
        .unwrap();

    assert_eq!(report.state, SupervisorState::Killed);
    assert_eq!(report.termination_warnings.len(), 2);
    assert!(report.termination_warnings[0].starts_with("terminate:"));
    assert!(report.termination_warnings[1].starts_with("kill:"));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_interrupts_the_poll_sleep() {
    init_tracing();
    let fs = fs_with_control();
    let mut launcher = FakeLauncher::new(fs, CONTROL).with_runs([FakeRun::hang()]);
    let cfg = SupervisionSettings {
        poll_interval: Duration::from_secs(30),
        ..settings()
    };
    let supervisor = ProcessSupervisor::new(cfg);

    let (handle, mut cancel) = cancel_pair();
    tokio::spawn(async move {
        sleep(Duration::from_secs(10)).await;
        handle.cancel();
    });

    let report = supervisor
        .supervise(&mut launcher, &invocation(), &mut cancel)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.state, SupervisorState::TimedOutTerminating);
    // Woken at 10 s rather than at the next 30 s poll, then one grace period.
    assert!(report.elapsed >= Duration::from_secs(12));
    assert!(report.elapsed <= Duration::from_secs(12) + TIMER_SLACK);
}

#[tokio::test]
async fn test_launch_failure_is_an_error() {
    let fs = fs_with_control();
    let mut launcher = FakeLauncher::new(fs, CONTROL).failing();
    let supervisor = ProcessSupervisor::new(settings());

    let err = supervisor
        .supervise(&mut launcher, &invocation(), &mut CancelSignal::never())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("/opt/tool"));
}
