//! Teardown Tests
//!
//! Tests for:
//! - Teardown in every phase releases every resource exactly once
//! - Repeated teardown is a no-op
//! - A failed scene build leaves nothing allocated
//! - Nothing fires after teardown
//! - Dropping a live sequencer tears it down

mod common;

use std::time::Duration;

use landfall::{IntroSequencer, LandfallError, Phase};

use common::{TestMount, finish_counter, initialize, run_until, settings};

fn assert_fully_released(intro: &IntroSequencer<TestMount>, mount_state: &common::MountState) {
    assert!(intro.resources().outstanding().is_zero());
    assert_eq!(intro.resources().allocated(), intro.resources().released());

    let log = mount_state.last_log();
    let log = log.borrow();
    assert_eq!(log.outstanding(), 0);
    assert_eq!(log.stray_releases, 0);
    assert_eq!(log.geometry_allocations, log.geometry_releases);
    assert_eq!(log.material_allocations, log.material_releases);
    assert!(log.disposed);

    assert!(mount_state.mounted.is_empty());
    assert!(intro.renderer().is_none());
    assert!(intro.scene().is_none());
    assert!(!intro.is_frame_loop_registered());
}

#[test]
fn teardown_in_every_phase_releases_everything() {
    for target in Phase::ORDER {
        let mount = TestMount::new(800, 600);
        let state = mount.state();
        let (mut intro, finished) = initialize(mount);
        let mut now = Duration::ZERO;

        let reached = run_until(&mut intro, &mut now, Duration::from_secs(30), |i| {
            i.phase() == target
        });
        assert!(reached, "never reached {target}");

        let before = *finished.borrow();
        let report = intro.teardown();
        assert!(report.renderer_disposed, "{target}");
        assert!(report.surface_detached, "{target}");
        assert!(!report.released().is_zero(), "{target}");
        assert_fully_released(&intro, &state.borrow());

        // Frames and timers are dead after teardown.
        let limit = now + Duration::from_secs(20);
        run_until(&mut intro, &mut now, limit, |_| false);
        assert_eq!(intro.phase(), target);
        assert_eq!(*finished.borrow(), before, "{target}");
    }
}

#[test]
fn shared_resources_are_released_once() {
    let mount = TestMount::new(800, 600);
    let state = mount.state();
    let (mut intro, _) = initialize(mount);

    let allocated = intro.resources().allocated();
    let report = intro.teardown();

    assert_eq!(report.released(), allocated);
    assert_eq!(report.detached.buffers, 1);
    assert_eq!(state.borrow().last_log().borrow().stray_releases, 0);
}

#[test]
fn second_teardown_is_a_noop() {
    let mount = TestMount::new(800, 600);
    let state = mount.state();
    let (mut intro, _) = initialize(mount);

    let first = intro.teardown();
    assert!(!first.is_noop());
    assert!(first.scheduler_cancelled);
    assert!(first.resize_unsubscribed);
    assert_eq!(first.timers_cancelled, 1);

    let second = intro.teardown();
    assert!(second.is_noop(), "{second}");
    assert_eq!(state.borrow().detach_calls, 1);
    assert!(intro.is_torn_down());
}

#[test]
fn teardown_during_flash_cancels_the_completion_timer() {
    let (mut intro, finished) = initialize(TestMount::new(800, 600));
    let mut now = Duration::ZERO;
    assert!(run_until(&mut intro, &mut now, Duration::from_secs(30), |i| {
        i.phase() == Phase::Flash
    }));

    let report = intro.teardown();
    assert_eq!(report.timers_cancelled, 1);

    intro.poll_timers(now + Duration::from_secs(5));
    assert_eq!(*finished.borrow(), 0);
    assert!(!intro.is_finished());
}

#[test]
fn start_and_skip_after_teardown_are_ignored() {
    let (mut intro, finished) = initialize(TestMount::new(800, 600));
    intro.teardown();

    intro.start();
    intro.skip();
    assert_eq!(intro.phase(), Phase::Waiting);
    assert_eq!(*finished.borrow(), 0);
}

#[test]
fn failed_build_releases_what_was_allocated() {
    for budget in [0, 1, 3, 10] {
        let mount = TestMount::new(800, 600).with_geometry_budget(budget);
        let state = mount.state();
        let (finished, on_finish) = finish_counter();

        let result = IntroSequencer::initialize(mount, settings(), on_finish);
        assert!(
            matches!(result, Err(LandfallError::GpuAllocation { .. })),
            "budget {budget}"
        );
        assert_eq!(*finished.borrow(), 0);

        let state = state.borrow();
        assert!(state.mounted.is_empty(), "budget {budget}");
        assert_eq!(state.attach_calls, 1);
        assert_eq!(state.detach_calls, 1);

        let log = state.last_log();
        let log = log.borrow();
        assert_eq!(log.outstanding(), 0, "budget {budget}");
        assert_eq!(log.stray_releases, 0, "budget {budget}");
        assert_eq!(log.geometry_allocations, budget);
        assert!(log.disposed);
    }
}

#[test]
fn dropping_mid_landing_releases_everything() {
    let mount = TestMount::new(800, 600);
    let state = mount.state();
    let (mut intro, finished) = initialize(mount);
    let mut now = Duration::ZERO;

    let reached = run_until(&mut intro, &mut now, Duration::from_secs(30), |i| {
        i.phase() == Phase::Landing
    });
    assert!(reached);
    assert_eq!(state.borrow().mounted.len(), 1);

    drop(intro);

    let state = state.borrow();
    assert!(state.mounted.is_empty());
    assert_eq!(state.detach_calls, 1);
    let log = state.last_log();
    let log = log.borrow();
    assert_eq!(log.outstanding(), 0);
    assert_eq!(log.stray_releases, 0);
    assert_eq!(log.geometry_allocations, log.geometry_releases);
    assert_eq!(log.material_allocations, log.material_releases);
    assert!(log.disposed);
    assert_eq!(*finished.borrow(), 0);
}

#[test]
fn dropping_after_teardown_releases_nothing_twice() {
    let mount = TestMount::new(800, 600);
    let state = mount.state();
    let (mut intro, _) = initialize(mount);
    intro.teardown();
    drop(intro);

    let state = state.borrow();
    assert_eq!(state.detach_calls, 1);
    assert_eq!(state.last_log().borrow().stray_releases, 0);
}

#[test]
fn dropping_the_mount_back_allows_a_fresh_sequencer() {
    let mount = TestMount::new(800, 600);
    let state = mount.state();
    let (intro, _) = initialize(mount);

    let mount = intro.into_mount();
    assert!(state.borrow().mounted.is_empty());
    assert_eq!(state.borrow().last_log().borrow().outstanding(), 0);

    let (mut again, _) = initialize(mount);
    assert_eq!(state.borrow().renderer_logs.len(), 2);
    again.teardown();
    assert_eq!(state.borrow().last_log().borrow().outstanding(), 0);
}
