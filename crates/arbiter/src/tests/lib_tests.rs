use super::*;
use std::collections::HashSet;

fn arbiter() -> ModeArbiter {
    ModeArbiter::new(100, 10).expect("arbiter")
}

fn select(value: i64) -> ControlRequest {
    ControlRequest::SelectMode(ModeSelect::try_from(value).expect("mode value"))
}

#[test]
fn rejects_initial_sample_count_above_buffer_length() {
    let err = ModeArbiter::new(5, 6).expect_err("should fail");
    assert_eq!(err.n_samples, 6);
    assert_eq!(err.max_length, 5);
}

#[test]
fn correction_modes_are_refused_while_measurement_runs() {
    for value in 1..=8 {
        let mut arbiter = arbiter();
        arbiter.respm_measurement.mode = Mode::Active(11);
        let err = arbiter.request(select(value)).expect_err("should reject");
        assert_eq!(err.code, RejectionCode::MeasurementRunning);
        assert_eq!(err.code.code(), 7);
        assert_eq!(arbiter.orbit_correction().mode(), Mode::Idle);
    }
}

#[test]
fn correction_modes_are_refused_while_measurement_waits() {
    let mut arbiter = arbiter();
    arbiter.respm_measurement.mode = Mode::Waiting(9);
    let err = arbiter.request(select(2)).expect_err("should reject");
    assert_eq!(err.code.code(), 7);
}

#[test]
fn measurement_modes_are_refused_while_correction_runs() {
    for value in 9..=14 {
        let mut arbiter = arbiter();
        arbiter.orbit_correction.mode = Mode::Active(3);
        let err = arbiter.request(select(value)).expect_err("should reject");
        assert_eq!(err.code, RejectionCode::CorrectionRunning);
        assert_eq!(arbiter.respm_measurement().mode(), Mode::Idle);
        assert_eq!(arbiter.orbit_correction().mode(), Mode::Active(3));
    }
}

#[test]
fn stop_without_measurement_idles_both_and_does_not_interrupt() {
    let mut arbiter = arbiter();
    arbiter.orbit_correction.mode = Mode::Active(5);
    let applied = arbiter.request(select(0)).expect("applied");
    assert!(!applied.interrupted);
    assert_eq!(arbiter.orbit_correction().mode(), Mode::Idle);
    assert_eq!(arbiter.respm_measurement().mode(), Mode::Idle);
    assert!(!arbiter.interrupt_handle().is_set());
}

#[test]
fn stop_interrupts_running_measurement_without_touching_its_mode() {
    let mut arbiter = arbiter();
    arbiter.respm_measurement.mode = Mode::Active(12);
    let applied = arbiter.request(select(0)).expect("applied");
    assert!(applied.interrupted);
    assert!(arbiter.interrupt_handle().is_set());
    assert_eq!(arbiter.respm_measurement().mode(), Mode::Active(12));
    assert_eq!(arbiter.orbit_correction().mode(), Mode::Idle);
}

#[test]
fn stop_interrupts_waiting_measurement() {
    let mut arbiter = arbiter();
    arbiter.respm_measurement.mode = Mode::Waiting(10);
    let applied = arbiter.request(select(0)).expect("applied");
    assert!(applied.interrupted);
}

#[test]
fn correction_queues_behind_variable_update() {
    let mut arbiter = arbiter();
    arbiter.var_update.mode = Mode::Active(4);
    arbiter.request(select(2)).expect("applied");
    assert_eq!(arbiter.orbit_correction().mode(), Mode::Waiting(2));
}

#[test]
fn measurement_queues_behind_variable_update() {
    let mut arbiter = arbiter();
    arbiter.var_update.mode = Mode::Active(7);
    arbiter.request(select(13)).expect("applied");
    assert_eq!(arbiter.respm_measurement().mode(), Mode::Waiting(13));
}

#[test]
fn running_correction_blocks_measurement_request() {
    let mut arbiter = arbiter();
    arbiter.request(select(3)).expect("applied");
    let before = arbiter.modes();
    let err = arbiter.request(select(10)).expect_err("should reject");
    assert_eq!(err.code.code(), 1);
    assert_eq!(arbiter.modes(), before);
}

#[test]
fn repeating_an_accepted_mode_is_applied_again() {
    let mut arbiter = arbiter();
    arbiter.request(select(4)).expect("first");
    let before = arbiter.modes();
    let applied = arbiter.request(select(4)).expect("second");
    assert!(!applied.interrupted);
    assert_eq!(arbiter.modes(), before);
}

#[test]
fn correction_can_switch_between_active_modes() {
    let mut arbiter = arbiter();
    arbiter.request(select(1)).expect("first");
    arbiter.request(select(8)).expect("second");
    assert_eq!(arbiter.orbit_correction().mode(), Mode::Active(8));
}

#[test]
fn sample_count_is_bounded_by_buffer_length() {
    let mut arbiter = arbiter();
    arbiter
        .request(ControlRequest::SetSampleCount(100))
        .expect("boundary accepted");
    assert_eq!(arbiter.orbit_measurement().n_samples(), 100);

    let err = arbiter
        .request(ControlRequest::SetSampleCount(101))
        .expect_err("should reject");
    assert_eq!(err.code, RejectionCode::SampleCountTooLarge);
    assert_eq!(arbiter.orbit_measurement().n_samples(), 100);
}

#[test]
fn element_set_points_map_onto_distinct_update_modes() {
    let mut seen = HashSet::new();
    for task in VarUpdateTask::ELEMENT_SETS {
        let mut arbiter = arbiter();
        arbiter
            .request(ControlRequest::UpdateVariable(task))
            .expect("applied");
        let Mode::Active(value) = arbiter.var_update().mode() else {
            panic!("var_update should be active for {task}");
        };
        assert!((7..=15).contains(&value));
        seen.insert(value);
    }
    assert_eq!(seen, (7..=15).collect::<HashSet<u8>>());
}

#[test]
fn variable_updates_require_idle_correction_and_updater() {
    let cases = [
        (VarUpdateTask::RespmSelect, 4, 8),
        (VarUpdateTask::RefOrbitXSelect, 5, 9),
        (VarUpdateTask::RefOrbitYSelect, 6, 9),
        (VarUpdateTask::RespmLoad, 1, 4),
        (VarUpdateTask::RefOrbitXLoad, 2, 5),
        (VarUpdateTask::RefOrbitYLoad, 3, 5),
        (VarUpdateTask::CvRemove, 15, 12),
    ];
    for (task, mode, code) in cases {
        let mut arbiter = arbiter();
        arbiter
            .request(ControlRequest::UpdateVariable(task))
            .expect("applied");
        assert_eq!(arbiter.var_update().mode(), Mode::Active(mode));

        let err = arbiter
            .request(ControlRequest::UpdateVariable(task))
            .expect_err("updater busy");
        assert_eq!(err.code.code(), code);

        let mut arbiter = self::arbiter();
        arbiter.orbit_correction.mode = Mode::Waiting(2);
        let err = arbiter
            .request(ControlRequest::UpdateVariable(task))
            .expect_err("correction busy");
        assert_eq!(err.code.code(), code);
        assert_eq!(arbiter.var_update().mode(), Mode::Idle);
    }
}

#[test]
fn variable_update_is_allowed_during_measurement() {
    let mut arbiter = arbiter();
    arbiter.respm_measurement.mode = Mode::Active(9);
    arbiter
        .request(ControlRequest::UpdateVariable(VarUpdateTask::BpmAdd))
        .expect("applied");
    assert_eq!(arbiter.var_update().mode(), Mode::Active(10));
}

#[test]
fn weight_must_lie_in_unit_interval() {
    let mut arbiter = arbiter();
    arbiter.request(ControlRequest::SetWeight(0.0)).expect("zero");
    arbiter.request(ControlRequest::SetWeight(1.0)).expect("one");
    for bad in [-0.1, 1.5, f64::NAN] {
        let err = arbiter
            .request(ControlRequest::SetWeight(bad))
            .expect_err("out of range");
        assert_eq!(err.code, RejectionCode::WeightOutOfRange);
    }
}

#[test]
fn releasing_updater_promotes_waiting_correction() {
    let mut arbiter = arbiter();
    arbiter
        .request(ControlRequest::UpdateVariable(VarUpdateTask::RespmSelect))
        .expect("applied");
    arbiter.request(select(6)).expect("queued");
    assert_eq!(arbiter.orbit_correction().mode(), Mode::Waiting(6));

    let promoted = arbiter.release(WorkerKind::VarUpdate);
    assert_eq!(promoted, vec![WorkerKind::OrbitCorrection]);
    assert_eq!(arbiter.orbit_correction().mode(), Mode::Active(6));
    assert_eq!(arbiter.var_update().mode(), Mode::Idle);
}

#[test]
fn resume_waiting_does_nothing_while_updater_busy() {
    let mut arbiter = arbiter();
    arbiter.var_update.mode = Mode::Active(2);
    arbiter.respm_measurement.mode = Mode::Waiting(14);
    assert!(arbiter.resume_waiting().is_empty());
    assert_eq!(arbiter.respm_measurement().mode(), Mode::Waiting(14));
}

#[test]
fn releasing_measurement_clears_interrupt() {
    let mut arbiter = arbiter();
    arbiter.respm_measurement.mode = Mode::Active(10);
    arbiter.request(select(0)).expect("applied");
    assert!(arbiter.modes().interrupt_pending);

    assert!(arbiter.release(WorkerKind::RespmMeasurement).is_empty());
    assert_eq!(arbiter.respm_measurement().mode(), Mode::Idle);
    assert!(!arbiter.modes().interrupt_pending);

    arbiter.request(select(3)).expect("correction can start");
}

#[test]
fn stopped_waiting_measurement_is_not_started_by_updater_release() {
    let mut arbiter = arbiter();
    arbiter
        .request(ControlRequest::UpdateVariable(VarUpdateTask::RespmSelect))
        .expect("applied");
    arbiter.request(select(10)).expect("queued");
    assert_eq!(arbiter.respm_measurement().mode(), Mode::Waiting(10));

    let applied = arbiter.request(select(0)).expect("stop");
    assert!(applied.interrupted);

    let promoted = arbiter.release(WorkerKind::VarUpdate);
    assert!(promoted.is_empty());
    assert_eq!(arbiter.respm_measurement().mode(), Mode::Idle);
    assert!(!arbiter.modes().interrupt_pending);
}

#[test]
fn releasing_orbit_measurement_keeps_it_idle() {
    let mut arbiter = arbiter();
    assert!(arbiter.release(WorkerKind::OrbitMeasurement).is_empty());
    assert_eq!(arbiter.orbit_measurement().mode(), Mode::Idle);
    assert_eq!(arbiter.orbit_measurement().n_samples(), 10);
}
