use super::*;

#[test]
fn parses_every_update_task_by_pv_name() {
    for task in VarUpdateTask::ALL {
        assert_eq!(
            ControlPoint::parse(task.pv_name()),
            ControlPoint::VarUpdate(task)
        );
    }
}

#[test]
fn unknown_names_pass_through() {
    let point = ControlPoint::parse("SICO-SOFB-KICK-CH");
    assert_eq!(
        point,
        ControlPoint::PassThrough("SICO-SOFB-KICK-CH".to_string())
    );
    assert_eq!(point.pv_name(), "SICO-SOFB-KICK-CH");
}

#[test]
fn fixed_points_round_trip_their_names() {
    for point in [
        ControlPoint::ModeSelect,
        ControlPoint::SampleCount,
        ControlPoint::Weight,
    ] {
        assert_eq!(ControlPoint::parse(point.pv_name()), point);
    }
}

#[test]
fn mode_select_partitions_value_domain() {
    assert_eq!(ModeSelect::try_from(0), Ok(ModeSelect::Stop));
    assert_eq!(ModeSelect::try_from(1), Ok(ModeSelect::Correction(1)));
    assert_eq!(ModeSelect::try_from(8), Ok(ModeSelect::Correction(8)));
    assert_eq!(ModeSelect::try_from(9), Ok(ModeSelect::Measurement(9)));
    assert_eq!(ModeSelect::try_from(14), Ok(ModeSelect::Measurement(14)));
    assert_eq!(ModeSelect::try_from(15), Err(15));
    assert_eq!(ModeSelect::try_from(-1), Err(-1));
}

#[test]
fn shared_rejection_codes_are_kept() {
    assert_eq!(
        VarUpdateTask::RefOrbitXLoad.rejection_code(),
        VarUpdateTask::RefOrbitYLoad.rejection_code()
    );
    assert_eq!(VarUpdateTask::RefOrbitXSelect.rejection_code().code(), 9);
    for task in VarUpdateTask::ELEMENT_SETS {
        assert_eq!(task.rejection_code().code(), 12);
    }
}
