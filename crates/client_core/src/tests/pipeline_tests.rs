use super::*;

#[test]
fn servo_pipeline_starts_at_zero_and_speed_at_fifty() {
    let servo = InputPipeline::servo();
    assert_eq!(servo.value(), 0.0);
    assert_eq!(servo.label(), "0°");
    assert_eq!(servo.fill_percent(), 0.0);

    let speed = InputPipeline::speed();
    assert_eq!(speed.value(), 50.0);
    assert_eq!(speed.label(), "50%");
    assert_eq!(speed.fill_percent(), 50.0);
}

#[test]
fn in_bounds_values_flow_through_unchanged() {
    let mut servo = InputPipeline::servo();
    for v in [0.0, 1.0, 17.0, 90.0, 179.0, 180.0] {
        let update = servo.on_change(v).expect("accepted");
        assert_eq!(update.value, v);
        assert_eq!(update.fill_percent, v / 180.0 * 100.0);
        assert_eq!(
            update.command,
            Command::ServoAngle(ServoAngle::new(v).expect("finite"))
        );
    }

    let mut speed = InputPipeline::speed();
    for v in [0.0, 33.0, 100.0] {
        let update = speed.on_change(v).expect("accepted");
        assert_eq!(update.fill_percent, v);
        assert_eq!(
            update.command,
            Command::StepperSpeed(SpeedPercent::new(v).expect("finite"))
        );
    }
}

#[test]
fn servo_update_carries_label_for_scenario_ninety() {
    let mut servo = InputPipeline::servo();
    let update = servo.on_change(90.0).expect("accepted");
    assert_eq!(update.label, "90°");
    assert_eq!(update.fill_percent, 50.0);
    assert_eq!(
        update.command.to_wire().expect("json"),
        r#"{"type":"servoAngle","value":90}"#
    );
}

#[test]
fn non_finite_input_is_ignored_without_side_effects() {
    let mut servo = InputPipeline::servo();
    servo.on_change(40.0).expect("accepted");
    assert!(servo.on_change(f64::NAN).is_none());
    assert!(servo.on_change(f64::NEG_INFINITY).is_none());
    assert_eq!(servo.value(), 40.0);
    assert_eq!(servo.label(), "40°");
}

#[test]
fn out_of_range_input_is_clamped_and_sent_as_shown() {
    let mut speed = InputPipeline::speed();
    for (raw, shown) in [(140.0, 100.0), (-3.0, 0.0), (37.5, 37.5)] {
        let update = speed.on_change(raw).expect("accepted");
        assert_eq!(update.value, shown);
        assert_eq!(update.fill_percent, shown);
        assert_eq!(
            update.command,
            Command::StepperSpeed(SpeedPercent::new(update.value).expect("finite"))
        );
    }

    let mut servo = InputPipeline::servo();
    let update = servo.on_change(270.0).expect("accepted");
    assert_eq!(update.value, 180.0);
    assert_eq!(update.label, "180°");
    assert_eq!(update.fill_percent, 100.0);
    assert_eq!(
        update.command.to_wire().expect("json"),
        r#"{"type":"servoAngle","value":180}"#
    );
}
