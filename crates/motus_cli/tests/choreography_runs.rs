//! End-to-end runs of choreographies through the headless runner

use motus_cli::{run, Choreography, ChoreographyError, ReportStatus, RunConfig, SAMPLE_CHOREOGRAPHY};
use std::path::Path;

fn settings(fps: u32, seconds: f32) -> RunConfig {
    RunConfig {
        fps,
        seconds,
        sample_every: 0,
    }
}

#[test]
fn test_sample_choreography_passes() {
    let choreo = Choreography::from_toml(SAMPLE_CHOREOGRAPHY).unwrap();
    let report = run(&choreo, choreo.run).unwrap();

    let failures: Vec<_> = report.failures().collect();
    assert!(failures.is_empty(), "failed expectations: {failures:?}");
    assert_eq!(report.status, ReportStatus::Passed);
    assert_eq!(report.frames, 360);

    let markers: Vec<_> = report.markers.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(markers, ["halfway"]);
    assert!((report.markers[0].time - 3.0).abs() < 0.02);

    // Camera, morph and color loops never finish
    assert_eq!(report.active_at_end, 3);
    assert_eq!(report.samples.len(), 13);
}

#[test]
fn test_removed_object_cancels_its_tweens() {
    let choreo = Choreography::from_toml(
        r##"
        [objects.box]
        fields = { x = 0.0 }

        [objects.other]
        fields = { x = 0.0 }

        [[tweens]]
        target = "box"
        to = { x = 10.0 }
        duration = 2.0

        [[tweens]]
        target = "other"
        to = { x = 10.0 }
        duration = 2.0
        repeat = -1

        [[removals]]
        at = 0.5
        object = "box"
        "##,
    )
    .unwrap();

    let report = run(&choreo, settings(10, 1.0)).unwrap();
    assert_eq!(report.status, ReportStatus::Passed);
    // Only the endless tween on the surviving object is left
    assert_eq!(report.active_at_end, 1);
}

#[test]
fn test_kill_freezes_only_named_fields() {
    let choreo = Choreography::from_toml(
        r##"
        [objects.box]
        fields = { x = 0.0, y = 0.0 }

        [[tweens]]
        target = "box"
        to = { x = 10.0 }
        duration = 2.0

        [[tweens]]
        target = "box"
        to = { y = 10.0 }
        duration = 2.0

        [[kills]]
        at = 1.0
        target = "box"
        fields = ["x"]

        [[expects]]
        at = 2.0
        field = "box.x"
        value = 5.0
        tolerance = 0.6

        [[expects]]
        at = 2.0
        field = "box.y"
        value = 10.0
        "##,
    )
    .unwrap();

    let report = run(&choreo, settings(10, 2.5)).unwrap();
    let failures: Vec<_> = report.failures().collect();
    assert!(failures.is_empty(), "failed expectations: {failures:?}");
    assert_eq!(report.active_at_end, 0);
}

#[test]
fn test_kill_without_fields_cancels_everything_on_target() {
    let choreo = Choreography::from_toml(
        r##"
        [objects.light]
        colors = { color = "#000000" }

        [[colors]]
        target = "light.color"
        to = "#ffffff"
        duration = 2.0

        [[kills]]
        at = 1.0
        target = "light.color"

        [[expects]]
        at = 2.0
        field = "light.color.r"
        value = 0.5
        tolerance = 0.06
        "##,
    )
    .unwrap();

    let report = run(&choreo, settings(10, 2.0)).unwrap();
    assert_eq!(report.status, ReportStatus::Passed);
}

#[test]
fn test_time_scale_speeds_up_playback() {
    let choreo = Choreography::from_toml(
        r##"
        [scheduler]
        time_scale = 2.0

        [objects.box]
        fields = { x = 0.0 }

        [[tweens]]
        target = "box"
        to = { x = 1.0 }
        duration = 2.0

        [[expects]]
        at = 1.0
        field = "box.x"
        value = 1.0
        "##,
    )
    .unwrap();

    let report = run(&choreo, settings(20, 1.0)).unwrap();
    assert_eq!(report.status, ReportStatus::Passed);
}

#[test]
fn test_failed_expectation_reports_actual_value() {
    let choreo = Choreography::from_toml(
        r##"
        [objects.box]
        fields = { x = 0.0 }

        [[tweens]]
        target = "box"
        to = { x = 1.0 }
        duration = 1.0

        [[expects]]
        at = 1.0
        field = "box.x"
        value = 2.0
        "##,
    )
    .unwrap();

    let report = run(&choreo, settings(10, 1.0)).unwrap();
    assert!(report.is_failed());
    let failure = report.failures().next().unwrap();
    assert!((failure.actual.unwrap() - 1.0).abs() < 1e-4);
}

#[test]
fn test_unknown_target_is_rejected() {
    let choreo = Choreography::from_toml(
        r##"
        [[tweens]]
        target = "ghost"
        to = { x = 1.0 }
        "##,
    )
    .unwrap();

    let err = run(&choreo, settings(10, 1.0)).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ChoreographyError>(),
        Some(ChoreographyError::UnknownObject(name)) if name == "ghost"
    ));
}

#[test]
fn test_missing_file_suggests_init() {
    let err = Choreography::load(Path::new("does/not/exist.toml")).unwrap_err();
    assert!(err.to_string().contains("motus init"));
}
