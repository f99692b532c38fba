//! Fixed-step headless playback

use crate::compose::{install, Journal};
use crate::config::{Choreography, ExpectSpec, RunConfig};
use crate::error::ChoreographyError;
use crate::report::{ExpectationResult, ReportStatus, RunReport, Sample};
use crate::scene::Scene;
use anyhow::Result;
use motus_animation::AnimationScheduler;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info, warn};

/// Slack when comparing expectation times against frame times
const TIME_EPSILON: f32 = 1e-4;

/// Play `choreo` for `settings.seconds` at `settings.fps` and report what happened
pub fn run(choreo: &Choreography, settings: RunConfig) -> Result<RunReport> {
    if settings.fps == 0 {
        return Err(ChoreographyError::InvalidRun("fps must be positive".into()).into());
    }
    if !settings.seconds.is_finite() || settings.seconds < 0.0 {
        return Err(ChoreographyError::InvalidRun(format!(
            "seconds must be a non-negative number, got {}",
            settings.seconds
        ))
        .into());
    }

    let scene = Rc::new(RefCell::new(Scene::new(&choreo.objects)));
    let mut scheduler = AnimationScheduler::with_config(choreo.scheduler);
    let journal = Journal::default();
    install(choreo, &scene, &mut scheduler, &journal)?;

    let dt = 1.0 / settings.fps as f32;
    let frames = (settings.seconds * settings.fps as f32).round() as u64;
    info!(
        fps = settings.fps,
        frames,
        animations = choreo.animation_count(),
        "starting playback"
    );

    let mut pending: Vec<&ExpectSpec> = choreo.expects.iter().collect();
    pending.sort_by(|a, b| a.at.total_cmp(&b.at));
    let mut pending = pending.into_iter().peekable();

    let mut expectations = Vec::with_capacity(choreo.expects.len());
    let mut samples = Vec::new();

    for frame in 0..=frames {
        let time = frame as f32 * dt;
        if frame > 0 {
            journal.set_time(time);
            scheduler.tick(dt);
        }

        let scene = scene.borrow();
        while let Some(expect) = pending.next_if(|e| e.at <= time + TIME_EPSILON) {
            let result = evaluate(expect, scene.read(&expect.field));
            if !result.passed {
                warn!(
                    field = %result.field,
                    at = result.at,
                    expected = result.expected,
                    actual = ?result.actual,
                    "expectation failed"
                );
            }
            expectations.push(result);
        }

        if settings.sample_every > 0 && frame % u64::from(settings.sample_every) == 0 {
            samples.push(Sample {
                frame,
                time,
                values: scene.snapshot(),
            });
        }
    }

    for expect in pending {
        debug!(field = %expect.field, at = expect.at, "expectation never reached");
        expectations.push(evaluate(expect, None));
    }

    let status = if expectations.iter().all(|e| e.passed) {
        ReportStatus::Passed
    } else {
        ReportStatus::Failed
    };
    let markers = journal.markers();
    info!(
        ?status,
        markers = markers.len(),
        remaining = scheduler.len(),
        "playback finished"
    );

    Ok(RunReport {
        status,
        frames,
        seconds: frames as f32 * dt,
        samples,
        markers,
        expectations,
        active_at_end: scheduler.len(),
    })
}

fn evaluate(expect: &ExpectSpec, actual: Option<f32>) -> ExpectationResult {
    let passed = actual.is_some_and(|value| (value - expect.value).abs() <= expect.tolerance);
    ExpectationResult {
        at: expect.at,
        field: expect.field.clone(),
        expected: expect.value,
        actual,
        tolerance: expect.tolerance,
        passed,
    }
}
