//! Builds scheduler entries from a choreography

use crate::config::{Choreography, TimelineSpec, TweenSpec};
use crate::error::{ChoreographyError, Result};
use crate::report::MarkerHit;
use crate::scene::Scene;
use motus_animation::{
    color_cycle, color_to, AnimationScheduler, Progress, Property, Rgb, Timeline, Tween,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::{debug, info, trace};

/// Clock and marker log shared with callbacks during playback
#[derive(Debug, Clone, Default)]
pub struct Journal {
    clock: Rc<Cell<f32>>,
    markers: Rc<RefCell<Vec<MarkerHit>>>,
}

impl Journal {
    pub fn set_time(&self, time: f32) {
        self.clock.set(time);
    }

    pub fn time(&self) -> f32 {
        self.clock.get()
    }

    pub fn mark(&self, name: &str) {
        debug!(marker = name, time = self.time(), "marker reached");
        self.markers.borrow_mut().push(MarkerHit {
            name: name.to_string(),
            time: self.time(),
        });
    }

    pub fn markers(&self) -> Vec<MarkerHit> {
        self.markers.borrow().clone()
    }
}

/// Register every animation the choreography declares
pub fn install(
    choreo: &Choreography,
    scene: &Rc<RefCell<Scene>>,
    scheduler: &mut AnimationScheduler,
    journal: &Journal,
) -> Result<()> {
    {
        let scene = scene.borrow();

        for spec in &choreo.tweens {
            scheduler.add(build_tween(&scene, spec)?);
        }

        for spec in &choreo.colors {
            let color = scene.color_at(&spec.target)?;
            let tween = color_to(&color, |c: &mut Rgb| c, spec.to, spec.config)
                .map_err(ChoreographyError::animation(format!("color '{}'", spec.target)))?;
            scheduler.add(tween);
        }

        for spec in &choreo.color_cycles {
            let color = scene.color_at(&spec.target)?;
            let tween = color_cycle(&color, |c: &mut Rgb| c, spec.palette.clone(), spec.config)
                .map_err(ChoreographyError::animation(format!(
                    "color cycle '{}'",
                    spec.target
                )))?;
            scheduler.add(tween);
        }

        for spec in &choreo.timelines {
            scheduler.add(build_timeline(&scene, spec)?);
        }

        for spec in &choreo.kills {
            let target = scene.target(&spec.target)?.id();
            let fields = spec.fields.clone();
            let handle = scheduler.handle();
            let label = spec.target.clone();
            scheduler
                .delayed_call(spec.at, move || {
                    let names: Option<Vec<&str>> = fields
                        .as_ref()
                        .map(|fields| fields.iter().map(String::as_str).collect());
                    debug!(path = %label, "killing tweens");
                    handle.kill_tweens_of(target, names.as_deref());
                })
                .map_err(ChoreographyError::animation(format!("kill '{}'", spec.target)))?;
        }

        for spec in &choreo.removals {
            scene.object(&spec.object)?;
        }
    }

    for spec in &choreo.removals {
        let shared = Rc::clone(scene);
        let name = spec.object.clone();
        scheduler
            .delayed_call(spec.at, move || {
                if shared.borrow_mut().remove(&name) {
                    info!(object = %name, "object removed from scene");
                }
            })
            .map_err(ChoreographyError::animation(format!("removal '{}'", spec.object)))?;
    }

    for spec in &choreo.markers {
        let journal = journal.clone();
        let name = spec.name.clone();
        scheduler
            .delayed_call(spec.at, move || journal.mark(&name))
            .map_err(ChoreographyError::animation(format!("marker '{}'", spec.name)))?;
    }

    Ok(())
}

/// Tween over the fields of one object
pub fn build_tween(scene: &Scene, spec: &TweenSpec) -> Result<Tween> {
    let mut builder = Tween::builder(spec.config);
    for (field, goal) in &spec.to {
        let property = scene.field(&spec.target, field)?;
        builder = match spec.from.get(field) {
            Some(start) => builder.from_to(property, *start, *goal),
            None => builder.to(property, *goal),
        };
    }

    if let Some(path) = &spec.progress_field {
        let mirror = scene.field_at(path)?;
        builder = builder.on_update_with(mirror, |progress: &Progress, mirror: &Property| {
            if let Err(err) = mirror.set(progress.progress) {
                trace!(?err, field = mirror.name(), "progress mirror not written");
            }
        });
    }

    builder
        .build()
        .map_err(ChoreographyError::animation(format!("tween on '{}'", spec.target)))
}

/// Timeline of tweens with its labels declared up front
pub fn build_timeline(scene: &Scene, spec: &TimelineSpec) -> Result<Timeline> {
    let mut timeline = Timeline::with_config(spec.config)
        .map_err(ChoreographyError::animation("timeline"))?;
    for (label, offset) in &spec.labels {
        timeline.add_label(label.clone(), *offset);
    }
    for child in &spec.children {
        let tween = build_tween(scene, &child.tween)?;
        timeline.add(tween, child.position.clone());
    }
    Ok(timeline)
}
