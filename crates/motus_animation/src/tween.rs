//! Tweens: timed interpolation of numeric fields
//!
//! A tween owns nothing it animates. Each [`Track`] pairs a [`Property`] with
//! a goal; start values are read from the live field the moment the tween
//! actually begins (after its delay), so a tween can be declared before its
//! target holds a meaningful value.
//!
//! ```rust
//! use motus_animation::{Easing, Property, Tween, TweenConfig};
//! use std::{cell::RefCell, rc::Rc};
//!
//! struct Position { z: f32 }
//!
//! let position = Rc::new(RefCell::new(Position { z: 0.0 }));
//! let mut tween = Tween::builder(TweenConfig::new(5.0).with_easing(Easing::Linear))
//!     .to(Property::new(&position, "z", |p: &mut Position| &mut p.z), 3.0)
//!     .build()
//!     .unwrap();
//!
//! tween.advance(1.0).unwrap();
//! assert!((position.borrow().z - 0.6).abs() < 1e-6);
//! ```

use crate::animation::{clamp_time, Callbacks, Direction, PlayState, Progress, Repeat, Timing};
use crate::easing::Easing;
use crate::error::{AnimationError, Result};
use crate::target::{AccessError, Property, TargetId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use tracing::{debug, trace};

/// Timing and easing of a tween
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweenConfig {
    /// Seconds per cycle
    pub duration: f32,
    /// Seconds to wait before the first cycle
    pub delay: f32,
    pub easing: Easing,
    pub repeat: Repeat,
    /// Seconds to hold between cycles
    pub repeat_delay: f32,
    /// Reverse every other cycle
    pub yoyo: bool,
    /// Re-read start values and re-evaluate computed goals on every repeat
    pub repeat_refresh: bool,
}

impl Default for TweenConfig {
    fn default() -> Self {
        Self {
            duration: 0.5,
            delay: 0.0,
            easing: Easing::Linear,
            repeat: Repeat::Count(0),
            repeat_delay: 0.0,
            yoyo: false,
            repeat_refresh: false,
        }
    }
}

impl TweenConfig {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_repeat(mut self, repeat: impl Into<Repeat>) -> Self {
        self.repeat = repeat.into();
        self
    }

    pub fn with_repeat_delay(mut self, repeat_delay: f32) -> Self {
        self.repeat_delay = repeat_delay;
        self
    }

    pub fn with_yoyo(mut self, yoyo: bool) -> Self {
        self.yoyo = yoyo;
        self
    }

    pub fn with_repeat_refresh(mut self, repeat_refresh: bool) -> Self {
        self.repeat_refresh = repeat_refresh;
        self
    }

    /// Reject negative or non-finite times
    pub fn validate(&self) -> Result<()> {
        if !is_valid_time(self.duration) {
            return Err(AnimationError::InvalidDuration(self.duration));
        }
        if !is_valid_time(self.delay) {
            return Err(AnimationError::InvalidDelay(self.delay));
        }
        if !is_valid_time(self.repeat_delay) {
            return Err(AnimationError::InvalidRepeatDelay(self.repeat_delay));
        }
        Ok(())
    }

    pub(crate) fn timing(&self) -> Timing {
        Timing {
            delay: self.delay,
            repeat: self.repeat,
            repeat_delay: self.repeat_delay,
            yoyo: self.yoyo,
        }
    }
}

pub(crate) fn is_valid_time(value: f32) -> bool {
    value.is_finite() && value >= 0.0
}

/// End value of a track
pub enum Goal {
    Value(f32),
    /// Evaluated when the tween starts, and again on each repeat when
    /// `repeat_refresh` is set
    Computed(Box<dyn FnMut() -> f32>),
}

impl Goal {
    fn resolve(&mut self) -> f32 {
        match self {
            Goal::Value(value) => *value,
            Goal::Computed(f) => f(),
        }
    }
}

impl From<f32> for Goal {
    fn from(value: f32) -> Self {
        Goal::Value(value)
    }
}

impl fmt::Debug for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Goal::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Goal::Computed(_) => f.write_str("Computed"),
        }
    }
}

/// One animated field
#[derive(Debug)]
struct Track {
    property: Property,
    goal: Goal,
    explicit_from: Option<f32>,
    from: f32,
    to: f32,
}

/// Builder for [`Tween`]
pub struct TweenBuilder {
    config: TweenConfig,
    tracks: SmallVec<[Track; 4]>,
    callbacks: Callbacks,
}

impl TweenBuilder {
    /// Animate `property` from its live value to `end`
    pub fn to(self, property: Property, end: f32) -> Self {
        self.track(property, Goal::Value(end), None)
    }

    /// Animate `property` from `start` to `end`, ignoring its live value
    pub fn from_to(self, property: Property, start: f32, end: f32) -> Self {
        self.track(property, Goal::Value(end), Some(start))
    }

    /// Animate `property` towards a goal computed when the tween starts
    pub fn to_with<F: FnMut() -> f32 + 'static>(self, property: Property, goal: F) -> Self {
        self.track(property, Goal::Computed(Box::new(goal)), None)
    }

    fn track(mut self, property: Property, goal: Goal, explicit_from: Option<f32>) -> Self {
        self.tracks.push(Track {
            property,
            goal,
            explicit_from,
            from: 0.0,
            to: 0.0,
        });
        self
    }

    pub fn on_start<F: FnMut() + 'static>(mut self, f: F) -> Self {
        self.callbacks.on_start = Some(Box::new(f));
        self
    }

    pub fn on_update<F: FnMut(&Progress) + 'static>(mut self, f: F) -> Self {
        self.callbacks.on_update = Some(Box::new(f));
        self
    }

    /// Like [`TweenBuilder::on_update`], passing `params` through unchanged
    pub fn on_update_with<P, F>(mut self, params: P, mut f: F) -> Self
    where
        P: 'static,
        F: FnMut(&Progress, &P) + 'static,
    {
        self.callbacks.on_update = Some(Box::new(move |progress: &Progress| f(progress, &params)));
        self
    }

    pub fn on_repeat<F: FnMut() + 'static>(mut self, f: F) -> Self {
        self.callbacks.on_repeat = Some(Box::new(f));
        self
    }

    pub fn on_complete<F: FnMut() + 'static>(mut self, f: F) -> Self {
        self.callbacks.on_complete = Some(Box::new(f));
        self
    }

    pub fn build(self) -> Result<Tween> {
        self.config.validate()?;
        if self.tracks.is_empty() {
            return Err(AnimationError::EmptyTracks);
        }
        Ok(Tween::from_parts(self.config, self.tracks, self.callbacks))
    }
}

/// A single timed interpolation of one or more fields
pub struct Tween {
    tracks: SmallVec<[Track; 4]>,
    config: TweenConfig,
    timing: Timing,
    callbacks: Callbacks,
    /// Local time, delay included; endless tweens fold whole periods away
    time: f32,
    folded: u32,
    cycle: u32,
    progress: f32,
    state: PlayState,
    captured: bool,
    /// `(cycle, in_cycle)` of the last render that reported an update
    rendered: Option<(u32, f32)>,
}

impl Tween {
    pub fn builder(config: TweenConfig) -> TweenBuilder {
        TweenBuilder {
            config,
            tracks: SmallVec::new(),
            callbacks: Callbacks::default(),
        }
    }

    /// A field-less tween that only fires `f` once `delay` seconds have passed
    pub fn delayed_call<F: FnMut() + 'static>(delay: f32, f: F) -> Result<Self> {
        let config = TweenConfig::new(0.0).with_delay(delay);
        config.validate()?;
        let callbacks = Callbacks {
            on_complete: Some(Box::new(f)),
            ..Default::default()
        };
        Ok(Self::from_parts(config, SmallVec::new(), callbacks))
    }

    fn from_parts(
        config: TweenConfig,
        tracks: SmallVec<[Track; 4]>,
        callbacks: Callbacks,
    ) -> Self {
        Self {
            tracks,
            timing: config.timing(),
            config,
            callbacks,
            time: 0.0,
            folded: 0,
            cycle: 0,
            progress: 0.0,
            state: PlayState::Pending,
            captured: false,
            rendered: None,
        }
    }

    /// Advance by `dt` seconds. Non-positive steps are ignored.
    pub fn advance(&mut self, dt: f32) -> Result<()> {
        if self.state.is_finished() || !(dt > 0.0) {
            return Ok(());
        }
        self.seek(self.time + dt)?;

        let (time, folded) = self.timing.fold(self.time, Some(self.config.duration));
        if folded > 0 {
            self.time = time;
            self.folded = self.folded.saturating_add(folded);
        }
        Ok(())
    }

    /// Render the tween at local time `time`, firing callbacks for every
    /// boundary crossed since the previous render.
    pub(crate) fn seek(&mut self, time: f32) -> Result<()> {
        if self.state == PlayState::Cancelled {
            return Ok(());
        }
        let total = self.total_duration();
        let time = clamp_time(time, total);
        let prev = self.time;
        self.time = time;

        let delay = self.config.delay;
        let duration = self.config.duration;
        let active = time > delay || (time >= delay && duration <= 0.0);

        if !active {
            if self.state != PlayState::Pending {
                // Played backwards past the start
                self.cycle = 0;
                self.progress = 0.0;
                self.rendered = None;
                self.state = PlayState::Pending;
                if self.captured {
                    self.write(0.0)?;
                }
            }
            return Ok(());
        }

        if self.state == PlayState::Pending {
            if !self.captured {
                self.capture()?;
            }
            self.state = PlayState::Running;
            trace!(fields = self.tracks.len(), "tween started");
            self.callbacks.start();
        }

        let (cycle, in_cycle) = self.timing.locate(time - delay, Some(duration), self.folded);
        if time >= prev && cycle > self.cycle {
            let crossed = cycle - self.cycle;
            let finished_direction = self.timing.direction(cycle - 1);
            self.cycle = cycle;
            for _ in 0..crossed {
                self.callbacks.repeat();
            }
            if self.config.repeat_refresh {
                self.refresh(finished_direction);
            }
        }
        self.cycle = cycle;

        let raw = if duration > 0.0 {
            in_cycle / duration
        } else {
            1.0
        };
        let direction = self.timing.direction(cycle);
        let eased = self.config.easing.apply(raw);
        let (factor, progress) = match direction {
            Direction::Forward => (eased, raw),
            Direction::Reverse => (1.0 - eased, 1.0 - raw),
        };
        self.progress = progress;
        self.write(factor)?;
        // Holds during repeat_delay land on the same cycle position
        if self.rendered != Some((cycle, in_cycle)) {
            self.rendered = Some((cycle, in_cycle));
            self.callbacks.update(&Progress {
                progress,
                cycle,
                direction,
            });
        }

        match total {
            Some(total) if time >= total => {
                if self.state != PlayState::Completed {
                    self.state = PlayState::Completed;
                    self.callbacks.complete();
                }
            }
            _ => {
                if self.state == PlayState::Completed {
                    self.state = PlayState::Running;
                }
            }
        }
        Ok(())
    }

    /// Cancel without firing `on_complete`; fields keep their current values
    pub fn kill(&mut self) {
        if !self.state.is_finished() {
            debug!(fields = self.tracks.len(), "tween killed");
            self.state = PlayState::Cancelled;
        }
    }

    /// Whether this tween writes to `target`, optionally restricted to `fields`
    pub fn writes_to(&self, target: TargetId, fields: Option<&[&str]>) -> bool {
        self.tracks.iter().any(|track| {
            track.property.target() == target
                && fields.map_or(true, |fields| {
                    fields.iter().any(|field| *field == track.property.name())
                })
        })
    }

    /// `(target, field name)` of every animated field
    pub fn targets(&self) -> impl Iterator<Item = (TargetId, &str)> {
        self.tracks
            .iter()
            .map(|track| (track.property.target(), track.property.name()))
    }

    fn capture(&mut self) -> Result<()> {
        for track in &mut self.tracks {
            track.from = match track.explicit_from {
                Some(from) => from,
                None => track
                    .property
                    .get()
                    .map_err(|err| access_error(err, track.property.name()))?,
            };
            track.to = track.goal.resolve();
        }
        self.captured = true;
        Ok(())
    }

    /// New cycle starts where the previous one ended, towards a fresh goal
    fn refresh(&mut self, finished_direction: Direction) {
        for track in &mut self.tracks {
            let ended_at = match finished_direction {
                Direction::Forward => track.to,
                Direction::Reverse => track.from,
            };
            track.from = track.explicit_from.unwrap_or(ended_at);
            track.to = track.goal.resolve();
        }
    }

    fn write(&self, factor: f32) -> Result<()> {
        for track in &self.tracks {
            let value = track.from + (track.to - track.from) * factor;
            match track.property.set(value) {
                Ok(()) => {}
                Err(AccessError::Borrowed) => {
                    trace!(field = track.property.name(), "target busy, skipping write");
                }
                Err(err) => return Err(access_error(err, track.property.name())),
            }
        }
        Ok(())
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        !self.state.is_finished()
    }

    /// Playhead position inside the current cycle (0.0 to 1.0)
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Local time, delay included
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    pub fn direction(&self) -> Direction {
        self.timing.direction(self.cycle)
    }

    /// Seconds per cycle
    pub fn duration(&self) -> f32 {
        self.config.duration
    }

    pub fn delay(&self) -> f32 {
        self.config.delay
    }

    /// Delay plus all cycles; `None` when repeating forever
    pub fn total_duration(&self) -> Option<f32> {
        self.timing.total(Some(self.config.duration))
    }

    pub fn config(&self) -> &TweenConfig {
        &self.config
    }
}

fn access_error(err: AccessError, field: &str) -> AnimationError {
    match err {
        AccessError::Borrowed => AnimationError::TargetBusy {
            field: field.to_string(),
        },
        AccessError::Dropped | AccessError::Missing => AnimationError::TargetUnavailable {
            field: field.to_string(),
        },
    }
}

impl fmt::Debug for Tween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tween")
            .field("tracks", &self.tracks)
            .field("config", &self.config)
            .field("callbacks", &self.callbacks.installed())
            .field("time", &self.time)
            .field("cycle", &self.cycle)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct Object3D {
        x: f32,
        z: f32,
    }

    fn object() -> Rc<RefCell<Object3D>> {
        Rc::new(RefCell::new(Object3D::default()))
    }

    fn z_of(obj: &Rc<RefCell<Object3D>>) -> Property {
        Property::new(obj, "position.z", |o: &mut Object3D| &mut o.z)
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-4,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn linear_tween_steps_through_expected_values() {
        let obj = object();
        let mut tween = Tween::builder(TweenConfig::new(5.0))
            .to(z_of(&obj), 3.0)
            .build()
            .unwrap();

        for expected in [0.6, 1.2, 1.8, 2.4, 3.0] {
            tween.advance(1.0).unwrap();
            assert_close(obj.borrow().z, expected);
        }
        assert_eq!(tween.state(), PlayState::Completed);
    }

    #[test]
    fn result_does_not_depend_on_tick_chunking() {
        let coarse = object();
        let fine = object();
        let config = TweenConfig::new(2.0).with_easing(Easing::EaseInOutQuad);
        let mut a = Tween::builder(config).to(z_of(&coarse), 4.0).build().unwrap();
        let mut b = Tween::builder(config).to(z_of(&fine), 4.0).build().unwrap();

        a.advance(2.0).unwrap();
        for _ in 0..16 {
            b.advance(0.125).unwrap();
        }
        assert_close(coarse.borrow().z, 4.0);
        assert_close(fine.borrow().z, 4.0);
    }

    #[test]
    fn start_value_is_captured_after_delay() {
        let obj = object();
        let mut tween = Tween::builder(TweenConfig::new(1.0).with_delay(1.0))
            .to(z_of(&obj), 10.0)
            .build()
            .unwrap();

        tween.advance(0.5).unwrap();
        assert_eq!(tween.state(), PlayState::Pending);
        obj.borrow_mut().z = 8.0;

        tween.advance(1.0).unwrap();
        assert_eq!(tween.state(), PlayState::Running);
        assert_close(obj.borrow().z, 9.0);
    }

    #[test]
    fn yoyo_returns_to_start_after_two_cycles() {
        let obj = object();
        obj.borrow_mut().z = 1.0;
        let mut tween = Tween::builder(TweenConfig::new(2.0).with_repeat(1).with_yoyo(true))
            .to(z_of(&obj), 5.0)
            .build()
            .unwrap();

        tween.advance(2.0).unwrap();
        assert_close(obj.borrow().z, 5.0);
        tween.advance(1.0).unwrap();
        assert_close(obj.borrow().z, 3.0);
        assert_eq!(tween.direction(), Direction::Reverse);
        tween.advance(1.0).unwrap();
        assert_close(obj.borrow().z, 1.0);
        assert_eq!(tween.state(), PlayState::Completed);
    }

    #[test]
    fn reverse_cycle_applies_ease_to_swapped_bounds() {
        let obj = object();
        let config = TweenConfig::new(1.0)
            .with_easing(Easing::EaseInQuad)
            .with_repeat(1)
            .with_yoyo(true);
        let mut tween = Tween::builder(config).to(z_of(&obj), 1.0).build().unwrap();

        tween.advance(1.25).unwrap();
        // lerp(end=1, start=0, ease(0.25)) = 1 - 0.0625
        assert_close(obj.borrow().z, 0.9375);
        assert_close(tween.progress(), 0.75);
    }

    #[test]
    fn overflow_carries_into_next_cycle() {
        let obj = object();
        let mut tween = Tween::builder(TweenConfig::new(1.0).with_repeat(2))
            .to(z_of(&obj), 1.0)
            .build()
            .unwrap();

        tween.advance(1.5).unwrap();
        assert_eq!(tween.cycle(), 1);
        assert_close(obj.borrow().z, 0.5);
    }

    #[test]
    fn zero_duration_resolves_on_first_tick() {
        let obj = object();
        let mut tween = Tween::builder(TweenConfig::new(0.0))
            .to(z_of(&obj), 7.0)
            .build()
            .unwrap();

        tween.advance(0.016).unwrap();
        assert_close(obj.borrow().z, 7.0);
        assert_eq!(tween.state(), PlayState::Completed);
    }

    #[test]
    fn infinite_repeat_never_completes() {
        let obj = object();
        let mut tween = Tween::builder(TweenConfig::new(0.5).with_repeat(-1).with_yoyo(true))
            .to(z_of(&obj), 1.0)
            .build()
            .unwrap();

        for _ in 0..10_000 {
            tween.advance(0.1).unwrap();
        }
        assert_eq!(tween.state(), PlayState::Running);
        assert!(tween.time() < 1.5, "time should stay folded");
        assert_eq!(tween.total_duration(), None);
    }

    #[test]
    fn repeat_delay_holds_end_value() {
        let obj = object();
        let config = TweenConfig::new(0.5).with_repeat(1).with_repeat_delay(0.5);
        let mut tween = Tween::builder(config).to(z_of(&obj), 2.0).build().unwrap();

        tween.advance(0.75).unwrap();
        assert_close(obj.borrow().z, 2.0);
        tween.advance(0.5).unwrap();
        assert_close(obj.borrow().z, 1.0);
        assert_eq!(tween.total_duration(), Some(1.5));
    }

    #[test]
    fn kill_freezes_field_and_skips_complete() {
        let obj = object();
        let completed = Rc::new(Cell::new(false));
        let flag = completed.clone();
        let mut tween = Tween::builder(TweenConfig::new(5.0))
            .to(z_of(&obj), 3.0)
            .on_complete(move || flag.set(true))
            .build()
            .unwrap();

        tween.advance(2.0).unwrap();
        tween.kill();
        tween.advance(3.0).unwrap();

        assert_close(obj.borrow().z, 1.2);
        assert_eq!(tween.state(), PlayState::Cancelled);
        assert!(!completed.get());
    }

    #[test]
    fn callbacks_fire_in_lifecycle_order() {
        let obj = object();
        let log = Rc::new(RefCell::new(Vec::new()));
        let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
        let mut tween = Tween::builder(TweenConfig::new(1.0).with_repeat(1))
            .to(z_of(&obj), 1.0)
            .on_start(move || l1.borrow_mut().push("start"))
            .on_repeat(move || l2.borrow_mut().push("repeat"))
            .on_complete(move || l3.borrow_mut().push("complete"))
            .build()
            .unwrap();

        for _ in 0..4 {
            tween.advance(0.5).unwrap();
        }
        assert_eq!(*log.borrow(), vec!["start", "repeat", "complete"]);
    }

    #[test]
    fn update_params_are_passed_through() {
        let obj = object();
        let influences = Rc::new(RefCell::new(vec![0.0f32; 3]));
        let sink = influences.clone();
        let mut tween = Tween::builder(TweenConfig::new(1.0).with_easing(Easing::EaseInOutExpo))
            .to(z_of(&obj), 1.0)
            .on_update_with(2usize, move |p: &Progress, index: &usize| {
                sink.borrow_mut()[*index] = p.progress;
            })
            .build()
            .unwrap();

        tween.advance(0.25).unwrap();
        assert_close(influences.borrow()[2], 0.25);
        assert_eq!(influences.borrow()[0], 0.0);
    }

    #[test]
    fn repeat_delay_hold_does_not_report_updates() {
        let obj = object();
        let updates = Rc::new(Cell::new(0u32));
        let counter = updates.clone();
        let config = TweenConfig::new(0.5).with_repeat(1).with_repeat_delay(0.5);
        let mut tween = Tween::builder(config)
            .to(z_of(&obj), 1.0)
            .on_update(move |_| counter.set(counter.get() + 1))
            .build()
            .unwrap();

        // 0.75 sits inside the hold between cycles
        for _ in 0..6 {
            tween.advance(0.25).unwrap();
        }
        assert_eq!(updates.get(), 5);
        assert_eq!(tween.state(), PlayState::Completed);
    }

    #[test]
    fn completes_on_the_last_frame_despite_rounding() {
        let obj = object();
        let completed = Rc::new(Cell::new(0u32));
        let counter = completed.clone();
        let mut tween = Tween::builder(TweenConfig::new(1.0))
            .to(z_of(&obj), 1.0)
            .on_complete(move || counter.set(counter.get() + 1))
            .build()
            .unwrap();

        for _ in 0..59 {
            tween.advance(1.0 / 60.0).unwrap();
        }
        assert_eq!(completed.get(), 0);
        tween.advance(1.0 / 60.0).unwrap();
        assert_eq!(completed.get(), 1);
        assert_eq!(tween.state(), PlayState::Completed);
        assert_close(obj.borrow().z, 1.0);
    }

    #[test]
    fn from_to_ignores_live_value() {
        let obj = object();
        obj.borrow_mut().x = 100.0;
        let mut tween = Tween::builder(TweenConfig::new(1.0))
            .from_to(Property::new(&obj, "x", |o: &mut Object3D| &mut o.x), -1.0, 1.0)
            .build()
            .unwrap();

        tween.advance(0.5).unwrap();
        assert_close(obj.borrow().x, 0.0);
    }

    #[test]
    fn repeat_refresh_reevaluates_computed_goal() {
        let obj = object();
        let palette = [1.0f32, 4.0, 2.0];
        let index = Rc::new(Cell::new(0usize));
        let (read, bump) = (index.clone(), index.clone());
        let config = TweenConfig::new(1.0)
            .with_repeat(-1)
            .with_repeat_refresh(true);
        let mut tween = Tween::builder(config)
            .to_with(z_of(&obj), move || palette[read.get() % palette.len()])
            .on_repeat(move || bump.set(bump.get() + 1))
            .build()
            .unwrap();

        tween.advance(1.0).unwrap();
        assert_close(obj.borrow().z, 1.0);
        // Second cycle runs from 1.0 towards palette[1]
        tween.advance(0.5).unwrap();
        assert_eq!(index.get(), 1);
        assert_close(obj.borrow().z, 2.5);
    }

    #[test]
    fn dropped_target_surfaces_as_unavailable() {
        let obj = object();
        let mut tween = Tween::builder(TweenConfig::new(1.0))
            .to(z_of(&obj), 1.0)
            .build()
            .unwrap();
        drop(obj);

        let err = tween.advance(0.5).unwrap_err();
        assert_eq!(
            err,
            AnimationError::TargetUnavailable {
                field: "position.z".into()
            }
        );
    }

    #[test]
    fn construction_rejects_bad_config() {
        let obj = object();
        let negative = Tween::builder(TweenConfig::new(-1.0))
            .to(z_of(&obj), 1.0)
            .build();
        assert_eq!(negative.unwrap_err(), AnimationError::InvalidDuration(-1.0));

        let empty = Tween::builder(TweenConfig::new(1.0)).build();
        assert_eq!(empty.unwrap_err(), AnimationError::EmptyTracks);

        let delayed = Tween::delayed_call(-0.5, || {});
        assert_eq!(delayed.unwrap_err(), AnimationError::InvalidDelay(-0.5));
    }

    #[test]
    fn delayed_call_fires_once_after_delay() {
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let mut call = Tween::delayed_call(1.0, move || counter.set(counter.get() + 1)).unwrap();

        call.advance(0.5).unwrap();
        assert_eq!(fired.get(), 0);
        call.advance(0.5).unwrap();
        assert_eq!(fired.get(), 1);
        call.advance(0.5).unwrap();
        assert_eq!(fired.get(), 1);
        assert_eq!(call.state(), PlayState::Completed);
    }

    #[test]
    fn config_deserializes_from_toml() {
        let config: TweenConfig = toml::from_str(
            r#"
            duration = 0.5
            repeat_delay = 0.5
            easing = "back.inOut(1.7)"
            repeat = -1
            yoyo = true
            "#,
        )
        .unwrap();
        assert_eq!(config.easing, Easing::EaseInOutBack(1.7));
        assert_eq!(config.repeat, Repeat::Infinite);
        assert!(config.yoyo);
        assert_eq!(config.delay, 0.0);
    }
}
