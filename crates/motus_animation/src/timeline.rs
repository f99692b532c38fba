//! Timeline orchestration for multiple animations
//!
//! Children are placed at absolute start offsets resolved when they are
//! added, either by sequencing, explicit offsets or named labels. The
//! timeline renders children by seeking them to their own local time, so a
//! repeating or reversing timeline replays its children exactly.

use crate::animation::{
    clamp_time, Animation, Callbacks, Direction, PlayState, Progress, Repeat, Timing,
};
use crate::error::{AnimationError, Result};
use crate::target::TargetId;
use crate::tween::is_valid_time;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace, warn};

/// Where a child starts inside its timeline
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "PositionRepr")]
pub enum Position {
    /// Right after the previously added child ends
    #[default]
    Sequence,
    /// Absolute offset from the timeline start
    At(f32),
    /// Offset from the end of the previously added child (`"+=1"`, `"-=0.5"`)
    Relative(f32),
    /// At a label; an unknown label is created at the current end
    Label(String),
    /// At a label plus an offset (`"sync+=0.5"`)
    LabelOffset(String, f32),
}

impl From<f32> for Position {
    fn from(offset: f32) -> Self {
        Position::At(offset)
    }
}

impl From<f64> for Position {
    fn from(offset: f64) -> Self {
        Position::At(offset as f32)
    }
}

impl From<&str> for Position {
    fn from(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            return Position::Sequence;
        }
        if let Some(offset) = parse_offset(input) {
            return Position::Relative(offset);
        }
        if let Ok(offset) = input.parse::<f32>() {
            return Position::At(offset);
        }
        if let Some(split) = input.find("+=").or_else(|| input.find("-=")) {
            let (label, offset) = input.split_at(split);
            if let Some(offset) = parse_offset(offset) {
                return Position::LabelOffset(label.trim().to_string(), offset);
            }
        }
        Position::Label(input.to_string())
    }
}

impl From<String> for Position {
    fn from(input: String) -> Self {
        Position::from(input.as_str())
    }
}

/// `"+=x"` or `"-=x"`
fn parse_offset(input: &str) -> Option<f32> {
    let (sign, rest) = if let Some(rest) = input.strip_prefix("+=") {
        (1.0, rest)
    } else {
        (-1.0, input.strip_prefix("-=")?)
    };
    rest.trim().parse::<f32>().ok().map(|offset| sign * offset)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PositionRepr {
    Offset(f32),
    Text(String),
}

impl From<PositionRepr> for Position {
    fn from(repr: PositionRepr) -> Self {
        match repr {
            PositionRepr::Offset(offset) => Position::At(offset),
            PositionRepr::Text(text) => Position::from(text),
        }
    }
}

/// Timing of a timeline as a whole
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub delay: f32,
    pub repeat: Repeat,
    pub repeat_delay: f32,
    pub yoyo: bool,
}

impl TimelineConfig {
    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay;
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

    pub fn validate(&self) -> Result<()> {
        if !is_valid_time(self.delay) {
            return Err(AnimationError::InvalidDelay(self.delay));
        }
        if !is_valid_time(self.repeat_delay) {
            return Err(AnimationError::InvalidRepeatDelay(self.repeat_delay));
        }
        Ok(())
    }

    fn timing(&self) -> Timing {
        Timing {
            delay: self.delay,
            repeat: self.repeat,
            repeat_delay: self.repeat_delay,
            yoyo: self.yoyo,
        }
    }
}

/// An entry in a timeline
#[derive(Debug)]
struct TimelineChild {
    /// Offset in seconds from the timeline start
    start: f32,
    animation: Animation,
}

/// A composition of tweens and nested timelines
pub struct Timeline {
    children: Vec<TimelineChild>,
    labels: FxHashMap<String, f32>,
    /// End of the most recently added child
    cursor: f32,
    config: TimelineConfig,
    timing: Timing,
    callbacks: Callbacks,
    /// Local time, delay included
    time: f32,
    folded: u32,
    cycle: u32,
    /// Playhead inside the content, after repeat and yoyo are applied
    playhead: f32,
    state: PlayState,
    /// `(cycle, playhead)` of the last render that reported an update
    rendered: Option<(u32, f32)>,
}

impl Timeline {
    pub fn new() -> Self {
        let config = TimelineConfig::default();
        Self {
            children: Vec::new(),
            labels: FxHashMap::default(),
            cursor: 0.0,
            timing: config.timing(),
            config,
            callbacks: Callbacks::default(),
            time: 0.0,
            folded: 0,
            cycle: 0,
            playhead: 0.0,
            state: PlayState::Pending,
            rendered: None,
        }
    }

    pub fn with_config(config: TimelineConfig) -> Result<Self> {
        config.validate()?;
        let mut timeline = Self::new();
        timeline.timing = config.timing();
        timeline.config = config;
        Ok(timeline)
    }

    /// Add a child at `position`, returning its resolved start offset
    pub fn add(&mut self, child: impl Into<Animation>, position: impl Into<Position>) -> f32 {
        let animation = child.into();
        let start = self.resolve(position.into());
        self.cursor = start + animation.span();
        trace!(start, children = self.children.len() + 1, "timeline child added");
        self.children.push(TimelineChild { start, animation });
        start
    }

    /// Declare a label explicitly. The default position is the current end
    /// of the timeline. Returns the label's offset; a name already declared
    /// keeps its original offset.
    pub fn add_label(&mut self, name: impl Into<String>, position: impl Into<Position>) -> f32 {
        let name = name.into();
        if let Some(time) = self.labels.get(&name) {
            return *time;
        }
        let time = match position.into() {
            Position::Sequence => self.content_end(),
            position => self.resolve(position),
        };
        self.labels.insert(name, time);
        time
    }

    pub fn label_time(&self, name: &str) -> Option<f32> {
        self.labels.get(name).copied()
    }

    fn resolve(&mut self, position: Position) -> f32 {
        let start = match position {
            Position::Sequence => self.cursor,
            Position::At(offset) => offset,
            Position::Relative(offset) => self.cursor + offset,
            Position::Label(name) => self.label_or_insert(name),
            Position::LabelOffset(name, offset) => self.label_or_insert(name) + offset,
        };
        start.max(0.0)
    }

    fn label_or_insert(&mut self, name: String) -> f32 {
        if let Some(time) = self.labels.get(&name) {
            return *time;
        }
        let time = self.content_end();
        self.labels.insert(name, time);
        time
    }

    pub fn on_start<F: FnMut() + 'static>(&mut self, f: F) -> &mut Self {
        self.callbacks.on_start = Some(Box::new(f));
        self
    }

    pub fn on_update<F: FnMut(&Progress) + 'static>(&mut self, f: F) -> &mut Self {
        self.callbacks.on_update = Some(Box::new(f));
        self
    }

    pub fn on_repeat<F: FnMut() + 'static>(&mut self, f: F) -> &mut Self {
        self.callbacks.on_repeat = Some(Box::new(f));
        self
    }

    pub fn on_complete<F: FnMut() + 'static>(&mut self, f: F) -> &mut Self {
        self.callbacks.on_complete = Some(Box::new(f));
        self
    }

    /// Advance by `dt` seconds. Non-positive steps are ignored.
    pub fn advance(&mut self, dt: f32) -> Result<()> {
        if self.state.is_finished() || !(dt > 0.0) {
            return Ok(());
        }
        self.seek(self.time + dt)?;

        let (time, folded) = self.timing.fold(self.time, self.duration());
        if folded > 0 {
            self.time = time;
            self.folded = self.folded.saturating_add(folded);
        }
        Ok(())
    }

    pub(crate) fn seek(&mut self, time: f32) -> Result<()> {
        if self.state == PlayState::Cancelled {
            return Ok(());
        }
        let duration = self.duration();
        let total = self.timing.total(duration);
        let time = clamp_time(time, total);
        let prev = self.time;
        self.time = time;

        let delay = self.config.delay;
        let active = time > delay || (time >= delay && duration == Some(0.0));
        if !active {
            if self.state != PlayState::Pending {
                self.render(0.0)?;
                self.cycle = 0;
                self.rendered = None;
                self.state = PlayState::Pending;
            }
            return Ok(());
        }

        if self.state == PlayState::Pending {
            self.state = PlayState::Running;
            debug!(children = self.children.len(), "timeline started");
            self.callbacks.start();
        }

        let (cycle, in_cycle) = self.timing.locate(time - delay, duration, self.folded);
        if let Some(duration) = duration {
            if time >= prev && cycle > self.cycle {
                for finished in self.cycle..cycle {
                    // Play out the finished cycle, then rewind unless the
                    // next cycle runs backwards from here
                    match self.timing.direction(finished) {
                        Direction::Forward => self.render(duration)?,
                        Direction::Reverse => self.render(0.0)?,
                    }
                    if !self.config.yoyo {
                        self.render(0.0)?;
                    }
                    self.cycle = finished + 1;
                    self.callbacks.repeat();
                }
            }
        }
        self.cycle = cycle;

        let direction = self.timing.direction(cycle);
        let playhead = match (duration, direction) {
            (Some(duration), Direction::Reverse) => duration - in_cycle,
            _ => in_cycle,
        };
        self.render(playhead)?;
        if self.rendered != Some((cycle, playhead)) {
            self.rendered = Some((cycle, playhead));
            self.callbacks.update(&Progress {
                progress: self.progress(),
                cycle,
                direction,
            });
        }

        match total {
            Some(total) if time >= total => {
                if self.state != PlayState::Completed {
                    self.state = PlayState::Completed;
                    debug!(children = self.children.len(), "timeline completed");
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

    /// Seek every child to match content time `playhead`. Children are
    /// visited in declaration order moving forward and in reverse order moving
    /// backward, so overlapping writes resolve the way they were declared.
    fn render(&mut self, playhead: f32) -> Result<()> {
        let forward = playhead >= self.playhead;
        self.playhead = playhead;

        let count = self.children.len();
        for i in 0..count {
            let index = if forward { i } else { count - 1 - i };
            let child = &mut self.children[index];
            let state = child.animation.state();
            if state == PlayState::Cancelled {
                continue;
            }

            let local = playhead - child.start;
            let child_time = match child.animation.total_duration() {
                Some(total) => local.clamp(0.0, total),
                None => local.max(0.0),
            };
            let opened = local >= 0.0;
            if child_time == child.animation.time() && !(opened && state == PlayState::Pending) {
                continue;
            }

            match child.animation.seek(child_time) {
                Ok(()) => {}
                Err(AnimationError::TargetBusy { field }) => {
                    trace!(%field, "timeline child target busy, retrying next tick");
                }
                Err(AnimationError::TargetUnavailable { field }) => {
                    warn!(%field, "timeline child target unavailable, cancelling child");
                    child.animation.kill();
                }
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    /// Cancel the timeline and everything nested in it
    pub fn kill(&mut self) {
        if !self.state.is_finished() {
            debug!(children = self.children.len(), "timeline killed");
            self.state = PlayState::Cancelled;
        }
        for child in &mut self.children {
            child.animation.kill();
        }
    }

    /// Cancel nested tweens writing to `target`; returns how many were
    /// cancelled
    pub fn kill_tweens_of(&mut self, target: TargetId, fields: Option<&[&str]>) -> usize {
        self.children
            .iter_mut()
            .map(|child| child.animation.kill_tweens_of(target, fields))
            .sum()
    }

    /// Children with their start offsets, in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (f32, &Animation)> {
        self.children
            .iter()
            .map(|child| (child.start, &child.animation))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// End of the latest-ending child, counting one cycle for endless ones
    pub fn content_end(&self) -> f32 {
        self.children
            .iter()
            .map(|child| child.start + child.animation.span())
            .fold(0.0, f32::max)
    }

    /// Length of one cycle; `None` when a child repeats forever
    pub fn duration(&self) -> Option<f32> {
        if self
            .children
            .iter()
            .any(|child| child.animation.total_duration().is_none())
        {
            return None;
        }
        Some(self.content_end())
    }

    /// Delay plus all cycles; `None` if it never ends
    pub fn total_duration(&self) -> Option<f32> {
        self.timing.total(self.duration())
    }

    pub fn delay(&self) -> f32 {
        self.config.delay
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        !self.state.is_finished()
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

    /// Playhead position inside the current cycle (0.0 to 1.0)
    pub fn progress(&self) -> f32 {
        match self.duration() {
            Some(duration) if duration > 0.0 => (self.playhead / duration).clamp(0.0, 1.0),
            Some(_) => 1.0,
            None => 0.0,
        }
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("children", &self.children)
            .field("labels", &self.labels)
            .field("config", &self.config)
            .field("callbacks", &self.callbacks.installed())
            .field("time", &self.time)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
