//! Lifecycle shared by tweens and timelines
//!
//! Both kinds of animation run on the same clock model: an optional delay,
//! then `repeat + 1` cycles of `duration` separated by `repeat_delay`, with
//! every odd cycle reversed when `yoyo` is set.

use crate::error::Result;
use crate::target::TargetId;
use crate::timeline::Timeline;
use crate::tween::Tween;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a tween or timeline
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayState {
    /// Declared, waiting out its delay
    #[default]
    Pending,
    /// Interpolating
    Running,
    /// Finite run exhausted
    Completed,
    /// Killed externally
    Cancelled,
}

impl PlayState {
    /// Whether no further progress can happen
    pub fn is_finished(self) -> bool {
        matches!(self, PlayState::Completed | PlayState::Cancelled)
    }
}

/// Playback direction of the current cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Start towards end
    #[default]
    Forward,
    /// End towards start (odd cycles of a yoyo)
    Reverse,
}

impl Direction {
    /// +1.0 or -1.0
    pub fn sign(self) -> f32 {
        match self {
            Direction::Forward => 1.0,
            Direction::Reverse => -1.0,
        }
    }
}

/// How many extra cycles follow the first one
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum Repeat {
    Count(u32),
    /// Runs until killed
    Infinite,
}

impl Default for Repeat {
    fn default() -> Self {
        Repeat::Count(0)
    }
}

impl Repeat {
    pub fn is_infinite(self) -> bool {
        matches!(self, Repeat::Infinite)
    }
}

/// Negative counts mean infinite, as in most animation scripts (`repeat: -1`)
impl From<i64> for Repeat {
    fn from(count: i64) -> Self {
        if count < 0 {
            Repeat::Infinite
        } else {
            Repeat::Count(count.min(u32::MAX as i64) as u32)
        }
    }
}

impl From<i32> for Repeat {
    fn from(count: i32) -> Self {
        Repeat::from(count as i64)
    }
}

impl From<u32> for Repeat {
    fn from(count: u32) -> Self {
        Repeat::Count(count)
    }
}

impl From<Repeat> for i64 {
    fn from(repeat: Repeat) -> Self {
        match repeat {
            Repeat::Count(count) => count as i64,
            Repeat::Infinite => -1,
        }
    }
}

/// Snapshot handed to `on_update` callbacks
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Progress {
    /// Playhead position inside the current cycle (0.0 to 1.0). Runs backwards
    /// on reversed cycles.
    pub progress: f32,
    /// Index of the current cycle, starting at 0
    pub cycle: u32,
    pub direction: Direction,
}

pub(crate) type Callback = Box<dyn FnMut()>;
pub(crate) type UpdateCallback = Box<dyn FnMut(&Progress)>;

/// Lifecycle hooks shared by tweens and timelines
#[derive(Default)]
pub(crate) struct Callbacks {
    pub on_start: Option<Callback>,
    pub on_update: Option<UpdateCallback>,
    pub on_repeat: Option<Callback>,
    pub on_complete: Option<Callback>,
}

impl Callbacks {
    pub fn start(&mut self) {
        if let Some(cb) = self.on_start.as_mut() {
            cb();
        }
    }

    pub fn update(&mut self, progress: &Progress) {
        if let Some(cb) = self.on_update.as_mut() {
            cb(progress);
        }
    }

    pub fn repeat(&mut self) {
        if let Some(cb) = self.on_repeat.as_mut() {
            cb();
        }
    }

    pub fn complete(&mut self) {
        if let Some(cb) = self.on_complete.as_mut() {
            cb();
        }
    }

    /// Names of the installed hooks, for `Debug` output
    pub fn installed(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.on_start.is_some() {
            names.push("on_start");
        }
        if self.on_update.is_some() {
            names.push("on_update");
        }
        if self.on_repeat.is_some() {
            names.push("on_repeat");
        }
        if self.on_complete.is_some() {
            names.push("on_complete");
        }
        names
    }
}

/// Delay / repeat / yoyo arithmetic
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Timing {
    pub delay: f32,
    pub repeat: Repeat,
    pub repeat_delay: f32,
    pub yoyo: bool,
}

impl Timing {
    /// Delay plus every cycle, or `None` when the animation never ends
    pub fn total(&self, duration: Option<f32>) -> Option<f32> {
        let duration = duration?;
        match self.repeat {
            Repeat::Infinite => None,
            Repeat::Count(n) => {
                Some(self.delay + duration * (n as f32 + 1.0) + self.repeat_delay * n as f32)
            }
        }
    }

    /// Map time elapsed past the delay to `(cycle, time inside that cycle)`.
    ///
    /// The cycle time is clamped to `duration`, so the repeat delay holds the
    /// end-of-cycle value. `folded` counts whole periods already removed from
    /// `rel` by [`Timing::fold`].
    pub fn locate(&self, rel: f32, duration: Option<f32>, folded: u32) -> (u32, f32) {
        let Some(duration) = duration else {
            return (0, rel);
        };
        let last = match self.repeat {
            Repeat::Count(n) => Some(n),
            Repeat::Infinite => None,
        };
        let period = duration + self.repeat_delay;
        if period <= 0.0 {
            return (last.unwrap_or(folded), duration);
        }

        let whole = (rel / period).floor().max(0.0);
        let mut cycle = folded.saturating_add(whole.min(u32::MAX as f32) as u32);
        let mut in_cycle = (rel - whole * period).clamp(0.0, duration);
        if let Some(last) = last {
            if cycle > last {
                cycle = last;
                in_cycle = duration;
            }
        }
        (cycle, in_cycle)
    }

    pub fn direction(&self, cycle: u32) -> Direction {
        if self.yoyo && cycle % 2 == 1 {
            Direction::Reverse
        } else {
            Direction::Forward
        }
    }

    /// Drop whole periods from an endlessly repeating clock so its time stays
    /// small. Returns the number of periods removed.
    pub fn fold(&self, time: f32, duration: Option<f32>) -> (f32, u32) {
        let Some(duration) = duration else {
            return (time, 0);
        };
        let period = duration + self.repeat_delay;
        let rel = time - self.delay;
        if !self.repeat.is_infinite() || period <= 0.0 || rel < period {
            return (time, 0);
        }
        let whole = (rel / period).floor();
        (time - whole * period, whole.min(u32::MAX as f32) as u32)
    }
}

/// A top-level or nested animation: a tween or a timeline
#[derive(Debug)]
pub enum Animation {
    Tween(Tween),
    Timeline(Timeline),
}

/// Relative distance from the end within which a render time counts as the end
const END_TOLERANCE: f32 = 1e-5;

/// Clamp a render time into `[0, total]`. Times that fall short of `total`
/// only by accumulated rounding land exactly on it.
pub(crate) fn clamp_time(time: f32, total: Option<f32>) -> f32 {
    match total {
        Some(total) if total - time <= END_TOLERANCE * total.max(1.0) => total,
        Some(_) | None => time.max(0.0),
    }
}

impl Animation {
    /// Advance by `dt` seconds
    pub fn advance(&mut self, dt: f32) -> Result<()> {
        match self {
            Animation::Tween(tween) => tween.advance(dt),
            Animation::Timeline(timeline) => timeline.advance(dt),
        }
    }

    /// Render at local time `time` (delay included)
    pub(crate) fn seek(&mut self, time: f32) -> Result<()> {
        match self {
            Animation::Tween(tween) => tween.seek(time),
            Animation::Timeline(timeline) => timeline.seek(time),
        }
    }

    /// Cancel; nested children are cancelled too
    pub fn kill(&mut self) {
        match self {
            Animation::Tween(tween) => tween.kill(),
            Animation::Timeline(timeline) => timeline.kill(),
        }
    }

    /// Cancel every tween (searching nested timelines) that writes to `target`,
    /// optionally only those touching one of `fields`. Returns how many were
    /// cancelled.
    pub fn kill_tweens_of(&mut self, target: TargetId, fields: Option<&[&str]>) -> usize {
        match self {
            Animation::Tween(tween) => {
                if tween.is_active() && tween.writes_to(target, fields) {
                    tween.kill();
                    1
                } else {
                    0
                }
            }
            Animation::Timeline(timeline) => timeline.kill_tweens_of(target, fields),
        }
    }

    /// Call `f` with the target of every field this animation writes,
    /// searching nested timelines. A target may be reported more than once.
    pub(crate) fn visit_targets(&self, f: &mut dyn FnMut(TargetId)) {
        match self {
            Animation::Tween(tween) => tween.targets().for_each(|(target, _)| f(target)),
            Animation::Timeline(timeline) => {
                for (_, child) in timeline.iter() {
                    child.visit_targets(f);
                }
            }
        }
    }

    pub fn state(&self) -> PlayState {
        match self {
            Animation::Tween(tween) => tween.state(),
            Animation::Timeline(timeline) => timeline.state(),
        }
    }

    /// Pending or running
    pub fn is_active(&self) -> bool {
        !self.state().is_finished()
    }

    /// Local time, delay included
    pub fn time(&self) -> f32 {
        match self {
            Animation::Tween(tween) => tween.time(),
            Animation::Timeline(timeline) => timeline.time(),
        }
    }

    /// Delay plus all cycles; `None` if it never ends
    pub fn total_duration(&self) -> Option<f32> {
        match self {
            Animation::Tween(tween) => tween.total_duration(),
            Animation::Timeline(timeline) => timeline.total_duration(),
        }
    }

    /// Length used when sequencing: the total duration, or delay plus one
    /// cycle for endless animations
    pub(crate) fn span(&self) -> f32 {
        match self {
            Animation::Tween(tween) => tween
                .total_duration()
                .unwrap_or(tween.delay() + tween.duration()),
            Animation::Timeline(timeline) => timeline
                .total_duration()
                .unwrap_or_else(|| timeline.delay() + timeline.content_end()),
        }
    }
}

impl From<Tween> for Animation {
    fn from(tween: Tween) -> Self {
        Animation::Tween(tween)
    }
}

impl From<Timeline> for Animation {
    fn from(timeline: Timeline) -> Self {
        Animation::Timeline(timeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(repeat: i32, repeat_delay: f32, yoyo: bool) -> Timing {
        Timing {
            delay: 0.0,
            repeat: repeat.into(),
            repeat_delay,
            yoyo,
        }
    }

    #[test]
    fn total_counts_cycles_and_gaps() {
        let t = Timing {
            delay: 1.0,
            ..timing(2, 0.5, false)
        };
        assert_eq!(t.total(Some(2.0)), Some(1.0 + 6.0 + 1.0));
        assert_eq!(timing(-1, 0.0, false).total(Some(2.0)), None);
        assert_eq!(timing(0, 0.0, false).total(None), None);
    }

    #[test]
    fn locate_holds_end_value_during_repeat_delay() {
        let t = timing(1, 0.5, false);
        assert_eq!(t.locate(0.25, Some(0.5), 0), (0, 0.25));
        assert_eq!(t.locate(0.75, Some(0.5), 0), (0, 0.5));
        assert_eq!(t.locate(1.25, Some(0.5), 0), (1, 0.25));
        assert_eq!(t.locate(9.0, Some(0.5), 0), (1, 0.5));
    }

    #[test]
    fn fold_preserves_cycle_parity() {
        let t = timing(-1, 0.0, true);
        let (time, folded) = t.fold(7.5, Some(2.0));
        assert_eq!((time, folded), (1.5, 3));
        let (cycle, in_cycle) = t.locate(time, Some(2.0), folded);
        assert_eq!((cycle, in_cycle), (3, 1.5));
        assert_eq!(t.direction(cycle), Direction::Reverse);
    }

    #[test]
    fn repeat_from_script_integers() {
        assert_eq!(Repeat::from(-1), Repeat::Infinite);
        assert_eq!(Repeat::from(3), Repeat::Count(3));
        assert_eq!(i64::from(Repeat::Infinite), -1);
    }
}
