//! Animation scheduler
//!
//! Owns every top-level tween and timeline and advances them once per host
//! tick, in registration order. Finished entries are swept at the end of each
//! tick. Callbacks reach the scheduler through a [`SchedulerHandle`]: entries
//! they add start on the next tick, kills they request apply before any
//! further entry is advanced.

use crate::animation::Animation;
use crate::error::{AnimationError, Result};
use crate::target::TargetId;
use crate::tween::Tween;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, trace, warn};

new_key_type! {
    pub struct AnimationId;
}

/// Clock adjustments applied to every tick
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Multiplier on every `dt`
    pub time_scale: f32,
    /// Upper bound on a single (scaled) step, smoothing over host stalls
    pub max_delta: Option<f32>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            max_delta: None,
        }
    }
}

enum KillRequest {
    Id(AnimationId),
    TweensOf {
        target: TargetId,
        fields: Option<Vec<String>>,
    },
    All,
}

/// Work requested from inside callbacks
#[derive(Default)]
struct CommandQueue {
    added: Vec<Animation>,
    kills: Vec<KillRequest>,
}

/// The scheduler that ticks all registered animations
pub struct AnimationScheduler {
    animations: SlotMap<AnimationId, Animation>,
    /// Registration order
    order: Vec<AnimationId>,
    /// Entries writing to each target, nested timeline children included
    targets: FxHashMap<TargetId, SmallVec<[AnimationId; 4]>>,
    queue: Rc<RefCell<CommandQueue>>,
    config: SchedulerConfig,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    pub fn with_config(config: SchedulerConfig) -> Self {
        Self {
            animations: SlotMap::with_key(),
            order: Vec::new(),
            targets: FxHashMap::default(),
            queue: Rc::new(RefCell::new(CommandQueue::default())),
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SchedulerConfig) {
        self.config = config;
    }

    /// Handle for use inside callbacks
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            queue: Rc::downgrade(&self.queue),
        }
    }

    /// Register a tween or timeline; it is advanced from the next tick on
    pub fn add(&mut self, animation: impl Into<Animation>) -> AnimationId {
        let animation = animation.into();
        let targets = &mut self.targets;
        let id = self.animations.insert_with_key(|id| {
            animation.visit_targets(&mut |target| {
                let ids = targets.entry(target).or_default();
                if !ids.contains(&id) {
                    ids.push(id);
                }
            });
            animation
        });
        self.order.push(id);
        debug!(?id, registered = self.order.len(), "animation registered");
        id
    }

    /// Fire `f` once after `delay` seconds
    pub fn delayed_call<F: FnMut() + 'static>(&mut self, delay: f32, f: F) -> Result<AnimationId> {
        Ok(self.add(Tween::delayed_call(delay, f)?))
    }

    /// Advance every registered entry by `dt` seconds, then drop finished
    /// entries. Negative or non-finite steps are ignored.
    pub fn tick(&mut self, dt: f32) {
        let dt = self.effective_delta(dt);
        self.register_queued();
        self.apply_queued_kills();

        if dt > 0.0 {
            trace!(dt, entries = self.order.len(), "tick");
            for index in 0..self.order.len() {
                let id = self.order[index];
                if let Some(animation) = self.animations.get_mut(id) {
                    if let Err(err) = animation.advance(dt) {
                        Self::handle_failure(id, animation, err);
                    }
                }
                self.apply_queued_kills();
            }
        }

        self.sweep();
    }

    fn effective_delta(&self, dt: f32) -> f32 {
        if !dt.is_finite() || dt < 0.0 {
            debug!(dt, "ignoring invalid tick delta");
            return 0.0;
        }
        let dt = dt * self.config.time_scale.max(0.0);
        match self.config.max_delta {
            Some(max) => dt.min(max.max(0.0)),
            None => dt,
        }
    }

    fn handle_failure(id: AnimationId, animation: &mut Animation, err: AnimationError) {
        match err {
            AnimationError::TargetBusy { field } => {
                trace!(?id, %field, "target busy, retrying next tick");
            }
            err => {
                warn!(?id, error = %err, "cancelling animation");
                animation.kill();
            }
        }
    }

    fn register_queued(&mut self) {
        let added = std::mem::take(&mut self.queue.borrow_mut().added);
        for animation in added {
            self.add(animation);
        }
    }

    fn apply_queued_kills(&mut self) {
        let kills = std::mem::take(&mut self.queue.borrow_mut().kills);
        for request in kills {
            match request {
                KillRequest::Id(id) => {
                    if let Some(animation) = self.animations.get_mut(id) {
                        animation.kill();
                    }
                }
                KillRequest::TweensOf { target, fields } => {
                    let fields: Option<Vec<&str>> = fields
                        .as_ref()
                        .map(|fields| fields.iter().map(String::as_str).collect());
                    self.cancel_tweens_of(target, fields.as_deref());
                }
                KillRequest::All => self.cancel_all(),
            }
        }
    }

    /// Remove finished entries, keeping registration order
    fn sweep(&mut self) {
        let animations = &mut self.animations;
        let targets = &mut self.targets;
        let before = self.order.len();
        self.order.retain(|id| {
            let active = animations.get(*id).is_some_and(|a| a.is_active());
            if !active {
                if let Some(animation) = animations.remove(*id) {
                    Self::unindex(targets, *id, &animation);
                }
            }
            active
        });
        let removed = before - self.order.len();
        if removed > 0 {
            debug!(removed, remaining = self.order.len(), "swept finished animations");
        }
    }

    fn unindex(
        targets: &mut FxHashMap<TargetId, SmallVec<[AnimationId; 4]>>,
        id: AnimationId,
        animation: &Animation,
    ) {
        animation.visit_targets(&mut |target| {
            if let Some(ids) = targets.get_mut(&target) {
                ids.retain(|entry| *entry != id);
                if ids.is_empty() {
                    targets.remove(&target);
                }
            }
        });
    }

    /// Cancel and remove one entry. Returns false if it was not registered.
    pub fn kill(&mut self, id: AnimationId) -> bool {
        let Some(animation) = self.animations.get_mut(id) else {
            return false;
        };
        animation.kill();
        self.sweep();
        true
    }

    /// Cancel every tween writing to `target` (restricted to `fields` when
    /// given), including tweens nested in timelines and entries not yet
    /// registered. Fields are left at their current values. Returns how many
    /// tweens were cancelled.
    pub fn kill_tweens_of(&mut self, target: TargetId, fields: Option<&[&str]>) -> usize {
        let killed = self.cancel_tweens_of(target, fields);
        self.sweep();
        killed
    }

    fn cancel_tweens_of(&mut self, target: TargetId, fields: Option<&[&str]>) -> usize {
        let mut killed = 0;
        let ids = self.targets.get(&target).cloned().unwrap_or_default();
        for id in ids {
            if let Some(animation) = self.animations.get_mut(id) {
                killed += animation.kill_tweens_of(target, fields);
            }
        }
        for animation in self.queue.borrow_mut().added.iter_mut() {
            killed += animation.kill_tweens_of(target, fields);
        }
        if killed > 0 {
            debug!(?target, killed, "killed tweens of target");
        }
        killed
    }

    /// Cancel and remove everything, including queued entries
    pub fn kill_all(&mut self) {
        self.cancel_all();
        self.sweep();
    }

    fn cancel_all(&mut self) {
        for animation in self.animations.values_mut() {
            animation.kill();
        }
        self.queue.borrow_mut().added.clear();
        debug!(entries = self.order.len(), "killed all animations");
    }

    pub fn get(&self, id: AnimationId) -> Option<&Animation> {
        self.animations.get(id)
    }

    pub fn get_mut(&mut self, id: AnimationId) -> Option<&mut Animation> {
        self.animations.get_mut(id)
    }

    pub fn contains(&self, id: AnimationId) -> bool {
        self.animations.contains_key(id)
    }

    /// Get the number of registered entries
    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// Check if anything is registered or waiting to be
    pub fn has_active_animations(&self) -> bool {
        self.animations.values().any(Animation::is_active)
            || !self.queue.borrow().added.is_empty()
    }

    /// Iterate over registered entries in registration order
    pub fn iter(&self) -> impl Iterator<Item = (AnimationId, &Animation)> {
        self.order
            .iter()
            .filter_map(|id| self.animations.get(*id).map(|animation| (*id, animation)))
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Weak access to a scheduler from inside callbacks
///
/// Every method is a no-op once the scheduler is dropped.
#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    queue: Weak<RefCell<CommandQueue>>,
}

impl SchedulerHandle {
    /// Queue an entry for registration at the start of the next tick.
    /// Returns false if the scheduler is gone.
    pub fn add(&self, animation: impl Into<Animation>) -> bool {
        let Some(queue) = self.queue.upgrade() else {
            return false;
        };
        queue.borrow_mut().added.push(animation.into());
        true
    }

    pub fn delayed_call<F: FnMut() + 'static>(&self, delay: f32, f: F) -> Result<bool> {
        Ok(self.add(Tween::delayed_call(delay, f)?))
    }

    pub fn kill(&self, id: AnimationId) {
        self.request(KillRequest::Id(id));
    }

    pub fn kill_tweens_of(&self, target: TargetId, fields: Option<&[&str]>) {
        self.request(KillRequest::TweensOf {
            target,
            fields: fields.map(|fields| fields.iter().map(|f| f.to_string()).collect()),
        });
    }

    pub fn kill_all(&self) {
        self.request(KillRequest::All);
    }

    fn request(&self, request: KillRequest) {
        if let Some(queue) = self.queue.upgrade() {
            queue.borrow_mut().kills.push(request);
        }
    }
}
