//! Motus Animation System
//!
//! Tweens, timelines and a tick-driven scheduler for animating numeric fields
//! on objects the scheduler does not own.
//!
//! # Features
//!
//! - **Tweens**: Delay, duration, easing, repeat, yoyo and lifecycle callbacks
//! - **Timelines**: Sequencing, explicit offsets and shared labels, nestable
//! - **Scheduler**: Registration-ordered ticking, `kill_tweens_of`, delayed calls
//! - **Colors**: RGB triplet tweens and palette cycles
//! - **Weak targets**: Dropped objects cancel their tweens instead of panicking

pub mod animation;
pub mod color;
pub mod easing;
pub mod error;
pub mod scheduler;
pub mod target;
pub mod timeline;
pub mod tween;

pub use animation::{Animation, Direction, PlayState, Progress, Repeat};
pub use color::{color_cycle, color_to, Rgb};
pub use easing::Easing;
pub use error::{AnimationError, Result};
pub use scheduler::{AnimationId, AnimationScheduler, SchedulerConfig, SchedulerHandle};
pub use target::{AccessError, Property, TargetId};
pub use timeline::{Position, Timeline, TimelineConfig};
pub use tween::{Goal, Tween, TweenBuilder, TweenConfig};
