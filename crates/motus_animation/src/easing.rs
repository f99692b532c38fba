//! Easing functions for animations
//!
//! Every easing maps normalized progress (clamped to 0.0..=1.0) to eased
//! progress. `back` and `elastic` curves overshoot that range on purpose.
//!
//! Easings can be named with the vocabulary animation scripts commonly use:
//!
//! ```rust
//! use motus_animation::Easing;
//!
//! let ease: Easing = "back.inOut(1.7)".parse().unwrap();
//! assert_eq!(ease, Easing::EaseInOutBack(1.7));
//! assert_eq!(ease.apply(1.0), 1.0);
//! ```

use crate::error::AnimationError;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Default overshoot of the `back` family
pub const BACK_OVERSHOOT: f32 = 1.70158;

/// Easing function type
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Easing {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    EaseInCubic,
    EaseOutCubic,
    EaseInOutCubic,
    EaseInQuart,
    EaseOutQuart,
    EaseInOutQuart,
    EaseInQuint,
    EaseOutQuint,
    EaseInOutQuint,
    EaseInExpo,
    EaseOutExpo,
    EaseInOutExpo,
    EaseInCirc,
    EaseOutCirc,
    EaseInOutCirc,
    /// Pulls back before moving forward; parameter is the overshoot
    EaseInBack(f32),
    EaseOutBack(f32),
    EaseInOutBack(f32),
    EaseInElastic,
    EaseOutElastic,
    EaseInOutElastic,
    EaseInBounce,
    EaseOutBounce,
    EaseInOutBounce,
    CubicBezier(f32, f32, f32, f32),
}

impl Easing {
    /// Apply the easing function to a progress value (0.0 to 1.0)
    pub fn apply(&self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::EaseIn | Easing::EaseInCubic => t * t * t,
            Easing::EaseOut | Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOut | Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            Easing::EaseOutSine => (t * PI / 2.0).sin(),
            Easing::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::EaseInQuart => t * t * t * t,
            Easing::EaseOutQuart => 1.0 - (1.0 - t).powi(4),
            Easing::EaseInOutQuart => {
                if t < 0.5 {
                    8.0 * t * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            Easing::EaseInQuint => t.powi(5),
            Easing::EaseOutQuint => 1.0 - (1.0 - t).powi(5),
            Easing::EaseInOutQuint => {
                if t < 0.5 {
                    16.0 * t.powi(5)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(5) / 2.0
                }
            }
            Easing::EaseInExpo => {
                if t == 0.0 {
                    0.0
                } else {
                    2f32.powf(10.0 * t - 10.0)
                }
            }
            Easing::EaseOutExpo => {
                if t == 1.0 {
                    1.0
                } else {
                    1.0 - 2f32.powf(-10.0 * t)
                }
            }
            Easing::EaseInOutExpo => {
                if t == 0.0 || t == 1.0 {
                    t
                } else if t < 0.5 {
                    2f32.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f32.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
            Easing::EaseInCirc => 1.0 - (1.0 - t * t).sqrt(),
            Easing::EaseOutCirc => (1.0 - (t - 1.0) * (t - 1.0)).sqrt(),
            Easing::EaseInOutCirc => {
                if t < 0.5 {
                    (1.0 - (1.0 - (2.0 * t).powi(2)).sqrt()) / 2.0
                } else {
                    ((1.0 - (-2.0 * t + 2.0).powi(2)).sqrt() + 1.0) / 2.0
                }
            }
            Easing::EaseInBack(s) => back_in(t, *s),
            Easing::EaseOutBack(s) => 1.0 - back_in(1.0 - t, *s),
            Easing::EaseInOutBack(s) => {
                if t < 0.5 {
                    back_in(t * 2.0, *s) / 2.0
                } else {
                    1.0 - back_in((1.0 - t) * 2.0, *s) / 2.0
                }
            }
            Easing::EaseInElastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    -(2f32.powf(10.0 * t - 10.0)) * ((10.0 * t - 10.75) * ELASTIC_C4).sin()
                }
            }
            Easing::EaseOutElastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    2f32.powf(-10.0 * t) * ((10.0 * t - 0.75) * ELASTIC_C4).sin() + 1.0
                }
            }
            Easing::EaseInOutElastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else if t < 0.5 {
                    -(2f32.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0
                } else {
                    2f32.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin() / 2.0
                        + 1.0
                }
            }
            Easing::EaseInBounce => 1.0 - bounce_out(1.0 - t),
            Easing::EaseOutBounce => bounce_out(t),
            Easing::EaseInOutBounce => {
                if t < 0.5 {
                    (1.0 - bounce_out(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + bounce_out(2.0 * t - 1.0)) / 2.0
                }
            }
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier_ease(t, *x1, *y1, *x2, *y2),
        }
    }

    /// `back.in` with the default overshoot
    pub fn back_in() -> Self {
        Easing::EaseInBack(BACK_OVERSHOOT)
    }

    /// `back.out` with the default overshoot
    pub fn back_out() -> Self {
        Easing::EaseOutBack(BACK_OVERSHOOT)
    }

    /// `back.inOut` with the default overshoot
    pub fn back_in_out() -> Self {
        Easing::EaseInOutBack(BACK_OVERSHOOT)
    }
}

const ELASTIC_C4: f32 = (2.0 * PI) / 3.0;
const ELASTIC_C5: f32 = (2.0 * PI) / 4.5;

#[inline]
fn back_in(t: f32, overshoot: f32) -> f32 {
    t * t * ((overshoot + 1.0) * t - overshoot)
}

fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;
    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

/// One axis of a unit cubic bezier anchored at 0 and 1, in polynomial form
#[derive(Clone, Copy)]
struct BezierAxis {
    a: f64,
    b: f64,
    c: f64,
}

impl BezierAxis {
    fn new(p1: f32, p2: f32) -> Self {
        let (p1, p2) = (p1 as f64, p2 as f64);
        let c = 3.0 * p1;
        let b = 3.0 * (p2 - p1) - c;
        Self {
            a: 1.0 - c - b,
            b,
            c,
        }
    }

    fn at(self, s: f64) -> f64 {
        ((self.a * s + self.b) * s + self.c) * s
    }

    fn slope(self, s: f64) -> f64 {
        (3.0 * self.a * s + 2.0 * self.b) * s + self.c
    }

    /// Curve parameter whose value is `target`. Newton steps that leave the
    /// current bracket fall back to bisection.
    fn solve(self, target: f64) -> f64 {
        let (mut lo, mut hi) = (0.0_f64, 1.0_f64);
        let mut s = target;
        for _ in 0..24 {
            let err = self.at(s) - target;
            if err.abs() < 1e-7 {
                break;
            }
            if err < 0.0 {
                lo = s;
            } else {
                hi = s;
            }
            let slope = self.slope(s);
            let next = if slope.abs() > 1e-9 { s - err / slope } else { f64::NAN };
            s = if next > lo && next < hi {
                next
            } else {
                0.5 * (lo + hi)
            };
        }
        s
    }
}

/// CSS `cubic-bezier(x1, y1, x2, y2)`, evaluated in f64
fn cubic_bezier_ease(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    if t <= 0.0 || t >= 1.0 {
        return t.clamp(0.0, 1.0);
    }
    let s = BezierAxis::new(x1, x2).solve(t as f64);
    BezierAxis::new(y1, y2).at(s) as f32
}

// ============================================================================
// Names
// ============================================================================

#[derive(Clone, Copy)]
enum Kind {
    In,
    Out,
    InOut,
}

impl FromStr for Easing {
    type Err = AnimationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let unknown = || AnimationError::UnknownEasing(input.to_string());
        let trimmed = input.trim();

        let (head, params) = match trimmed.find('(') {
            Some(open) => {
                let inner = trimmed[open + 1..].strip_suffix(')').ok_or_else(unknown)?;
                let params = inner
                    .split(',')
                    .map(|p| p.trim().parse::<f32>().map_err(|_| unknown()))
                    .collect::<Result<Vec<_>, _>>()?;
                (trimmed[..open].trim(), params)
            }
            None => (trimmed, Vec::new()),
        };
        let head = head.to_ascii_lowercase();

        match head.as_str() {
            "cubic-bezier" => {
                return match params.as_slice() {
                    [x1, y1, x2, y2] => Ok(Easing::CubicBezier(*x1, *y1, *x2, *y2)),
                    _ => Err(unknown()),
                };
            }
            "back" => {}
            _ if head.starts_with("back.") => {}
            _ if !params.is_empty() => return Err(unknown()),
            _ => {}
        }

        let css = match head.as_str() {
            "none" | "linear" | "power0" | "power0.in" | "power0.out" | "power0.inout" => {
                Some(Easing::Linear)
            }
            "ease" => Some(Easing::CubicBezier(0.25, 0.1, 0.25, 1.0)),
            "ease-in" => Some(Easing::EaseIn),
            "ease-out" => Some(Easing::EaseOut),
            "ease-in-out" => Some(Easing::EaseInOut),
            _ => None,
        };
        if let Some(easing) = css {
            return Ok(easing);
        }

        let (family, kind) = match head.split_once('.') {
            Some((family, "in")) => (family, Kind::In),
            Some((family, "out")) => (family, Kind::Out),
            Some((family, "inout")) => (family, Kind::InOut),
            Some(_) => return Err(unknown()),
            // An omitted kind means "out"
            None => (head.as_str(), Kind::Out),
        };

        let overshoot = match params.as_slice() {
            [] => BACK_OVERSHOOT,
            [s] => *s,
            _ => return Err(unknown()),
        };

        let easing = match (family, kind) {
            ("sine", Kind::In) => Easing::EaseInSine,
            ("sine", Kind::Out) => Easing::EaseOutSine,
            ("sine", Kind::InOut) => Easing::EaseInOutSine,
            ("quad" | "power1", Kind::In) => Easing::EaseInQuad,
            ("quad" | "power1", Kind::Out) => Easing::EaseOutQuad,
            ("quad" | "power1", Kind::InOut) => Easing::EaseInOutQuad,
            ("cubic" | "power2", Kind::In) => Easing::EaseInCubic,
            ("cubic" | "power2", Kind::Out) => Easing::EaseOutCubic,
            ("cubic" | "power2", Kind::InOut) => Easing::EaseInOutCubic,
            ("quart" | "power3", Kind::In) => Easing::EaseInQuart,
            ("quart" | "power3", Kind::Out) => Easing::EaseOutQuart,
            ("quart" | "power3", Kind::InOut) => Easing::EaseInOutQuart,
            ("quint" | "power4", Kind::In) => Easing::EaseInQuint,
            ("quint" | "power4", Kind::Out) => Easing::EaseOutQuint,
            ("quint" | "power4", Kind::InOut) => Easing::EaseInOutQuint,
            ("expo", Kind::In) => Easing::EaseInExpo,
            ("expo", Kind::Out) => Easing::EaseOutExpo,
            ("expo", Kind::InOut) => Easing::EaseInOutExpo,
            ("circ", Kind::In) => Easing::EaseInCirc,
            ("circ", Kind::Out) => Easing::EaseOutCirc,
            ("circ", Kind::InOut) => Easing::EaseInOutCirc,
            ("back", Kind::In) => Easing::EaseInBack(overshoot),
            ("back", Kind::Out) => Easing::EaseOutBack(overshoot),
            ("back", Kind::InOut) => Easing::EaseInOutBack(overshoot),
            ("elastic", Kind::In) => Easing::EaseInElastic,
            ("elastic", Kind::Out) => Easing::EaseOutElastic,
            ("elastic", Kind::InOut) => Easing::EaseInOutElastic,
            ("bounce", Kind::In) => Easing::EaseInBounce,
            ("bounce", Kind::Out) => Easing::EaseOutBounce,
            ("bounce", Kind::InOut) => Easing::EaseInOutBounce,
            _ => return Err(unknown()),
        };
        Ok(easing)
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Easing::Linear => "linear",
            Easing::EaseIn => "ease-in",
            Easing::EaseOut => "ease-out",
            Easing::EaseInOut => "ease-in-out",
            Easing::EaseInSine => "sine.in",
            Easing::EaseOutSine => "sine.out",
            Easing::EaseInOutSine => "sine.inOut",
            Easing::EaseInQuad => "quad.in",
            Easing::EaseOutQuad => "quad.out",
            Easing::EaseInOutQuad => "quad.inOut",
            Easing::EaseInCubic => "cubic.in",
            Easing::EaseOutCubic => "cubic.out",
            Easing::EaseInOutCubic => "cubic.inOut",
            Easing::EaseInQuart => "quart.in",
            Easing::EaseOutQuart => "quart.out",
            Easing::EaseInOutQuart => "quart.inOut",
            Easing::EaseInQuint => "quint.in",
            Easing::EaseOutQuint => "quint.out",
            Easing::EaseInOutQuint => "quint.inOut",
            Easing::EaseInExpo => "expo.in",
            Easing::EaseOutExpo => "expo.out",
            Easing::EaseInOutExpo => "expo.inOut",
            Easing::EaseInCirc => "circ.in",
            Easing::EaseOutCirc => "circ.out",
            Easing::EaseInOutCirc => "circ.inOut",
            Easing::EaseInBack(s) => return write!(f, "back.in({s})"),
            Easing::EaseOutBack(s) => return write!(f, "back.out({s})"),
            Easing::EaseInOutBack(s) => return write!(f, "back.inOut({s})"),
            Easing::EaseInElastic => "elastic.in",
            Easing::EaseOutElastic => "elastic.out",
            Easing::EaseInOutElastic => "elastic.inOut",
            Easing::EaseInBounce => "bounce.in",
            Easing::EaseOutBounce => "bounce.out",
            Easing::EaseInOutBounce => "bounce.inOut",
            Easing::CubicBezier(x1, y1, x2, y2) => {
                return write!(f, "cubic-bezier({x1}, {y1}, {x2}, {y2})")
            }
        };
        f.write_str(name)
    }
}

impl TryFrom<String> for Easing {
    type Error = AnimationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Easing> for String {
    fn from(easing: Easing) -> Self {
        easing.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 35] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::EaseInSine,
        Easing::EaseOutSine,
        Easing::EaseInOutSine,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
        Easing::EaseInCubic,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
        Easing::EaseInQuart,
        Easing::EaseOutQuart,
        Easing::EaseInOutQuart,
        Easing::EaseInQuint,
        Easing::EaseOutQuint,
        Easing::EaseInOutQuint,
        Easing::EaseInExpo,
        Easing::EaseOutExpo,
        Easing::EaseInOutExpo,
        Easing::EaseInCirc,
        Easing::EaseOutCirc,
        Easing::EaseInOutCirc,
        Easing::EaseInBack(BACK_OVERSHOOT),
        Easing::EaseOutBack(BACK_OVERSHOOT),
        Easing::EaseInOutBack(1.7),
        Easing::EaseInElastic,
        Easing::EaseOutElastic,
        Easing::EaseInOutElastic,
        Easing::EaseInBounce,
        Easing::EaseOutBounce,
        Easing::EaseInOutBounce,
        Easing::CubicBezier(0.25, 0.1, 0.25, 1.0),
    ];

    #[test]
    fn every_easing_hits_both_endpoints() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-4, "{easing} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-4, "{easing} at 1");
        }
    }

    #[test]
    fn css_ease_matches_reference_points() {
        let ease = Easing::CubicBezier(0.25, 0.1, 0.25, 1.0);
        // Reference values of the CSS `ease` curve
        assert!((ease.apply(0.5) - 0.8024).abs() < 1e-3);
        assert!((ease.apply(0.25) - 0.4085).abs() < 1e-3);
        let linear = Easing::CubicBezier(0.0, 0.0, 1.0, 1.0);
        assert!((linear.apply(0.3) - 0.3).abs() < 1e-5);
    }

    #[test]
    fn input_is_clamped() {
        assert_eq!(Easing::Linear.apply(-3.0), 0.0);
        assert_eq!(Easing::Linear.apply(7.0), 1.0);
        assert_eq!(Easing::EaseInQuad.apply(f32::NAN), 0.0);
    }

    #[test]
    fn back_overshoots_below_zero() {
        let early = Easing::back_in().apply(0.2);
        assert!(early < 0.0);
        let stronger = Easing::EaseInBack(4.0).apply(0.2);
        assert!(stronger < early);
        assert!(Easing::back_out().apply(0.8) > 1.0);
    }

    #[test]
    fn in_out_curves_are_symmetric_at_midpoint() {
        for easing in [
            Easing::EaseInOutSine,
            Easing::EaseInOutQuad,
            Easing::EaseInOutExpo,
            Easing::EaseInOutBack(1.7),
        ] {
            assert!((easing.apply(0.5) - 0.5).abs() < 1e-4, "{easing}");
        }
    }

    #[test]
    fn parses_script_style_names() {
        assert_eq!("expo.inOut".parse::<Easing>(), Ok(Easing::EaseInOutExpo));
        assert_eq!(
            "back.inOut(1.7)".parse::<Easing>(),
            Ok(Easing::EaseInOutBack(1.7))
        );
        assert_eq!(
            "back.in".parse::<Easing>(),
            Ok(Easing::EaseInBack(BACK_OVERSHOOT))
        );
        assert_eq!("power2.out".parse::<Easing>(), Ok(Easing::EaseOutCubic));
        assert_eq!("sine".parse::<Easing>(), Ok(Easing::EaseOutSine));
        assert_eq!("none".parse::<Easing>(), Ok(Easing::Linear));
        assert_eq!("ease-in-out".parse::<Easing>(), Ok(Easing::EaseInOut));
        assert_eq!(
            "cubic-bezier(0.4, 0, 0.2, 1)".parse::<Easing>(),
            Ok(Easing::CubicBezier(0.4, 0.0, 0.2, 1.0))
        );
    }

    #[test]
    fn rejects_unknown_names_and_stray_params() {
        assert!("wobble.in".parse::<Easing>().is_err());
        assert!("expo.sideways".parse::<Easing>().is_err());
        assert!("expo.in(2)".parse::<Easing>().is_err());
        assert!("back.in(1, 2)".parse::<Easing>().is_err());
        assert!("cubic-bezier(0.4, 0)".parse::<Easing>().is_err());
        assert!("back.in(1.7".parse::<Easing>().is_err());
    }

    #[test]
    fn display_names_parse_back() {
        for easing in ALL {
            assert_eq!(easing.to_string().parse::<Easing>(), Ok(easing));
        }
    }

    #[test]
    fn serializes_as_name() {
        let json = serde_json::to_string(&Easing::EaseInOutBack(1.7)).unwrap();
        assert_eq!(json, "\"back.inOut(1.7)\"");
        let parsed: Easing = serde_json::from_str("\"expo.out\"").unwrap();
        assert_eq!(parsed, Easing::EaseOutExpo);
    }
}
