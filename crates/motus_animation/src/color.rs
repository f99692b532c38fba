//! RGB triplets and color tweens
//!
//! Colors are interpolated channel by channel in whatever space the triplet
//! already uses. Converting between spaces is up to the caller.

use crate::error::{AnimationError, Result};
use crate::target::Property;
use crate::tween::{Tween, TweenConfig};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

/// RGB color with channels in 0.0..=1.0
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ColorRepr", into = "String")]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create from a packed `0xRRGGBB` integer
    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self::new(r, g, b)
    }

    pub fn to_hex(&self) -> u32 {
        let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (byte(self.r) << 16) | (byte(self.g) << 8) | byte(self.b)
    }

    /// Parse `"#rrggbb"`, `"#rgb"`, `"0xrrggbb"`, bare `"rrggbb"` or a CSS
    /// color name
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || AnimationError::InvalidColor(input.to_string());
        let lower = input.trim().to_ascii_lowercase();
        if let Some(digits) = lower.strip_prefix('#').or_else(|| lower.strip_prefix("0x")) {
            return parse_hex_digits(digits).map(Self::from_hex).ok_or_else(invalid);
        }
        if let Some(hex) = named_color(&lower) {
            return Ok(Self::from_hex(hex));
        }
        if lower.len() == 6 {
            if let Some(hex) = parse_hex_digits(&lower) {
                return Ok(Self::from_hex(hex));
            }
        }
        Err(invalid())
    }

    pub fn lerp(&self, other: &Rgb, t: f32) -> Rgb {
        Rgb::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    pub fn to_array(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    fn channel_mut(&mut self, index: usize) -> &mut f32 {
        match index {
            0 => &mut self.r,
            1 => &mut self.g,
            _ => &mut self.b,
        }
    }
}

fn parse_hex_digits(digits: &str) -> Option<u32> {
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match digits.len() {
        6 => u32::from_str_radix(digits, 16).ok(),
        3 => {
            let short = u32::from_str_radix(digits, 16).ok()?;
            let expand = |nibble: u32| nibble * 0x11;
            Some(
                (expand((short >> 8) & 0xF) << 16)
                    | (expand((short >> 4) & 0xF) << 8)
                    | expand(short & 0xF),
            )
        }
        _ => None,
    }
}

fn named_color(name: &str) -> Option<u32> {
    let hex = match name {
        "black" => 0x000000,
        "white" => 0xffffff,
        "red" => 0xff0000,
        "green" => 0x008000,
        "lime" => 0x00ff00,
        "blue" => 0x0000ff,
        "yellow" => 0xffff00,
        "cyan" | "aqua" => 0x00ffff,
        "magenta" | "fuchsia" => 0xff00ff,
        "gray" | "grey" => 0x808080,
        "silver" => 0xc0c0c0,
        "maroon" => 0x800000,
        "olive" => 0x808000,
        "teal" => 0x008080,
        "navy" => 0x000080,
        "purple" => 0x800080,
        "orange" => 0xffa500,
        "pink" => 0xffc0cb,
        "hotpink" => 0xff69b4,
        "gold" => 0xffd700,
        "indigo" => 0x4b0082,
        "violet" => 0xee82ee,
        "brown" => 0xa52a2a,
        "coral" => 0xff7f50,
        "crimson" => 0xdc143c,
        "salmon" => 0xfa8072,
        "skyblue" => 0x87ceeb,
        "turquoise" => 0x40e0d0,
        "orchid" => 0xda70d6,
        _ => return None,
    };
    Some(hex)
}

impl FromStr for Rgb {
    type Err = AnimationError;

    fn from_str(input: &str) -> Result<Self> {
        Rgb::parse(input)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.to_hex())
    }
}

impl From<u32> for Rgb {
    fn from(hex: u32) -> Self {
        Rgb::from_hex(hex)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Hex(u32),
    Text(String),
}

impl TryFrom<ColorRepr> for Rgb {
    type Error = AnimationError;

    fn try_from(repr: ColorRepr) -> Result<Self> {
        match repr {
            ColorRepr::Hex(hex) => Ok(Rgb::from_hex(hex)),
            ColorRepr::Text(text) => Rgb::parse(&text),
        }
    }
}

fn channels<T, L>(target: &Rc<RefCell<T>>, lens: L) -> [Property; 3]
where
    T: 'static,
    L: Fn(&mut T) -> &mut Rgb + 'static,
{
    let lens = Rc::new(lens);
    let channel = |index: usize, name: &'static str| {
        let lens = lens.clone();
        Property::new(target, name, move |t: &mut T| lens(t).channel_mut(index))
    };
    [channel(0, "r"), channel(1, "g"), channel(2, "b")]
}

/// Tween an RGB triplet towards `goal`, one track per channel named `r`, `g`
/// and `b`. Start values are read from the live triplet when the tween starts.
///
/// ```rust
/// use motus_animation::{color_to, Rgb, TweenConfig};
/// use std::{cell::RefCell, rc::Rc};
///
/// struct Material { color: Rgb }
///
/// let material = Rc::new(RefCell::new(Material { color: Rgb::WHITE }));
/// let mut tween = color_to(
///     &material,
///     |m: &mut Material| &mut m.color,
///     Rgb::from_hex(0x000000),
///     TweenConfig::new(1.0),
/// )
/// .unwrap();
///
/// tween.advance(1.0).unwrap();
/// assert_eq!(material.borrow().color, Rgb::BLACK);
/// ```
pub fn color_to<T, L>(target: &Rc<RefCell<T>>, lens: L, goal: Rgb, config: TweenConfig) -> Result<Tween>
where
    T: 'static,
    L: Fn(&mut T) -> &mut Rgb + 'static,
{
    let [r, g, b] = channels(target, lens);
    Tween::builder(config)
        .to(r, goal.r)
        .to(g, goal.g)
        .to(b, goal.b)
        .build()
}

/// Endlessly cycle an RGB triplet through `palette`, one entry per cycle.
///
/// Each cycle starts from the color the previous one ended on. `config.repeat`
/// and `config.repeat_refresh` are overridden.
pub fn color_cycle<T, L>(
    target: &Rc<RefCell<T>>,
    lens: L,
    palette: Vec<Rgb>,
    config: TweenConfig,
) -> Result<Tween>
where
    T: 'static,
    L: Fn(&mut T) -> &mut Rgb + 'static,
{
    if palette.is_empty() {
        return Err(AnimationError::EmptyPalette);
    }
    let palette = Rc::new(palette);
    let index = Rc::new(Cell::new(0usize));
    let goal = |pick: fn(&Rgb) -> f32| {
        let palette = palette.clone();
        let index = index.clone();
        move || pick(&palette[index.get() % palette.len()])
    };

    let [r, g, b] = channels(target, lens);
    let counter = index.clone();
    Tween::builder(config.with_repeat(-1).with_repeat_refresh(true))
        .to_with(r, goal(|c| c.r))
        .to_with(g, goal(|c| c.g))
        .to_with(b, goal(|c| c.b))
        .on_repeat(move || counter.set(counter.get() + 1))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Light {
        color: Rgb,
    }

    fn light(color: Rgb) -> Rc<RefCell<Light>> {
        Rc::new(RefCell::new(Light { color }))
    }

    fn assert_rgb(actual: Rgb, expected: Rgb) {
        let close = actual
            .to_array()
            .iter()
            .zip(expected.to_array())
            .all(|(a, e)| (a - e).abs() < 1e-4);
        assert!(close, "expected {expected:?}, got {actual:?}");
    }

    #[test]
    fn parses_hex_forms_and_names() {
        let orange = Rgb::from_hex(0xff9900);
        assert_eq!(Rgb::parse("#ff9900"), Ok(orange));
        assert_eq!(Rgb::parse("#F90"), Ok(orange));
        assert_eq!(Rgb::parse("0xff9900"), Ok(orange));
        assert_eq!(Rgb::parse("ff9900"), Ok(orange));
        assert_eq!(Rgb::parse(" White "), Ok(Rgb::WHITE));
        assert_eq!("teal".parse::<Rgb>(), Ok(Rgb::from_hex(0x008080)));
    }

    #[test]
    fn rejects_malformed_colors() {
        for input in ["#ff99", "#gggggg", "0x", "notacolor", ""] {
            assert_eq!(
                Rgb::parse(input),
                Err(AnimationError::InvalidColor(input.to_string())),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn hex_round_trips_through_display() {
        let color = Rgb::from_hex(0x1e90ff);
        assert_eq!(color.to_hex(), 0x1e90ff);
        assert_eq!(color.to_string(), "#1e90ff");
    }

    #[test]
    fn serde_accepts_strings_and_integers() {
        #[derive(Deserialize)]
        struct Doc {
            a: Rgb,
            b: Rgb,
        }
        let doc: Doc = toml::from_str("a = \"#000\"\nb = 16777215").unwrap();
        assert_eq!(doc.a, Rgb::BLACK);
        assert_eq!(doc.b, Rgb::WHITE);
        assert_eq!(serde_json::to_string(&doc.b).unwrap(), "\"#ffffff\"");
    }

    #[test]
    fn lerp_is_per_channel() {
        let mid = Rgb::BLACK.lerp(&Rgb::new(1.0, 0.5, 0.0), 0.5);
        assert_rgb(mid, Rgb::new(0.5, 0.25, 0.0));
    }

    #[test]
    fn color_to_reaches_goal_channels() {
        let light = light(Rgb::WHITE);
        let mut tween = color_to(
            &light,
            |l: &mut Light| &mut l.color,
            Rgb::from_hex(0x000000),
            TweenConfig::new(1.0),
        )
        .unwrap();

        tween.advance(0.5).unwrap();
        assert_rgb(light.borrow().color, Rgb::new(0.5, 0.5, 0.5));
        tween.advance(0.5).unwrap();
        assert_rgb(light.borrow().color, Rgb::BLACK);

        let fields: Vec<_> = tween.targets().map(|(_, name)| name.to_string()).collect();
        assert_eq!(fields, ["r", "g", "b"]);
    }

    #[test]
    fn color_cycle_walks_the_palette() {
        let light = light(Rgb::BLACK);
        let red = Rgb::from_hex(0xff0000);
        let blue = Rgb::from_hex(0x0000ff);
        let mut tween = color_cycle(
            &light,
            |l: &mut Light| &mut l.color,
            vec![red, blue],
            TweenConfig::new(1.0),
        )
        .unwrap();

        tween.advance(1.0).unwrap();
        assert_rgb(light.borrow().color, red);
        tween.advance(0.5).unwrap();
        assert_rgb(light.borrow().color, Rgb::new(0.5, 0.0, 0.5));
        tween.advance(0.5).unwrap();
        tween.advance(0.5).unwrap();
        // third cycle wraps back to red
        assert_rgb(light.borrow().color, Rgb::new(0.5, 0.0, 0.5));
        assert_eq!(tween.total_duration(), None);
    }

    #[test]
    fn empty_palette_is_rejected() {
        let light = light(Rgb::BLACK);
        let result = color_cycle(&light, |l: &mut Light| &mut l.color, vec![], TweenConfig::new(1.0));
        assert_eq!(result.unwrap_err(), AnimationError::EmptyPalette);
    }
}
