//! Keyframe tables and their blend rules
//!
//! A table is a short, strictly increasing list of `(key, value)` pairs
//! stored inline (no heap), so over-lifetime components stay plain data.
//! Sampling clamps outside the covered keys and blends linearly inside,
//! except colors, which travel through hue space.

use ember_core::{Color, EmberError, Hsv, Result, Vec2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Most keyframes a single table may hold
pub const MAX_KEYFRAMES: usize = 8;

/// How two values of a type mix at fraction `u` in `[0, 1]`
pub trait Blend: Copy + Default + Send + Sync + 'static {
    fn blend(a: Self, b: Self, u: f32) -> Self;
}

impl Blend for f32 {
    fn blend(a: Self, b: Self, u: f32) -> Self {
        a + (b - a) * u
    }
}

impl Blend for Vec2 {
    fn blend(a: Self, b: Self, u: f32) -> Self {
        Vec2::lerp(a, b, u)
    }
}

impl Blend for Color {
    /// Hue, saturation and value blend independently, hue along the shorter
    /// arc. Alpha blends linearly in its own byte range and never passes
    /// through HSV.
    fn blend(a: Self, b: Self, u: f32) -> Self {
        let (ha, hb) = (a.to_hsv(), b.to_hsv());

        // A gray endpoint has no hue of its own; borrow the other one's
        let (h0, h1) = match (ha.s == 0.0, hb.s == 0.0) {
            (true, false) => (hb.h, hb.h),
            (false, true) => (ha.h, ha.h),
            _ => (ha.h, hb.h),
        };
        let mut dh = h1 - h0;
        if dh > 180.0 {
            dh -= 360.0;
        } else if dh < -180.0 {
            dh += 360.0;
        }

        let rgb = Color::from_hsv(Hsv {
            h: (h0 + dh * u).rem_euclid(360.0),
            s: f32::blend(ha.s, hb.s, u),
            v: f32::blend(ha.v, hb.v, u),
        });
        let alpha = f32::blend(a.a as f32, b.a as f32, u);

        Color {
            a: alpha.round().clamp(0.0, 255.0) as u8,
            ..rgb
        }
    }
}

/// One `(key, value)` pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Keyframe<T> {
    pub key: f32,
    pub value: T,
}

impl<T> Keyframe<T> {
    pub const fn new(key: f32, value: T) -> Self {
        Self { key, value }
    }
}

/// A validated keyframe table: 2 to [`MAX_KEYFRAMES`] entries, strictly
/// increasing finite keys.
///
/// Tables are only built through [`Keyframes::new`]; TOML sources read a
/// plain `Vec<Keyframe<T>>` and convert it.
#[derive(Clone, Copy, Serialize)]
#[serde(into = "Vec<Keyframe<T>>", bound(serialize = "T: Blend + Serialize"))]
pub struct Keyframes<T: Blend> {
    frames: [Keyframe<T>; MAX_KEYFRAMES],
    len: u8,
}

impl<T: Blend> Keyframes<T> {
    /// Validate and copy `frames` into a table
    pub fn new(frames: &[Keyframe<T>]) -> Result<Self> {
        if frames.len() < 2 {
            return Err(EmberError::InvalidKeyframeTable(format!(
                "need at least 2 keyframes, got {}",
                frames.len()
            )));
        }
        if frames.len() > MAX_KEYFRAMES {
            return Err(EmberError::InvalidKeyframeTable(format!(
                "at most {MAX_KEYFRAMES} keyframes allowed, got {}",
                frames.len()
            )));
        }
        if let Some(bad) = frames.iter().find(|f| !f.key.is_finite()) {
            return Err(EmberError::InvalidKeyframeTable(format!(
                "key {} is not finite",
                bad.key
            )));
        }
        for (i, pair) in frames.windows(2).enumerate() {
            if pair[1].key <= pair[0].key {
                return Err(EmberError::InvalidKeyframeTable(format!(
                    "keys must be strictly increasing: {} at index {} follows {}",
                    pair[1].key,
                    i + 1,
                    pair[0].key
                )));
            }
        }

        let mut table = Self {
            frames: [Keyframe::default(); MAX_KEYFRAMES],
            len: frames.len() as u8,
        };
        table.frames[..frames.len()].copy_from_slice(frames);
        Ok(table)
    }

    /// Shorthand for `new` over `(key, value)` tuples
    pub fn from_pairs(pairs: &[(f32, T)]) -> Result<Self> {
        let frames: Vec<Keyframe<T>> = pairs.iter().map(|&(k, v)| Keyframe::new(k, v)).collect();
        Self::new(&frames)
    }

    /// `{0: from, 1: to}`; always valid
    pub fn span(from: T, to: T) -> Self {
        let mut frames = [Keyframe::default(); MAX_KEYFRAMES];
        frames[0] = Keyframe::new(0.0, from);
        frames[1] = Keyframe::new(1.0, to);
        Self { frames, len: 2 }
    }

    pub fn as_slice(&self) -> &[Keyframe<T>] {
        &self.frames[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn first(&self) -> Keyframe<T> {
        self.frames[0]
    }

    pub fn last(&self) -> Keyframe<T> {
        self.frames[self.len as usize - 1]
    }

    /// Sample the table at `t`.
    ///
    /// Returns the boundary value outside `[first.key, last.key]`, the exact
    /// stored value at a key, and a blend of the bracketing pair otherwise.
    pub fn evaluate(&self, t: f32) -> T {
        let frames = self.as_slice();
        let first = frames[0];
        if frames.len() == 1 || t <= first.key {
            return first.value;
        }
        let last = frames[frames.len() - 1];
        if t >= last.key {
            return last.value;
        }

        for pair in frames.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t >= a.key && t < b.key {
                if t == a.key {
                    return a.value;
                }
                let u = (t - a.key) / (b.key - a.key);
                return T::blend(a.value, b.value, u);
            }
        }

        // Only reachable for NaN input
        last.value
    }
}

impl<T: Blend> TryFrom<Vec<Keyframe<T>>> for Keyframes<T> {
    type Error = EmberError;

    fn try_from(frames: Vec<Keyframe<T>>) -> Result<Self> {
        Self::new(&frames)
    }
}

impl<T: Blend> From<Keyframes<T>> for Vec<Keyframe<T>> {
    fn from(table: Keyframes<T>) -> Self {
        table.as_slice().to_vec()
    }
}

impl<T: Blend + PartialEq> PartialEq for Keyframes<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Blend + fmt::Debug> fmt::Debug for Keyframes<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Keyframes<f32> {
        Keyframes::from_pairs(&[(0.0, 0.0), (0.5, 10.0), (1.0, 0.0)]).unwrap()
    }

    #[test]
    fn rejects_short_tables() {
        let err = Keyframes::from_pairs(&[(0.0, 1.0f32)]).unwrap_err();
        assert!(matches!(err, EmberError::InvalidKeyframeTable(_)));
        assert!(Keyframes::<f32>::new(&[]).is_err());
    }

    #[test]
    fn rejects_non_increasing_keys() {
        assert!(Keyframes::from_pairs(&[(0.0, 1.0f32), (0.0, 2.0)]).is_err());
        assert!(Keyframes::from_pairs(&[(0.0, 1.0f32), (0.6, 2.0), (0.4, 3.0)]).is_err());
        assert!(Keyframes::from_pairs(&[(0.0, 1.0f32), (f32::NAN, 2.0)]).is_err());
    }

    #[test]
    fn rejects_oversized_tables() {
        let pairs: Vec<(f32, f32)> = (0..=MAX_KEYFRAMES).map(|i| (i as f32, 0.0)).collect();
        assert!(Keyframes::from_pairs(&pairs).is_err());
        assert!(Keyframes::from_pairs(&pairs[..MAX_KEYFRAMES]).is_ok());
    }

    #[test]
    fn exact_at_every_key() {
        let table = ramp();
        for frame in table.as_slice() {
            assert_eq!(table.evaluate(frame.key), frame.value);
        }
    }

    #[test]
    fn linear_inside_segments() {
        let table = ramp();
        assert!((table.evaluate(0.25) - 5.0).abs() < 1e-6);
        assert!((table.evaluate(0.75) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn clamps_outside_range() {
        let table = Keyframes::from_pairs(&[(0.2, 3.0f32), (0.8, 7.0)]).unwrap();
        assert_eq!(table.evaluate(-1.0), 3.0);
        assert_eq!(table.evaluate(0.0), 3.0);
        assert_eq!(table.evaluate(0.8), 7.0);
        assert_eq!(table.evaluate(1.5), 7.0);
    }

    #[test]
    fn vec2_blends_per_component() {
        let table = Keyframes::span(Vec2::new(0.0, 10.0), Vec2::new(10.0, 0.0));
        let mid = table.evaluate(0.5);
        assert!((mid.x - 5.0).abs() < 1e-6);
        assert!((mid.y - 5.0).abs() < 1e-6);
    }

    #[test]
    fn red_to_blue_passes_through_magenta() {
        let table = Keyframes::span(Color::RED, Color::BLUE);
        let mid = table.evaluate(0.5);
        let hsv = mid.to_hsv();

        // Saturated violet/magenta, not a dull gray
        assert!(hsv.s > 0.95, "saturation {} too low", hsv.s);
        assert!(hsv.v > 0.95);
        assert!((270.0..=330.0).contains(&hsv.h), "hue {} not violet", hsv.h);
        assert!(mid.r > 200 && mid.b > 200 && mid.g < 30);
        assert_eq!(mid.a, 255);
    }

    #[test]
    fn color_alpha_is_linear() {
        let table = Keyframes::span(Color::RED.with_alpha(0.0), Color::RED);
        assert_eq!(table.evaluate(0.5).a, 128);
        assert_eq!(table.evaluate(0.25).a, 64);
        // Hue untouched when only alpha changes
        let c = table.evaluate(0.5);
        assert_eq!((c.r, c.g, c.b), (255, 0, 0));
    }

    #[test]
    fn gray_endpoint_keeps_other_hue() {
        let table = Keyframes::span(Color::WHITE, Color::BLUE);
        let c = table.evaluate(0.5);
        // Desaturated blue, never a hue sweep through red or green
        assert!(c.b >= c.r && c.b >= c.g);
        assert_eq!(c.r, c.g);
    }

    #[test]
    fn toml_lists_convert_through_validation() {
        #[derive(Deserialize)]
        struct Holder {
            fade: Vec<Keyframe<Color>>,
        }
        let ok: Holder = toml::from_str(
            r#"fade = [
                { key = 0.0, value = [255, 0, 0, 255] },
                { key = 1.0, value = [0, 0, 255, 0] },
            ]"#,
        )
        .unwrap();
        let table = Keyframes::try_from(ok.fade).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.last().value, Color::new(0, 0, 255, 0));

        let short: Holder =
            toml::from_str(r#"fade = [ { key = 0.5, value = [255, 0, 0, 255] } ]"#).unwrap();
        let err = Keyframes::try_from(short.fade).unwrap_err();
        assert!(matches!(err, EmberError::InvalidKeyframeTable(_)));
    }

    #[test]
    fn serializes_as_plain_list() {
        let table = Keyframes::span(0.0f32, 2.0);
        let frames: Vec<Keyframe<f32>> = table.into();
        assert_eq!(frames, vec![Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 2.0)]);
    }
}
