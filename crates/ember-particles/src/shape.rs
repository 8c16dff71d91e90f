//! Emission shapes: where (and how fast) a particle starts, in emitter space

use ember_core::{EmberError, RandomSource, Result, Vec2};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Region a new particle is sampled from, relative to the emitter.
///
/// Lengths are half-extents; angles are degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EmissionShape {
    /// Everything starts at the emitter
    #[default]
    Point,
    /// Horizontal segment `[-width, width]`
    Line { width: f32 },
    /// Axis-aligned rectangle, filled or perimeter only
    Box {
        width: f32,
        height: f32,
        #[serde(default)]
        outline: bool,
    },
    /// Disc, filled or rim only
    Circle {
        radius: f32,
        #[serde(default)]
        outline: bool,
    },
    /// Segment of `base_width` launching particles upward, fanned out by up
    /// to `angle` degrees to either side
    Cone {
        base_width: f32,
        angle: f32,
        #[serde(default)]
        min_intensity: f32,
        max_intensity: f32,
    },
}

impl EmissionShape {
    /// Local start position and local start velocity for one particle
    pub fn sample(&self, rng: &mut dyn RandomSource) -> (Vec2, Vec2) {
        match *self {
            EmissionShape::Point => (Vec2::ZERO, Vec2::ZERO),
            EmissionShape::Line { width } => (Vec2::new(rng.spread(width), 0.0), Vec2::ZERO),
            EmissionShape::Box {
                width,
                height,
                outline: false,
            } => (rng.vec2_in((-width, width), (-height, height)), Vec2::ZERO),
            EmissionShape::Box {
                width,
                height,
                outline: true,
            } => (box_perimeter(width, height, rng), Vec2::ZERO),
            EmissionShape::Circle { radius, outline } => {
                let angle = rng.range(0.0, TAU);
                // sqrt keeps the fill uniform by area
                let dist = if outline {
                    radius
                } else {
                    radius * rng.next_f32().sqrt()
                };
                (Vec2::RIGHT.rotated(angle) * dist, Vec2::ZERO)
            }
            EmissionShape::Cone {
                base_width,
                angle,
                min_intensity,
                max_intensity,
            } => {
                let pos = Vec2::new(rng.spread(base_width), 0.0);
                let fan = rng.spread(angle.to_radians());
                let speed = rng.range(min_intensity, max_intensity);
                (pos, Vec2::new(0.0, speed).rotated(fan))
            }
        }
    }

    /// Whether sampled velocities can be non-zero
    pub fn emits_velocity(&self) -> bool {
        matches!(self, EmissionShape::Cone { .. })
    }

    /// Reject negative or non-finite parameters
    pub fn validate(&self) -> Result<()> {
        let params: Vec<(&str, f32)> = match self {
            EmissionShape::Point => Vec::new(),
            EmissionShape::Line { width } => vec![("width", *width)],
            EmissionShape::Box { width, height, .. } => vec![("width", *width), ("height", *height)],
            EmissionShape::Circle { radius, .. } => vec![("radius", *radius)],
            EmissionShape::Cone {
                base_width,
                angle,
                min_intensity,
                max_intensity,
            } => {
                if min_intensity > max_intensity {
                    return Err(EmberError::InvalidTemplate(format!(
                        "cone min_intensity {min_intensity} exceeds max_intensity {max_intensity}"
                    )));
                }
                vec![
                    ("base_width", *base_width),
                    ("angle", *angle),
                    ("min_intensity", *min_intensity),
                    ("max_intensity", *max_intensity),
                ]
            }
        };

        for (name, value) in params {
            if !value.is_finite() || value < 0.0 {
                return Err(EmberError::InvalidTemplate(format!(
                    "shape {name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Uniform point on the rectangle's edge, weighted by edge length
fn box_perimeter(width: f32, height: f32, rng: &mut dyn RandomSource) -> Vec2 {
    let perimeter = 4.0 * (width + height);
    if perimeter <= 0.0 {
        return Vec2::ZERO;
    }
    let d = rng.range(0.0, perimeter);
    let (w2, h2) = (2.0 * width, 2.0 * height);
    if d < w2 {
        Vec2::new(-width + d, -height)
    } else if d < w2 + h2 {
        Vec2::new(width, -height + (d - w2))
    } else if d < 2.0 * w2 + h2 {
        Vec2::new(width - (d - w2 - h2), height)
    } else {
        Vec2::new(-width, height - (d - 2.0 * w2 - h2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::random::seeded;

    const EPS: f32 = 1e-4;

    #[test]
    fn point_is_origin() {
        let mut rng = seeded(1);
        assert_eq!(EmissionShape::Point.sample(&mut rng), (Vec2::ZERO, Vec2::ZERO));
    }

    #[test]
    fn line_stays_on_axis() {
        let mut rng = seeded(2);
        let shape = EmissionShape::Line { width: 5.0 };
        for _ in 0..200 {
            let (p, v) = shape.sample(&mut rng);
            assert_eq!(p.y, 0.0);
            assert!(p.x.abs() <= 5.0);
            assert_eq!(v, Vec2::ZERO);
        }
    }

    #[test]
    fn box_outline_on_edges() {
        let mut rng = seeded(3);
        let shape = EmissionShape::Box {
            width: 4.0,
            height: 2.0,
            outline: true,
        };
        for _ in 0..500 {
            let (p, _) = shape.sample(&mut rng);
            let on_vertical = (p.x.abs() - 4.0).abs() < EPS && p.y.abs() <= 2.0 + EPS;
            let on_horizontal = (p.y.abs() - 2.0).abs() < EPS && p.x.abs() <= 4.0 + EPS;
            assert!(on_vertical || on_horizontal, "{p:?} not on the box edge");
        }
    }

    #[test]
    fn circle_fill_and_rim() {
        let mut rng = seeded(4);
        let rim = EmissionShape::Circle {
            radius: 3.0,
            outline: true,
        };
        let disc = EmissionShape::Circle {
            radius: 3.0,
            outline: false,
        };
        for _ in 0..200 {
            assert!((rim.sample(&mut rng).0.length() - 3.0).abs() < EPS);
            assert!(disc.sample(&mut rng).0.length() <= 3.0 + EPS);
        }
    }

    #[test]
    fn cone_launches_within_fan() {
        let mut rng = seeded(5);
        let shape = EmissionShape::Cone {
            base_width: 2.0,
            angle: 30.0,
            min_intensity: 10.0,
            max_intensity: 20.0,
        };
        assert!(shape.emits_velocity());
        for _ in 0..300 {
            let (p, v) = shape.sample(&mut rng);
            assert!(p.x.abs() <= 2.0 && p.y == 0.0);
            let speed = v.length();
            assert!((10.0 - EPS..=20.0 + EPS).contains(&speed));
            // Angle from straight up never exceeds the half-angle
            let off = v.x.atan2(v.y).abs().to_degrees();
            assert!(off <= 30.0 + 1e-3, "{off} degrees off vertical");
        }
    }

    #[test]
    fn validation() {
        assert!(EmissionShape::Circle {
            radius: -1.0,
            outline: false
        }
        .validate()
        .is_err());
        assert!(EmissionShape::Cone {
            base_width: 1.0,
            angle: 10.0,
            min_intensity: 5.0,
            max_intensity: 1.0
        }
        .validate()
        .is_err());
        assert!(EmissionShape::Line { width: f32::NAN }.validate().is_err());
        assert!(EmissionShape::Point.validate().is_ok());
    }

    #[test]
    fn parses_from_toml() {
        #[derive(Deserialize)]
        struct Holder {
            shape: EmissionShape,
        }
        let h: Holder = toml::from_str(
            r#"shape = { type = "cone", base_width = 4.0, angle = 25.0, max_intensity = 80.0 }"#,
        )
        .unwrap();
        assert_eq!(
            h.shape,
            EmissionShape::Cone {
                base_width: 4.0,
                angle: 25.0,
                min_intensity: 0.0,
                max_intensity: 80.0
            }
        );
    }
}
