//! Shared particle templates
//!
//! A template describes a family of particles. Each property is either
//! absent, fixed, or a random distribution; one seed per particle samples all
//! random properties, so a particle drawn near the top of its size range is
//! also drawn near the top of its speed range.

use crate::components::DrawTag;
use crate::keyframes::{Blend, Keyframe, Keyframes};
use crate::shape::EmissionShape;
use ember_core::{Color, EmberError, Result, Vec2};
use serde::Deserialize;

/// How one templated property is produced for a new particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Property<T: Blend> {
    /// No component is attached
    Absent,
    /// Every particle gets the same value
    Fixed(T),
    /// Sampled from a distribution table at the particle's seed
    Random(Keyframes<T>),
}

impl<T: Blend> Default for Property<T> {
    fn default() -> Self {
        Property::Absent
    }
}

impl<T: Blend> Property<T> {
    /// Uniform over `[min, max]` (hue-space for colors)
    pub fn range(min: T, max: T) -> Self {
        Property::Random(Keyframes::span(min, max))
    }

    /// Value for a particle whose seed is `seed` in `[0, 1)`
    pub fn sample(&self, seed: f32) -> Option<T> {
        match self {
            Property::Absent => None,
            Property::Fixed(v) => Some(*v),
            Property::Random(table) => Some(table.evaluate(seed)),
        }
    }

    pub fn is_present(&self) -> bool {
        !matches!(self, Property::Absent)
    }

    /// Every value the property can produce lies between these
    fn candidates(&self) -> Vec<T> {
        match self {
            Property::Absent => Vec::new(),
            Property::Fixed(v) => vec![*v],
            Property::Random(table) => table.as_slice().iter().map(|k| k.value).collect(),
        }
    }
}

/// The `"none"` keyword that disables a property
#[derive(Debug, Clone, Deserialize)]
pub enum Keyword {
    #[serde(rename = "none")]
    Disabled,
}

/// TOML form of a [`Property`]. Accepted spellings:
/// `"none"`, `{ range = [min, max] }`, `{ random = [ {key, value}, .. ] }`,
/// or a bare value.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PropertySource<T> {
    Off(Keyword),
    Range { range: [T; 2] },
    Random { random: Vec<Keyframe<T>> },
    Fixed(T),
}

impl<T: Blend> PropertySource<T> {
    /// Build the property, validating any distribution table
    pub fn into_property(self) -> Result<Property<T>> {
        Ok(match self {
            PropertySource::Off(Keyword::Disabled) => Property::Absent,
            PropertySource::Range { range: [min, max] } => Property::range(min, max),
            PropertySource::Random { random } => Property::Random(Keyframes::new(&random)?),
            PropertySource::Fixed(v) => Property::Fixed(v),
        })
    }
}

/// Property values drawn for one particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleSample {
    pub lifetime: f32,
    pub velocity: Option<Vec2>,
    pub acceleration: Option<Vec2>,
    pub rotation: Option<f32>,
    pub angular_velocity: Option<f32>,
    pub angular_acceleration: Option<f32>,
    pub size: Option<Vec2>,
    pub color: Option<Color>,
}

/// Shared, read-only description of the particles an emitter produces
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleTemplate {
    pub lifetime: Property<f32>,
    pub velocity: Property<Vec2>,
    pub acceleration: Property<Vec2>,
    pub rotation: Property<f32>,
    pub angular_velocity: Property<f32>,
    pub angular_acceleration: Property<f32>,
    pub size: Property<Vec2>,
    pub color: Property<Color>,

    pub velocity_over_lifetime: Option<Keyframes<Vec2>>,
    pub size_over_lifetime: Option<Keyframes<Vec2>>,
    pub color_over_lifetime: Option<Keyframes<Color>>,
    pub rotation_over_lifetime: Option<Keyframes<f32>>,
    pub angular_velocity_over_lifetime: Option<Keyframes<f32>>,

    pub draw: DrawTag,
    pub shape: EmissionShape,
}

impl Default for ParticleTemplate {
    fn default() -> Self {
        Self {
            lifetime: Property::Fixed(1.0),
            velocity: Property::Fixed(Vec2::ZERO),
            acceleration: Property::Absent,
            rotation: Property::Absent,
            angular_velocity: Property::Absent,
            angular_acceleration: Property::Absent,
            size: Property::Fixed(Vec2::splat(10.0)),
            color: Property::Fixed(Color::PINK),
            velocity_over_lifetime: None,
            size_over_lifetime: None,
            color_over_lifetime: None,
            rotation_over_lifetime: None,
            angular_velocity_over_lifetime: None,
            draw: DrawTag::Point,
            shape: EmissionShape::Point,
        }
    }
}

/// TOML form of a [`ParticleTemplate`].
///
/// Keyframe tables stay plain lists here; converting to a template runs
/// every table through [`Keyframes::new`], so a bad table surfaces as
/// `InvalidKeyframeTable` rather than a parse error. Omitted properties
/// keep the template defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplateSource {
    pub lifetime: Option<PropertySource<f32>>,
    pub velocity: Option<PropertySource<Vec2>>,
    pub acceleration: Option<PropertySource<Vec2>>,
    pub rotation: Option<PropertySource<f32>>,
    pub angular_velocity: Option<PropertySource<f32>>,
    pub angular_acceleration: Option<PropertySource<f32>>,
    pub size: Option<PropertySource<Vec2>>,
    pub color: Option<PropertySource<Color>>,

    pub velocity_over_lifetime: Option<Vec<Keyframe<Vec2>>>,
    pub size_over_lifetime: Option<Vec<Keyframe<Vec2>>>,
    pub color_over_lifetime: Option<Vec<Keyframe<Color>>>,
    pub rotation_over_lifetime: Option<Vec<Keyframe<f32>>>,
    pub angular_velocity_over_lifetime: Option<Vec<Keyframe<f32>>>,

    pub draw: DrawTag,
    pub shape: EmissionShape,
}

fn property<T: Blend>(source: Option<PropertySource<T>>, default: Property<T>) -> Result<Property<T>> {
    source.map_or(Ok(default), PropertySource::into_property)
}

fn table<T: Blend>(frames: Option<Vec<Keyframe<T>>>) -> Result<Option<Keyframes<T>>> {
    frames.map(|f| Keyframes::new(&f)).transpose()
}

impl TryFrom<TemplateSource> for ParticleTemplate {
    type Error = EmberError;

    fn try_from(source: TemplateSource) -> Result<Self> {
        let defaults = Self::default();
        let template = Self {
            lifetime: property(source.lifetime, defaults.lifetime)?,
            velocity: property(source.velocity, defaults.velocity)?,
            acceleration: property(source.acceleration, defaults.acceleration)?,
            rotation: property(source.rotation, defaults.rotation)?,
            angular_velocity: property(source.angular_velocity, defaults.angular_velocity)?,
            angular_acceleration: property(
                source.angular_acceleration,
                defaults.angular_acceleration,
            )?,
            size: property(source.size, defaults.size)?,
            color: property(source.color, defaults.color)?,
            velocity_over_lifetime: table(source.velocity_over_lifetime)?,
            size_over_lifetime: table(source.size_over_lifetime)?,
            color_over_lifetime: table(source.color_over_lifetime)?,
            rotation_over_lifetime: table(source.rotation_over_lifetime)?,
            angular_velocity_over_lifetime: table(source.angular_velocity_over_lifetime)?,
            draw: source.draw,
            shape: source.shape,
        };
        template.validate()?;
        Ok(template)
    }
}

impl ParticleTemplate {
    /// Parse and validate a template from TOML
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let source: TemplateSource = toml::from_str(source)?;
        Self::try_from(source)
    }

    /// Check everything keyframe construction can't: lifetime present and
    /// positive, sane shape and draw parameters.
    pub fn validate(&self) -> Result<()> {
        let lifetimes = self.lifetime.candidates();
        if lifetimes.is_empty() {
            return Err(EmberError::InvalidTemplate("lifetime is required".into()));
        }
        if let Some(bad) = lifetimes.iter().find(|l| !(l.is_finite() && **l > 0.0)) {
            return Err(EmberError::InvalidTemplate(format!(
                "lifetime must be positive, got {bad}"
            )));
        }

        self.shape.validate()?;

        match self.draw {
            DrawTag::Ring { segments: 0, .. } | DrawTag::RoundedRect { segments: 0, .. } => {
                return Err(EmberError::InvalidTemplate(
                    "draw segments must be at least 1".into(),
                ));
            }
            DrawTag::RoundedRect { roundness, .. } if !(0.0..=1.0).contains(&roundness) => {
                return Err(EmberError::InvalidTemplate(format!(
                    "roundness must lie in [0, 1], got {roundness}"
                )));
            }
            _ => {}
        }
        Ok(())
    }

    /// Draw every property for the particle whose seed is `seed`.
    ///
    /// A template without a lifetime can't produce particles and fails with
    /// `InvalidTemplate`.
    pub fn sample(&self, seed: f32) -> Result<ParticleSample> {
        let lifetime = self
            .lifetime
            .sample(seed)
            .ok_or_else(|| EmberError::InvalidTemplate("lifetime is required".into()))?;
        Ok(ParticleSample {
            lifetime,
            velocity: self.velocity.sample(seed),
            acceleration: self.acceleration.sample(seed),
            rotation: self.rotation.sample(seed),
            angular_velocity: self.angular_velocity.sample(seed),
            angular_acceleration: self.angular_acceleration.sample(seed),
            size: self.size.sample(seed),
            color: self.color.sample(seed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let t = ParticleTemplate::default();
        t.validate().unwrap();
        let s = t.sample(0.3).unwrap();
        assert_eq!(s.lifetime, 1.0);
        assert_eq!(s.velocity, Some(Vec2::ZERO));
        assert_eq!(s.acceleration, None);
        assert_eq!(s.color, Some(Color::PINK));
    }

    #[test]
    fn random_properties_share_the_seed() {
        let t = ParticleTemplate {
            lifetime: Property::range(1.0, 3.0),
            size: Property::range(Vec2::splat(2.0), Vec2::splat(4.0)),
            ..Default::default()
        };
        let lo = t.sample(0.0).unwrap();
        let hi = t.sample(0.99).unwrap();
        assert_eq!(lo.lifetime, 1.0);
        assert_eq!(lo.size, Some(Vec2::splat(2.0)));
        assert!(hi.lifetime > 2.9);
        assert!(hi.size.unwrap().x > 3.9);
    }

    #[test]
    fn parses_full_template() {
        let t = ParticleTemplate::from_toml_str(
            r#"
lifetime = { range = [0.5, 1.5] }
velocity = [0, -40]
acceleration = { range = [[0, 10], [0, 30]] }
rotation = 45
size = "none"
color = [255, 128, 0, 255]
color_over_lifetime = [
    { key = 0.0, value = [255, 255, 0, 255] },
    { key = 0.5, value = [255, 0, 0, 200] },
    { key = 1.0, value = [64, 0, 0, 0] },
]
draw = { kind = "circle" }
shape = { type = "circle", radius = 20.0, outline = true }
"#,
        )
        .unwrap();

        assert!(matches!(t.lifetime, Property::Random(_)));
        assert_eq!(t.velocity, Property::Fixed(Vec2::new(0.0, -40.0)));
        assert!(matches!(t.acceleration, Property::Random(_)));
        assert_eq!(t.rotation, Property::Fixed(45.0));
        assert_eq!(t.size, Property::Absent);
        assert_eq!(t.color_over_lifetime.map(|k| k.len()), Some(3));
        assert_eq!(t.draw, DrawTag::Circle);
        assert_eq!(
            t.shape,
            EmissionShape::Circle {
                radius: 20.0,
                outline: true
            }
        );
    }

    #[test]
    fn random_table_form() {
        let t = ParticleTemplate::from_toml_str(
            r#"
angular_velocity = { random = [ { key = 0.0, value = -90.0 }, { key = 1.0, value = 90.0 } ] }
"#,
        )
        .unwrap();
        assert_eq!(t.sample(0.5).unwrap().angular_velocity, Some(0.0));
    }

    #[test]
    fn rejects_missing_or_bad_lifetime() {
        let err = ParticleTemplate::from_toml_str(r#"lifetime = "none""#).unwrap_err();
        assert!(matches!(err, EmberError::InvalidTemplate(_)));

        let err = ParticleTemplate::from_toml_str("lifetime = -1.0").unwrap_err();
        assert!(matches!(err, EmberError::InvalidTemplate(_)));

        let err = ParticleTemplate::from_toml_str("lifetime = { range = [0.0, 2.0] }").unwrap_err();
        assert!(matches!(err, EmberError::InvalidTemplate(_)));
    }

    #[test]
    fn rejects_bad_keyframes_before_spawning() {
        let err = ParticleTemplate::from_toml_str(
            r#"size_over_lifetime = [ { key = 1.0, value = [1, 1] }, { key = 0.0, value = [2, 2] } ]"#,
        )
        .unwrap_err();
        assert!(matches!(err, EmberError::InvalidKeyframeTable(_)), "{err:?}");

        let err = ParticleTemplate::from_toml_str(
            r#"color = { random = [ { key = 0.0, value = [255, 0, 0, 255] } ] }"#,
        )
        .unwrap_err();
        assert!(matches!(err, EmberError::InvalidKeyframeTable(_)), "{err:?}");

        // Malformed TOML is still a parse error
        let err = ParticleTemplate::from_toml_str("size_over_lifetime = [").unwrap_err();
        assert!(matches!(err, EmberError::TomlParseError(_)));
    }

    #[test]
    fn omitted_properties_keep_defaults() {
        let t = ParticleTemplate::from_toml_str(r#"draw = { kind = "rect" }"#).unwrap();
        let defaults = ParticleTemplate::default();
        assert_eq!(t.lifetime, defaults.lifetime);
        assert_eq!(t.size, defaults.size);
        assert_eq!(t.color, defaults.color);
        assert_eq!(t.draw, DrawTag::Rect);
    }

    #[test]
    fn sampling_without_lifetime_is_an_error() {
        let t = ParticleTemplate {
            lifetime: Property::Absent,
            ..Default::default()
        };
        let err = t.sample(0.5).unwrap_err();
        assert!(matches!(err, EmberError::InvalidTemplate(_)));
    }

    #[test]
    fn rejects_unknown_fields_and_bad_shapes() {
        assert!(ParticleTemplate::from_toml_str("colour = [1, 2, 3, 4]").is_err());

        let err = ParticleTemplate::from_toml_str(r#"shape = { type = "line", width = -3.0 }"#)
            .unwrap_err();
        assert!(matches!(err, EmberError::InvalidTemplate(_)));

        let err =
            ParticleTemplate::from_toml_str(r#"draw = { kind = "rounded_rect", roundness = 2.0 }"#)
                .unwrap_err();
        assert!(matches!(err, EmberError::InvalidTemplate(_)));
    }
}
