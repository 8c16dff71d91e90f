//! Presentation adapter: turns drawable particles into draw calls
//!
//! The simulation never draws. A host implements [`Canvas`]; the
//! [`Presenter`] walks the registry after a frame has fully run, issues one
//! immediate command per particle grouped by draw kind, and hands every
//! batched point to the canvas as a single packed instance buffer.

use crate::components::{DestroyTag, DrawTag, Position, Rotation, Size, Tint};
use bytemuck::{Pod, Zeroable};
use ember_core::{Color, Vec2};
use ember_ecs::Registry;

/// Drawing capability supplied by the host
pub trait Canvas {
    /// Viewport changed; hosts with a projection rebuild it here
    fn resize(&mut self, _width: u32, _height: u32) {}

    /// Draw one immediate-mode particle
    fn draw(&mut self, command: &DrawCommand);

    /// Draw every batched point of the frame in one call
    fn draw_point_batch(&mut self, points: &[PointInstance]);
}

/// Everything an immediate-mode draw routine needs for one particle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub kind: DrawTag,
    pub position: Vec2,
    /// Zero for kinds drawn without a size
    pub size: Vec2,
    pub color: Color,
    /// Degrees
    pub rotation: f32,
}

impl DrawCommand {
    /// Start and end colors of a gradient rect, in drawing order
    pub fn gradient(&self) -> Option<(Color, Color)> {
        match self.kind {
            DrawTag::RectGradient {
                other, tint_first, ..
            } => Some(if tint_first {
                (self.color, other)
            } else {
                (other, self.color)
            }),
            _ => None,
        }
    }
}

/// GPU-ready point instance. 32 bytes (2 rows of vec4).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PointInstance {
    /// x, y, point size, rotation in degrees
    pub pos_size: [f32; 4],
    /// rgba in [0, 1]
    pub color: [f32; 4],
}

impl PointInstance {
    pub fn new(position: Vec2, size: f32, rotation: f32, color: Color) -> Self {
        Self {
            pos_size: [position.x, position.y, size, rotation],
            color: color.to_array(),
        }
    }
}

/// What one `present` call handed to the canvas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PresentStats {
    pub immediate: usize,
    pub batched: usize,
    /// Drawable entities skipped for lacking a `Size` their kind requires
    pub skipped: usize,
}

/// Collects draw calls; buffers are reused across frames
#[derive(Default)]
pub struct Presenter {
    commands: Vec<DrawCommand>,
    points: Vec<PointInstance>,
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw every live, drawable particle.
    ///
    /// Drawable means `DrawTag`, `Position` and `Tint`, plus `Size` for every
    /// kind except single pixels. Tagged-for-destruction particles are dead
    /// and skipped.
    pub fn present(&mut self, registry: &Registry, canvas: &mut dyn Canvas) -> PresentStats {
        self.commands.clear();
        self.points.clear();
        let mut stats = PresentStats::default();

        for (_, (kind, position, tint, size, rotation)) in registry
            .view_excluding::<(
                &DrawTag,
                &Position,
                &Tint,
                Option<&Size>,
                Option<&Rotation>,
            ), &DestroyTag>()
            .iter()
        {
            let rotation = rotation.map_or(0.0, |r| r.0);
            if kind.is_batched() {
                let point_size = size.map_or(1.0, |s| s.0.x);
                self.points
                    .push(PointInstance::new(position.0, point_size, rotation, tint.0));
                continue;
            }

            let size = match (size, kind.needs_size()) {
                (Some(size), _) => size.0,
                (None, false) => Vec2::ZERO,
                (None, true) => {
                    stats.skipped += 1;
                    continue;
                }
            };
            self.commands.push(DrawCommand {
                kind: *kind,
                position: position.0,
                size,
                color: tint.0,
                rotation,
            });
        }

        // Stable: entities keep registry order inside each kind
        self.commands.sort_by_key(|c| c.kind.order());
        for command in &self.commands {
            canvas.draw(command);
        }
        if !self.points.is_empty() {
            canvas.draw_point_batch(&self.points);
        }

        stats.immediate = self.commands.len();
        stats.batched = self.points.len();
        stats
    }

    /// The point batch from the last `present`, as raw bytes for upload
    pub fn point_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.points)
    }
}
