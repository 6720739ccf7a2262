use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::decor::Decor;
use crate::editor::background::Color;
use crate::editor::EditorSession;
use crate::math::bounds::{AABB, BOX_EDGES};

pub const OUTLINE_COLOR: Color = Color {
    r: 1.0,
    g: 1.0,
    b: 0.0,
};
const STAR_HALF_SIZE: f32 = 15.0;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable, PartialEq)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl LineVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Vertex list for a line-list pipeline, two vertices per segment.
#[derive(Debug, Default)]
pub struct LineBatch {
    vertices: Vec<LineVertex>,
}

impl LineBatch {
    pub fn push_line(&mut self, start: Vec3, end: Vec3, color: Color) {
        let color = color.to_linear();
        self.vertices.push(LineVertex {
            position: start.to_array(),
            color,
        });
        self.vertices.push(LineVertex {
            position: end.to_array(),
            color,
        });
    }

    pub fn push_box(&mut self, bounds: &AABB, transform: &Mat4, color: Color) {
        let corners = bounds.corners().map(|corner| transform.transform_point3(corner));
        for (a, b) in BOX_EDGES {
            self.push_line(corners[a], corners[b], color);
        }
    }

    pub fn push_cross(&mut self, center: Vec3, half_size: f32, color: Color) {
        for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            self.push_line(center - axis * half_size, center + axis * half_size, color);
        }
    }

    pub fn vertices(&self) -> &[LineVertex] {
        &self.vertices
    }

    pub fn segment_count(&self) -> usize {
        self.vertices.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Everything the line pass draws this frame.
pub fn build_frame_lines(session: &EditorSession, decor: &Decor, show_outline: bool) -> LineBatch {
    let mut batch = LineBatch::default();
    let view = &session.view;

    if view.grid_visible {
        for line in &decor.grid {
            batch.push_line(line.start, line.end, line.color);
        }
    }

    if view.starfield_visible {
        for &star in &decor.stars {
            batch.push_cross(star, STAR_HALF_SIZE, view.star_color);
        }
    }

    if show_outline {
        if let Some(bounds) = session.outline().and_then(|outline| outline.bounds) {
            batch.push_box(&bounds, &Mat4::IDENTITY, OUTLINE_COLOR);
        }
    }

    batch
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::assets::ModelNode;
    use crate::config::SandboxConfig;

    fn session_with_planet() -> EditorSession {
        let mut session =
            EditorSession::with_rng(SandboxConfig::default(), StdRng::seed_from_u64(5));
        let model = ModelNode::mesh("Moon", AABB::new(Vec3::splat(-1.0), Vec3::splat(1.0)));
        session.place_model(&model);
        session
    }

    fn empty_decor() -> Decor {
        Decor {
            stars: vec![Vec3::ZERO],
            grid: Vec::new(),
        }
    }

    #[test]
    fn outline_is_optional() {
        let session = session_with_planet();
        let decor = empty_decor();

        let with_outline = build_frame_lines(&session, &decor, true);
        let without_outline = build_frame_lines(&session, &decor, false);

        // One star cross, plus the outline box
        assert_eq!(without_outline.segment_count(), 3);
        assert_eq!(with_outline.segment_count(), 3 + 12);
    }

    #[test]
    fn hidden_decor_is_skipped() {
        let mut session = session_with_planet();
        session.view.starfield_visible = false;
        session.view.grid_visible = false;

        // Placed models are drawn by the mesh pass, not as wireframes
        let batch = build_frame_lines(&session, &empty_decor(), false);
        assert!(batch.is_empty());
    }

    #[test]
    fn stars_use_contrast_color() {
        let mut session = session_with_planet();
        session.set_background(Color::WHITE);

        let batch = build_frame_lines(&session, &empty_decor(), false);
        let star_vertex = batch.vertices()[0];
        assert_eq!(star_vertex.color, [0.0, 0.0, 0.0]);
    }
}
