//! WGSL sources of the feedback programs.
//!
//! Every fragment source is composed after [`FULLSCREEN_VERTEX`] and may use
//! its `VertexOutput` struct (`uv_pos`, origin top-left).

use redif_engine::render::ProgramSource;

pub const FULLSCREEN_VERTEX: &str = include_str!("fullscreen.wgsl");

/// Loop pass: samples `tex` and writes it out unchanged.
pub const IDENTITY_FRAGMENT: &str = include_str!("identity.wgsl");

/// Default compute pass: Gray-Scott step with brush override.
pub const GRAY_SCOTT_FRAGMENT: &str = include_str!("gray_scott.wgsl");

/// Default render pass: height-lit palette lookup.
pub const SHADE_FRAGMENT: &str = include_str!("shade.wgsl");

/// Pairs a fragment source with the shared vertex stage.
pub fn program<'a>(label: &'a str, fragment: &'a str) -> ProgramSource<'a> {
    ProgramSource {
        label,
        vertex: FULLSCREEN_VERTEX,
        geometry: None,
        fragment,
    }
}

#[cfg(test)]
mod tests {
    use redif_engine::render::{ProgramLayout, UniformShape};

    use super::*;

    fn reflect(label: &str, fragment: &str) -> ProgramLayout {
        match ProgramLayout::reflect(&program(label, fragment)) {
            Ok(layout) => layout,
            Err(e) => panic!("{e}"),
        }
    }

    fn shape(layout: &ProgramLayout, name: &str) -> Option<UniformShape> {
        layout.uniform(name).map(|(_, m)| m.shape)
    }

    #[test]
    fn identity_samples_tex_only() {
        let layout = reflect("loop", IDENTITY_FRAGMENT);
        assert_eq!(layout.textures().len(), 1);
        assert!(layout.texture_slot("tex").is_some());
        assert!(layout.uniform_blocks().is_empty());
        let inputs: Vec<_> = layout.vertex_inputs().iter().map(|v| v.name.as_str()).collect();
        assert_eq!(inputs, ["scr_pos", "vert_uv_pos"]);
    }

    #[test]
    fn gray_scott_exposes_the_tick_uniforms() {
        let layout = reflect("compute", GRAY_SCOTT_FRAGMENT);
        assert!(layout.texture_slot("tex").is_some());
        assert_eq!(shape(&layout, "size"), Some(UniformShape::Vec2));
        assert_eq!(shape(&layout, "draw_center"), Some(UniformShape::Vec2));
        assert_eq!(shape(&layout, "draw_radius"), Some(UniformShape::Float));
        assert_eq!(shape(&layout, "draw_value"), Some(UniformShape::Vec4));
        assert_eq!(shape(&layout, "start"), Some(UniformShape::Vec2));
        assert_eq!(shape(&layout, "end"), Some(UniformShape::Vec2));
        assert_eq!(shape(&layout, "scale"), Some(UniformShape::Float));
        assert_eq!(shape(&layout, "light"), None);
    }

    #[test]
    fn shade_exposes_the_render_uniforms() {
        let layout = reflect("render", SHADE_FRAGMENT);
        assert!(layout.texture_slot("tex").is_some());
        assert!(layout.texture_slot("pal").is_some());
        assert_eq!(shape(&layout, "size"), Some(UniformShape::Vec2));
        assert_eq!(shape(&layout, "scale"), Some(UniformShape::Float));
        assert_eq!(shape(&layout, "light"), Some(UniformShape::Vec3));
        assert_eq!(shape(&layout, "draw_radius"), None);
    }
}
