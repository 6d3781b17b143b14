use redif_engine::coords::Vec2;
use redif_engine::render::UniformValue;

use crate::config::ViewConfig;
use crate::feedback::Feedback;

/// Brush applied by the next tick. A radius of zero disables it.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Brush {
    /// Field pixels, origin top-left.
    pub center: Vec2,
    pub radius: f32,
    pub value: [f32; 4],
}

impl Brush {
    pub const OFF: Brush = Brush {
        center: Vec2::zero(),
        radius: 0.0,
        value: [0.0; 4],
    };

    pub fn is_active(&self) -> bool {
        self.radius > 0.0
    }
}

/// Parameter-space view of the simulation plus lighting and brush state.
///
/// Screen points are field pixels (the field has the window's physical size).
/// Simulation space is (kill, feed): `center` is the point under the middle of
/// the field, and `scale` is the distance from the middle to an edge of a
/// square of the field's geometric-mean size.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    resolution: Vec2,
    pub center: Vec2,
    pub scale: f32,
    /// Diffusion-rate multiplier; the shaders' `scale` uniform.
    pub rate: f32,
    pub brush: Brush,
    pub light_angle: f32,
    pub light_radius: f32,
    pub zoom_step: f32,
}

impl ViewState {
    pub fn new(resolution: (u32, u32)) -> Self {
        Self::from_config(&ViewConfig::default(), resolution)
    }

    pub fn from_config(config: &ViewConfig, resolution: (u32, u32)) -> Self {
        Self {
            resolution: Vec2::new(resolution.0 as f32, resolution.1 as f32),
            center: Vec2::new(config.center[0], config.center[1]),
            scale: config.scale,
            rate: config.rate,
            brush: Brush::OFF,
            light_angle: config.light_angle,
            light_radius: config.light_radius,
            zoom_step: config.zoom_step,
        }
    }

    pub fn resolution(&self) -> Vec2 {
        self.resolution
    }

    pub fn screen_to_sim(&self, p: Vec2) -> Vec2 {
        let norm = (self.resolution.x * self.resolution.y).sqrt();
        self.center + (p - self.resolution * 0.5) * (2.0 * self.scale / norm)
    }

    /// Zooms by one step keeping the simulation point under `p` fixed.
    pub fn pan_zoom(&mut self, p: Vec2, zoom_in: bool) {
        let before = self.screen_to_sim(p);
        if zoom_in {
            self.scale /= self.zoom_step;
        } else {
            self.scale *= self.zoom_step;
        }
        let after = self.screen_to_sim(p);
        self.center += before - after;
    }

    /// Places the brush at `p` (field pixels), or disables it on `None`.
    pub fn set_draw(&mut self, p: Option<Vec2>, radius: f32, value: [f32; 4]) {
        self.brush = match p {
            Some(center) => Brush { center, radius, value },
            None => Brush::OFF,
        };
    }

    pub fn adjust_rate(&mut self, factor: f32) {
        self.rate *= factor;
    }

    /// The radius never drops below zero.
    pub fn adjust_light(&mut self, angle_delta: f32, radius_delta: f32) {
        self.light_angle += angle_delta;
        self.light_radius = (self.light_radius + radius_delta).max(0.0);
    }

    pub fn light_vector(&self) -> [f32; 3] {
        [
            self.light_radius * self.light_angle.cos(),
            self.light_radius * self.light_angle.sin(),
            -1.0,
        ]
    }

    /// Simulation-space points under the top-left and bottom-right corners.
    pub fn viewport_corners(&self) -> (Vec2, Vec2) {
        (self.screen_to_sim(Vec2::zero()), self.screen_to_sim(self.resolution))
    }

    /// Writes this frame's uniforms to the compute and render programs.
    pub fn push_uniforms(&self, feedback: &mut Feedback) {
        let (start, end) = self.viewport_corners();

        let compute = feedback.compute_program_mut();
        compute.set_uniform("draw_center", UniformValue::Vec2(self.brush.center.to_array()));
        compute.set_uniform("draw_radius", UniformValue::Float(self.brush.radius));
        compute.set_uniform("draw_value", UniformValue::Vec4(self.brush.value));
        compute.set_uniform("start", UniformValue::Vec2(start.to_array()));
        compute.set_uniform("end", UniformValue::Vec2(end.to_array()));
        compute.set_uniform("scale", UniformValue::Float(self.rate));

        let render = feedback.render_program_mut();
        render.set_uniform("scale", UniformValue::Float(self.rate));
        render.set_uniform("light", UniformValue::Vec3(self.light_vector()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-6
    }

    #[test]
    fn middle_of_field_maps_to_center() {
        let view = ViewState::new((1600, 1000));
        assert!(close(view.screen_to_sim(Vec2::new(800.0, 500.0)), view.center));
    }

    #[test]
    fn screen_to_sim_scales_by_geometric_mean() {
        let mut view = ViewState::new((400, 100));
        view.center = Vec2::zero();
        view.scale = 1.0;
        // sqrt(400 * 100) = 200: a 100 px offset is one scale unit.
        assert!(close(view.screen_to_sim(Vec2::new(300.0, 50.0)), Vec2::new(1.0, 0.0)));
        assert!(close(view.screen_to_sim(Vec2::new(200.0, 150.0)), Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn zoom_keeps_anchor_fixed() {
        let mut view = ViewState::new((1600, 1000));
        let anchors = [Vec2::new(100.0, 900.0), Vec2::new(1500.0, 20.0), Vec2::new(800.0, 500.0)];
        for p in anchors {
            for zoom_in in [true, false, true, true] {
                let before = view.screen_to_sim(p);
                view.pan_zoom(p, zoom_in);
                let after = view.screen_to_sim(p);
                assert!((before - after).length() < 1e-6, "{before:?} -> {after:?}");
            }
        }
    }

    #[test]
    fn zoom_steps_scale() {
        let mut view = ViewState::new((100, 100));
        let scale = view.scale;
        view.pan_zoom(Vec2::zero(), true);
        assert!((view.scale - scale / 1.2).abs() < 1e-7);
        view.pan_zoom(Vec2::zero(), false);
        assert!((view.scale - scale).abs() < 1e-7);
    }

    #[test]
    fn corners_span_the_field() {
        let mut view = ViewState::new((200, 200));
        view.center = Vec2::new(0.05, 0.03);
        view.scale = 0.01;
        let (start, end) = view.viewport_corners();
        assert!(close(start, Vec2::new(0.04, 0.02)));
        assert!(close(end, Vec2::new(0.06, 0.04)));
    }

    #[test]
    fn light_vector_and_clamp() {
        let mut view = ViewState::new((10, 10));
        view.light_angle = 0.0;
        view.light_radius = 0.5;
        assert_eq!(view.light_vector(), [0.5, 0.0, -1.0]);

        view.adjust_light(std::f32::consts::FRAC_PI_2, -1.0);
        assert_eq!(view.light_radius, 0.0);
        let [x, y, z] = view.light_vector();
        assert_eq!((x, y, z), (0.0, 0.0, -1.0));
    }

    #[test]
    fn rate_multiplies() {
        let mut view = ViewState::new((10, 10));
        view.adjust_rate(1.1);
        view.adjust_rate(1.0 / 1.1);
        assert!((view.rate - 1.0).abs() < 1e-6);
    }

    #[test]
    fn set_draw_none_disables_brush() {
        let mut view = ViewState::new((10, 10));
        view.set_draw(Some(Vec2::new(3.0, 4.0)), 2.0, [1.0, 1.0, 0.0, 0.0]);
        assert!(view.brush.is_active());
        assert_eq!(view.brush.center, Vec2::new(3.0, 4.0));

        view.set_draw(None, 2.0, [1.0, 1.0, 0.0, 0.0]);
        assert_eq!(view.brush, Brush::OFF);
        assert!(!view.brush.is_active());
    }
}
