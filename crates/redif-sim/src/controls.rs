use redif_engine::coords::Vec2;
use redif_engine::core::AppControl;
use redif_engine::input::{InputFrame, InputState, Key, MouseButton};

use crate::config::ControlsConfig;
use crate::view::ViewState;

/// Maps window input to [`ViewState`] changes.
///
/// | input                 | effect                                  |
/// |-----------------------|-----------------------------------------|
/// | wheel up / down       | zoom in / out around the pointer        |
/// | left button held      | draw brush under the pointer            |
/// | right button held     | erase brush under the pointer           |
/// | ArrowUp / ArrowDown   | rate times / divided by `rate_step`     |
/// | W / S held            | light radius up / down                  |
/// | A / D held            | light angle up / down                   |
/// | Escape                | exit                                    |
#[derive(Debug, Clone, Default)]
pub struct Controls {
    config: ControlsConfig,
}

impl Controls {
    pub fn new(config: ControlsConfig) -> Self {
        Self { config }
    }

    /// Applies one frame of input.
    ///
    /// `to_field` converts a pointer position (logical window pixels) to field
    /// pixels. Without a pointer, zooming anchors at the field center and the
    /// brush is off.
    pub fn apply(
        &self,
        view: &mut ViewState,
        input: &InputState,
        frame: &InputFrame,
        to_field: impl Fn(Vec2) -> Vec2,
    ) -> AppControl {
        if frame.key_pressed(Key::Escape) {
            return AppControl::Exit;
        }

        let pointer = input.pointer_pos.map(|(x, y)| to_field(Vec2::new(x, y)));

        let anchor = pointer.unwrap_or(view.resolution() * 0.5);
        for step in frame.wheel_steps() {
            if step > 0.0 {
                view.pan_zoom(anchor, true);
            } else if step < 0.0 {
                view.pan_zoom(anchor, false);
            }
        }

        if frame.key_pressed(Key::ArrowUp) {
            view.adjust_rate(self.config.rate_step);
        }
        if frame.key_pressed(Key::ArrowDown) {
            view.adjust_rate(1.0 / self.config.rate_step);
        }

        let mut radius_delta = 0.0;
        let mut angle_delta = 0.0;
        if input.key_down(Key::W) {
            radius_delta += self.config.light_radius_step;
        }
        if input.key_down(Key::S) {
            radius_delta -= self.config.light_radius_step;
        }
        if input.key_down(Key::A) {
            angle_delta += self.config.light_angle_step;
        }
        if input.key_down(Key::D) {
            angle_delta -= self.config.light_angle_step;
        }
        if radius_delta != 0.0 || angle_delta != 0.0 {
            view.adjust_light(angle_delta, radius_delta);
        }

        let preset = if input.button_down(MouseButton::Left) {
            Some(self.config.draw)
        } else if input.button_down(MouseButton::Right) {
            Some(self.config.erase)
        } else {
            None
        };
        match preset {
            Some(p) => view.set_draw(pointer, p.radius, p.value),
            None => view.set_draw(None, 0.0, [0.0; 4]),
        }

        AppControl::Continue
    }
}
