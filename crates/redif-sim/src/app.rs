use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

use redif_engine::coords::Viewport;
use redif_engine::core::{App, AppControl, FrameCtx};
use redif_engine::device::GpuInit;
use redif_engine::render::Texture;
use redif_engine::window::{Runtime, RuntimeConfig};

use crate::config::SimConfig;
use crate::controls::Controls;
use crate::feedback::{Feedback, FeedbackDesc};
use crate::palette::load_palette;
use crate::shaders;
use crate::view::ViewState;
use crate::SimError;

/// Interactive simulator: one window, one field, fixed ticks per frame.
///
/// ```no_run
/// use redif_sim::{SimConfig, Simulator};
///
/// Simulator::new(SimConfig::default()).run().unwrap();
/// ```
pub struct Simulator {
    config: SimConfig,
    tick_fragment: String,
    render_fragment: String,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            tick_fragment: shaders::GRAY_SCOTT_FRAGMENT.to_string(),
            render_fragment: shaders::SHADE_FRAGMENT.to_string(),
        }
    }

    /// Replaces the compute pass fragment source.
    pub fn tick_shader(mut self, source: impl Into<String>) -> Self {
        self.tick_fragment = source.into();
        self
    }

    /// Replaces the render pass fragment source.
    pub fn render_shader(mut self, source: impl Into<String>) -> Self {
        self.render_fragment = source.into();
        self
    }

    /// Opens the window and runs until it is closed or Escape is pressed.
    ///
    /// Shader and palette failures surface here as errors.
    pub fn run(self) -> Result<()> {
        let window = &self.config.window;
        let runtime = RuntimeConfig::new(
            window.title.clone(),
            f64::from(window.width),
            f64::from(window.height),
        );

        let fatal = Rc::new(RefCell::new(None));
        let app = SimApp {
            controls: Controls::new(self.config.controls.clone()),
            config: self.config,
            tick_fragment: self.tick_fragment,
            render_fragment: self.render_fragment,
            session: None,
            fatal: Rc::clone(&fatal),
        };

        Runtime::run(runtime, GpuInit::default(), app)?;

        match fatal.borrow_mut().take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// GPU state created on the first frame, once the surface size is known.
struct Session {
    feedback: Feedback,
    view: ViewState,
    _palette: Texture,
}

struct SimApp {
    config: SimConfig,
    controls: Controls,
    tick_fragment: String,
    render_fragment: String,
    session: Option<Session>,
    fatal: Rc<RefCell<Option<anyhow::Error>>>,
}

impl SimApp {
    fn start(&self, ctx: &FrameCtx<'_, '_>, size: (u32, u32)) -> Result<Session, SimError> {
        let device = ctx.gpu.device();
        let queue = ctx.gpu.queue();

        let palette = load_palette(device, queue, self.config.simulation.palette.as_deref())?;
        let feedback = Feedback::new(
            device,
            FeedbackDesc {
                size,
                tick_fragment: &self.tick_fragment,
                render_fragment: &self.render_fragment,
                surface_format: ctx.gpu.surface_format(),
            },
            &palette,
        )?;

        Ok(Session {
            feedback,
            view: ViewState::from_config(&self.config.view, size),
            _palette: palette,
        })
    }
}

impl App for SimApp {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.session.is_none() {
            let size = ctx.window.physical_size();
            if size.0 == 0 || size.1 == 0 {
                return AppControl::Continue;
            }
            match self.start(ctx, size) {
                Ok(session) => self.session = Some(session),
                Err(e) => {
                    log::error!("simulator startup failed: {e}");
                    *self.fatal.borrow_mut() =
                        Some(anyhow::Error::new(e).context("simulator startup failed"));
                    return AppControl::Exit;
                }
            }
        }
        let Some(session) = self.session.as_mut() else {
            return AppControl::Continue;
        };

        // The field keeps its first size; pointer input is rescaled onto it.
        let (lw, lh) = ctx.window.logical_size();
        let window = Viewport::new(lw, lh);
        let (fw, fh) = session.feedback.size();
        let field = Viewport::new(fw as f32, fh as f32);

        let to_field = |p| if window.is_valid() { window.map_to(p, field) } else { p };
        if self.controls.apply(&mut session.view, ctx.input, ctx.input_frame, to_field)
            == AppControl::Exit
        {
            return AppControl::Exit;
        }

        session.view.push_uniforms(&mut session.feedback);

        let ticks = self.config.simulation.ticks_per_frame;
        let feedback = &mut session.feedback;
        let control = ctx.render(wgpu::Color::BLACK, |rctx, target| {
            for _ in 0..ticks {
                feedback.tick(rctx.queue, target.encoder);
            }
            feedback.render(rctx.queue, target);
        });

        log::trace!(
            "frame {}: {:.2} ms, rate {:.3}, scale {:.5}",
            ctx.time.frame_index,
            ctx.time.dt * 1000.0,
            session.view.rate,
            session.view.scale
        );

        control
    }
}
