use redif_engine::render::{
    Program, ProgramError, ProgramSource, Quad, RenderTarget, Texture, TextureTarget, UniformValue,
};

use crate::field::Field;
use crate::shaders;
use crate::SimError;

/// Selects one of the two field textures.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Buffer {
    /// Current state; written by the compute pass, read by render.
    Data,
    /// Copy of the previous state; read by the compute pass.
    Loop,
}

/// Construction parameters for [`Feedback`].
#[derive(Debug, Copy, Clone)]
pub struct FeedbackDesc<'a> {
    /// Field size in texels; both components must be non-zero.
    pub size: (u32, u32),
    /// Fragment source of the compute pass.
    pub tick_fragment: &'a str,
    /// Fragment source of the on-screen pass.
    pub render_fragment: &'a str,
    /// Format of the surface the render pass draws into.
    pub surface_format: wgpu::TextureFormat,
}

impl<'a> FeedbackDesc<'a> {
    /// Gray-Scott step and lit palette rendering.
    pub fn gray_scott(size: (u32, u32), surface_format: wgpu::TextureFormat) -> Self {
        Self {
            size,
            tick_fragment: shaders::GRAY_SCOTT_FRAGMENT,
            render_fragment: shaders::SHADE_FRAGMENT,
            surface_format,
        }
    }
}

/// A program with the full-screen quad built against its inputs.
struct Pass {
    program: Program,
    quad: Quad,
}

impl Pass {
    fn new(
        device: &wgpu::Device,
        source: &ProgramSource<'_>,
        format: wgpu::TextureFormat,
    ) -> Result<Self, ProgramError> {
        let program = Program::new(device, source, format)?;
        let quad = Quad::fullscreen(device, &program)?;
        Ok(Self { program, quad })
    }

    fn draw(
        &mut self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) {
        self.program.draw(queue, encoder, view, &self.quad);
    }
}

/// Ping-pong feedback loop over a two-channel field.
///
/// Each [`tick`](Feedback::tick) records two passes: *loop* copies "data"
/// into "loop", then *compute* reads "loop" and writes the next state into
/// "data". No pass samples the texture it writes. [`render`](Feedback::render)
/// samples "data" and the palette and never changes state.
pub struct Feedback {
    size: (u32, u32),
    data: TextureTarget,
    looped: TextureTarget,

    loop_pass: Pass,
    compute: Pass,
    render: Pass,
}

impl Feedback {
    /// Allocates both field textures (zeroed) and builds the three programs.
    ///
    /// `tex` is bound to "data" for loop and render and to "loop" for compute;
    /// `pal` is bound to `palette`; `size` is set on compute and render. The
    /// rate starts at 1 and the brush off, so ticking before any per-frame
    /// uniforms are pushed is a plain step with zero feed and kill.
    pub fn new(
        device: &wgpu::Device,
        desc: FeedbackDesc<'_>,
        palette: &Texture,
    ) -> Result<Self, ProgramError> {
        let (width, height) = desc.size;

        let data = TextureTarget::new(device, "redif data", width, height);
        let looped = TextureTarget::new(device, "redif loop", width, height);
        let field_format = data.texture().format();

        let mut loop_pass = Pass::new(
            device,
            &shaders::program("loop", shaders::IDENTITY_FRAGMENT),
            field_format,
        )?;
        let mut compute = Pass::new(
            device,
            &shaders::program("compute", desc.tick_fragment),
            field_format,
        )?;
        let mut render = Pass::new(
            device,
            &shaders::program("render", desc.render_fragment),
            desc.surface_format,
        )?;

        let size = UniformValue::Vec2([width as f32, height as f32]);

        loop_pass.program.set_uniform("tex", UniformValue::Texture(data.texture()));

        compute.program.set_uniform("tex", UniformValue::Texture(looped.texture()));
        compute.program.set_uniform("size", size);
        compute.program.set_uniform("scale", UniformValue::Float(1.0));
        compute.program.set_uniform("draw_radius", UniformValue::Float(0.0));

        render.program.set_uniform("tex", UniformValue::Texture(data.texture()));
        render.program.set_uniform("pal", UniformValue::Texture(palette));
        render.program.set_uniform("size", size);
        render.program.set_uniform("scale", UniformValue::Float(1.0));

        log::info!("feedback pipeline ready: {width}x{height} field");

        Ok(Self {
            size: desc.size,
            data,
            looped,
            loop_pass,
            compute,
            render,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// The compute program, for per-frame uniforms.
    pub fn compute_program_mut(&mut self) -> &mut Program {
        &mut self.compute.program
    }

    /// The render program, for per-frame uniforms.
    pub fn render_program_mut(&mut self) -> &mut Program {
        &mut self.render.program
    }

    /// Records one simulation step into `encoder`.
    pub fn tick(&mut self, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder) {
        self.loop_pass.draw(queue, encoder, self.looped.view());
        self.compute.draw(queue, encoder, self.data.view());
    }

    /// Draws the current state into the frame's surface view.
    pub fn render(&mut self, queue: &wgpu::Queue, target: &mut RenderTarget<'_>) {
        self.render.draw(queue, target.encoder, target.color_view);
    }

    /// Draws the current state into `view`, which must have the surface format.
    pub fn render_to(
        &mut self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
    ) {
        self.render.draw(queue, encoder, view);
    }

    /// Seeds both textures with `field`.
    pub fn upload(&self, queue: &wgpu::Queue, field: &Field) -> Result<(), SimError> {
        if field.size() != self.size {
            return Err(SimError::FieldSize {
                expected: self.size,
                actual: field.size(),
            });
        }
        self.data.texture().write_texels(queue, field.texels())?;
        self.looped.texture().write_texels(queue, field.texels())?;
        Ok(())
    }

    /// Resets both textures to zero.
    pub fn clear(&self, queue: &wgpu::Queue) -> Result<(), SimError> {
        let (width, height) = self.size;
        self.upload(queue, &Field::zeros(width, height))
    }

    /// Copies one texture back to the host, waiting for pending GPU work.
    pub fn read_back(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        buffer: Buffer,
    ) -> Result<Field, SimError> {
        let target = match buffer {
            Buffer::Data => &self.data,
            Buffer::Loop => &self.looped,
        };
        let (width, height) = self.size;
        let texels = target.texture().read_texels(device, queue)?;
        Ok(Field::from_texels(width, height, texels)?)
    }
}

#[cfg(test)]
mod tests {
    use redif_engine::device::HeadlessGpu;
    use redif_engine::render::Filter;

    use super::*;
    use crate::field::texel_in_disc;

    const FIELD_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

    fn gpu() -> Option<HeadlessGpu> {
        let gpu = HeadlessGpu::try_default();
        if gpu.is_none() {
            eprintln!("no GPU adapter; skipping");
        }
        gpu
    }

    fn white_palette(gpu: &HeadlessGpu) -> Texture {
        Texture::from_rgba8(
            gpu.device(),
            gpu.queue(),
            "test palette",
            1,
            1,
            &[255, 255, 255, 255],
            Filter::Linear,
        )
        .unwrap()
    }

    fn feedback(gpu: &HeadlessGpu, desc: FeedbackDesc<'_>) -> Feedback {
        let palette = white_palette(gpu);
        match Feedback::new(gpu.device(), desc, &palette) {
            Ok(fb) => fb,
            Err(e) => panic!("{e}"),
        }
    }

    /// Constant feed/kill over the whole field, rate 1, brush off.
    fn set_constant_params(fb: &mut Feedback, kill: f32, feed: f32) {
        let p = fb.compute_program_mut();
        assert!(p.set_uniform("start", UniformValue::Vec2([kill, feed])));
        assert!(p.set_uniform("end", UniformValue::Vec2([kill, feed])));
        assert!(p.set_uniform("scale", UniformValue::Float(1.0)));
        assert!(p.set_uniform("draw_radius", UniformValue::Float(0.0)));
    }

    fn set_brush(fb: &mut Feedback, center: (f32, f32), radius: f32, value: [f32; 4]) {
        let p = fb.compute_program_mut();
        assert!(p.set_uniform("draw_center", UniformValue::Vec2([center.0, center.1])));
        assert!(p.set_uniform("draw_radius", UniformValue::Float(radius)));
        assert!(p.set_uniform("draw_value", UniformValue::Vec4(value)));
    }

    fn tick_n(gpu: &HeadlessGpu, fb: &mut Feedback, n: usize) {
        gpu.submit_with("test ticks", |encoder| {
            for _ in 0..n {
                fb.tick(gpu.queue(), encoder);
            }
        });
    }

    fn read(gpu: &HeadlessGpu, fb: &Feedback, buffer: Buffer) -> Field {
        fb.read_back(gpu.device(), gpu.queue(), buffer).unwrap()
    }

    /// Values exactly representable in half precision.
    fn seeded(width: u32, height: u32) -> Field {
        let mut field = Field::zeros(width, height);
        for y in 0..height {
            for x in 0..width {
                let a = if (x + y) % 2 == 0 { 0.5 } else { 0.25 };
                field.set(x, y, [a, 0.125, 0.0, 0.0]);
            }
        }
        field.fill_disc((8.0, 8.0), 3.0, [1.0, 1.0, 0.0, 0.0]);
        field
    }

    #[test]
    fn identity_compute_keeps_both_buffers_equal_to_input() {
        let Some(gpu) = gpu() else { return };
        let desc = FeedbackDesc {
            tick_fragment: shaders::IDENTITY_FRAGMENT,
            ..FeedbackDesc::gray_scott((16, 16), FIELD_FORMAT)
        };
        let mut fb = feedback(&gpu, desc);
        let input = seeded(16, 16);
        fb.upload(gpu.queue(), &input).unwrap();

        tick_n(&gpu, &mut fb, 1);

        assert_eq!(read(&gpu, &fb, Buffer::Loop), input);
        assert_eq!(read(&gpu, &fb, Buffer::Data), input);
    }

    #[test]
    fn loop_holds_the_state_before_the_tick() {
        let Some(gpu) = gpu() else { return };
        let mut fb = feedback(&gpu, FeedbackDesc::gray_scott((16, 16), FIELD_FORMAT));
        set_constant_params(&mut fb, 0.06, 0.03);
        fb.upload(gpu.queue(), &seeded(16, 16)).unwrap();

        tick_n(&gpu, &mut fb, 1);
        let before = read(&gpu, &fb, Buffer::Data);
        tick_n(&gpu, &mut fb, 1);

        assert_eq!(read(&gpu, &fb, Buffer::Loop), before);
        assert!(read(&gpu, &fb, Buffer::Data).max_abs_diff(&before) > 1e-3);
    }

    #[test]
    fn tick_before_any_uniforms_is_a_plain_step() {
        let Some(gpu) = gpu() else { return };
        let mut fb = feedback(&gpu, FeedbackDesc::gray_scott((8, 8), FIELD_FORMAT));
        // Flat A with no B: zero Laplacian and reaction, so nothing moves.
        let input = Field::filled(8, 8, [0.5, 0.0, 0.0, 0.0]);
        fb.upload(gpu.queue(), &input).unwrap();

        tick_n(&gpu, &mut fb, 1);

        let out = read(&gpu, &fb, Buffer::Data);
        assert!(out.texels().iter().all(|t| t.iter().all(|c| c.is_finite())));
        assert_eq!(out, input);
    }

    #[test]
    fn channels_stay_clamped() {
        let Some(gpu) = gpu() else { return };
        let mut fb = feedback(&gpu, FeedbackDesc::gray_scott((8, 8), FIELD_FORMAT));
        set_constant_params(&mut fb, 0.0, 0.0);
        fb.upload(gpu.queue(), &Field::filled(8, 8, [1.0, 1.0, 0.0, 0.0])).unwrap();

        tick_n(&gpu, &mut fb, 1);

        // Unclamped, B would reach 2 and A would drop to 0.
        for t in read(&gpu, &fb, Buffer::Data).texels() {
            assert!((0.0..=1.0).contains(&t[0]) && (0.0..=1.0).contains(&t[1]), "{t:?}");
            assert!(t[0].abs() < 1e-3);
            assert_eq!(t[1], 1.0);
        }
    }

    #[test]
    fn brush_on_zero_field_writes_disc_and_feeds_elsewhere() {
        let Some(gpu) = gpu() else { return };
        let (kill, feed) = (0.05, 0.03);
        let mut fb = feedback(&gpu, FeedbackDesc::gray_scott((100, 100), FIELD_FORMAT));
        set_constant_params(&mut fb, kill, feed);
        set_brush(&mut fb, (50.0, 50.0), 5.0, [1.0, 1.0, 0.0, 0.0]);
        fb.clear(gpu.queue()).unwrap();

        tick_n(&gpu, &mut fb, 1);
        let out = read(&gpu, &fb, Buffer::Data);

        for y in 0..100 {
            for x in 0..100 {
                let t = out.get(x, y);
                if texel_in_disc(x, y, (50.0, 50.0), 5.0) {
                    assert_eq!(t, [1.0, 1.0, 0.0, 0.0], "inside at ({x},{y})");
                } else if !texel_in_disc(x, y, (50.0, 50.0), 7.0) {
                    // A' = d * feed with d = 1 on an all-zero neighborhood.
                    assert!((t[0] - feed).abs() < 1e-3, "A at ({x},{y}) = {}", t[0]);
                    assert_eq!(t[1], 0.0, "B at ({x},{y})");
                }
            }
        }
    }

    #[test]
    fn brush_overrides_prior_state() {
        let Some(gpu) = gpu() else { return };
        let mut fb = feedback(&gpu, FeedbackDesc::gray_scott((32, 32), FIELD_FORMAT));
        set_constant_params(&mut fb, 0.06, 0.03);
        fb.upload(gpu.queue(), &seeded(32, 32)).unwrap();
        set_brush(&mut fb, (10.0, 20.0), 4.0, [0.0, 0.5, 0.0, 0.0]);

        tick_n(&gpu, &mut fb, 1);
        let out = read(&gpu, &fb, Buffer::Data);

        let mut inside = 0;
        for y in 0..32 {
            for x in 0..32 {
                if texel_in_disc(x, y, (10.0, 20.0), 4.0) {
                    inside += 1;
                    assert_eq!(out.get(x, y), [0.0, 0.5, 0.0, 0.0]);
                }
            }
        }
        assert!(inside > 40);
    }

    #[test]
    fn ticks_and_render_are_deterministic() {
        let Some(gpu) = gpu() else { return };

        let run = || {
            let mut fb = feedback(&gpu, FeedbackDesc::gray_scott((24, 24), FIELD_FORMAT));
            set_constant_params(&mut fb, 0.062, 0.035);
            let r = fb.render_program_mut();
            assert!(r.set_uniform("scale", UniformValue::Float(1.0)));
            assert!(r.set_uniform("light", UniformValue::Vec3([0.3, 0.4, -1.0])));
            fb.upload(gpu.queue(), &seeded(24, 24)).unwrap();

            let screen = TextureTarget::new(gpu.device(), "test screen", 24, 24);
            gpu.submit_with("test frame", |encoder| {
                for _ in 0..5 {
                    fb.tick(gpu.queue(), encoder);
                }
                fb.render_to(gpu.queue(), encoder, screen.view());
            });

            let state = read(&gpu, &fb, Buffer::Data);
            let pixels = screen.texture().read_texels(gpu.device(), gpu.queue()).unwrap();
            (state, pixels)
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn render_leaves_state_untouched() {
        let Some(gpu) = gpu() else { return };
        let mut fb = feedback(&gpu, FeedbackDesc::gray_scott((16, 16), FIELD_FORMAT));
        let r = fb.render_program_mut();
        assert!(r.set_uniform("scale", UniformValue::Float(1.0)));
        assert!(r.set_uniform("light", UniformValue::Vec3([0.0, 0.5, -1.0])));
        let input = seeded(16, 16);
        fb.upload(gpu.queue(), &input).unwrap();

        let screen = TextureTarget::new(gpu.device(), "test screen", 16, 16);
        gpu.submit_with("test render", |encoder| {
            fb.render_to(gpu.queue(), encoder, screen.view());
        });

        assert_eq!(read(&gpu, &fb, Buffer::Data), input);
        assert_eq!(read(&gpu, &fb, Buffer::Loop), input);
    }

    #[test]
    fn disabling_the_brush_continues_the_pde() {
        let Some(gpu) = gpu() else { return };
        let mut brushed = feedback(&gpu, FeedbackDesc::gray_scott((32, 32), FIELD_FORMAT));
        set_constant_params(&mut brushed, 0.06, 0.03);
        brushed.clear(gpu.queue()).unwrap();
        set_brush(&mut brushed, (16.0, 16.0), 4.0, [1.0, 1.0, 0.0, 0.0]);
        tick_n(&gpu, &mut brushed, 2);
        let seed = read(&gpu, &brushed, Buffer::Data);

        // Brush off for two frames on the brushed pipeline...
        set_brush(&mut brushed, (16.0, 16.0), 0.0, [1.0, 1.0, 0.0, 0.0]);
        tick_n(&gpu, &mut brushed, 1);
        tick_n(&gpu, &mut brushed, 1);

        // ...matches two plain steps from the same state.
        let mut plain = feedback(&gpu, FeedbackDesc::gray_scott((32, 32), FIELD_FORMAT));
        set_constant_params(&mut plain, 0.06, 0.03);
        plain.upload(gpu.queue(), &seed).unwrap();
        tick_n(&gpu, &mut plain, 2);

        let after = read(&gpu, &brushed, Buffer::Data);
        assert_eq!(after, read(&gpu, &plain, Buffer::Data));
        assert_ne!(after.get(16, 16), [1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn upload_rejects_mismatched_field() {
        let Some(gpu) = gpu() else { return };
        let fb = feedback(&gpu, FeedbackDesc::gray_scott((16, 16), FIELD_FORMAT));
        let err = fb.upload(gpu.queue(), &Field::zeros(8, 16)).unwrap_err();
        assert!(matches!(
            err,
            SimError::FieldSize { expected: (16, 16), actual: (8, 16) }
        ));
    }

    #[test]
    fn broken_tick_shader_fails_construction() {
        let Some(gpu) = gpu() else { return };
        let desc = FeedbackDesc {
            tick_fragment: "@fragment fn fs_main( -> @location(0) vec4<f32> {}",
            ..FeedbackDesc::gray_scott((4, 4), FIELD_FORMAT)
        };
        let palette = white_palette(&gpu);
        assert!(Feedback::new(gpu.device(), desc, &palette).is_err());
    }
}
