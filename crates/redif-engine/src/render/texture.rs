use half::f16;

use super::TextureError;

/// Storage class of a [`Texture`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TextureKind {
    /// Four half-float channels; render-attachable and copyable both ways.
    Float,
    /// Four 8-bit normalized channels; sampled only (palettes, lookup tables).
    Rgba8,
}

impl TextureKind {
    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            TextureKind::Float => wgpu::TextureFormat::Rgba16Float,
            TextureKind::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
        }
    }

    pub fn bytes_per_texel(self) -> u32 {
        match self {
            TextureKind::Float => 8,
            TextureKind::Rgba8 => 4,
        }
    }

    fn usage(self) -> wgpu::TextureUsages {
        match self {
            TextureKind::Float => {
                wgpu::TextureUsages::TEXTURE_BINDING
                    | wgpu::TextureUsages::RENDER_ATTACHMENT
                    | wgpu::TextureUsages::COPY_SRC
                    | wgpu::TextureUsages::COPY_DST
            }
            TextureKind::Rgba8 => {
                wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST
            }
        }
    }
}

/// Sampling filter used by a texture's own sampler.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Filter {
    Linear,
    Nearest,
}

impl Filter {
    fn mode(self) -> wgpu::FilterMode {
        match self {
            Filter::Linear => wgpu::FilterMode::Linear,
            Filter::Nearest => wgpu::FilterMode::Nearest,
        }
    }
}

/// A 2D texture with its default view and sampler.
///
/// The sampler travels with the texture so a program binding `tex` also binds
/// `tex_sampler` with the filtering chosen here. Addressing is mirrored-repeat
/// on both axes, so stencil taps past the edge read the reflected interior.
pub struct Texture {
    label: String,
    kind: TextureKind,
    width: u32,
    height: u32,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

impl Texture {
    /// Allocates an uninitialized (zeroed) texture.
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        kind: TextureKind,
        filter: Filter,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent(width, height),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: kind.format(),
            usage: kind.usage(),
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::MirrorRepeat,
            address_mode_v: wgpu::AddressMode::MirrorRepeat,
            address_mode_w: wgpu::AddressMode::MirrorRepeat,
            mag_filter: filter.mode(),
            min_filter: filter.mode(),
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        log::debug!("texture `{label}` allocated: {width}x{height} {kind:?}");

        Self {
            label: label.to_string(),
            kind,
            width,
            height,
            texture,
            view,
            sampler,
        }
    }

    /// Creates an 8-bit RGBA texture from straight RGBA bytes, rows top to bottom.
    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
        filter: Filter,
    ) -> Result<Self, TextureError> {
        let expected = (width * height * 4) as usize;
        if pixels.len() != expected {
            return Err(TextureError::SizeMismatch { expected, actual: pixels.len() });
        }

        let texture = Self::new(device, label, width, height, TextureKind::Rgba8, filter);
        texture.write_bytes(queue, pixels);
        Ok(texture)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.kind.format()
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn raw(&self) -> &wgpu::Texture {
        &self.texture
    }

    /// Uploads RGBA texels to a [`TextureKind::Float`] texture, rows top to bottom.
    pub fn write_texels(&self, queue: &wgpu::Queue, texels: &[[f32; 4]]) -> Result<(), TextureError> {
        self.ensure_float()?;

        let expected = (self.width * self.height) as usize;
        if texels.len() != expected {
            return Err(TextureError::SizeMismatch { expected, actual: texels.len() });
        }

        let bits: Vec<u16> = texels
            .iter()
            .flat_map(|t| t.iter().map(|&c| f16::from_f32(c).to_bits()))
            .collect();
        self.write_bytes(queue, bytemuck::cast_slice(&bits));
        Ok(())
    }

    /// Copies a [`TextureKind::Float`] texture back to the host.
    ///
    /// Blocks until the GPU has finished every submission so far. Diagnostic
    /// path only; the simulation never reads back on its own.
    pub fn read_texels(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
    ) -> Result<Vec<[f32; 4]>, TextureError> {
        self.ensure_float()?;

        let bpt = self.kind.bytes_per_texel();
        let unpadded = self.width * bpt;
        let padded = unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let staging = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("redif readback staging"),
            size: u64::from(padded) * u64::from(self.height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("redif readback encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &staging,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded),
                    rows_per_image: Some(self.height),
                },
            },
            extent(self.width, self.height),
        );
        queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(|e| TextureError::Readback(e.to_string()))?;
        rx.recv()
            .map_err(|e| TextureError::Readback(e.to_string()))?
            .map_err(|e| TextureError::Readback(e.to_string()))?;

        let mut texels = Vec::with_capacity((self.width * self.height) as usize);
        {
            let data = slice.get_mapped_range();
            for row in 0..self.height as usize {
                let start = row * padded as usize;
                let row_bytes = &data[start..start + unpadded as usize];
                for texel in row_bytes.chunks_exact(bpt as usize) {
                    let channel = |i: usize| {
                        f16::from_bits(u16::from_le_bytes([texel[2 * i], texel[2 * i + 1]])).to_f32()
                    };
                    texels.push([channel(0), channel(1), channel(2), channel(3)]);
                }
            }
        }
        staging.unmap();

        Ok(texels)
    }

    fn ensure_float(&self) -> Result<(), TextureError> {
        if self.kind == TextureKind::Float {
            Ok(())
        } else {
            Err(TextureError::NotFloat { label: self.label.clone() })
        }
    }

    fn write_bytes(&self, queue: &wgpu::Queue, bytes: &[u8]) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width * self.kind.bytes_per_texel()),
                rows_per_image: Some(self.height),
            },
            extent(self.width, self.height),
        );
    }
}

fn extent(width: u32, height: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}
