use super::{Filter, Texture, TextureKind};

/// Off-screen render target backed by a floating-point [`Texture`].
///
/// The same texture is sampled by later passes, so a target is never bound
/// for writing while one of its own samplers is in use; wgpu rejects such a
/// pass at validation time.
pub struct TextureTarget {
    texture: Texture,
}

impl TextureTarget {
    pub fn new(device: &wgpu::Device, label: &str, width: u32, height: u32) -> Self {
        Self {
            texture: Texture::new(device, label, width, height, TextureKind::Float, Filter::Linear),
        }
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn view(&self) -> &wgpu::TextureView {
        self.texture.view()
    }

    pub fn size(&self) -> (u32, u32) {
        self.texture.size()
    }
}

/// Opens a render pass writing `view`, cleared to transparent black.
///
/// The returned pass borrows `encoder` mutably: the target stays bound exactly
/// as long as the pass value lives and is released when it drops, including
/// on early return. Nothing else can record into the encoder meanwhile.
pub fn scoped_pass<'e>(
    encoder: &'e mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    label: &str,
) -> wgpu::RenderPass<'e> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    })
}
