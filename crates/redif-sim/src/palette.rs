use std::path::Path;

use redif_engine::render::{Filter, Texture, TextureError};

use crate::SimError;

/// Side length of the built-in palette.
pub const BUILTIN_SIZE: u32 = 256;

/// Decoded palette pixels, straight RGBA8, rows top to bottom.
///
/// The render pass looks colors up at `(A, 1 - B)`: A runs left to right and
/// B bottom to top.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl PaletteImage {
    /// Decodes any format the `image` crate was built with.
    pub fn from_path(path: &Path) -> Result<Self, SimError> {
        let bytes = std::fs::read(path).map_err(|source| SimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let image = image::load_from_memory(&bytes).map_err(|source| SimError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }

    /// Built-in palette: dark blue where both chemicals are absent, warm where
    /// A dominates, pale where B does.
    pub fn builtin() -> Self {
        let size = BUILTIN_SIZE;
        let max = (size - 1) as f32;
        let mut rgba = Vec::with_capacity((size * size * 4) as usize);

        for row in 0..size {
            let b = 1.0 - row as f32 / max;
            for col in 0..size {
                let a = col as f32 / max;
                let r = 0.05 + 0.85 * a + 0.10 * b;
                let g = 0.08 + 0.35 * a * (1.0 - b) + 0.55 * b;
                let bl = 0.20 + 0.15 * (1.0 - a) + 0.45 * b;
                for c in [r, g, bl, 1.0] {
                    rgba.push((c.clamp(0.0, 1.0) * 255.0).round() as u8);
                }
            }
        }

        Self {
            width: size,
            height: size,
            rgba,
        }
    }

    /// Loads `path` if given, falling back to [`PaletteImage::builtin`] with a
    /// warning when it cannot be read.
    pub fn load_or_builtin(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            log::debug!("no palette configured; using built-in palette");
            return Self::builtin();
        };

        match Self::from_path(path) {
            Ok(image) => {
                log::info!("palette loaded from {} ({}x{})", path.display(), image.width, image.height);
                image
            }
            Err(e) => {
                log::warn!("{e}; using built-in palette");
                Self::builtin()
            }
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]]
    }

    /// Uploads as a linearly filtered RGBA8 texture.
    pub fn upload(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Texture, TextureError> {
        Texture::from_rgba8(
            device,
            queue,
            "redif palette",
            self.width,
            self.height,
            &self.rgba,
            Filter::Linear,
        )
    }
}

/// Palette texture for the render pass; see [`PaletteImage::load_or_builtin`].
pub fn load_palette(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    path: Option<&Path>,
) -> Result<Texture, SimError> {
    Ok(PaletteImage::load_or_builtin(path).upload(device, queue)?)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("redif-palette-{}-{name}", std::process::id()))
    }

    #[test]
    fn builtin_has_expected_shape() {
        let p = PaletteImage::builtin();
        assert_eq!((p.width, p.height), (BUILTIN_SIZE, BUILTIN_SIZE));
        assert_eq!(p.rgba.len(), (BUILTIN_SIZE * BUILTIN_SIZE * 4) as usize);
        assert!(p.rgba.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn builtin_varies_along_both_axes() {
        let p = PaletteImage::builtin();
        let last = BUILTIN_SIZE - 1;
        // Bottom-left is A = 0, B = 0.
        assert_ne!(p.pixel(0, last), p.pixel(last, last));
        assert_ne!(p.pixel(0, last), p.pixel(0, 0));
        assert!(p.pixel(0, last)[2] > p.pixel(0, last)[0]);
    }

    #[test]
    fn decodes_png() {
        let path = temp_path("ok.png");
        let img = image::RgbaImage::from_fn(3, 2, |x, y| image::Rgba([x as u8 * 10, y as u8 * 20, 7, 255]));
        img.save(&path).unwrap();

        let p = PaletteImage::from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!((p.width, p.height), (3, 2));
        assert_eq!(p.pixel(2, 1), [20, 20, 7, 255]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = PaletteImage::from_path(&temp_path("missing.png")).unwrap_err();
        assert!(matches!(err, SimError::Io { .. }));
    }

    #[test]
    fn garbage_is_image_error() {
        let path = temp_path("garbage.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        let err = PaletteImage::from_path(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, SimError::Image { .. }));
    }

    #[test]
    fn unreadable_palette_falls_back() {
        let p = PaletteImage::load_or_builtin(Some(&temp_path("missing.png")));
        assert_eq!(p, PaletteImage::builtin());
        assert_eq!(PaletteImage::load_or_builtin(None), PaletteImage::builtin());
    }
}
