use redif_engine::render::TextureError;

/// Host-side copy of a simulation field.
///
/// Texels are RGBA, rows top to bottom; A lives in `r`, B in `g`. The GPU
/// copy is authoritative; this type exists for seeding and inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    width: u32,
    height: u32,
    texels: Vec<[f32; 4]>,
}

impl Field {
    /// All-zero field.
    pub fn zeros(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0.0; 4])
    }

    pub fn filled(width: u32, height: u32, value: [f32; 4]) -> Self {
        Self {
            width,
            height,
            texels: vec![value; (width * height) as usize],
        }
    }

    /// Wraps texels read from or destined for a texture.
    pub fn from_texels(width: u32, height: u32, texels: Vec<[f32; 4]>) -> Result<Self, TextureError> {
        let expected = (width * height) as usize;
        if texels.len() != expected {
            return Err(TextureError::SizeMismatch { expected, actual: texels.len() });
        }
        Ok(Self { width, height, texels })
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

    pub fn texels(&self) -> &[[f32; 4]] {
        &self.texels
    }

    pub fn get(&self, x: u32, y: u32) -> [f32; 4] {
        self.texels[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, value: [f32; 4]) {
        let i = self.index(x, y);
        self.texels[i] = value;
    }

    /// Sets every texel whose center lies strictly within `radius` of `center`.
    pub fn fill_disc(&mut self, center: (f32, f32), radius: f32, value: [f32; 4]) {
        for y in 0..self.height {
            for x in 0..self.width {
                if texel_in_disc(x, y, center, radius) {
                    self.set(x, y, value);
                }
            }
        }
    }

    /// Largest per-channel absolute difference between two equally sized fields.
    pub fn max_abs_diff(&self, other: &Field) -> f32 {
        debug_assert_eq!(self.size(), other.size());
        self.texels
            .iter()
            .zip(&other.texels)
            .flat_map(|(a, b)| a.iter().zip(b).map(|(x, y)| (x - y).abs()))
            .fold(0.0, f32::max)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        (y * self.width + x) as usize
    }
}

/// The brush test, evaluated at texel centers exactly as the tick shader does.
pub fn texel_in_disc(x: u32, y: u32, center: (f32, f32), radius: f32) -> bool {
    let dx = x as f32 + 0.5 - center.0;
    let dy = y as f32 + 0.5 - center.1;
    dx * dx + dy * dy < radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_texels_checks_length() {
        assert!(Field::from_texels(2, 2, vec![[0.0; 4]; 4]).is_ok());
        assert_eq!(
            Field::from_texels(2, 2, vec![[0.0; 4]; 3]),
            Err(TextureError::SizeMismatch { expected: 4, actual: 3 })
        );
    }

    #[test]
    fn fill_disc_uses_strict_inequality() {
        let mut field = Field::zeros(10, 10);
        // texel (5,5) has its center at (5.5,5.5): distance 0.5 from (5,5)
        field.fill_disc((5.0, 5.0), 0.5, [1.0; 4]);
        assert_eq!(field.texels().iter().filter(|t| t[0] == 1.0).count(), 0);

        field.fill_disc((5.0, 5.0), 1.0, [1.0; 4]);
        // the four texels around the point (5,5), each at distance sqrt(0.5)
        for (x, y) in [(4, 4), (5, 4), (4, 5), (5, 5)] {
            assert_eq!(field.get(x, y), [1.0; 4]);
        }
        assert_eq!(field.texels().iter().filter(|t| t[0] == 1.0).count(), 4);
    }

    #[test]
    fn max_abs_diff_finds_largest_channel_delta() {
        let a = Field::zeros(3, 1);
        let mut b = a.clone();
        b.set(1, 0, [0.0, -0.25, 0.1, 0.0]);
        assert_eq!(a.max_abs_diff(&b), 0.25);
        assert_eq!(a.max_abs_diff(&a), 0.0);
    }
}
