use super::Vec2;

/// Viewport size in pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    #[inline]
    pub fn size(self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Maps a point in this viewport onto the same relative position in `other`.
    #[inline]
    pub fn map_to(self, p: Vec2, other: Viewport) -> Vec2 {
        Vec2::new(p.x * other.width / self.width, p.y * other.height / self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_to_rescales_per_axis() {
        let window = Viewport::new(800.0, 600.0);
        let field = Viewport::new(400.0, 200.0);
        assert_eq!(window.map_to(Vec2::new(400.0, 300.0), field), Vec2::new(200.0, 100.0));
        assert_eq!(window.map_to(Vec2::zero(), field), Vec2::zero());
    }

    #[test]
    fn zero_sized_is_invalid() {
        assert!(!Viewport::new(0.0, 10.0).is_valid());
        assert!(Viewport::new(1.0, 1.0).is_valid());
    }
}
