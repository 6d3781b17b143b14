use super::Texture;

/// Shape of a uniform block member as declared in the shader.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformShape {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformShape {
    /// Number of bytes written for a value of this shape.
    pub fn byte_len(self) -> usize {
        match self {
            UniformShape::Float => 4,
            UniformShape::Vec2 => 8,
            UniformShape::Vec3 => 12,
            UniformShape::Vec4 => 16,
            UniformShape::Mat4 => 64,
        }
    }
}

/// A value for [`Program::set_uniform`](super::Program::set_uniform).
///
/// Block members take the numeric variants; `Texture` binds a texture input
/// together with its sampler.
#[derive(Copy, Clone)]
pub enum UniformValue<'a> {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Column-major.
    Mat4([[f32; 4]; 4]),
    Texture(&'a Texture),
}

impl UniformValue<'_> {
    /// Shape of a numeric value; `None` for textures.
    pub fn shape(&self) -> Option<UniformShape> {
        match self {
            UniformValue::Float(_) => Some(UniformShape::Float),
            UniformValue::Vec2(_) => Some(UniformShape::Vec2),
            UniformValue::Vec3(_) => Some(UniformShape::Vec3),
            UniformValue::Vec4(_) => Some(UniformShape::Vec4),
            UniformValue::Mat4(_) => Some(UniformShape::Mat4),
            UniformValue::Texture(_) => None,
        }
    }

    /// Copies the value's little-endian bytes into the front of `dst`.
    ///
    /// Returns the number of bytes written (zero for textures).
    pub(crate) fn write_bytes(&self, dst: &mut [u8]) -> usize {
        let src: &[u8] = match self {
            UniformValue::Float(v) => bytemuck::bytes_of(v),
            UniformValue::Vec2(v) => bytemuck::cast_slice(v.as_slice()),
            UniformValue::Vec3(v) => bytemuck::cast_slice(v.as_slice()),
            UniformValue::Vec4(v) => bytemuck::cast_slice(v.as_slice()),
            UniformValue::Mat4(m) => bytemuck::cast_slice(m.as_slice()),
            UniformValue::Texture(_) => return 0,
        };
        dst[..src.len()].copy_from_slice(src);
        src.len()
    }
}

impl std::fmt::Debug for UniformValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniformValue::Float(v) => write!(f, "Float({v})"),
            UniformValue::Vec2(v) => write!(f, "Vec2({v:?})"),
            UniformValue::Vec3(v) => write!(f, "Vec3({v:?})"),
            UniformValue::Vec4(v) => write!(f, "Vec4({v:?})"),
            UniformValue::Mat4(m) => write!(f, "Mat4({m:?})"),
            UniformValue::Texture(t) => write!(f, "Texture({})", t.label()),
        }
    }
}

impl From<f32> for UniformValue<'_> {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<[f32; 2]> for UniformValue<'_> {
    fn from(v: [f32; 2]) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<[f32; 3]> for UniformValue<'_> {
    fn from(v: [f32; 3]) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<[f32; 4]> for UniformValue<'_> {
    fn from(v: [f32; 4]) -> Self {
        UniformValue::Vec4(v)
    }
}

impl<'a> From<&'a Texture> for UniformValue<'a> {
    fn from(t: &'a Texture) -> Self {
        UniformValue::Texture(t)
    }
}
