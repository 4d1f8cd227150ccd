//! Byte layouts for uniform blocks shared between host and shaders.
//!
//! A layout is declared once as an ordered list of `(name, kind)` pairs.
//! Offsets follow the WGSL uniform address-space rules: every field starts
//! at a multiple of its alignment, so vector fields land on 16-byte
//! boundaries while scalars may pack into the tail of a preceding `vec3`.
//! `vec2` is the one kind WGSL would place on 8 bytes; it is raised to 16
//! and the generated struct says so with `@align(16)`.
//! The same list generates the WGSL struct the shader declares, which keeps
//! the two sides in lock-step.
//!
//! ```
//! use sparkfield::layout::{FieldKind, UniformLayout};
//!
//! let layout = UniformLayout::new(&[
//!     ("delta_time", FieldKind::F32),
//!     ("gravity", FieldKind::Vec3),
//!     ("scale", FieldKind::F32),
//! ]);
//! assert_eq!(layout.offset("gravity"), Some(16));
//! assert_eq!(layout.offset("scale"), Some(28));
//! assert_eq!(layout.size(), 32);
//! ```

/// Minimum alignment for vector fields and for the total block size.
pub const UNIFORM_ALIGNMENT: u64 = 16;

/// Supported field types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    F32,
    U32,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl FieldKind {
    /// Get the WGSL type name for this kind.
    pub fn wgsl_type(self) -> &'static str {
        match self {
            FieldKind::F32 => "f32",
            FieldKind::U32 => "u32",
            FieldKind::Vec2 => "vec2<f32>",
            FieldKind::Vec3 => "vec3<f32>",
            FieldKind::Vec4 => "vec4<f32>",
            FieldKind::Mat4 => "mat4x4<f32>",
        }
    }

    /// Byte size of the encoded value (without trailing padding).
    pub fn byte_size(self) -> u64 {
        match self {
            FieldKind::F32 | FieldKind::U32 => 4,
            FieldKind::Vec2 => 8,
            FieldKind::Vec3 => 12,
            FieldKind::Vec4 => 16,
            FieldKind::Mat4 => 64,
        }
    }

    /// Alignment WGSL gives this kind without an attribute.
    pub fn natural_alignment(self) -> u64 {
        match self {
            FieldKind::F32 | FieldKind::U32 => 4,
            FieldKind::Vec2 => 8,
            FieldKind::Vec3 | FieldKind::Vec4 | FieldKind::Mat4 => UNIFORM_ALIGNMENT,
        }
    }

    /// Start alignment used by [`UniformLayout`]: 16 for every vector or
    /// matrix, 4 for scalars.
    pub fn alignment(self) -> u64 {
        if self.is_vector() {
            UNIFORM_ALIGNMENT
        } else {
            4
        }
    }

    /// Whether this kind is a vector or matrix.
    pub fn is_vector(self) -> bool {
        !matches!(self, FieldKind::F32 | FieldKind::U32)
    }
}

/// A single field with its resolved offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldLayout {
    pub name: &'static str,
    pub kind: FieldKind,
    pub offset: u64,
}

impl FieldLayout {
    /// One past the last byte this field occupies.
    pub fn end(&self) -> u64 {
        self.offset + self.kind.byte_size()
    }
}

/// Immutable field table for one uniform block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniformLayout {
    fields: Vec<FieldLayout>,
    size: u64,
}

impl UniformLayout {
    /// Resolve offsets for `fields` in declaration order.
    ///
    /// # Panics
    ///
    /// Panics if a field name is declared twice.
    pub fn new(fields: &[(&'static str, FieldKind)]) -> Self {
        let mut resolved: Vec<FieldLayout> = Vec::with_capacity(fields.len());
        let mut cursor = 0u64;

        for &(name, kind) in fields {
            assert!(
                resolved.iter().all(|f| f.name != name),
                "duplicate uniform field `{name}`"
            );
            let offset = align_up(cursor, kind.alignment());
            resolved.push(FieldLayout { name, kind, offset });
            cursor = offset + kind.byte_size();
        }

        Self {
            fields: resolved,
            size: align_up(cursor.max(1), UNIFORM_ALIGNMENT),
        }
    }

    /// Total block size in bytes, a multiple of 16.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> &[FieldLayout] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldLayout> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Byte offset of the named field.
    pub fn offset(&self, name: &str) -> Option<u64> {
        self.field(name).map(|f| f.offset)
    }

    /// Generate the matching WGSL struct declaration.
    pub fn to_wgsl_struct(&self, struct_name: &str) -> String {
        let body = self
            .fields
            .iter()
            .map(|f| {
                let align = if f.kind.alignment() != f.kind.natural_alignment() {
                    format!("@align({}) ", f.kind.alignment())
                } else {
                    String::new()
                };
                format!("    {align}{}: {},", f.name, f.kind.wgsl_type())
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("struct {struct_name} {{\n{body}\n}};\n")
    }
}

fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars_pack_tightly() {
        let layout = UniformLayout::new(&[("a", FieldKind::F32), ("b", FieldKind::F32)]);
        assert_eq!(layout.offset("a"), Some(0));
        assert_eq!(layout.offset("b"), Some(4));
        assert_eq!(layout.size(), 16);
    }

    #[test]
    fn test_vec3_after_scalar_is_padded() {
        let layout = UniformLayout::new(&[("dt", FieldKind::F32), ("v", FieldKind::Vec3)]);
        assert_eq!(layout.offset("v"), Some(16));
        assert_eq!(layout.size(), 32);
    }

    #[test]
    fn test_scalar_fills_vec3_tail() {
        let layout = UniformLayout::new(&[("v", FieldKind::Vec3), ("s", FieldKind::F32)]);
        assert_eq!(layout.offset("s"), Some(12));
        assert_eq!(layout.size(), 16);
    }

    #[test]
    fn test_vec2_is_raised_to_sixteen() {
        let layout = UniformLayout::new(&[("s", FieldKind::F32), ("uv", FieldKind::Vec2)]);
        assert_eq!(layout.offset("uv"), Some(16));
        assert!(layout.to_wgsl_struct("P").contains("@align(16) uv: vec2<f32>,"));
    }

    #[test]
    fn test_unknown_field() {
        let layout = UniformLayout::new(&[("a", FieldKind::F32)]);
        assert!(layout.field("missing").is_none());
    }

    #[test]
    #[should_panic(expected = "duplicate uniform field")]
    fn test_duplicate_field_panics() {
        UniformLayout::new(&[("a", FieldKind::F32), ("a", FieldKind::U32)]);
    }

    #[test]
    fn test_wgsl_struct() {
        let layout = UniformLayout::new(&[("view_proj", FieldKind::Mat4)]);
        assert_eq!(
            layout.to_wgsl_struct("Camera"),
            "struct Camera {\n    view_proj: mat4x4<f32>,\n};\n"
        );
    }
}
