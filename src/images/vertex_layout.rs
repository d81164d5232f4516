// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Vertex buffer layout descriptions for GPU rendering.
//!
//! When rendering geometry, the GPU needs to know how to interpret the raw bytes in
//! vertex buffers.  A [`VertexFormat`] lists the attributes of one interleaved
//! vertex, where each one lives, and how its stored components reach the shader.
//!
//! # Example
//!
//! ```
//! use frames_and_samples::images::vertex_layout::{Semantic, VertexAttribute, VertexFormat};
//!
//! // position then texture coordinate, both two floats
//! let format = VertexFormat::new(16)
//!     .with(VertexAttribute::float(Semantic::Position, 2, 0))
//!     .with(VertexAttribute::float(Semantic::Texcoord, 2, 8));
//! assert!(format.validate().is_ok());
//! ```

/// Shader input slot an attribute feeds.
///
/// The discriminant is the WGSL `@location`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Semantic {
    Position = 0,
    Color = 3,
    Texcoord = 4,
}

impl Semantic {
    pub const fn location(self) -> u32 {
        self as u32
    }
}

/// Storage type of each component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl ElementType {
    pub const fn size(self) -> u32 {
        match self {
            ElementType::U8 | ElementType::I8 => 1,
            ElementType::U16 | ElementType::I16 => 2,
            ElementType::U32 | ElementType::I32 | ElementType::F32 => 4,
            ElementType::F64 => 8,
        }
    }

    pub const fn is_integer(self) -> bool {
        !matches!(self, ElementType::F32 | ElementType::F64)
    }
}

/// How stored components are presented to the shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeClass {
    /// Converted to 32-bit float, optionally normalized from integer storage.
    Float,
    /// Passed through as integers.
    Integer,
    /// Passed through as 64-bit floats.
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub semantic: Semantic,
    /// 1 to 4.
    pub components: u8,
    pub element_type: ElementType,
    pub class: AttributeClass,
    pub normalized: bool,
    /// Byte offset from the start of the vertex.
    pub offset: u32,
    pub binding: u32,
}

impl VertexAttribute {
    /// `components` 32-bit floats at `offset` on binding 0.
    pub const fn float(semantic: Semantic, components: u8, offset: u32) -> Self {
        VertexAttribute {
            semantic,
            components,
            element_type: ElementType::F32,
            class: AttributeClass::Float,
            normalized: false,
            offset,
            binding: 0,
        }
    }

    /// `components` integers normalized to 0..=1 (or -1..=1 when signed).
    pub const fn normalized(
        semantic: Semantic,
        components: u8,
        element_type: ElementType,
        offset: u32,
    ) -> Self {
        VertexAttribute {
            semantic,
            components,
            element_type,
            class: AttributeClass::Float,
            normalized: true,
            offset,
            binding: 0,
        }
    }

    /// Bytes occupied in the vertex.
    pub const fn size(&self) -> u32 {
        self.components as u32 * self.element_type.size()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("vertex format has no attributes")]
    NoAttributes,
    #[error("vertex stride is zero")]
    ZeroStride,
    #[error("{semantic:?} has {components} components")]
    ComponentCount { semantic: Semantic, components: u8 },
    #[error("{semantic:?} ends at byte {end}, past the {stride}-byte stride")]
    PastStride {
        semantic: Semantic,
        end: u32,
        stride: u32,
    },
    #[error("{semantic:?} is normalized but presented as {class:?}")]
    NormalizedNonFloat {
        semantic: Semantic,
        class: AttributeClass,
    },
    #[error("{semantic:?} can't present {element_type:?} as {class:?}")]
    ClassMismatch {
        semantic: Semantic,
        class: AttributeClass,
        element_type: ElementType,
    },
    #[error("{semantic:?} reads binding {binding}; only binding 0 exists")]
    Binding { semantic: Semantic, binding: u32 },
    #[error("{0:?} appears twice")]
    DuplicateSemantic(Semantic),
}

/// Interleaved attributes of one vertex buffer binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexFormat {
    pub stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexFormat {
    pub fn new(stride: u32) -> Self {
        VertexFormat {
            stride,
            attributes: Vec::new(),
        }
    }

    pub fn with(mut self, attribute: VertexAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn attribute(&self, semantic: Semantic) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.semantic == semantic)
    }

    pub fn validate(&self) -> Result<(), FormatError> {
        if self.attributes.is_empty() {
            return Err(FormatError::NoAttributes);
        }
        if self.stride == 0 {
            return Err(FormatError::ZeroStride);
        }
        for (i, a) in self.attributes.iter().enumerate() {
            if !(1..=4).contains(&a.components) {
                return Err(FormatError::ComponentCount {
                    semantic: a.semantic,
                    components: a.components,
                });
            }
            if a.normalized && a.class != AttributeClass::Float {
                return Err(FormatError::NormalizedNonFloat {
                    semantic: a.semantic,
                    class: a.class,
                });
            }
            let class_ok = match a.class {
                AttributeClass::Float => !(a.normalized && !a.element_type.is_integer()),
                AttributeClass::Integer => a.element_type.is_integer(),
                AttributeClass::Double => a.element_type == ElementType::F64,
            };
            if !class_ok {
                return Err(FormatError::ClassMismatch {
                    semantic: a.semantic,
                    class: a.class,
                    element_type: a.element_type,
                });
            }
            if a.binding != 0 {
                return Err(FormatError::Binding {
                    semantic: a.semantic,
                    binding: a.binding,
                });
            }
            let end = a.offset + a.size();
            if end > self.stride {
                return Err(FormatError::PastStride {
                    semantic: a.semantic,
                    end,
                    stride: self.stride,
                });
            }
            if self.attributes[..i].iter().any(|b| b.semantic == a.semantic) {
                return Err(FormatError::DuplicateSemantic(a.semantic));
            }
        }
        Ok(())
    }

    /// Reads attribute `semantic` of vertex `index` as floats.
    ///
    /// Missing components read as 0 except w, which reads as 1.  Returns `None`
    /// when the format lacks the attribute or the vertex is out of range.
    pub fn read_f32(&self, vertices: &[u8], index: u32, semantic: Semantic) -> Option<[f32; 4]> {
        let a = self.attribute(semantic)?;
        let base = index as usize * self.stride as usize + a.offset as usize;
        let bytes = vertices.get(base..base + a.size() as usize)?;
        let mut out = [0.0, 0.0, 0.0, 1.0];
        let step = a.element_type.size() as usize;
        for (c, chunk) in bytes.chunks_exact(step).enumerate() {
            let raw = match a.element_type {
                ElementType::U8 => chunk[0] as f64,
                ElementType::I8 => chunk[0] as i8 as f64,
                ElementType::U16 => u16::from_le_bytes([chunk[0], chunk[1]]) as f64,
                ElementType::I16 => i16::from_le_bytes([chunk[0], chunk[1]]) as f64,
                ElementType::U32 => bytemuck::pod_read_unaligned::<u32>(chunk) as f64,
                ElementType::I32 => bytemuck::pod_read_unaligned::<i32>(chunk) as f64,
                ElementType::F32 => bytemuck::pod_read_unaligned::<f32>(chunk) as f64,
                ElementType::F64 => bytemuck::pod_read_unaligned::<f64>(chunk),
            };
            let value = if a.normalized {
                match a.element_type {
                    ElementType::U8 => raw / 255.0,
                    ElementType::I8 => (raw / 127.0).max(-1.0),
                    ElementType::U16 => raw / 65535.0,
                    ElementType::I16 => (raw / 32767.0).max(-1.0),
                    ElementType::U32 => raw / u32::MAX as f64,
                    ElementType::I32 => (raw / i32::MAX as f64).max(-1.0),
                    ElementType::F32 | ElementType::F64 => raw,
                }
            } else {
                raw
            };
            out[c] = value as f32;
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textured() -> VertexFormat {
        VertexFormat::new(16)
            .with(VertexAttribute::float(Semantic::Position, 2, 0))
            .with(VertexAttribute::float(Semantic::Texcoord, 2, 8))
    }

    #[test]
    fn textured_quad_layout_is_valid() {
        assert_eq!(textured().validate(), Ok(()));
    }

    #[test]
    fn attribute_past_stride_is_rejected() {
        let format = VertexFormat::new(12)
            .with(VertexAttribute::float(Semantic::Position, 2, 0))
            .with(VertexAttribute::float(Semantic::Texcoord, 2, 8));
        assert_eq!(
            format.validate(),
            Err(FormatError::PastStride {
                semantic: Semantic::Texcoord,
                end: 16,
                stride: 12
            })
        );
    }

    #[test]
    fn normalized_integer_class_is_rejected() {
        let mut attribute = VertexAttribute::normalized(Semantic::Color, 4, ElementType::U8, 8);
        attribute.class = AttributeClass::Integer;
        let format = VertexFormat::new(12)
            .with(VertexAttribute::float(Semantic::Position, 2, 0))
            .with(attribute);
        assert!(matches!(
            format.validate(),
            Err(FormatError::NormalizedNonFloat { .. })
        ));
    }

    #[test]
    fn double_class_needs_f64() {
        let mut attribute = VertexAttribute::float(Semantic::Position, 2, 0);
        attribute.class = AttributeClass::Double;
        let format = VertexFormat::new(16).with(attribute);
        assert!(matches!(
            format.validate(),
            Err(FormatError::ClassMismatch { .. })
        ));
    }

    #[test]
    fn duplicate_and_binding() {
        let format = textured().with(VertexAttribute::float(Semantic::Position, 1, 0));
        assert_eq!(
            format.validate(),
            Err(FormatError::DuplicateSemantic(Semantic::Position))
        );
        let mut attribute = VertexAttribute::float(Semantic::Color, 1, 0);
        attribute.binding = 1;
        assert!(matches!(
            VertexFormat::new(4).with(attribute).validate(),
            Err(FormatError::Binding { .. })
        ));
    }

    #[test]
    fn reads_normalized_colors() {
        let format = VertexFormat::new(12)
            .with(VertexAttribute::float(Semantic::Position, 2, 0))
            .with(VertexAttribute::normalized(Semantic::Color, 4, ElementType::U8, 8));
        let mut bytes = Vec::new();
        bytes.extend_from_slice(bytemuck::cast_slice(&[0.5f32, -0.25]));
        bytes.extend_from_slice(&[255, 0, 51, 255]);
        assert_eq!(
            format.read_f32(&bytes, 0, Semantic::Position),
            Some([0.5, -0.25, 0.0, 1.0])
        );
        assert_eq!(
            format.read_f32(&bytes, 0, Semantic::Color),
            Some([1.0, 0.0, 0.2, 1.0])
        );
        assert_eq!(format.read_f32(&bytes, 1, Semantic::Color), None);
        assert_eq!(format.read_f32(&bytes, 0, Semantic::Texcoord), None);
    }
}
