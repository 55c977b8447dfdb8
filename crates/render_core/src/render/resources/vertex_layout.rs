//! Vertex layout and buffer usage descriptions
//!
//! A layout lists the attributes a vertex shader reads and where each one
//! lives inside the interleaved vertex data. The backend turns it into its
//! native input-assembly state.

use serde::{Deserialize, Serialize};

/// Scalar type of one vertex attribute component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    /// Signed 8-bit integer
    Int8,
    /// Unsigned 8-bit integer
    UInt8,
    /// Signed 16-bit integer
    Int16,
    /// Unsigned 16-bit integer
    UInt16,
    /// Signed 32-bit integer
    Int32,
    /// Unsigned 32-bit integer
    UInt32,
    /// Half precision float
    Float16,
    /// Single precision float
    Float32,
    /// Double precision float
    Float64,
}

impl AttributeType {
    /// Size of one component in bytes
    pub const fn size(self) -> u32 {
        match self {
            Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 | Self::Float16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }
}

/// One attribute of an interleaved vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexAttribute {
    /// Shader input location
    pub index: u32,
    /// Component type
    pub attribute_type: AttributeType,
    /// Number of components (1 to 4)
    pub components: u32,
    /// Whether integer data is normalized to [0, 1] / [-1, 1]
    pub normalized: bool,
    /// Distance in bytes between consecutive vertices
    pub stride: u32,
    /// Offset in bytes of this attribute inside a vertex
    pub offset: u32,
}

impl VertexAttribute {
    /// Create an attribute description
    pub const fn new(
        index: u32,
        attribute_type: AttributeType,
        components: u32,
        normalized: bool,
        stride: u32,
        offset: u32,
    ) -> Self {
        Self { index, attribute_type, components, normalized, stride, offset }
    }

    /// Bytes occupied by this attribute inside one vertex
    pub const fn size(&self) -> u32 {
        self.attribute_type.size() * self.components
    }
}

/// Ordered list of vertex attributes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Create a layout from attributes
    pub fn new(attributes: Vec<VertexAttribute>) -> Self {
        Self { attributes }
    }

    /// Attributes in declaration order
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Largest stride declared by any attribute; this is the vertex size
    pub fn stride(&self) -> u32 {
        self.attributes.iter().map(|a| a.stride).max().unwrap_or(0)
    }

    /// Bytes per vertex. Tightly packed layouts (stride 0) use the sum of
    /// attribute sizes.
    pub fn vertex_size(&self) -> u32 {
        match self.stride() {
            0 => self.attributes.iter().map(VertexAttribute::size).sum(),
            stride => stride,
        }
    }

    /// Check the layout is internally consistent
    ///
    /// Rejects empty layouts, component counts outside 1..=4, duplicate
    /// locations, and attributes that extend past their stride.
    pub fn validate(&self) -> Result<(), String> {
        if self.attributes.is_empty() {
            return Err("vertex layout has no attributes".to_string());
        }

        for (position, attribute) in self.attributes.iter().enumerate() {
            if !(1..=4).contains(&attribute.components) {
                return Err(format!(
                    "attribute {} has {} components, expected 1 to 4",
                    attribute.index, attribute.components
                ));
            }

            let end = attribute.offset.checked_add(attribute.size());
            if attribute.stride != 0 && end.map_or(true, |end| end > attribute.stride) {
                return Err(format!(
                    "attribute {} (offset {}, size {}) exceeds stride {}",
                    attribute.index,
                    attribute.offset,
                    attribute.size(),
                    attribute.stride
                ));
            }

            if self.attributes[..position].iter().any(|a| a.index == attribute.index) {
                return Err(format!("attribute location {} declared twice", attribute.index));
            }
        }

        Ok(())
    }
}

impl From<Vec<VertexAttribute>> for VertexLayout {
    fn from(attributes: Vec<VertexAttribute>) -> Self {
        Self::new(attributes)
    }
}

/// Expected update frequency of a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BufferUsage {
    /// Written once, drawn many times
    #[default]
    Static,
    /// Rewritten occasionally
    Dynamic,
    /// Rewritten every frame
    Stream,
}

/// Element type of an index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IndexType {
    /// 8-bit indices
    UInt8,
    /// 16-bit indices
    UInt16,
    /// 32-bit indices
    #[default]
    UInt32,
}

impl IndexType {
    /// Size of one index in bytes
    pub const fn size(self) -> u32 {
        match self {
            Self::UInt8 => 1,
            Self::UInt16 => 2,
            Self::UInt32 => 4,
        }
    }
}
