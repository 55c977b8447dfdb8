//! Material values
//!
//! A material is a program plus named shader parameters. Materials live by
//! value inside the device's material cache and are referenced everywhere
//! else through a [`MaterialHandle`](crate::render::MaterialHandle).

use crate::foundation::math::{Mat3, Mat4, Vec2, Vec3, Vec4};
use crate::render::handle::{ProgramHandle, TextureHandle};
use std::collections::BTreeMap;

/// Value of one material parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    /// Scalar float
    Float(f32),
    /// Scalar integer
    Int(i32),
    /// 2-component vector
    Vec2(Vec2),
    /// 3-component vector
    Vec3(Vec3),
    /// 4-component vector
    Vec4(Vec4),
    /// 3x3 matrix
    Mat3(Mat3),
    /// 4x4 matrix
    Mat4(Mat4),
    /// Texture bound to a sampler
    Texture(TextureHandle),
}

impl ParameterValue {
    /// Texture referenced by this value, if any
    pub const fn texture(&self) -> Option<TextureHandle> {
        match self {
            Self::Texture(texture) => Some(*texture),
            _ => None,
        }
    }
}

macro_rules! impl_parameter_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ParameterValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_parameter_from! {
    f32 => Float,
    i32 => Int,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    Mat3 => Mat3,
    Mat4 => Mat4,
    TextureHandle => Texture,
}

/// Named parameters, kept sorted by name so iteration is deterministic
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialParameters {
    values: BTreeMap<String, ParameterValue>,
}

impl MaterialParameters {
    /// Empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Builder-style [`set`](Self::set)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Look up a parameter
    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name)
    }

    /// Copy every parameter of `other` over this set
    pub fn merge(&mut self, other: &Self) {
        for (name, value) in &other.values {
            self.values.insert(name.clone(), *value);
        }
    }

    /// Iterate parameters in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Textures referenced by any parameter
    pub fn textures(&self) -> impl Iterator<Item = TextureHandle> + '_ {
        self.values.values().filter_map(ParameterValue::texture)
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no parameter is set
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Program plus parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Linked program used to draw with this material
    pub program: ProgramHandle,
    /// Shader parameters
    pub parameters: MaterialParameters,
    /// Optional name for debugging
    pub name: Option<String>,
}

impl Material {
    /// Material with no parameters
    pub fn new(program: ProgramHandle) -> Self {
        Self { program, parameters: MaterialParameters::new(), name: None }
    }

    /// Set a parameter
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.parameters.set(name, value);
        self
    }

    /// Set the debug name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
