//! Texture descriptions

use serde::{Deserialize, Serialize};

/// Kind of texture object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureTarget {
    /// Single 2D image with optional mip chain
    #[default]
    Texture2D,
    /// Six square faces
    CubeMap,
}

impl TextureTarget {
    /// Number of images per mip level
    pub const fn layers(self) -> u32 {
        match self {
            Self::Texture2D => 1,
            Self::CubeMap => 6,
        }
    }
}

/// Pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureFormat {
    /// One 8-bit channel
    R8,
    /// Two 8-bit channels
    Rg8,
    /// Three 8-bit channels
    Rgb8,
    /// Four 8-bit channels
    #[default]
    Rgba8,
    /// Four half-float channels
    Rgba16F,
    /// Four float channels
    Rgba32F,
    /// 24-bit depth + 8-bit stencil
    Depth24Stencil8,
    /// 32-bit float depth
    Depth32F,
}

impl TextureFormat {
    /// Bytes per pixel
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::R8 => 1,
            Self::Rg8 => 2,
            Self::Rgb8 => 3,
            Self::Rgba8 | Self::Depth24Stencil8 | Self::Depth32F => 4,
            Self::Rgba16F => 8,
            Self::Rgba32F => 16,
        }
    }

    /// True for depth and depth-stencil formats
    pub const fn is_depth(self) -> bool {
        matches!(self, Self::Depth24Stencil8 | Self::Depth32F)
    }
}

/// Coordinate wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureWrap {
    /// Repeat the texture
    #[default]
    Repeat,
    /// Mirror the texture
    MirroredRepeat,
    /// Clamp to edge
    ClampToEdge,
}

/// Sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextureFilter {
    /// Nearest neighbor filtering
    Nearest,
    /// Linear filtering
    #[default]
    Linear,
}

/// Everything about a texture except its pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureMetadata {
    /// Texture kind
    pub target: TextureTarget,
    /// Width in pixels of mip 0
    pub width: u32,
    /// Height in pixels of mip 0
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Number of mip levels, at least 1
    pub mip_levels: u32,
    /// Coordinate wrapping
    pub wrap: TextureWrap,
    /// Sampling filter
    pub filter: TextureFilter,
}

impl Default for TextureMetadata {
    fn default() -> Self {
        Self {
            target: TextureTarget::Texture2D,
            width: 1,
            height: 1,
            format: TextureFormat::Rgba8,
            mip_levels: 1,
            wrap: TextureWrap::Repeat,
            filter: TextureFilter::Linear,
        }
    }
}

impl TextureMetadata {
    /// 2D texture metadata with a single mip level
    pub fn new_2d(width: u32, height: u32, format: TextureFormat) -> Self {
        Self { width, height, format, ..Self::default() }
    }

    /// Longest possible mip chain for these dimensions
    pub fn max_mip_levels(&self) -> u32 {
        32 - self.width.max(self.height).max(1).leading_zeros()
    }

    /// Size in bytes of mip 0 for all layers, `None` if it does not fit in
    /// `usize`
    pub fn base_level_size(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.format.bytes_per_pixel() as usize)?
            .checked_mul(self.target.layers() as usize)
    }

    /// Check dimensions and mip count
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("texture size {}x{} is empty", self.width, self.height));
        }
        if self.target == TextureTarget::CubeMap && self.width != self.height {
            return Err(format!("cube map faces must be square, got {}x{}", self.width, self.height));
        }
        if self.mip_levels == 0 || self.mip_levels > self.max_mip_levels() {
            return Err(format!(
                "{} mip levels requested, {}x{} allows 1 to {}",
                self.mip_levels,
                self.width,
                self.height,
                self.max_mip_levels()
            ));
        }
        if self.base_level_size().is_none() {
            return Err(format!("{}x{} {:?} texture is too large to address", self.width, self.height, self.format));
        }
        Ok(())
    }
}

/// Texture metadata plus optional initial pixels for mip 0
///
/// The description owns its pixel data; it is released as soon as the
/// device has handed it to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextureDescription {
    /// Size, format and sampling state
    pub metadata: TextureMetadata,
    /// Tightly packed mip 0 pixels for every layer, or `None` for an
    /// uninitialized texture (render targets)
    pub data: Option<Vec<u8>>,
}

impl TextureDescription {
    /// Description without initial data
    pub fn empty(metadata: TextureMetadata) -> Self {
        Self { metadata, data: None }
    }

    /// Description with initial pixel data
    pub fn with_data(metadata: TextureMetadata, data: Vec<u8>) -> Self {
        Self { metadata, data: Some(data) }
    }
}
