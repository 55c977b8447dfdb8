//! Frame buffer descriptions

use crate::render::handle::TextureHandle;
use serde::{Deserialize, Serialize};

/// Where a texture is attached on a frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttachmentPoint {
    /// Color attachment with its index
    Color(u32),
    /// Depth attachment
    Depth,
    /// Stencil attachment
    Stencil,
    /// Combined depth-stencil attachment
    DepthStencil,
}

/// One texture bound to a frame buffer attachment point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameBufferAttachment {
    /// Attachment point
    pub point: AttachmentPoint,
    /// Render texture written through this attachment
    pub texture: TextureHandle,
}

/// Attachment list of an off-screen frame buffer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameBufferDescription {
    /// Attachments in declaration order
    pub attachments: Vec<FrameBufferAttachment>,
}

impl FrameBufferDescription {
    /// Create a description from attachments
    pub fn new(attachments: Vec<FrameBufferAttachment>) -> Self {
        Self { attachments }
    }

    /// Textures written when rendering into this frame buffer
    pub fn textures(&self) -> impl Iterator<Item = TextureHandle> + '_ {
        self.attachments.iter().map(|a| a.texture)
    }

    /// Check that no attachment point is used twice and at least one exists
    pub fn validate(&self) -> Result<(), String> {
        if self.attachments.is_empty() {
            return Err("frame buffer has no attachments".to_string());
        }
        for (position, attachment) in self.attachments.iter().enumerate() {
            if self.attachments[..position].iter().any(|a| a.point == attachment.point) {
                return Err(format!("attachment point {:?} used twice", attachment.point));
            }
        }
        Ok(())
    }
}
