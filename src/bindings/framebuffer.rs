// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Framebuffers and their completeness rules.
//!
//! A framebuffer declares its size and sample count up front and takes one color
//! attachment.  Completeness is a pure function of the declaration and the
//! attachment's [`TextureDescriptor`], so both drivers report identical statuses.

use std::fmt::{Display, Formatter};

use crate::bindings::handle::Handle;
use crate::bindings::texture_builder::{TextureDescriptor, TextureKind};
use crate::bittricks::mip_extent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramebufferDescriptor {
    pub label: String,
    pub color_attachment: Option<Handle>,
    /// Mip level of the attachment rendered to.
    pub level: u32,
    pub width: u32,
    pub height: u32,
    pub samples: u32,
}

/// Result of a completeness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferStatus {
    Complete,
    /// The handle does not name a framebuffer.
    Undefined,
    /// The attachment is dead, not renderable, or lacks the requested level.
    IncompleteAttachment,
    MissingAttachment,
    /// Sample counts are zero or disagree.
    IncompleteMultisample,
    /// Sizes are zero or disagree.
    IncompleteDimensions,
    /// The driver cannot render to this combination.
    Unsupported,
}

impl Display for FramebufferStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FramebufferStatus::Complete => "complete",
            FramebufferStatus::Undefined => "undefined",
            FramebufferStatus::IncompleteAttachment => "incomplete attachment",
            FramebufferStatus::MissingAttachment => "missing attachment",
            FramebufferStatus::IncompleteMultisample => "incomplete multisample",
            FramebufferStatus::IncompleteDimensions => "incomplete dimensions",
            FramebufferStatus::Unsupported => "unsupported",
        })
    }
}

impl FramebufferDescriptor {
    pub fn new(label: &str, width: u32, height: u32, samples: u32) -> Self {
        FramebufferDescriptor {
            label: label.to_string(),
            color_attachment: None,
            level: 0,
            width,
            height,
            samples,
        }
    }

    pub fn with_attachment(mut self, texture: Handle, level: u32) -> Self {
        self.color_attachment = Some(texture);
        self.level = level;
        self
    }

    /// Checks the declared parameters alone.
    pub fn validate_declared(&self) -> FramebufferStatus {
        if self.width == 0 || self.height == 0 {
            FramebufferStatus::IncompleteDimensions
        } else if self.samples == 0 {
            FramebufferStatus::IncompleteMultisample
        } else {
            FramebufferStatus::Complete
        }
    }

    /// Checks the declaration against its attachment.
    ///
    /// `attachment` is the descriptor of the attached texture, or `None` when the
    /// attached handle is not a live texture.
    pub fn status_against(&self, attachment: Option<&TextureDescriptor>) -> FramebufferStatus {
        let declared = self.validate_declared();
        if declared != FramebufferStatus::Complete {
            return declared;
        }
        if self.color_attachment.is_none() {
            return FramebufferStatus::MissingAttachment;
        }
        let Some(texture) = attachment else {
            return FramebufferStatus::IncompleteAttachment;
        };
        if !texture.render_target || !texture.format.is_renderable() || self.level >= texture.levels
        {
            return FramebufferStatus::IncompleteAttachment;
        }
        if !matches!(texture.kind, TextureKind::D2 | TextureKind::D2Multisample) {
            return FramebufferStatus::Unsupported;
        }
        if texture.samples != self.samples {
            return FramebufferStatus::IncompleteMultisample;
        }
        let extent = (
            mip_extent(texture.width, self.level),
            mip_extent(texture.height, self.level),
        );
        if extent != (self.width, self.height) {
            return FramebufferStatus::IncompleteDimensions;
        }
        FramebufferStatus::Complete
    }

    /// Checks that `self` can be resolved into `destination` over the full rect.
    pub fn resolve_status(&self, destination: &FramebufferDescriptor) -> FramebufferStatus {
        if destination.samples != 1 {
            FramebufferStatus::IncompleteMultisample
        } else if (self.width, self.height) != (destination.width, destination.height) {
            FramebufferStatus::IncompleteDimensions
        } else {
            FramebufferStatus::Complete
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::handle::{HandleAllocator, ResourceKind};
    use crate::bindings::texture_builder::TextureBuilder;
    use crate::pixel_formats::PixelFormat;

    fn msaa(samples: u32) -> TextureDescriptor {
        TextureBuilder::new("ms", 160, 160, PixelFormat::RGBA8UNorm)
            .kind(TextureKind::D2Multisample)
            .samples(samples)
            .render_target()
            .build()
            .unwrap()
    }

    #[test]
    fn complete_multisample_attachment() {
        let texture = HandleAllocator::new().allocate(ResourceKind::Texture);
        let fb = FramebufferDescriptor::new("render", 160, 160, 4).with_attachment(texture, 0);
        assert_eq!(fb.status_against(Some(&msaa(4))), FramebufferStatus::Complete);
    }

    #[test]
    fn zero_samples_is_incomplete_multisample() {
        let fb = FramebufferDescriptor::new("render", 160, 160, 0);
        assert_eq!(fb.validate_declared(), FramebufferStatus::IncompleteMultisample);
    }

    #[test]
    fn attachment_problems() {
        let texture = HandleAllocator::new().allocate(ResourceKind::Texture);
        let fb = FramebufferDescriptor::new("render", 160, 160, 4);
        assert_eq!(fb.status_against(None), FramebufferStatus::MissingAttachment);
        let fb = fb.with_attachment(texture, 0);
        assert_eq!(fb.status_against(None), FramebufferStatus::IncompleteAttachment);
        assert_eq!(
            fb.status_against(Some(&msaa(2))),
            FramebufferStatus::IncompleteMultisample
        );
        let small = FramebufferDescriptor::new("render", 80, 160, 4).with_attachment(texture, 0);
        assert_eq!(
            small.status_against(Some(&msaa(4))),
            FramebufferStatus::IncompleteDimensions
        );
        let sampled_only = TextureBuilder::new("t", 160, 160, PixelFormat::RGBA8UNorm)
            .build()
            .unwrap();
        let single = FramebufferDescriptor::new("r", 160, 160, 1).with_attachment(texture, 0);
        assert_eq!(
            single.status_against(Some(&sampled_only)),
            FramebufferStatus::IncompleteAttachment
        );
    }

    #[test]
    fn resolve_pairs() {
        let render = FramebufferDescriptor::new("render", 160, 160, 4);
        let resolve = FramebufferDescriptor::new("resolve", 160, 160, 1);
        assert_eq!(render.resolve_status(&resolve), FramebufferStatus::Complete);
        let wrong = FramebufferDescriptor::new("resolve", 128, 160, 1);
        assert_eq!(
            render.resolve_status(&wrong),
            FramebufferStatus::IncompleteDimensions
        );
    }
}
