// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Sampler configuration.
//!
//! A [`SamplerDescriptor`] names magnification, minification and mip filters
//! separately.  Drivers see the minification side through
//! [`SamplerDescriptor::min_filter_mode`], which folds the two into one of the four
//! combined modes.

/// Texel filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Filter {
    #[default]
    Nearest,
    Linear,
}

/// Minification combined with mip selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinFilter {
    NearestMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapNearest,
    LinearMipmapLinear,
}

impl MinFilter {
    /// Splits back into (minification, mip) filters.
    pub const fn split(self) -> (Filter, Filter) {
        match self {
            MinFilter::NearestMipmapNearest => (Filter::Nearest, Filter::Nearest),
            MinFilter::NearestMipmapLinear => (Filter::Nearest, Filter::Linear),
            MinFilter::LinearMipmapNearest => (Filter::Linear, Filter::Nearest),
            MinFilter::LinearMipmapLinear => (Filter::Linear, Filter::Linear),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    #[default]
    ClampToEdge,
    Repeat,
    MirrorRepeat,
    ClampToBorder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderColor {
    #[default]
    TransparentBlack,
    OpaqueBlack,
    OpaqueWhite,
}

impl BorderColor {
    pub const fn rgba(self) -> [f32; 4] {
        match self {
            BorderColor::TransparentBlack => [0.0, 0.0, 0.0, 0.0],
            BorderColor::OpaqueBlack => [0.0, 0.0, 0.0, 1.0],
            BorderColor::OpaqueWhite => [1.0, 1.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunction {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplerDescriptor {
    pub label: String,
    pub mag_filter: Filter,
    pub min_filter: Filter,
    pub mipmap_filter: Filter,
    /// Applied to u, v and w alike.
    pub address_mode: AddressMode,
    pub border_color: BorderColor,
    /// `None` disables comparison.
    pub compare: Option<CompareFunction>,
    pub lod_min_clamp: f32,
    pub lod_max_clamp: f32,
}

impl Default for SamplerDescriptor {
    fn default() -> Self {
        Self::nearest("sampler")
    }
}

impl SamplerDescriptor {
    /// Nearest filtering on every axis and mip, clamped to edge.
    pub fn nearest(label: &str) -> Self {
        SamplerDescriptor {
            label: label.to_string(),
            mag_filter: Filter::Nearest,
            min_filter: Filter::Nearest,
            mipmap_filter: Filter::Nearest,
            address_mode: AddressMode::ClampToEdge,
            border_color: BorderColor::TransparentBlack,
            compare: None,
            lod_min_clamp: 0.0,
            lod_max_clamp: 32.0,
        }
    }

    /// Linear magnification and minification with linear mip blending.
    pub fn trilinear(label: &str) -> Self {
        SamplerDescriptor {
            mag_filter: Filter::Linear,
            min_filter: Filter::Linear,
            mipmap_filter: Filter::Linear,
            ..Self::nearest(label)
        }
    }

    pub fn with_address_mode(mut self, address_mode: AddressMode) -> Self {
        self.address_mode = address_mode;
        self
    }

    pub fn with_border_color(mut self, border_color: BorderColor) -> Self {
        self.border_color = border_color;
        self
    }

    pub fn with_compare(mut self, compare: CompareFunction) -> Self {
        self.compare = Some(compare);
        self
    }

    /// The combined minification mode.
    pub const fn min_filter_mode(&self) -> MinFilter {
        match (self.min_filter, self.mipmap_filter) {
            (Filter::Linear, Filter::Linear) => MinFilter::LinearMipmapLinear,
            (Filter::Linear, Filter::Nearest) => MinFilter::LinearMipmapNearest,
            (Filter::Nearest, Filter::Linear) => MinFilter::NearestMipmapLinear,
            (Filter::Nearest, Filter::Nearest) => MinFilter::NearestMipmapNearest,
        }
    }

    /// Comparison function in effect; `LessEqual` when comparison is disabled.
    pub const fn compare_function(&self) -> CompareFunction {
        match self.compare {
            Some(c) => c,
            None => CompareFunction::LessEqual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_filter_combinations() {
        let mut d = SamplerDescriptor::nearest("s");
        assert_eq!(d.min_filter_mode(), MinFilter::NearestMipmapNearest);
        d.mipmap_filter = Filter::Linear;
        assert_eq!(d.min_filter_mode(), MinFilter::NearestMipmapLinear);
        d.min_filter = Filter::Linear;
        assert_eq!(d.min_filter_mode(), MinFilter::LinearMipmapLinear);
        d.mipmap_filter = Filter::Nearest;
        assert_eq!(d.min_filter_mode(), MinFilter::LinearMipmapNearest);
        assert_eq!(d.min_filter_mode().split(), (Filter::Linear, Filter::Nearest));
    }

    #[test]
    fn compare_defaults_to_less_equal() {
        let d = SamplerDescriptor::default();
        assert_eq!(d.compare, None);
        assert_eq!(d.compare_function(), CompareFunction::LessEqual);
        let d = d.with_compare(CompareFunction::Greater);
        assert_eq!(d.compare_function(), CompareFunction::Greater);
    }

    #[test]
    fn trilinear_keeps_clamp() {
        let d = SamplerDescriptor::trilinear("t");
        assert_eq!(d.mag_filter, Filter::Linear);
        assert_eq!(d.address_mode, AddressMode::ClampToEdge);
    }
}
