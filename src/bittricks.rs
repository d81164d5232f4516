// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
alignment and mip arithmetic.

todo: should this be a crate?
*/

/// Rounds `value` up to the next multiple of `alignment`.
///
/// An alignment of 0 is treated as 1.
pub const fn align_up(value: u64, alignment: u64) -> u64 {
    let alignment = if alignment == 0 { 1 } else { alignment };
    value.div_ceil(alignment) * alignment
}

/// Extent of mip `level` for a base extent, never smaller than 1.
pub const fn mip_extent(base: u32, level: u32) -> u32 {
    if level >= 32 {
        return 1;
    }
    let e = base >> level;
    if e == 0 { 1 } else { e }
}

/// Length of the full mip chain for a `width` x `height` image.
pub const fn max_mip_levels(width: u32, height: u32) -> u32 {
    let largest = if width > height { width } else { height };
    if largest == 0 {
        return 0;
    }
    32 - largest.leading_zeros()
}
