// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! CPU-side resources backing the software driver. */

pub mod texture;
