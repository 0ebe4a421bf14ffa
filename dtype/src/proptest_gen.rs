//! Proptest strategies for element-type vocabularies.

use proptest::prelude::*;
use strum::VariantArray;

use crate::{AccessMode, ImageKind, ScalarType};

/// Strategy over every scalar element type.
pub fn scalar_type() -> impl Strategy<Value = ScalarType> {
    proptest::sample::select(ScalarType::VARIANTS.to_vec())
}

/// Strategy over scalar element types with the given byte width.
pub fn scalar_type_of_width(bytes: usize) -> impl Strategy<Value = ScalarType> {
    let matching: Vec<_> = ScalarType::VARIANTS.iter().copied().filter(|s| s.bytes() == bytes).collect();
    proptest::sample::select(matching)
}

/// Strategy over buffer/image access modes.
pub fn access_mode() -> impl Strategy<Value = AccessMode> {
    proptest::sample::select(AccessMode::VARIANTS.to_vec())
}

/// Strategy over image channel kinds.
pub fn image_kind() -> impl Strategy<Value = ImageKind> {
    proptest::sample::select(ImageKind::VARIANTS.to_vec())
}
