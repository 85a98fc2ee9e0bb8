//! Element type conversion for constant tensors.
//!
//! Conversions are looked up in a static table keyed by destination type and
//! source storage family. A pair that is not in the table is unsupported.
//!
//! Each kernel casts value by value with `as` semantics: float to integer
//! truncates toward zero (saturating at the integer bounds, NaN becomes 0),
//! integer narrowing wraps. Small integer destinations are narrowed to their
//! logical type and then widened back into the shared `i32` slot, so an
//! `int8` result of `-1` is stored as `-1i32` and a `uint8` result of `255`
//! as `255i32`.

use crate::types::{DataType, StorageKind, TensorData};
use crate::{Error, Result};
use num_traits::AsPrimitive;

/// A per-buffer conversion routine.
///
/// Returns `None` if the buffer is not of the family the kernel reads.
pub type ConvertKernel = fn(&TensorData) -> Option<TensorData>;

/// One cell of the conversion table.
#[derive(Clone, Copy)]
pub struct Conversion {
    /// Destination element type.
    pub dst: DataType,

    /// Source storage family.
    pub src: StorageKind,

    /// Routine producing the destination buffer.
    pub kernel: ConvertKernel,
}

/// Primitive element types that back a [`TensorData`] variant.
pub trait StorageElement: Copy + 'static {
    const KIND: StorageKind;

    fn slice(data: &TensorData) -> Option<&[Self]>;

    fn wrap(values: Vec<Self>) -> TensorData;
}

macro_rules! storage_element {
    ($ty:ty, $variant:ident) => {
        impl StorageElement for $ty {
            const KIND: StorageKind = StorageKind::$variant;

            fn slice(data: &TensorData) -> Option<&[Self]> {
                match data {
                    TensorData::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn wrap(values: Vec<Self>) -> TensorData {
                TensorData::$variant(values)
            }
        }
    };
}

storage_element!(f32, F32);
storage_element!(i32, I32);
storage_element!(i64, I64);
storage_element!(f64, F64);
storage_element!(u64, U64);

/// Read `S` slots, cast each to logical type `L`, store as `D` slots.
fn stage<S, L, D>(data: &TensorData) -> Option<TensorData>
where
    S: StorageElement + AsPrimitive<L>,
    L: Copy + 'static + AsPrimitive<D>,
    D: StorageElement,
{
    let src = S::slice(data)?;
    let values = src
        .iter()
        .map(|&v| {
            let logical: L = v.as_();
            logical.as_()
        })
        .collect();
    Some(D::wrap(values))
}

// `DST as LOGICAL => SLOT: [sources]` expands to one table row per source
// slot type.
macro_rules! conversion_table {
    ($($dst:ident as $logical:ty => $slot:ty : [$($src:ty),*];)*) => {
        &[$($(
            Conversion {
                dst: DataType::$dst,
                src: <$src as StorageElement>::KIND,
                kernel: stage::<$src, $logical, $slot>,
            },
        )*)*]
    };
}

// Sources never include the destination's own storage family.
static CONVERSIONS: &[Conversion] = conversion_table! {
    F32 as f32 => f32: [i32, i64, f64, u64];
    U8 as u8 => i32: [f32, i64, f64, u64];
    I8 as i8 => i32: [f32, i64, f64, u64];
    U16 as u16 => i32: [f32, i64, f64, u64];
    I16 as i16 => i32: [f32, i64, f64, u64];
    I32 as i32 => i32: [f32, i64, f64, u64];
    I64 as i64 => i64: [f32, i32, f64, u64];
    F64 as f64 => f64: [f32, i32, i64, u64];
    U32 as u32 => u64: [f32, i32, i64, f64];
    U64 as u64 => u64: [f32, i32, i64, f64];
};

/// Every supported `(dst, source family)` cell.
pub fn conversions() -> &'static [Conversion] {
    CONVERSIONS
}

/// Look up the kernel converting `src` elements to `dst`.
///
/// Returns `None` when either side is a kind cast fusion does not handle or
/// the pair is missing from the table (including identity pairs).
pub fn find_conversion(src: DataType, dst: DataType) -> Option<ConvertKernel> {
    if !src.is_supported_by_cast_fusion() || !dst.is_supported_by_cast_fusion() {
        return None;
    }

    let family = src.storage_kind();
    CONVERSIONS
        .iter()
        .find(|c| c.dst == dst && c.src == family)
        .map(|c| c.kernel)
}

/// Whether `src` elements can be converted to `dst`.
pub fn is_supported(src: DataType, dst: DataType) -> bool {
    find_conversion(src, dst).is_some()
}

/// Convert a buffer of `src` elements to a buffer of `dst` elements.
///
/// # Errors
///
/// Returns `Error::UnsupportedConversion` if the pair is not in the table or
/// if `data` is not stored in `src`'s family.
pub fn convert(src: DataType, dst: DataType, data: &TensorData) -> Result<TensorData> {
    find_conversion(src, dst)
        .and_then(|kernel| kernel(data))
        .ok_or(Error::UnsupportedConversion { from: src, to: dst })
}
