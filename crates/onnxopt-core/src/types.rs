//! Core types for element types, shapes and constant tensors.

use crate::{Error, Result};
use std::fmt;

/// Element types of the ONNX `TensorProto.DataType` enumeration.
///
/// Discriminants are the ONNX wire codes, so `DataType::U8 as i64 == 2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    F32 = 1,
    U8 = 2,
    I8 = 3,
    U16 = 4,
    I16 = 5,
    I32 = 6,
    I64 = 7,
    String = 8,
    Bool = 9,
    F16 = 10,
    F64 = 11,
    U32 = 12,
    U64 = 13,
    Complex64 = 14,
    Complex128 = 15,
    BF16 = 16,
}

impl DataType {
    /// Every element type, in ONNX code order.
    pub const ALL: [DataType; 16] = [
        DataType::F32,
        DataType::U8,
        DataType::I8,
        DataType::U16,
        DataType::I16,
        DataType::I32,
        DataType::I64,
        DataType::String,
        DataType::Bool,
        DataType::F16,
        DataType::F64,
        DataType::U32,
        DataType::U64,
        DataType::Complex64,
        DataType::Complex128,
        DataType::BF16,
    ];

    /// Look up an element type from its ONNX code.
    ///
    /// Returns `None` for `UNDEFINED` (0) and codes this crate does not know.
    pub fn from_onnx_code(code: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|dtype| dtype.onnx_code() == code)
    }

    /// The ONNX `TensorProto.DataType` code.
    pub fn onnx_code(self) -> i64 {
        self as i64
    }

    /// Whether `Cast` constants of this type can be folded.
    ///
    /// Strings, booleans, half floats and complex numbers are kept as graph
    /// data but never converted.
    pub fn is_supported_by_cast_fusion(self) -> bool {
        !matches!(
            self,
            DataType::String
                | DataType::Bool
                | DataType::F16
                | DataType::BF16
                | DataType::Complex64
                | DataType::Complex128
        )
    }

    /// The physical buffer that holds elements of this type.
    ///
    /// Several logical types share one buffer width, the same way
    /// `TensorProto` stores them.
    pub fn storage_kind(self) -> StorageKind {
        match self {
            DataType::F32 | DataType::Complex64 => StorageKind::F32,
            DataType::U8
            | DataType::I8
            | DataType::U16
            | DataType::I16
            | DataType::I32
            | DataType::Bool
            | DataType::F16
            | DataType::BF16 => StorageKind::I32,
            DataType::String => StorageKind::Strings,
            DataType::I64 => StorageKind::I64,
            DataType::F64 | DataType::Complex128 => StorageKind::F64,
            DataType::U32 | DataType::U64 => StorageKind::U64,
        }
    }

    /// Buffer slots used per logical element (2 for complex types).
    pub fn slots_per_element(self) -> usize {
        match self {
            DataType::Complex64 | DataType::Complex128 => 2,
            _ => 1,
        }
    }

    /// Inclusive range a staged integer must fall in, for types stored in a
    /// wider slot than their logical width.
    fn staged_range(self) -> Option<(i128, i128)> {
        match self {
            DataType::U8 => Some((0, u8::MAX as i128)),
            DataType::I8 => Some((i8::MIN as i128, i8::MAX as i128)),
            DataType::U16 | DataType::F16 | DataType::BF16 => Some((0, u16::MAX as i128)),
            DataType::I16 => Some((i16::MIN as i128, i16::MAX as i128)),
            DataType::Bool => Some((0, 1)),
            DataType::U32 => Some((0, u32::MAX as i128)),
            _ => None,
        }
    }

    /// ONNX spelling of the type name (`"float"`, `"uint8"`, ...).
    pub fn onnx_name(self) -> &'static str {
        match self {
            DataType::F32 => "float",
            DataType::U8 => "uint8",
            DataType::I8 => "int8",
            DataType::U16 => "uint16",
            DataType::I16 => "int16",
            DataType::I32 => "int32",
            DataType::I64 => "int64",
            DataType::String => "string",
            DataType::Bool => "bool",
            DataType::F16 => "float16",
            DataType::F64 => "double",
            DataType::U32 => "uint32",
            DataType::U64 => "uint64",
            DataType::Complex64 => "complex64",
            DataType::Complex128 => "complex128",
            DataType::BF16 => "bfloat16",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.onnx_name())
    }
}

/// Physical buffer families of a constant tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    F32,
    I32,
    Strings,
    I64,
    F64,
    U64,
}

/// Node attribute values.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Int(i64),
    String(String),
}

impl TryFrom<AttributeValue> for i64 {
    type Error = String;

    fn try_from(value: AttributeValue) -> std::result::Result<Self, Self::Error> {
        match value {
            AttributeValue::Int(v) => Ok(v),
            _ => Err("Not an int".to_string()),
        }
    }
}

/// Shape of a value flowing through the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TensorShape {
    /// All dimensions are known.
    Static(Vec<usize>),

    /// Shape has not been inferred.
    Unknown,
}

impl TensorShape {
    /// Get static dimensions if available.
    pub fn as_static(&self) -> Option<&[usize]> {
        match self {
            TensorShape::Static(dims) => Some(dims),
            TensorShape::Unknown => None,
        }
    }
}

/// Number of elements described by `shape`.
///
/// An empty shape is a scalar and holds one element. Saturates at
/// `usize::MAX`; see [`checked_count_elements`].
pub fn count_elements(shape: &[usize]) -> usize {
    checked_count_elements(shape).unwrap_or(usize::MAX)
}

/// Number of elements described by `shape`, or `None` if it overflows.
///
/// A zero dimension makes the count zero regardless of the others.
pub fn checked_count_elements(shape: &[usize]) -> Option<usize> {
    if shape.contains(&0) {
        return Some(0);
    }
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

/// Typed buffer of a constant tensor.
///
/// Exactly one physical family is populated; see [`DataType::storage_kind`]
/// for which logical types share a family.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    F32(Vec<f32>),
    I32(Vec<i32>),
    Strings(Vec<Vec<u8>>),
    I64(Vec<i64>),
    F64(Vec<f64>),
    U64(Vec<u64>),
}

impl TensorData {
    /// Number of slots in the buffer.
    pub fn len(&self) -> usize {
        match self {
            TensorData::F32(v) => v.len(),
            TensorData::I32(v) => v.len(),
            TensorData::Strings(v) => v.len(),
            TensorData::I64(v) => v.len(),
            TensorData::F64(v) => v.len(),
            TensorData::U64(v) => v.len(),
        }
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Which physical family this buffer belongs to.
    pub fn storage_kind(&self) -> StorageKind {
        match self {
            TensorData::F32(_) => StorageKind::F32,
            TensorData::I32(_) => StorageKind::I32,
            TensorData::Strings(_) => StorageKind::Strings,
            TensorData::I64(_) => StorageKind::I64,
            TensorData::F64(_) => StorageKind::F64,
            TensorData::U64(_) => StorageKind::U64,
        }
    }

    /// Integer slots widened to `i128`, for range checks.
    fn integer_slots(&self) -> Option<Vec<i128>> {
        match self {
            TensorData::I32(v) => Some(v.iter().map(|&x| x as i128).collect()),
            TensorData::I64(v) => Some(v.iter().map(|&x| x as i128).collect()),
            TensorData::U64(v) => Some(v.iter().map(|&x| x as i128).collect()),
            _ => None,
        }
    }
}

/// A named, typed, shaped constant (an initializer).
#[derive(Debug, Clone, PartialEq)]
pub struct TensorConstant {
    /// Initializer name; matches the graph value it feeds.
    pub name: String,

    /// Logical element type.
    pub dtype: DataType,

    /// Dimension sizes (empty for scalars).
    pub shape: Vec<usize>,

    /// Element buffer.
    pub data: TensorData,
}

impl TensorConstant {
    /// Create a constant, checking that `data` is the right family and length
    /// for `dtype` and `shape`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTensor` if the buffer family does not match the
    /// element type, if its length disagrees with the shape, or if a value
    /// staged in a wider slot is outside the logical type's range.
    pub fn new(
        name: impl Into<String>,
        dtype: DataType,
        shape: Vec<usize>,
        data: TensorData,
    ) -> Result<Self> {
        let name = name.into();

        if data.storage_kind() != dtype.storage_kind() {
            return Err(Error::InvalidTensor(format!(
                "initializer '{}' of type {} cannot be stored in a {:?} buffer",
                name,
                dtype,
                data.storage_kind()
            )));
        }

        let expected = checked_count_elements(&shape)
            .and_then(|count| count.checked_mul(dtype.slots_per_element()))
            .ok_or_else(|| {
                Error::InvalidTensor(format!(
                    "initializer '{}' has shape {:?} whose size overflows",
                    name, shape
                ))
            })?;
        if data.len() != expected {
            return Err(Error::InvalidTensor(format!(
                "initializer '{}' has {} slots but shape {:?} needs {}",
                name,
                data.len(),
                shape,
                expected
            )));
        }

        if let (Some((lo, hi)), Some(slots)) = (dtype.staged_range(), data.integer_slots()) {
            if let Some(bad) = slots.iter().find(|&&v| v < lo || v > hi) {
                return Err(Error::InvalidTensor(format!(
                    "initializer '{}' holds {} which is not a valid {}",
                    name, bad, dtype
                )));
            }
        }

        Ok(Self {
            name,
            dtype,
            shape,
            data,
        })
    }

    /// Number of logical elements.
    pub fn element_count(&self) -> usize {
        count_elements(&self.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_elements() {
        assert_eq!(count_elements(&[]), 1);
        assert_eq!(count_elements(&[2, 3]), 6);
        assert_eq!(count_elements(&[4, 0, 7]), 0);
    }

    #[test]
    fn test_checked_count_elements_overflow() {
        assert_eq!(checked_count_elements(&[usize::MAX, 2]), None);
        assert_eq!(checked_count_elements(&[usize::MAX, 2, 0]), Some(0));
        assert_eq!(checked_count_elements(&[]), Some(1));
        assert_eq!(count_elements(&[usize::MAX, 2]), usize::MAX);
    }

    #[test]
    fn test_tensor_constant_rejects_oversized_shape() {
        let err = TensorConstant::new(
            "huge",
            DataType::F32,
            vec![usize::MAX, 2],
            TensorData::F32(vec![]),
        );
        assert!(matches!(err, Err(Error::InvalidTensor(_))));

        // Element count fits but the two slots per complex element do not
        let err = TensorConstant::new(
            "huge",
            DataType::Complex64,
            vec![usize::MAX / 2 + 1],
            TensorData::F32(vec![]),
        );
        assert!(matches!(err, Err(Error::InvalidTensor(_))));
    }

    #[test]
    fn test_onnx_codes() {
        assert_eq!(DataType::F32.onnx_code(), 1);
        assert_eq!(DataType::U8.onnx_code(), 2);
        assert_eq!(DataType::F64.onnx_code(), 11);
        assert_eq!(DataType::BF16.onnx_code(), 16);
        assert_eq!(DataType::from_onnx_code(7), Some(DataType::I64));
        assert_eq!(DataType::from_onnx_code(0), None);
        assert_eq!(DataType::from_onnx_code(17), None);

        for dtype in DataType::ALL {
            assert_eq!(DataType::from_onnx_code(dtype.onnx_code()), Some(dtype));
        }
    }

    #[test]
    fn test_supported_kinds() {
        let supported: Vec<_> = DataType::ALL
            .into_iter()
            .filter(|d| d.is_supported_by_cast_fusion())
            .collect();
        assert_eq!(supported.len(), 10);
        assert!(!DataType::Bool.is_supported_by_cast_fusion());
        assert!(!DataType::Complex128.is_supported_by_cast_fusion());
    }

    #[test]
    fn test_display_uses_onnx_names() {
        assert_eq!(DataType::F32.to_string(), "float");
        assert_eq!(DataType::F64.to_string(), "double");
        assert_eq!(DataType::U16.to_string(), "uint16");
    }

    #[test]
    fn test_tensor_constant_scalar() {
        let scalar =
            TensorConstant::new("s", DataType::I64, vec![], TensorData::I64(vec![42])).unwrap();
        assert_eq!(scalar.element_count(), 1);
    }

    #[test]
    fn test_tensor_constant_rejects_wrong_family() {
        let err = TensorConstant::new("w", DataType::U8, vec![2], TensorData::I64(vec![1, 2]));
        assert!(matches!(err, Err(Error::InvalidTensor(_))));
    }

    #[test]
    fn test_tensor_constant_rejects_wrong_length() {
        let err = TensorConstant::new(
            "w",
            DataType::F32,
            vec![2, 4],
            TensorData::F32(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
        );
        assert!(matches!(err, Err(Error::InvalidTensor(_))));
    }

    #[test]
    fn test_tensor_constant_rejects_out_of_range_staging() {
        let err = TensorConstant::new("w", DataType::U8, vec![1], TensorData::I32(vec![300]));
        assert!(matches!(err, Err(Error::InvalidTensor(_))));

        let err = TensorConstant::new("w", DataType::U32, vec![1], TensorData::U64(vec![1 << 40]));
        assert!(matches!(err, Err(Error::InvalidTensor(_))));

        let ok = TensorConstant::new("w", DataType::I8, vec![2], TensorData::I32(vec![-128, 127]));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_complex_uses_two_slots() {
        let ok = TensorConstant::new(
            "c",
            DataType::Complex64,
            vec![2],
            TensorData::F32(vec![1.0, 0.0, 0.5, -0.5]),
        );
        assert!(ok.is_ok());
    }
}
