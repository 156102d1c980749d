use num_derive::FromPrimitive;

/// Element type of a tensor (`TfLiteType`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, FromPrimitive)]
pub enum TensorType {
    NoType = 0,
    Float32 = 1,
    Int32 = 2,
    UInt8 = 3,
    Int64 = 4,
    String = 5,
    Bool = 6,
    Int16 = 7,
    Complex64 = 8,
    Int8 = 9,
    Float16 = 10,
    Float64 = 11,
    Complex128 = 12,
    UInt64 = 13,
    Resource = 14,
    Variant = 15,
    UInt32 = 16,
    UInt16 = 17,
    /// Packed two per byte.
    Int4 = 18,
    BFloat16 = 19,
}

impl TensorType {
    /// Storage width of one element in bytes.
    ///
    /// `None` for strings, whose width depends on the payload. Types without
    /// a whole-byte storage width (no type, resources, variants, packed int4)
    /// report zero.
    pub fn element_width(self) -> Option<usize> {
        use std::mem::size_of;

        Some(match self {
            Self::NoType | Self::Resource | Self::Variant | Self::Int4 => 0,
            Self::Float32 => size_of::<f32>(),
            Self::Int32 => size_of::<i32>(),
            Self::UInt8 => size_of::<u8>(),
            Self::Int64 => size_of::<i64>(),
            Self::String => return None,
            Self::Bool => size_of::<bool>(),
            Self::Int16 => size_of::<i16>(),
            Self::Complex64 => 2 * size_of::<f32>(),
            Self::Int8 => size_of::<i8>(),
            Self::Float16 | Self::BFloat16 => size_of::<u16>(),
            Self::Float64 => size_of::<f64>(),
            Self::Complex128 => 2 * size_of::<f64>(),
            Self::UInt64 => size_of::<u64>(),
            Self::UInt32 => size_of::<u32>(),
            Self::UInt16 => size_of::<u16>(),
        })
    }

    /// The name TensorFlow Lite uses for this type (`TfLiteTypeGetName`).
    pub fn name(self) -> &'static str {
        match self {
            Self::NoType => "NOTYPE",
            Self::Float32 => "FLOAT32",
            Self::Int32 => "INT32",
            Self::UInt8 => "UINT8",
            Self::Int64 => "INT64",
            Self::String => "STRING",
            Self::Bool => "BOOL",
            Self::Int16 => "INT16",
            Self::Complex64 => "COMPLEX64",
            Self::Int8 => "INT8",
            Self::Float16 => "FLOAT16",
            Self::Float64 => "FLOAT64",
            Self::Complex128 => "COMPLEX128",
            Self::UInt64 => "UINT64",
            Self::Resource => "RESOURCE",
            Self::Variant => "VARIANT",
            Self::UInt32 => "UINT32",
            Self::UInt16 => "UINT16",
            Self::Int4 => "INT4",
            Self::BFloat16 => "BFLOAT16",
        }
    }
}

impl std::fmt::Display for TensorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
