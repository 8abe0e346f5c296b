//! Typed scalar values exchanged between test steps and the runtime.

use crate::error::{HsaError, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    U8,
    U16,
    U32,
    U64,
    S8,
    S16,
    S32,
    S64,
    F16,
    F32,
    F64,
}

impl ValueType {
    pub fn size(self) -> usize {
        match self {
            ValueType::U8 | ValueType::S8 => 1,
            ValueType::U16 | ValueType::S16 | ValueType::F16 => 2,
            ValueType::U32 | ValueType::S32 | ValueType::F32 => 4,
            ValueType::U64 | ValueType::S64 | ValueType::F64 => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, ValueType::F16 | ValueType::F32 | ValueType::F64)
    }
}

/// One typed value. `F16` is carried as its raw bit pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    S8(i8),
    S16(i16),
    S32(i32),
    S64(i64),
    F16(u16),
    F32(f32),
    F64(f64),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::U8(_) => ValueType::U8,
            Value::U16(_) => ValueType::U16,
            Value::U32(_) => ValueType::U32,
            Value::U64(_) => ValueType::U64,
            Value::S8(_) => ValueType::S8,
            Value::S16(_) => ValueType::S16,
            Value::S32(_) => ValueType::S32,
            Value::S64(_) => ValueType::S64,
            Value::F16(_) => ValueType::F16,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
        }
    }

    /// Natural size in bytes.
    pub fn size(&self) -> usize {
        self.value_type().size()
    }

    /// Writes the value in host byte order into the first `size()` bytes.
    pub fn write_to(&self, dst: &mut [u8]) -> Result<()> {
        let size = self.size();
        let len = dst.len();
        let dst = dst.get_mut(..size).ok_or_else(|| {
            HsaError::InvalidArgument(format!(
                "{} bytes do not fit in a {} byte destination",
                size, len
            ))
        })?;
        match *self {
            Value::U8(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            Value::U16(v) | Value::F16(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            Value::U32(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            Value::U64(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            Value::S8(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            Value::S16(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            Value::S32(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            Value::S64(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            Value::F32(v) => dst.copy_from_slice(&v.to_ne_bytes()),
            Value::F64(v) => dst.copy_from_slice(&v.to_ne_bytes()),
        }
        Ok(())
    }

    /// Reads a value of type `ty` from the first bytes of `src`.
    pub fn read_from(ty: ValueType, src: &[u8]) -> Result<Self> {
        let bytes = src.get(..ty.size()).ok_or_else(|| {
            HsaError::InvalidArgument(format!(
                "need {} bytes to read {:?}, have {}",
                ty.size(),
                ty,
                src.len()
            ))
        })?;
        Ok(match ty {
            ValueType::U8 => Value::U8(bytes[0]),
            ValueType::S8 => Value::S8(bytes[0] as i8),
            ValueType::U16 => Value::U16(u16::from_ne_bytes([bytes[0], bytes[1]])),
            ValueType::F16 => Value::F16(u16::from_ne_bytes([bytes[0], bytes[1]])),
            ValueType::S16 => Value::S16(i16::from_ne_bytes([bytes[0], bytes[1]])),
            ValueType::U32 => Value::U32(u32::from_ne_bytes(array(bytes))),
            ValueType::S32 => Value::S32(i32::from_ne_bytes(array(bytes))),
            ValueType::F32 => Value::F32(f32::from_ne_bytes(array(bytes))),
            ValueType::U64 => Value::U64(u64::from_ne_bytes(array(bytes))),
            ValueType::S64 => Value::S64(i64::from_ne_bytes(array(bytes))),
            ValueType::F64 => Value::F64(f64::from_ne_bytes(array(bytes))),
        })
    }

    /// Raw bits zero-extended to 64 bits.
    pub fn bits(&self) -> u64 {
        match *self {
            Value::U8(v) => v as u64,
            Value::U16(v) | Value::F16(v) => v as u64,
            Value::U32(v) => v as u64,
            Value::U64(v) => v,
            Value::S8(v) => v as u8 as u64,
            Value::S16(v) => v as u16 as u64,
            Value::S32(v) => v as u32 as u64,
            Value::S64(v) => v as u64,
            Value::F32(v) => v.to_bits() as u64,
            Value::F64(v) => v.to_bits(),
        }
    }

    /// Integer interpretation, for values used as sizes or offsets.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U8(v) => Some(v as u64),
            Value::U16(v) => Some(v as u64),
            Value::U32(v) => Some(v as u64),
            Value::U64(v) => Some(v),
            Value::S8(v) => u64::try_from(v).ok(),
            Value::S16(v) => u64::try_from(v).ok(),
            Value::S32(v) => u64::try_from(v).ok(),
            Value::S64(v) => u64::try_from(v).ok(),
            Value::F16(_) | Value::F32(_) | Value::F64(_) => None,
        }
    }
}

fn array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[..N]);
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U8(v) => write!(f, "u8 {}", v),
            Value::U16(v) => write!(f, "u16 {}", v),
            Value::U32(v) => write!(f, "u32 {}", v),
            Value::U64(v) => write!(f, "u64 {}", v),
            Value::S8(v) => write!(f, "s8 {}", v),
            Value::S16(v) => write!(f, "s16 {}", v),
            Value::S32(v) => write!(f, "s32 {}", v),
            Value::S64(v) => write!(f, "s64 {}", v),
            Value::F16(v) => write!(f, "f16 {:#06x}", v),
            Value::F32(v) => write!(f, "f32 {:e} ({:#010x})", v, v.to_bits()),
            Value::F64(v) => write!(f, "f64 {:e} ({:#018x})", v, v.to_bits()),
        }
    }
}

/// Total byte size of a value list packed back to back.
pub fn packed_size(values: &[Value]) -> usize {
    values.iter().map(Value::size).sum()
}

/// Packs values back to back at their natural sizes.
pub fn pack_values(values: &[Value], dst: &mut [u8]) -> Result<usize> {
    let mut offset = 0;
    for value in values {
        let start = offset.min(dst.len());
        value.write_to(&mut dst[start..])?;
        offset += value.size();
    }
    Ok(offset)
}
