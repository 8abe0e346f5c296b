//! Kernel argument layout.
//!
//! Arguments are appended one after another, each at the first offset that
//! is a multiple of its own size.

use crate::error::{HsaError, Result};
use crate::value::Value;

/// Smallest offset at or after `offset` that is naturally aligned for an
/// argument of `size` bytes.
pub fn aligned_offset(offset: usize, size: usize) -> usize {
    offset.next_multiple_of(size.max(1))
}

/// Value of a group-offset argument: the kernel's static group segment
/// followed by `dynamic_offset` bytes of dynamically allocated group memory.
pub fn group_offset(static_group_size: u32, dynamic_offset: u32) -> Result<u32> {
    static_group_size.checked_add(dynamic_offset).ok_or_else(|| {
        HsaError::InvalidArgument(format!(
            "group offset {} + {} overflows 32 bits",
            static_group_size, dynamic_offset
        ))
    })
}

/// Running write position in one dispatch's kernarg segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernargWriter {
    offset: usize,
    capacity: usize,
}

impl KernargWriter {
    pub fn new(capacity: usize) -> Self {
        Self {
            offset: 0,
            capacity,
        }
    }

    /// End of the last argument written.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Claims room for a `size` byte argument and returns where it starts.
    pub fn reserve(&mut self, size: usize) -> Result<usize> {
        let start = aligned_offset(self.offset, size);
        let end = start.checked_add(size).filter(|&end| end <= self.capacity).ok_or(
            HsaError::KernargOverflow {
                offset: start,
                size,
                capacity: self.capacity,
            },
        )?;
        self.offset = end;
        Ok(start)
    }

    pub fn write_value(&mut self, segment: &mut [u8], value: &Value) -> Result<usize> {
        let start = self.reserve(value.size())?;
        value.write_to(&mut segment[start..])?;
        Ok(start)
    }

    /// Writes raw bytes aligned as a `bytes.len()` sized scalar.
    pub fn write_bytes(&mut self, segment: &mut [u8], bytes: &[u8]) -> Result<usize> {
        let start = self.reserve(bytes.len())?;
        segment[start..start + bytes.len()].copy_from_slice(bytes);
        Ok(start)
    }
}
