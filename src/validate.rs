use crate::error::{HsaError, Result};
use crate::value::{Value, ValueType};
use tracing::{debug, error};

/// How buffer contents are compared with expected values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Comparison {
    #[default]
    Exact,
    /// Floats may differ by up to this many units in the last place.
    /// Integers still compare exactly.
    Ulps(u64),
}

fn is_nan(ty: ValueType, bits: u64) -> bool {
    match ty {
        ValueType::F16 => bits & 0x7c00 == 0x7c00 && bits & 0x03ff != 0,
        ValueType::F32 => f32::from_bits(bits as u32).is_nan(),
        ValueType::F64 => f64::from_bits(bits).is_nan(),
        _ => false,
    }
}

/// Maps float bits onto integers ordered like the floats, with both zeros
/// at 0.
fn ordered(ty: ValueType, bits: u64) -> i128 {
    match ty {
        ValueType::F16 => {
            let i = bits as u16 as i16;
            (if i < 0 { i16::MIN.wrapping_sub(i) } else { i }) as i128
        }
        ValueType::F32 => {
            let i = bits as u32 as i32;
            (if i < 0 { i32::MIN.wrapping_sub(i) } else { i }) as i128
        }
        _ => {
            let i = bits as i64;
            (if i < 0 { i64::MIN.wrapping_sub(i) } else { i }) as i128
        }
    }
}

/// Distance in units in the last place between two floats of type `ty`.
pub fn ulp_distance(ty: ValueType, a: u64, b: u64) -> u64 {
    let d = (ordered(ty, a) - ordered(ty, b)).unsigned_abs();
    u64::try_from(d).unwrap_or(u64::MAX)
}

fn matches(ty: ValueType, expected: u64, actual: u64, method: Comparison) -> bool {
    if !ty.is_float() {
        return expected == actual;
    }
    if is_nan(ty, expected) || is_nan(ty, actual) {
        return is_nan(ty, expected) && is_nan(ty, actual);
    }
    let tolerance = match method {
        Comparison::Exact => 0,
        Comparison::Ulps(n) => n,
    };
    ulp_distance(ty, expected, actual) <= tolerance
}

/// Compares the leading bytes of `memory`, read as consecutive values of
/// type `ty`, with `expected`.
pub fn validate_memory(
    memory: &[u8],
    expected: &[Value],
    ty: ValueType,
    method: Comparison,
) -> Result<()> {
    let needed = expected.len() * ty.size();
    if memory.len() < needed {
        return Err(HsaError::InvalidArgument(format!(
            "{} expected values need {} bytes, buffer has {}",
            expected.len(),
            needed,
            memory.len()
        )));
    }

    let mut mismatches = 0usize;
    for (index, (want, chunk)) in expected.iter().zip(memory.chunks_exact(ty.size())).enumerate() {
        if want.value_type() != ty {
            return Err(HsaError::InvalidArgument(format!(
                "expected value {} is {:?}, memory holds {:?}",
                index,
                want.value_type(),
                ty
            )));
        }
        let got = Value::read_from(ty, chunk)?;
        if !matches(ty, want.bits(), got.bits(), method) {
            mismatches += 1;
            error!(index, expected = %want, actual = %got, "value mismatch");
        }
    }

    if mismatches > 0 {
        return Err(HsaError::Validation(format!(
            "{} of {} values differ",
            mismatches,
            expected.len()
        )));
    }
    debug!(count = expected.len(), ?ty, ?method, "memory matches expected values");
    Ok(())
}
