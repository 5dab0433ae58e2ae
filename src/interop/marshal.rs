//! Scalar marshaling - foreign scalars <-> host primitives
//!
//! Design: one coercion protocol call per value, range checks done on the
//! widened `i128`/`f64` intermediate so every width shares one code path.

use super::types::PrimitiveKind;
use crate::errors::{ConversionError, ConversionResult};
use crate::foreign::{ForeignErrorKind, ForeignRef, Gil};
use crate::host::HostValue;
use crate::logging::log_conversion_failure;

/// Convert a borrowed foreign scalar to a host primitive
///
/// With `report_error` set a failure is also raised in the foreign error
/// indicator; without it nothing but the returned outcome is touched.
pub fn to_host(
    py: Gil<'_>,
    value: &ForeignRef,
    kind: PrimitiveKind,
    report_error: bool,
) -> ConversionResult<HostValue> {
    let result = extract(py, value, kind);

    if let Err(e) = &result {
        if report_error {
            log_conversion_failure(&e.source_type, &e.target_type, &e.to_string());
            py.set_error(e.to_foreign_error());
        }
    }
    result
}

/// Pure scalar extraction: never touches the error indicator
pub(crate) fn extract(
    py: Gil<'_>,
    value: &ForeignRef,
    kind: PrimitiveKind,
) -> ConversionResult<HostValue> {
    match kind {
        PrimitiveKind::String => value
            .as_str()
            .map(|s| HostValue::String(s.to_owned()))
            .ok_or_else(|| mismatch(py, value, kind)),

        // Truth protocol accepts every object
        PrimitiveKind::Bool => Ok(HostValue::Bool(py.is_true(value))),

        PrimitiveKind::Char => extract_char(py, value),

        PrimitiveKind::I8 | PrimitiveKind::U8 => match value.as_bytes() {
            Some([byte]) => Ok(if kind == PrimitiveKind::I8 {
                HostValue::I8(*byte as i8)
            } else {
                HostValue::U8(*byte)
            }),
            Some(_) => Err(mismatch(py, value, kind).with_detail("expected a single byte")),
            None => extract_integer(py, value, kind),
        },

        PrimitiveKind::I16
        | PrimitiveKind::U16
        | PrimitiveKind::I32
        | PrimitiveKind::U32
        | PrimitiveKind::I64
        | PrimitiveKind::U64 => extract_integer(py, value, kind),

        PrimitiveKind::F32 => {
            let v = extract_float(py, value, kind)?;
            if v.is_finite() && v.abs() > f64::from(f32::MAX) {
                return Err(overflow(py, value, kind).with_detail(format!("{} outside f32 range", v)));
            }
            Ok(HostValue::F32(v as f32))
        }

        PrimitiveKind::F64 => extract_float(py, value, kind).map(HostValue::F64),
    }
}

fn extract_integer(py: Gil<'_>, value: &ForeignRef, kind: PrimitiveKind) -> ConversionResult<HostValue> {
    let number = py.number_long(value).map_err(|e| {
        let error = if e.kind == ForeignErrorKind::OverflowError {
            overflow(py, value, kind)
        } else {
            mismatch(py, value, kind)
        };
        error.with_detail(e.message)
    })?;

    // number_long only ever yields int/long objects
    let wide = number
        .as_i128()
        .ok_or_else(|| mismatch(py, value, kind))?;

    HostValue::from_i128(kind, wide).ok_or_else(|| {
        let error = overflow(py, value, kind);
        match kind.range() {
            Some((min, max)) => error.with_detail(format!("{} outside [{}, {}]", wide, min, max)),
            None => error,
        }
    })
}

fn extract_float(py: Gil<'_>, value: &ForeignRef, kind: PrimitiveKind) -> ConversionResult<f64> {
    let number = py
        .number_float(value)
        .map_err(|e| mismatch(py, value, kind).with_detail(e.message))?;

    number.as_f64().ok_or_else(|| mismatch(py, value, kind))
}

fn extract_char(py: Gil<'_>, value: &ForeignRef) -> ConversionResult<HostValue> {
    let kind = PrimitiveKind::Char;

    if let Some(text) = value.as_str() {
        let mut chars = text.chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => u16::try_from(u32::from(c))
                .map(HostValue::Char)
                .map_err(|_| {
                    overflow(py, value, kind)
                        .with_detail(format!("U+{:04X} exceeds one code unit", u32::from(c)))
                }),
            _ => Err(mismatch(py, value, kind).with_detail("expected a string of length 1")),
        };
    }

    match value.as_bytes() {
        Some([byte]) => Ok(HostValue::Char(u16::from(*byte))),
        _ => Err(mismatch(py, value, kind)),
    }
}

#[inline]
fn mismatch(py: Gil<'_>, value: &ForeignRef, kind: PrimitiveKind) -> ConversionError {
    ConversionError::type_mismatch(py.type_name(value), kind.name())
}

#[inline]
fn overflow(py: Gil<'_>, value: &ForeignRef, kind: PrimitiveKind) -> ConversionError {
    ConversionError::overflow(py.type_name(value), kind.name())
}

/// Convert a host scalar to a new foreign reference
///
/// Total for `Null`, booleans, fixed-width numbers and strings. `None` for
/// values that are not scalars and for lone surrogate chars, which have no
/// foreign string form; the engine identity-wraps those instead.
pub fn to_foreign(py: Gil<'_>, value: &HostValue) -> Option<ForeignRef> {
    let object = match value {
        HostValue::Null => py.none(),
        HostValue::Bool(b) => py.bool(*b),
        HostValue::Char(unit) => {
            let c = char::from_u32(u32::from(*unit))?;
            py.str(c.encode_utf8(&mut [0; 4]))
        }
        HostValue::F32(v) => py.float(f64::from(*v)),
        HostValue::F64(v) => py.float(*v),
        HostValue::String(s) => py.str(s),
        other => py.int(other.as_i128()?),
    };
    Some(object)
}
