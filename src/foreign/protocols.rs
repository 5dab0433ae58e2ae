//! Coercion protocols - numeric, truth and sequence
//!
//! Pure with respect to the error indicator: failures come back as
//! `ForeignError` values and the caller decides whether to raise them.

use super::object::{ObjectData, TypeTag};
use super::refcount::ForeignRef;
use super::{ForeignError, Gil};
use num_traits::ToPrimitive;

impl<'py> Gil<'py> {
    /// Type name of `value` as the foreign runtime reports it
    pub fn type_name(self, value: &ForeignRef) -> String {
        match value.data() {
            ObjectData::HostInstance(inner) => inner
                .runtime_type()
                .map(|ty| ty.name().to_owned())
                .unwrap_or_else(|| TypeTag::HostInstance.name().to_owned()),
            ObjectData::Instance(data) => data.class_name.clone(),
            _ => value.type_tag().name().to_owned(),
        }
    }

    /// Printable representation, used in diagnostics
    pub fn repr(self, value: &ForeignRef) -> String {
        match value.data() {
            ObjectData::None => "None".to_owned(),
            ObjectData::Bool(true) => "True".to_owned(),
            ObjectData::Bool(false) => "False".to_owned(),
            ObjectData::Int(v) => v.to_string(),
            ObjectData::Float(v) => format_float(*v),
            ObjectData::Str(s) => format!("'{}'", s),
            ObjectData::Bytes(b) => format!("b'{}'", b.escape_ascii()),
            ObjectData::List(items) => format!("[{}]", self.join_repr(items)),
            ObjectData::Tuple(items) if items.len() == 1 => {
                format!("({},)", self.repr(&items[0]))
            }
            ObjectData::Tuple(items) => format!("({})", self.join_repr(items)),
            ObjectData::Type(tag) => format!("<class '{}'>", tag.name()),
            ObjectData::HostInstance(_) => format!("<{} object>", self.type_name(value)),
            ObjectData::HostClass(ty) => format!("<host class '{}'>", ty.name()),
            ObjectData::Instance(data) => format!("<{} object>", data.class_name),
        }
    }

    fn join_repr(self, items: &[ForeignRef]) -> String {
        items
            .iter()
            .map(|item| self.repr(item))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Truth-value protocol (never fails)
    pub fn is_true(self, value: &ForeignRef) -> bool {
        match value.data() {
            ObjectData::None => false,
            ObjectData::Bool(b) => *b,
            ObjectData::Int(v) => *v != 0,
            ObjectData::Float(v) => *v != 0.0,
            ObjectData::Str(s) => !s.is_empty(),
            ObjectData::Bytes(b) => !b.is_empty(),
            ObjectData::List(items) | ObjectData::Tuple(items) => !items.is_empty(),
            ObjectData::Instance(data) => data.truthy,
            ObjectData::Type(_) | ObjectData::HostInstance(_) | ObjectData::HostClass(_) => true,
        }
    }

    /// "Convert to integer" protocol; returns a new reference to an int
    pub fn number_long(self, value: &ForeignRef) -> Result<ForeignRef, ForeignError> {
        match value.data() {
            ObjectData::Int(_) => Ok(value.clone()),
            ObjectData::Bool(b) => Ok(self.int(i128::from(*b))),
            ObjectData::Float(v) => {
                if v.is_nan() {
                    return Err(ForeignError::value_error("cannot convert float NaN to integer"));
                }
                if v.is_infinite() {
                    return Err(ForeignError::overflow(
                        "cannot convert float infinity to integer",
                    ));
                }
                v.trunc()
                    .to_i128()
                    .map(|i| self.int(i))
                    .ok_or_else(|| ForeignError::overflow("int too large to represent"))
            }
            ObjectData::Str(s) => parse_int_literal(s).map(|i| self.int(i)).ok_or_else(|| {
                ForeignError::value_error(format!(
                    "invalid literal for int() with base 10: '{}'",
                    s
                ))
            }),
            ObjectData::Instance(data) => data.int_slot.map(|i| self.int(i)).ok_or_else(|| {
                ForeignError::type_error(format!(
                    "int() argument must be a string or a number, not '{}'",
                    data.class_name
                ))
            }),
            _ => Err(ForeignError::type_error(format!(
                "int() argument must be a string or a number, not '{}'",
                self.type_name(value)
            ))),
        }
    }

    /// "Convert to float" protocol; returns a new reference to a float
    pub fn number_float(self, value: &ForeignRef) -> Result<ForeignRef, ForeignError> {
        match value.data() {
            ObjectData::Float(_) => Ok(value.clone()),
            ObjectData::Int(v) => Ok(self.float(*v as f64)),
            ObjectData::Bool(b) => Ok(self.float(if *b { 1.0 } else { 0.0 })),
            ObjectData::Str(s) => s
                .trim()
                .parse::<f64>()
                .map(|f| self.float(f))
                .map_err(|_| {
                    ForeignError::value_error(format!("could not convert string to float: '{}'", s))
                }),
            ObjectData::Instance(data) => data.float_slot.map(|f| self.float(f)).ok_or_else(|| {
                ForeignError::type_error(format!(
                    "float() argument must be a string or a number, not '{}'",
                    data.class_name
                ))
            }),
            _ => Err(ForeignError::type_error(format!(
                "float() argument must be a string or a number, not '{}'",
                self.type_name(value)
            ))),
        }
    }

    /// Whether `value` supports the sequence protocol
    pub fn sequence_check(self, value: &ForeignRef) -> bool {
        match value.data() {
            ObjectData::Str(_)
            | ObjectData::Bytes(_)
            | ObjectData::List(_)
            | ObjectData::Tuple(_) => true,
            ObjectData::Instance(data) => data.sequence.is_some(),
            _ => false,
        }
    }

    /// Sequence length query
    pub fn sequence_size(self, value: &ForeignRef) -> Result<usize, ForeignError> {
        let no_len = || {
            ForeignError::type_error(format!(
                "object of type '{}' has no len()",
                self.type_name(value)
            ))
        };

        match value.data() {
            ObjectData::Str(s) => Ok(s.chars().count()),
            ObjectData::Bytes(b) => Ok(b.len()),
            ObjectData::List(items) | ObjectData::Tuple(items) => Ok(items.len()),
            ObjectData::Instance(data) => {
                let slot = data.sequence.as_ref().ok_or_else(no_len)?;
                usize::try_from(slot.reported_len).map_err(|_| no_len())
            }
            _ => Err(no_len()),
        }
    }

    /// Indexed fetch; `Ok(Some)` is a new reference, `Ok(None)` means the
    /// object produced no item without raising
    pub fn sequence_get_item(
        self,
        value: &ForeignRef,
        index: usize,
    ) -> Result<Option<ForeignRef>, ForeignError> {
        let out_of_range = || ForeignError::index_error("sequence index out of range");

        match value.data() {
            ObjectData::Str(s) => s
                .chars()
                .nth(index)
                .map(|c| Some(self.str(c.encode_utf8(&mut [0; 4]))))
                .ok_or_else(out_of_range),
            ObjectData::Bytes(b) => b
                .get(index)
                .map(|byte| Some(self.int(i128::from(*byte))))
                .ok_or_else(out_of_range),
            ObjectData::List(items) | ObjectData::Tuple(items) => items
                .get(index)
                .map(|item| Some(item.clone()))
                .ok_or_else(out_of_range),
            ObjectData::Instance(data) => {
                let slot = data.sequence.as_ref().ok_or_else(|| {
                    ForeignError::type_error(format!(
                        "'{}' object does not support indexing",
                        data.class_name
                    ))
                })?;
                slot.items.get(index).cloned().ok_or_else(out_of_range)
            }
            _ => Err(ForeignError::type_error(format!(
                "'{}' object does not support indexing",
                self.type_name(value)
            ))),
        }
    }
}

/// Base-10 integer literal: surrounding whitespace, optional sign, `_` between digits
fn parse_int_literal(text: &str) -> Option<i128> {
    let trimmed = text.trim();
    let digits = trimmed.trim_start_matches(['+', '-']);
    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') || digits.contains("__")
    {
        return None;
    }
    trimmed.replace('_', "").parse().ok()
}

fn format_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_owned()
    } else if value.is_infinite() {
        (if value > 0.0 { "inf" } else { "-inf" }).to_owned()
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
