//! Conversion failure taxonomy

use crate::foreign::{ForeignError, ForeignErrorKind};
use std::fmt;

/// Why a conversion failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionErrorKind {
    /// Wrong shape, failed coercion protocol, failed fetch or unassignable wrapped instance
    TypeMismatch,
    /// Magnitude or precision exceeds the target width
    Overflow,
    /// Right underlying type, but not a member of a non-flags enum
    UndefinedEnumValue,
    /// A sequence fetch produced no object
    NullItem,
}

impl fmt::Display for ConversionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TypeMismatch => "type mismatch",
            Self::Overflow => "overflow",
            Self::UndefinedEnumValue => "undefined enum value",
            Self::NullItem => "null item",
        };
        f.write_str(name)
    }
}

/// A failed conversion, naming the offending foreign type and the target
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", render(self))]
pub struct ConversionError {
    pub kind: ConversionErrorKind,
    pub source_type: String,
    pub target_type: String,
    pub detail: Option<String>,
}

fn render(error: &ConversionError) -> String {
    let src = &error.source_type;
    let target = &error.target_type;
    let mut message = match error.kind {
        ConversionErrorKind::TypeMismatch => {
            format!("'{}' value cannot be converted to {}", src, target)
        }
        ConversionErrorKind::Overflow => {
            format!("'{}' value too large to convert to {}", src, target)
        }
        ConversionErrorKind::UndefinedEnumValue => {
            format!("'{}' value is not a defined member of {}", src, target)
        }
        ConversionErrorKind::NullItem => {
            format!("'{}' sequence returned no item while converting to {}", src, target)
        }
    };

    if let Some(detail) = &error.detail {
        message.push_str(": ");
        message.push_str(detail);
    }
    message
}

impl ConversionError {
    pub fn new(
        kind: ConversionErrorKind,
        source_type: impl Into<String>,
        target_type: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            source_type: source_type.into(),
            target_type: target_type.into(),
            detail: None,
        }
    }

    pub fn type_mismatch(source_type: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self::new(ConversionErrorKind::TypeMismatch, source_type, target_type)
    }

    pub fn overflow(source_type: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self::new(ConversionErrorKind::Overflow, source_type, target_type)
    }

    pub fn undefined_enum_value(
        source_type: impl Into<String>,
        target_type: impl Into<String>,
    ) -> Self {
        Self::new(ConversionErrorKind::UndefinedEnumValue, source_type, target_type)
    }

    pub fn null_item(source_type: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self::new(ConversionErrorKind::NullItem, source_type, target_type)
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[inline]
    pub fn kind(&self) -> ConversionErrorKind {
        self.kind
    }

    /// Exception raised on the foreign side when this failure is reported
    pub fn to_foreign_error(&self) -> ForeignError {
        let kind = match self.kind {
            ConversionErrorKind::TypeMismatch | ConversionErrorKind::NullItem => {
                ForeignErrorKind::TypeError
            }
            ConversionErrorKind::Overflow => ForeignErrorKind::OverflowError,
            ConversionErrorKind::UndefinedEnumValue => ForeignErrorKind::ValueError,
        };
        ForeignError::new(kind, self.to_string())
    }
}

pub type ConversionResult<T> = Result<T, ConversionError>;
