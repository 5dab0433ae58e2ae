//! Argument tuple extraction helpers

use crate::errors::ConversionError;
use crate::foreign::{ForeignRef, Gil};
use crate::interop::{ConversionEngine, FromForeign};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgError {
    #[error("argument {index} missing ({len} given)")]
    Missing { index: usize, len: usize },

    #[error("argument {index}: {source}")]
    Conversion {
        index: usize,
        #[source]
        source: ConversionError,
    },
}

/// Positional access to a borrowed foreign argument tuple
#[derive(Debug, Clone, Copy)]
pub struct ArgParser<'a> {
    engine: &'a ConversionEngine,
    args: &'a [ForeignRef],
}

impl<'a> ArgParser<'a> {
    pub fn new(engine: &'a ConversionEngine, args: &'a [ForeignRef]) -> Self {
        Self { engine, args }
    }

    /// Parser over the items of a foreign tuple or list
    pub fn from_tuple(engine: &'a ConversionEngine, tuple: &'a ForeignRef) -> Option<Self> {
        tuple.as_items().map(|args| Self::new(engine, args))
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Borrowed argument at `index`
    pub fn item(&self, index: usize) -> Result<&'a ForeignRef, ArgError> {
        self.args.get(index).ok_or(ArgError::Missing {
            index,
            len: self.args.len(),
        })
    }

    /// Convert argument `index`; failures are reported to the error indicator
    pub fn extract<T: FromForeign>(&self, py: Gil<'_>, index: usize) -> Result<T, ArgError> {
        let item = self.item(index)?;
        self.engine
            .extract::<T>(py, item, true)
            .map_err(|source| ArgError::Conversion { index, source })
    }

    pub fn extract_string(&self, py: Gil<'_>, index: usize) -> Result<String, ArgError> {
        self.extract(py, index)
    }

    pub fn extract_char(&self, py: Gil<'_>, index: usize) -> Result<char, ArgError> {
        self.extract(py, index)
    }

    pub fn extract_i32(&self, py: Gil<'_>, index: usize) -> Result<i32, ArgError> {
        self.extract(py, index)
    }

    pub fn extract_u32(&self, py: Gil<'_>, index: usize) -> Result<u32, ArgError> {
        self.extract(py, index)
    }

    pub fn extract_i64(&self, py: Gil<'_>, index: usize) -> Result<i64, ArgError> {
        self.extract(py, index)
    }

    pub fn extract_u64(&self, py: Gil<'_>, index: usize) -> Result<u64, ArgError> {
        self.extract(py, index)
    }

    pub fn extract_f32(&self, py: Gil<'_>, index: usize) -> Result<f32, ArgError> {
        self.extract(py, index)
    }

    pub fn extract_f64(&self, py: Gil<'_>, index: usize) -> Result<f64, ArgError> {
        self.extract(py, index)
    }

    pub fn extract_bool(&self, py: Gil<'_>, index: usize) -> Result<bool, ArgError> {
        self.extract(py, index)
    }
}
