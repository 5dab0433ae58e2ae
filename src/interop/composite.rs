//! Composite conversion - arrays, multidimensional arrays, enums, nullables
//!
//! Elements go back through the engine's full dispatch, so an element may
//! itself be an array, an enum or a wrapped host object. Every fetched
//! element is an owned reference released at the end of its iteration,
//! on the success path and on the early-return error path alike.

use super::marshal;
use super::ConversionEngine;
use crate::config::RaggedPolicy;
use crate::errors::{ConversionError, ConversionResult};
use crate::foreign::{ForeignError, ForeignRef, Gil};
use crate::host::{EnumValue, HostArray, HostType, HostValue};
use smallvec::{smallvec, SmallVec};

/// One-dimensional array target
pub(crate) fn to_array(
    engine: &ConversionEngine,
    py: Gil<'_>,
    value: &ForeignRef,
    target: &HostType,
    element: &HostType,
) -> ConversionResult<HostValue> {
    let len = py
        .sequence_size(value)
        .map_err(|e| shape_error(engine, py, value, target, e))?;

    // Reported lengths are untrusted; grow only as items arrive
    let mut items = Vec::new();
    for index in 0..len {
        let item = fetch(py, value, target, index)?;
        items.push(engine.convert(py, &item, element)?);
    }

    Ok(HostValue::Array(HostArray::new(element.clone(), items)))
}

enum Node {
    Leaf(HostValue),
    Branch(Vec<Node>),
}

struct Descent<'a, 'py> {
    engine: &'a ConversionEngine,
    py: Gil<'py>,
    target: &'a HostType,
    element: &'a HostType,
    rank: usize,
    policy: RaggedPolicy,
    dims: SmallVec<[usize; 4]>,
    seen: SmallVec<[bool; 4]>,
}

impl<'a, 'py> Descent<'a, 'py> {
    fn descend(&mut self, value: &ForeignRef, depth: usize) -> ConversionResult<Vec<Node>> {
        let py = self.py;
        let len = py
            .sequence_size(value)
            .map_err(|e| shape_error(self.engine, py, value, self.target, e))?;

        self.record(py, value, depth, len)?;

        let mut nodes = Vec::new();
        for index in 0..len {
            let item = fetch(py, value, self.target, index)?;
            let node = if depth + 1 == self.rank {
                Node::Leaf(self.engine.convert(py, &item, self.element)?)
            } else {
                Node::Branch(self.descend(&item, depth + 1)?)
            };
            nodes.push(node);
        }
        Ok(nodes)
    }

    fn record(&mut self, py: Gil<'_>, value: &ForeignRef, depth: usize, len: usize) -> ConversionResult<()> {
        match self.policy {
            RaggedPolicy::Tolerate => {
                self.dims[depth] = self.dims[depth].max(len);
            }
            RaggedPolicy::Strict => {
                if self.seen[depth] && self.dims[depth] != len {
                    return Err(ConversionError::type_mismatch(py.type_name(value), self.target.name())
                        .with_detail(format!(
                            "ragged input: length {} at depth {}, expected {}",
                            len, depth, self.dims[depth]
                        )));
                }
                self.dims[depth] = len;
                self.seen[depth] = true;
            }
        }
        Ok(())
    }
}

/// Multidimensional array target (`rank > 1`)
///
/// Dimensions come from the per-depth lengths recorded during one descent;
/// under `RaggedPolicy::Tolerate` short rows are padded with the element
/// type's default value.
pub(crate) fn to_multi_array(
    engine: &ConversionEngine,
    py: Gil<'_>,
    value: &ForeignRef,
    target: &HostType,
    element: &HostType,
    rank: usize,
) -> ConversionResult<HostValue> {
    let mut descent = Descent {
        engine,
        py,
        target,
        element,
        rank,
        policy: engine.config().arrays.ragged,
        dims: smallvec![0; rank],
        seen: smallvec![false; rank],
    };

    let tree = descent.descend(value, 0)?;
    let dims = descent.dims;

    let too_large = || {
        ConversionError::type_mismatch(py.type_name(value), target.name())
            .with_detail(format!("dimensions {:?} exceed addressable size", dims.as_slice()))
    };
    let total = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(&too_large)?;

    let mut items = Vec::new();
    items.try_reserve_exact(total).map_err(|_| too_large())?;
    items.resize(total, element.default_value());
    scatter(tree, &dims, 0, &mut items);

    HostArray::with_dims(element.clone(), &dims, items)
        .map(HostValue::Array)
        .ok_or_else(|| ConversionError::type_mismatch(py.type_name(value), target.name()))
}

/// Place converted leaves at their row-major slots
fn scatter(nodes: Vec<Node>, dims: &[usize], offset: usize, items: &mut [HostValue]) {
    let stride: usize = dims[1..].iter().product();

    for (i, node) in nodes.into_iter().enumerate() {
        match node {
            Node::Leaf(value) => items[offset + i] = value,
            Node::Branch(children) => scatter(children, &dims[1..], offset + i * stride, items),
        }
    }
}

/// Enumeration target
pub(crate) fn to_enum(py: Gil<'_>, value: &ForeignRef, target: &HostType) -> ConversionResult<HostValue> {
    let info = target
        .enum_info()
        .ok_or_else(|| ConversionError::type_mismatch(py.type_name(value), target.name()))?;

    let underlying = marshal::extract(py, value, info.underlying).map_err(|e| ConversionError {
        target_type: target.name().to_owned(),
        ..e
    })?;

    let bits = underlying
        .as_i128()
        .ok_or_else(|| ConversionError::type_mismatch(py.type_name(value), target.name()))?;

    if info.flags || info.is_defined(bits) {
        Ok(HostValue::Enum(EnumValue::new(target.clone(), bits)))
    } else {
        Err(ConversionError::undefined_enum_value(py.type_name(value), target.name())
            .with_detail(bits.to_string()))
    }
}

/// `Nullable<inner>` target
pub(crate) fn to_nullable(
    engine: &ConversionEngine,
    py: Gil<'_>,
    value: &ForeignRef,
    inner: &HostType,
) -> ConversionResult<HostValue> {
    if py.is_none(value) {
        return Ok(HostValue::Null);
    }
    engine.convert(py, value, inner)
}

/// Fetch one element as an owned reference
fn fetch(py: Gil<'_>, sequence: &ForeignRef, target: &HostType, index: usize) -> ConversionResult<ForeignRef> {
    match py.sequence_get_item(sequence, index) {
        Ok(Some(item)) => Ok(item),
        Ok(None) => Err(ConversionError::null_item(py.type_name(sequence), target.name())
            .with_detail(format!("at index {}", index))),
        Err(e) => Err(ConversionError::type_mismatch(py.type_name(sequence), target.name())
            .with_detail(format!("at index {}: {}", index, e))),
    }
}

fn shape_error(
    engine: &ConversionEngine,
    py: Gil<'_>,
    value: &ForeignRef,
    target: &HostType,
    cause: ForeignError,
) -> ConversionError {
    let error = ConversionError::type_mismatch(py.type_name(value), target.name());
    let errors = &engine.config().errors;

    if errors.include_repr {
        let repr: String = py.repr(value).chars().take(errors.max_repr_len).collect();
        error.with_detail(format!("{} ({})", repr, cause.message))
    } else {
        error.with_detail(cause.message)
    }
}
