//! Nested value tree and structure-preserving traversal
//!
//! Batches, metric dictionaries, and model outputs are rarely a single
//! tensor: they are mappings and sequences with numeric payloads at the
//! bottom. [`Value`] models that shape as a closed set of container kinds
//! (ordered sequence, key-ordered mapping) plus a [`Leaf`] case, and
//! [`Value::map_leaves`] walks it once so every converter in this crate is
//! just a leaf transform.

use std::collections::BTreeMap;

use candle_core::Tensor;
use ndarray::ArrayD;

use crate::error::Result;

/// Terminal value inside a nested structure
///
/// `Text` and `Bytes` are opaque: sequence-like payloads (labels, ids,
/// raw buffers) that every converter returns unchanged.
#[derive(Debug, Clone)]
pub enum Leaf {
    /// Plain numeric scalar
    Scalar(f64),
    /// Host-resident n-dimensional array (dynamic rank, 0-d is legal)
    Array(ArrayD<f32>),
    /// Candle tensor of any dtype, rank, and device
    Tensor(Tensor),
    /// Opaque text payload, excluded from conversion
    Text(String),
    /// Opaque byte payload, excluded from conversion
    Bytes(Vec<u8>),
}

impl Leaf {
    /// Get the scalar value if this leaf is a scalar
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Leaf::Scalar(s) => Some(*s),
            _ => None,
        }
    }

    /// Get the array if this leaf is an array
    pub fn as_array(&self) -> Option<&ArrayD<f32>> {
        match self {
            Leaf::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Get the tensor if this leaf is a tensor
    pub fn as_tensor(&self) -> Option<&Tensor> {
        match self {
            Leaf::Tensor(t) => Some(t),
            _ => None,
        }
    }

    /// Get the text payload if this leaf is opaque text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Leaf::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the byte payload if this leaf is opaque bytes
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Leaf::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

/// Nested data structure of sequences, mappings, and leaves
#[derive(Debug, Clone)]
pub enum Value {
    /// Terminal value
    Leaf(Leaf),
    /// Ordered sequence of nested values
    Seq(Vec<Value>),
    /// Key-ordered mapping of nested values
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Apply a fallible transform to every leaf, preserving structure
    ///
    /// Container kinds, nesting, sequence order, and map keys of the result
    /// are identical to the input; only leaves may differ. The first leaf
    /// error aborts the traversal and propagates.
    pub fn map_leaves<F>(&self, mut f: F) -> Result<Value>
    where
        F: FnMut(&Leaf) -> Result<Leaf>,
    {
        self.map_leaves_inner(&mut f)
    }

    fn map_leaves_inner<F>(&self, f: &mut F) -> Result<Value>
    where
        F: FnMut(&Leaf) -> Result<Leaf>,
    {
        match self {
            Value::Leaf(leaf) => Ok(Value::Leaf(f(leaf)?)),
            Value::Seq(items) => items
                .iter()
                .map(|item| item.map_leaves_inner(f))
                .collect::<Result<Vec<_>>>()
                .map(Value::Seq),
            Value::Map(entries) => entries
                .iter()
                .map(|(key, item)| Ok((key.clone(), item.map_leaves_inner(f)?)))
                .collect::<Result<BTreeMap<_, _>>>()
                .map(Value::Map),
        }
    }

    /// Depth-first iterator over leaf references
    ///
    /// Visits leaves in sequence order and map key order.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves { stack: vec![self] }
    }

    /// True if this value is a leaf rather than a container
    pub fn is_leaf(&self) -> bool {
        matches!(self, Value::Leaf(_))
    }

    /// Get the leaf if this value is one
    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Value::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    /// Get the items if this value is a sequence
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    /// Get the entries if this value is a mapping
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a mapping entry by key
    ///
    /// Returns `None` if this value is not a mapping or the key is absent.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|entries| entries.get(key))
    }

    /// Shorthand for `as_leaf` + [`Leaf::as_scalar`]
    pub fn as_scalar(&self) -> Option<f64> {
        self.as_leaf().and_then(Leaf::as_scalar)
    }

    /// Shorthand for `as_leaf` + [`Leaf::as_tensor`]
    pub fn as_tensor(&self) -> Option<&Tensor> {
        self.as_leaf().and_then(Leaf::as_tensor)
    }

    /// Shorthand for `as_leaf` + [`Leaf::as_array`]
    pub fn as_array(&self) -> Option<&ArrayD<f32>> {
        self.as_leaf().and_then(Leaf::as_array)
    }
}

/// Depth-first leaf iterator, created by [`Value::leaves`]
pub struct Leaves<'a> {
    stack: Vec<&'a Value>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a Leaf;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(value) = self.stack.pop() {
            match value {
                Value::Leaf(leaf) => return Some(leaf),
                // Children are pushed reversed so they pop in order.
                Value::Seq(items) => self.stack.extend(items.iter().rev()),
                Value::Map(entries) => self.stack.extend(entries.values().rev()),
            }
        }
        None
    }
}

impl From<Leaf> for Value {
    fn from(leaf: Leaf) -> Self {
        Value::Leaf(leaf)
    }
}

impl From<f64> for Value {
    fn from(s: f64) -> Self {
        Value::Leaf(Leaf::Scalar(s))
    }
}

impl From<f32> for Value {
    fn from(s: f32) -> Self {
        Value::Leaf(Leaf::Scalar(f64::from(s)))
    }
}

impl From<i64> for Value {
    fn from(s: i64) -> Self {
        Value::Leaf(Leaf::Scalar(s as f64))
    }
}

impl From<ArrayD<f32>> for Value {
    fn from(arr: ArrayD<f32>) -> Self {
        Value::Leaf(Leaf::Array(arr))
    }
}

impl From<Tensor> for Value {
    fn from(tensor: Tensor) -> Self {
        Value::Leaf(Leaf::Tensor(tensor))
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Leaf(Leaf::Text(text.to_string()))
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Leaf(Leaf::Text(text))
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Leaf(Leaf::Bytes(bytes))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(entries: BTreeMap<String, Value>) -> Self {
        Value::Map(entries)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Seq(iter.into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Value::Map(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;
    use ndarray::IxDyn;

    fn sample_tree() -> Value {
        Value::from_iter([
            (
                "metrics".to_string(),
                Value::from_iter([
                    ("loss".to_string(), Value::from(0.5)),
                    ("lr".to_string(), Value::from(1e-3)),
                ]),
            ),
            (
                "batch".to_string(),
                Value::from(vec![
                    Value::from(ArrayD::from_elem(IxDyn(&[2, 3]), 1.0f32)),
                    Value::from("sample-7"),
                ]),
            ),
        ])
    }

    #[test]
    fn map_leaves_preserves_structure() {
        let tree = sample_tree();
        let mapped = tree
            .map_leaves(|leaf| {
                Ok(match leaf {
                    Leaf::Scalar(s) => Leaf::Scalar(s * 2.0),
                    other => other.clone(),
                })
            })
            .unwrap();

        let metrics = mapped.get("metrics").unwrap().as_map().unwrap();
        assert_eq!(
            metrics.keys().collect::<Vec<_>>(),
            vec!["loss", "lr"],
        );
        assert_eq!(mapped.get("metrics").unwrap().get("loss").unwrap().as_scalar(), Some(1.0));

        let batch = mapped.get("batch").unwrap().as_seq().unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].as_array().unwrap().shape(), &[2, 3]);
        assert_eq!(batch[1].as_leaf().and_then(Leaf::as_text), Some("sample-7"));
    }

    #[test]
    fn map_leaves_propagates_first_error() {
        let tree = Value::from(vec![Value::from(1.0), Value::from(2.0)]);
        let mut visited = 0;
        let result = tree.map_leaves(|_| {
            visited += 1;
            Err(crate::Error::invalid_input("boom"))
        });
        assert!(result.is_err());
        assert_eq!(visited, 1);
    }

    #[test]
    fn leaves_iterates_in_order() {
        let tree = Value::from_iter([
            ("a".to_string(), Value::from(1.0)),
            (
                "b".to_string(),
                Value::from(vec![Value::from(2.0), Value::from(3.0)]),
            ),
            ("c".to_string(), Value::from(4.0)),
        ]);
        let scalars: Vec<f64> = tree.leaves().filter_map(Leaf::as_scalar).collect();
        assert_eq!(scalars, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn leaf_accessors() {
        let tensor = Tensor::new(1.0f64, &Device::Cpu).unwrap();
        assert!(Value::from(tensor).as_tensor().is_some());
        assert_eq!(Value::from(3.5).as_scalar(), Some(3.5));
        assert_eq!(Value::from("hi").as_leaf().and_then(Leaf::as_text), Some("hi"));
        assert_eq!(
            Value::from(vec![1u8, 2]).as_leaf().and_then(Leaf::as_bytes),
            Some(&[1u8, 2][..]),
        );
        assert!(Value::Seq(vec![]).as_leaf().is_none());
        assert!(!Value::Seq(vec![]).is_leaf());
    }
}
