//! Leaf converters applied through the structure-preserving traversal
//!
//! Each public function here takes a nested [`Value`], applies a single-leaf
//! conversion to every terminal value via [`Value::map_leaves`], and returns
//! a structurally identical result. Opaque `Text`/`Bytes` leaves pass through
//! every converter unchanged.
//!
//! There is no converter that wraps values for gradient tracking or marks
//! them volatile: use candle's `Var` for values that need gradients, and
//! [`as_detached`] to cut a value out of the autograd graph.

use candle_core::{DType, Device, Tensor};
use ndarray::{ArrayD, IxDyn};
use tracing::instrument;

use crate::device;
use crate::error::{Error, Result};
use crate::value::{Leaf, Value};

/// Convert numeric leaves to tensors
///
/// Arrays become F32 tensors on the CPU device with the same shape; scalars
/// become 0-d F64 tensors. Existing tensors are returned unchanged, keeping
/// their dtype, device, and autograd history.
#[instrument(skip(value))]
pub fn as_tensor(value: &Value) -> Result<Value> {
    value.map_leaves(tensor_leaf)
}

fn tensor_leaf(leaf: &Leaf) -> Result<Leaf> {
    match leaf {
        Leaf::Scalar(s) => Ok(Leaf::Tensor(Tensor::new(*s, &Device::Cpu)?)),
        Leaf::Array(arr) => {
            // Iteration is in logical order, so this is layout-independent.
            let data: Vec<f32> = arr.iter().copied().collect();
            let tensor = Tensor::from_vec(data, arr.shape().to_vec(), &Device::Cpu)?;
            Ok(Leaf::Tensor(tensor))
        }
        other => Ok(other.clone()),
    }
}

/// Convert numeric leaves to host-resident arrays
///
/// Tensors are detached, moved to host memory, and read back as `ArrayD<f32>`
/// with the same shape. Scalars become 0-d arrays. Existing arrays are
/// returned unchanged.
#[instrument(skip(value))]
pub fn as_array(value: &Value) -> Result<Value> {
    value.map_leaves(array_leaf)
}

fn array_leaf(leaf: &Leaf) -> Result<Leaf> {
    match leaf {
        Leaf::Tensor(t) => Ok(Leaf::Array(tensor_to_array(t)?)),
        Leaf::Scalar(s) => Ok(Leaf::Array(ArrayD::from_elem(IxDyn(&[]), *s as f32))),
        other => Ok(other.clone()),
    }
}

fn tensor_to_array(tensor: &Tensor) -> Result<ArrayD<f32>> {
    // contiguous() first: flatten_all rejects transposed and strided views.
    let host = tensor.detach().to_device(&Device::Cpu)?.contiguous()?;
    let data = host.to_dtype(DType::F32)?.flatten_all()?.to_vec1::<f32>()?;
    Ok(ArrayD::from_shape_vec(IxDyn(tensor.dims()), data)?)
}

/// Reduce numeric leaves to plain floating-point scalars
///
/// Tensor and array leaves must hold exactly one element; anything else
/// fails with [`Error::ScalarExtraction`]. Scalar leaves are returned
/// unchanged.
#[instrument(skip(value))]
pub fn as_float(value: &Value) -> Result<Value> {
    value.map_leaves(float_leaf)
}

fn float_leaf(leaf: &Leaf) -> Result<Leaf> {
    match leaf {
        Leaf::Tensor(t) => {
            if t.elem_count() != 1 {
                return Err(Error::scalar_extraction(t.elem_count()));
            }
            let host = t.detach().to_device(&Device::Cpu)?.contiguous()?;
            let values = host.to_dtype(DType::F64)?.flatten_all()?.to_vec1::<f64>()?;
            Ok(Leaf::Scalar(values[0]))
        }
        Leaf::Array(arr) => match arr.iter().next() {
            Some(v) if arr.len() == 1 => Ok(Leaf::Scalar(f64::from(*v))),
            _ => Err(Error::scalar_extraction(arr.len())),
        },
        other => Ok(other.clone()),
    }
}

/// Move tensor leaves to host memory
///
/// Arrays, scalars, and opaque leaves are host-resident by construction and
/// pass through unchanged.
#[instrument(skip(value))]
pub fn as_cpu(value: &Value) -> Result<Value> {
    as_device(value, &Device::Cpu)
}

/// Move tensor leaves to the accelerator device
///
/// The device is resolved from the enabled backend feature; see
/// [`crate::device::accelerator`]. Fails when no accelerator is available,
/// and device initialization errors propagate unmodified.
#[instrument(skip(value))]
pub fn as_accelerator(value: &Value) -> Result<Value> {
    let device = device::accelerator()?;
    as_device(value, &device)
}

/// Move tensor leaves to the given device
///
/// All other leaves pass through unchanged. Transfers of tensors already on
/// the target device are no-ops in candle.
#[instrument(skip(value))]
pub fn as_device(value: &Value, device: &Device) -> Result<Value> {
    value.map_leaves(|leaf| match leaf {
        Leaf::Tensor(t) => Ok(Leaf::Tensor(t.to_device(device)?)),
        other => Ok(other.clone()),
    })
}

/// Detach tensor leaves from the autograd graph
///
/// With `clone` set, a deep copy is detached instead, yielding storage
/// independent of the input. All other leaves pass through unchanged.
#[instrument(skip(value))]
pub fn as_detached(value: &Value, clone: bool) -> Result<Value> {
    value.map_leaves(|leaf| match leaf {
        Leaf::Tensor(t) => {
            let detached = if clone { t.copy()?.detach() } else { t.detach() };
            Ok(Leaf::Tensor(detached))
        }
        other => Ok(other.clone()),
    })
}
