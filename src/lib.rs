//! Structure-preserving tensor conversions for nested data
//!
//! Training and inference code passes around nested structures, not bare
//! tensors: metric dictionaries, batches of mixed payloads, sequences of
//! per-layer weights. This crate converts every numeric leaf of such a
//! structure between tensor form ([`candle_core::Tensor`]), array form
//! ([`ndarray::ArrayD`]), and plain scalars, and moves tensor leaves
//! between host and accelerator memory or out of the autograd graph. The
//! container shape of the input is always preserved; opaque `Text` and
//! `Bytes` leaves are never touched.
//!
//! # Example
//!
//! ```
//! use tensor_tree::{as_float, as_tensor, Value};
//!
//! let batch = Value::from_iter([
//!     ("loss".to_string(), Value::from(0.25)),
//!     ("tag".to_string(), Value::from("train")),
//! ]);
//! let tensors = as_tensor(&batch)?;
//! let scalars = as_float(&tensors)?;
//! assert_eq!(scalars.get("loss").and_then(Value::as_scalar), Some(0.25));
//! # Ok::<(), tensor_tree::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

pub mod convert;
pub mod device;
pub mod error;
pub mod value;

// Re-exports
pub use convert::{as_accelerator, as_array, as_cpu, as_detached, as_device, as_float, as_tensor};
pub use device::{accelerator, accelerator_available};
pub use error::{Error, Result};
pub use value::{Leaf, Value};
