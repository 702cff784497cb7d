//! Accelerator device resolution
//!
//! The accelerator backend is chosen at compile time through cargo features,
//! mirroring candle's own backend gating: `cuda` resolves CUDA ordinal 0,
//! otherwise `metal` resolves Metal ordinal 0. Without either feature there
//! is no accelerator and [`accelerator`] returns an error.

use candle_core::Device;
use tracing::debug;

use crate::error::Result;

/// Resolve the accelerator device for this build
///
/// Fails when the crate was built without an accelerator backend, or when
/// the backend cannot initialize the device (e.g. no CUDA-capable GPU).
#[cfg(feature = "cuda")]
pub fn accelerator() -> Result<Device> {
    let device = Device::new_cuda(0)?;
    debug!("resolved accelerator device: {:?}", device);
    Ok(device)
}

/// Resolve the accelerator device for this build
///
/// Fails when the crate was built without an accelerator backend, or when
/// the backend cannot initialize the device.
#[cfg(all(feature = "metal", not(feature = "cuda")))]
pub fn accelerator() -> Result<Device> {
    let device = Device::new_metal(0)?;
    debug!("resolved accelerator device: {:?}", device);
    Ok(device)
}

/// Resolve the accelerator device for this build
///
/// Always fails: this build carries no accelerator backend. Enable the
/// `cuda` or `metal` feature to get one.
#[cfg(not(any(feature = "cuda", feature = "metal")))]
pub fn accelerator() -> Result<Device> {
    debug!("accelerator requested but no backend is compiled in");
    Err(crate::error::Error::accelerator_unavailable(
        "built without an accelerator backend (enable the `cuda` or `metal` feature)",
    ))
}

/// True when an accelerator backend is compiled in and its device initializes
pub fn accelerator_available() -> bool {
    accelerator().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(any(feature = "cuda", feature = "metal")))]
    #[test]
    fn accelerator_unavailable_without_backend() {
        let err = accelerator().unwrap_err();
        assert!(matches!(err, crate::Error::AcceleratorUnavailable(_)));
        assert!(!accelerator_available());
    }
}
