//! Compute device selection.
//!
//! Picks the device the pipeline runs on, preferring a CUDA accelerator.
//! When compiled without the `cuda` feature, always falls back to CPU.

use std::fmt;

use tracing::info;

/// Device the pipeline executes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Device {
    /// CUDA accelerator, by device ordinal.
    Cuda { ordinal: usize },

    /// Host CPU fallback.
    Cpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cuda { ordinal } => write!(f, "cuda:{ordinal}"),
            Device::Cpu => write!(f, "cpu"),
        }
    }
}

impl Device {
    /// Detect the best available device.
    ///
    /// With the `cuda` feature enabled, probes the CUDA runtime and prefers
    /// the first usable ordinal. Without it, always selects the CPU.
    pub fn detect() -> Device {
        #[cfg(feature = "cuda")]
        {
            match detect_cuda() {
                Some(device) => return device,
                None => info!("No CUDA device available, falling back to CPU"),
            }
        }

        #[cfg(not(feature = "cuda"))]
        info!("CUDA not enabled, running on CPU");

        Device::Cpu
    }

    /// Whether this is an accelerator device.
    pub fn is_accelerator(&self) -> bool {
        matches!(self, Device::Cuda { .. })
    }
}

#[cfg(feature = "cuda")]
fn detect_cuda() -> Option<Device> {
    // Real implementation would use cudarc to probe the driver and report
    // the first device with enough free memory. This is a compile-time
    // gated stub that would be filled in when cudarc is available.
    todo!("Implement CUDA device detection with cudarc")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_labels() {
        assert_eq!(Device::Cpu.to_string(), "cpu");
        assert_eq!(Device::Cuda { ordinal: 0 }.to_string(), "cuda:0");
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn test_detect_without_cuda() {
        let device = Device::detect();
        assert_eq!(device, Device::Cpu);
        assert!(!device.is_accelerator());
    }
}
