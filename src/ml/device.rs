// ============================================================
// Layer 5 - Device Selection
// ============================================================
// Which Burn backend a run uses. The choice is stored in the
// TrainConfig, so `predict` and `evaluate` default to the same
// backend `train` used, but it can be overridden per command
// (train on a GPU box, score on a laptop).
//
//   cpu → NdArray  (always available, used by the tests)
//   gpu → Wgpu     (Vulkan / Metal / DX12 via wgpu)

use serde::{Deserialize, Serialize};

pub type CpuBackend = burn::backend::NdArray;
pub type GpuBackend = burn::backend::Wgpu;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    #[default]
    Cpu,
    Gpu,
}

pub fn cpu_device() -> burn::backend::ndarray::NdArrayDevice {
    burn::backend::ndarray::NdArrayDevice::Cpu
}

pub fn gpu_device() -> burn::backend::wgpu::WgpuDevice {
    burn::backend::wgpu::WgpuDevice::default()
}
