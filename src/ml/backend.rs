// Burn backend selection. CPU (ndarray) by default, GPU with
// `--features wgpu`. Training wraps the backend in Autodiff;
// evaluation and prediction run on the plain inner backend.

#[cfg(not(feature = "wgpu"))]
pub type InnerBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type InnerBackend = burn::backend::Wgpu;

pub type TrainBackend = burn::backend::Autodiff<InnerBackend>;

pub type Device = <InnerBackend as burn::prelude::Backend>::Device;

pub fn default_device() -> Device {
    Device::default()
}
