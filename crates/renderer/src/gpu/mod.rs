//! wgpu backend for the render loop.
//!
//! - `context` owns the instance, device and swapchain and rebuilds the
//!   swapchain when the window resizes.
//! - `pipeline` compiles `bubble.wgsl` and holds its bind group layouts.
//! - `uniforms` mirrors the shader's uniform blocks on the CPU.
//! - `capture` reads rendered frames back for export.
//! - `state` ties them together as a [`crate::host::GraphicsHost`].

mod capture;
mod context;
mod pipeline;
mod state;
mod uniforms;

pub(crate) use state::GpuState;
