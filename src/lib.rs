pub mod animation;
pub mod asset;
pub mod atlas;
pub mod backend;
pub mod camera;
pub mod config;
pub mod error;
pub mod renderer;
pub mod scheduler;
pub mod vertex;

use std::path::PathBuf;

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

pub use animation::{Advance, AnimationClock, OverflowPolicy};
pub use asset::{AssetLoader, FsAssetLoader, MemoryAssetLoader};
pub use atlas::{FrameAtlas, FrameSpan};
pub use backend::GraphicsBackend;
pub use camera::{Camera, ModelTransform, OrthoBounds};
pub use config::{ShaderFailurePolicy, SpriteConfig};
pub use error::SpriteError;
pub use renderer::{Renderer, RendererState, TickOutcome, WgpuBackend};
pub use scheduler::{FrameLoop, FramePacer, HostScheduler, IntervalPacer, LoopControl, StopToken};

/// Create a wgpu-backed sprite renderer for any window type that can provide raw window +
/// display handles. The sprite sheet is read from disk relative to `asset_root`.
///
/// In the demo, this is a `winit::window::Window` wrapped in an `Arc`. Blocks until the
/// GPU device is ready and the sheet has loaded.
pub fn new_from_window<W>(
    window: W,
    size: (u32, u32),
    config: &SpriteConfig,
    asset_root: impl Into<PathBuf>,
) -> Result<Renderer<WgpuBackend<W>>, SpriteError>
where
    W: HasWindowHandle + HasDisplayHandle + wgpu::WasmNotSendSync + Sync + Clone + 'static,
{
    let loader = FsAssetLoader::new(asset_root);
    pollster::block_on(async {
        let backend = WgpuBackend::new(window, size.0, size.1).await?;
        Renderer::init(config, backend, &loader).await
    })
}
