use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::error::SpriteError;

/// One-shot image loading capability.
///
/// Loading is async so a host can back it with whatever I/O it has; the
/// renderer awaits it before it will tick.
pub trait AssetLoader {
    fn load_image(&self, path: &Path) -> impl Future<Output = Result<RgbaImage, SpriteError>>;
}

fn decode(path: &Path, bytes: &[u8]) -> Result<RgbaImage, SpriteError> {
    let img = image::load_from_memory(bytes).map_err(|e| SpriteError::AssetLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(img.to_rgba8())
}

/// Reads images from disk relative to `root`.
#[derive(Clone, Debug, Default)]
pub struct FsAssetLoader {
    root: PathBuf,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetLoader for FsAssetLoader {
    async fn load_image(&self, path: &Path) -> Result<RgbaImage, SpriteError> {
        let full = self.root.join(path);
        let bytes = std::fs::read(&full).map_err(|e| SpriteError::AssetLoad {
            path: full.clone(),
            reason: e.to_string(),
        })?;
        let rgba = decode(&full, &bytes)?;
        log::info!(
            "Loaded {} ({}x{})",
            full.display(),
            rgba.width(),
            rgba.height()
        );
        Ok(rgba)
    }
}

/// Serves encoded images from memory, keyed by path.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssetLoader {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryAssetLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }
}

impl AssetLoader for MemoryAssetLoader {
    async fn load_image(&self, path: &Path) -> Result<RgbaImage, SpriteError> {
        let bytes = self.files.get(path).ok_or_else(|| SpriteError::AssetLoad {
            path: path.to_path_buf(),
            reason: "no such asset".into(),
        })?;
        decode(path, bytes)
    }
}

/// Encode a blank RGBA sheet as PNG. Handy for tests and demos.
pub fn blank_sheet_png(width: u32, height: u32) -> Result<Vec<u8>, SpriteError> {
    let img = RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255]));
    let mut png_bytes = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut png_bytes),
        image::ImageFormat::Png,
    )
    .map_err(|e| SpriteError::AssetLoad {
        path: PathBuf::from("<memory>"),
        reason: e.to_string(),
    })?;
    Ok(png_bytes)
}
