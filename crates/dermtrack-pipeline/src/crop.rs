use dermtrack_core::PixelRect;
use image::DynamicImage;
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// Reference to a persisted lesion crop.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CropHandle {
    File { path: PathBuf },
    Memory { key: String },
}

#[derive(thiserror::Error, Debug)]
pub enum CropSinkError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Destination for lesion crops.
pub trait CropSink: Send + Sync {
    fn store(&self, mole_id: &str, crop: &DynamicImage) -> Result<CropHandle, CropSinkError>;
}

/// Cut the inclusive pixel rectangle out of `image`.
pub fn crop_lesion(image: &DynamicImage, rect: &PixelRect) -> DynamicImage {
    image.crop_imm(rect.x1, rect.y1, rect.width(), rect.height())
}

/// Writes crops as `{stem}_{mole_id}.png` inside a directory.
#[derive(Clone, Debug)]
pub struct DirectoryCropSink {
    dir: PathBuf,
    stem: String,
}

impl DirectoryCropSink {
    pub fn new(dir: impl Into<PathBuf>, stem: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stem: stem.into(),
        }
    }

    /// Sink whose file names derive from the source image's file stem.
    pub fn for_image(dir: impl Into<PathBuf>, image_path: impl AsRef<Path>) -> Self {
        let stem = image_path
            .as_ref()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        Self::new(dir, stem)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn crop_path(&self, mole_id: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.png", self.stem, mole_id))
    }
}

impl CropSink for DirectoryCropSink {
    fn store(&self, mole_id: &str, crop: &DynamicImage) -> Result<CropHandle, CropSinkError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.crop_path(mole_id);
        crop.save(&path)?;
        debug!(
            "stored {}x{} crop at {}",
            crop.width(),
            crop.height(),
            path.display()
        );
        Ok(CropHandle::File { path })
    }
}

/// Keeps crops in memory, keyed by mole id. Useful when the caller consumes
/// the crops directly.
#[derive(Debug, Default)]
pub struct MemoryCropSink {
    crops: Mutex<Vec<(String, DynamicImage)>>,
}

impl MemoryCropSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, mole_id: &str) -> Option<DynamicImage> {
        self.lock()
            .iter()
            .find(|(id, _)| id == mole_id)
            .map(|(_, img)| img.clone())
    }

    /// All stored crops in insertion order.
    pub fn into_crops(self) -> Vec<(String, DynamicImage)> {
        self.crops
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, DynamicImage)>> {
        self.crops
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CropSink for MemoryCropSink {
    fn store(&self, mole_id: &str, crop: &DynamicImage) -> Result<CropHandle, CropSinkError> {
        let mut crops = self.lock();
        match crops.iter_mut().find(|(id, _)| id == mole_id) {
            Some(slot) => slot.1 = crop.clone(),
            None => crops.push((mole_id.to_string(), crop.clone())),
        }
        Ok(CropHandle::Memory {
            key: mole_id.to_string(),
        })
    }
}
