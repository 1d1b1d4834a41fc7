/// Turning picked paths into `SelectedFile`s
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use super::data::SelectedFile;

/// Extensions offered by the picker and accepted from folders
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "bmp", "ico", "tif", "tiff", "tga", "qoi", "pnm",
];

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Every image file below `folder`, in a stable order
pub fn find_images(folder: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(folder)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file() && is_image_path(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();
    paths
}

/// Stat each path. Files that vanished or can't be read are skipped.
pub async fn load_selection(paths: Vec<PathBuf>) -> Vec<SelectedFile> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match SelectedFile::from_path(&path).await {
            Ok(file) => files.push(file),
            Err(e) => warn!("⚠️  Skipping {}: {}", path.display(), e),
        }
    }
    files
}

/// Scan a folder and load every image in it
pub async fn load_folder(folder: PathBuf) -> Vec<SelectedFile> {
    info!("🔍 Scanning folder: {}", folder.display());
    let paths = match tokio::task::spawn_blocking(move || find_images(&folder)).await {
        Ok(paths) => paths,
        Err(e) => {
            warn!("⚠️  Folder scan failed: {}", e);
            Vec::new()
        }
    };
    load_selection(paths).await
}
