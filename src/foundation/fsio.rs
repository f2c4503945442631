use std::{
    fs::File,
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use image::{ImageFormat, RgbImage, codecs::jpeg::JpegEncoder};

use crate::foundation::error::{CocoAugError, CocoAugResult};

/// JPEG quality used for every derived image.
pub const JPEG_QUALITY: u8 = 95;

/// Decode the image at `path` into packed RGB8.
///
/// A path with no regular file behind it yields [`CocoAugError::SourceNotFound`]; decode
/// failures are wrapped as [`CocoAugError::Other`].
pub fn read_rgb_image(path: &Path) -> CocoAugResult<RgbImage> {
    if !path.is_file() {
        return Err(CocoAugError::source_not_found(path));
    }
    let img = image::open(path).with_context(|| format!("decode image '{}'", path.display()))?;
    Ok(img.to_rgb8())
}

/// Encode `img` to `path`, picking the format from the extension (JPEG when unknown).
pub fn write_rgb_image(path: &Path, img: &RgbImage) -> CocoAugResult<()> {
    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Jpeg);
    if format == ImageFormat::Jpeg {
        let f = File::create(path).with_context(|| format!("create '{}'", path.display()))?;
        let mut w = BufWriter::new(f);
        let encoder = JpegEncoder::new_with_quality(&mut w, JPEG_QUALITY);
        img.write_with_encoder(encoder)
            .with_context(|| format!("encode jpeg '{}'", path.display()))?;
        w.flush()
            .with_context(|| format!("flush '{}'", path.display()))?;
    } else {
        img.save_with_format(path, format)
            .with_context(|| format!("write image '{}'", path.display()))?;
    }
    Ok(())
}

/// Create `dir` and all missing parents.
pub fn ensure_dir(dir: &Path) -> CocoAugResult<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create directory '{}'", dir.display()))?;
    Ok(())
}

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> CocoAugResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Write `bytes` to a sibling temp file and rename it over `path`.
///
/// Readers either see the previous contents or the new ones, never a truncated file.
pub fn replace_file(path: &Path, bytes: &[u8]) -> CocoAugResult<()> {
    ensure_parent_dir(path)?;
    let tmp = temp_sibling(path);
    std::fs::write(&tmp, bytes).with_context(|| format!("write '{}'", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("rename '{}' -> '{}'", tmp.display(), path.display()))?;
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Remove `path`. Returns `false` when it was already absent.
pub fn remove_file_if_present(path: &Path) -> CocoAugResult<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("delete '{}'", path.display()))
            .into()),
    }
}

/// Names of the regular files directly inside `dir`, sorted.
pub fn list_file_names(dir: &Path) -> CocoAugResult<Vec<String>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("list directory '{}'", dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in '{}'", dir.display()))?;
        let is_file = entry
            .file_type()
            .with_context(|| format!("stat '{}'", entry.path().display()))?
            .is_file();
        if !is_file {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/fsio.rs"]
mod tests;
