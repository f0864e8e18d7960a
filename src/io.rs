use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};

// ============================================================================
// EXPORT - PNG / JPEG encoding and data URLs
// ============================================================================

/// Default JPEG quality when none is given.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Png,
    /// Quality 1-100.
    Jpeg(u8),
}

impl ExportFormat {
    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg(_) => "image/jpeg",
        }
    }

    /// Pick the format from a file extension; anything but jpg/jpeg is PNG.
    pub fn from_path(path: &Path, quality: u8) -> Self {
        let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("jpg" | "jpeg") => ExportFormat::Jpeg(quality),
            _ => ExportFormat::Png,
        }
    }
}

/// Encode `image` into `writer`. JPEG has no alpha, so it is dropped.
pub fn encode_to_writer(image: &RgbaImage, format: ExportFormat, mut writer: impl Write) -> Result<()> {
    match format {
        ExportFormat::Png => {
            let encoder = PngEncoder::new(&mut writer);
            #[allow(deprecated)]
            encoder.encode(image.as_raw(), image.width(), image.height(), image::ColorType::Rgba8)?;
        }
        ExportFormat::Jpeg(quality) => {
            let rgb_image = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, quality.clamp(1, 100));
            encoder.encode(rgb_image.as_raw(), rgb_image.width(), rgb_image.height(), image::ColorType::Rgb8)?;
        }
    }
    Ok(())
}

/// Encode and write to `path`.
pub fn export_file(image: &RgbaImage, path: &Path, format: ExportFormat) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    encode_to_writer(image, format, &mut writer)?;
    writer.flush()?;
    crate::log_info!("export: {}x{} {:?} -> {}", image.width(), image.height(), format, path.display());
    Ok(())
}

/// `data:<mime>;base64,<payload>` for the encoded image.
pub fn export_data_url(image: &RgbaImage, format: ExportFormat) -> Result<String> {
    let mut bytes = Vec::new();
    encode_to_writer(image, format, &mut bytes)?;
    Ok(format!("data:{};base64,{}", format.mime(), STANDARD.encode(&bytes)))
}

/// Decode a base64 image data URL produced by `export_data_url` (or any
/// browser) back into RGBA pixels.
pub fn decode_data_url(url: &str) -> Result<RgbaImage> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| EngineError::InvalidDataUrl("missing 'data:' prefix".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| EngineError::InvalidDataUrl("missing ',' separator".into()))?;
    if !header.ends_with(";base64") {
        return Err(EngineError::InvalidDataUrl(format!("not base64 encoded: '{header}'")));
    }
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| EngineError::InvalidDataUrl(e.to_string()))?;
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}

// ============================================================================
// AUTOSAVE STORAGE
// ============================================================================

/// The last autosaved drawing: a PNG data URL plus the canvas size it was
/// taken at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

impl StoredSnapshot {
    /// Decoded pixels at the stored size. An image whose own size disagrees
    /// is stretched to fit.
    pub fn decode(&self) -> Result<RgbaImage> {
        let pixels = decode_data_url(&self.data_url)?;
        if pixels.dimensions() == (self.width, self.height) || self.width == 0 || self.height == 0 {
            return Ok(pixels);
        }
        Ok(image::imageops::resize(&pixels, self.width, self.height, image::imageops::FilterType::Nearest))
    }
}

/// Where the project keeps its autosave. One slot: each save replaces the last.
pub trait SnapshotStore {
    fn save_snapshot(&mut self, data_url: &str, width: u32, height: u32) -> Result<()>;
    fn load_snapshot(&self) -> Result<Option<StoredSnapshot>>;
    fn delete_snapshot(&mut self) -> Result<()>;
}

/// In-process store, mainly for tests and embedding hosts with their own
/// persistence.
#[derive(Clone, Debug, Default)]
pub struct MemorySnapshotStore {
    slot: Option<StoredSnapshot>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save_snapshot(&mut self, data_url: &str, width: u32, height: u32) -> Result<()> {
        self.slot = Some(StoredSnapshot { data_url: data_url.to_string(), width, height });
        Ok(())
    }

    fn load_snapshot(&self) -> Result<Option<StoredSnapshot>> {
        Ok(self.slot.clone())
    }

    fn delete_snapshot(&mut self) -> Result<()> {
        self.slot = None;
        Ok(())
    }
}

/// Magic header of the autosave file.
const SNAPSHOT_MAGIC: &str = "PKS1";

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    magic: String,
    snapshot: StoredSnapshot,
}

/// bincode file on disk.
#[derive(Clone, Debug)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `autosave.bin` next to the session log.
    pub fn default_location() -> Self {
        Self::new(crate::logger::data_dir().join("PaintKit").join("autosave.bin"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn save_snapshot(&mut self, data_url: &str, width: u32, height: u32) -> Result<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }
        let file = SnapshotFile {
            magic: SNAPSHOT_MAGIC.to_string(),
            snapshot: StoredSnapshot { data_url: data_url.to_string(), width, height },
        };
        let mut writer = BufWriter::new(File::create(&self.path)?);
        bincode::serialize_into(&mut writer, &file)?;
        writer.flush()?;
        Ok(())
    }

    fn load_snapshot(&self) -> Result<Option<StoredSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let file: SnapshotFile = bincode::deserialize_from(reader)?;
        if file.magic != SNAPSHOT_MAGIC {
            return Err(EngineError::Serialize(format!("unknown autosave magic '{}'", file.magic)));
        }
        Ok(Some(file.snapshot))
    }

    fn delete_snapshot(&mut self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(7, 5, |x, y| Rgba([x as u8 * 30, y as u8 * 40, 90, 255]))
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("paintkit-{}-{}", std::process::id(), name))
    }

    #[test]
    fn png_data_url_decodes_to_the_same_pixels() {
        let img = sample();
        let url = export_data_url(&img, ExportFormat::Png).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(decode_data_url(&url).unwrap(), img);
    }

    #[test]
    fn jpeg_data_url_keeps_the_size() {
        let url = export_data_url(&sample(), ExportFormat::Jpeg(80)).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert_eq!(decode_data_url(&url).unwrap().dimensions(), (7, 5));
    }

    #[test]
    fn malformed_data_urls_are_errors() {
        assert!(matches!(decode_data_url("image/png;base64,AAAA"), Err(EngineError::InvalidDataUrl(_))));
        assert!(matches!(decode_data_url("data:image/png,AAAA"), Err(EngineError::InvalidDataUrl(_))));
        assert!(matches!(decode_data_url("data:image/png;base64,@@@"), Err(EngineError::InvalidDataUrl(_))));
    }

    #[test]
    fn format_follows_the_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("a.JPG"), 70), ExportFormat::Jpeg(70));
        assert_eq!(ExportFormat::from_path(Path::new("a.png"), 70), ExportFormat::Png);
        assert_eq!(ExportFormat::from_path(Path::new("a"), 70), ExportFormat::Png);
    }

    #[test]
    fn memory_store_keeps_one_slot() {
        let mut store = MemorySnapshotStore::new();
        assert_eq!(store.load_snapshot().unwrap(), None);
        store.save_snapshot("data:a", 1, 2).unwrap();
        store.save_snapshot("data:b", 3, 4).unwrap();
        let loaded = store.load_snapshot().unwrap().unwrap();
        assert_eq!((loaded.data_url.as_str(), loaded.width, loaded.height), ("data:b", 3, 4));
        store.delete_snapshot().unwrap();
        assert_eq!(store.load_snapshot().unwrap(), None);
    }

    #[test]
    fn file_store_round_trips_through_bincode() {
        let path = temp_path("store.bin");
        let mut store = FileSnapshotStore::new(&path);
        let img = sample();
        let url = export_data_url(&img, ExportFormat::Png).unwrap();
        store.save_snapshot(&url, 7, 5).unwrap();

        let reopened = FileSnapshotStore::new(&path);
        let snapshot = reopened.load_snapshot().unwrap().unwrap();
        assert_eq!(snapshot.decode().unwrap(), img);

        store.delete_snapshot().unwrap();
        assert!(!path.exists());
        assert_eq!(store.load_snapshot().unwrap(), None);
        store.delete_snapshot().unwrap();
    }

    #[test]
    fn stored_size_wins_over_the_image_size() {
        let url = export_data_url(&sample(), ExportFormat::Png).unwrap();
        let snapshot = StoredSnapshot { data_url: url, width: 14, height: 10 };
        assert_eq!(snapshot.decode().unwrap().dimensions(), (14, 10));
    }
}
