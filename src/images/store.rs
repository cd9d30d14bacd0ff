//! Image download, validation, and local storage.
//!
//! Candidates are downloaded with a hard byte cap, decoded, rejected when
//! too small, and re-encoded as JPEG at a fixed quality for predictable
//! storage size. Filenames are derived from a SHA-256 digest of the source
//! URL, so repeated runs are reproducible and collision-resistant.
//!
//! "Could not produce a usable image" is a single outcome class: transport
//! errors, undecodable payloads, and too-small images all collapse to `None`
//! at the [`ImageStore::download`] boundary.

use crate::error::Result;
use crate::fetch::Fetcher;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Hard cap on downloaded image bytes; anything beyond is discarded.
const MAX_IMAGE_BYTES: usize = 2_000_000;

/// Minimum acceptable width and height in pixels.
const MIN_DIMENSION: u32 = 256;

/// JPEG quality for the re-encoded local copy.
const JPEG_QUALITY: u8 = 80;

/// A successfully downloaded and re-encoded image.
#[derive(Debug, Clone)]
pub struct StoredImage {
    /// Path of the local JPEG copy.
    pub local_path: String,
    /// Original pixel width before re-encoding.
    pub width: u32,
    /// Original pixel height before re-encoding.
    pub height: u32,
}

/// Append-only local storage area for downloaded images.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    /// Create the store under `<data_dir>/images`, creating directories as
    /// needed.
    pub async fn new(data_dir: &Path) -> Result<Self> {
        let dir = data_dir.join("images");
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// Download one candidate, returning `None` for every failure class.
    #[instrument(level = "debug", skip(self, fetcher))]
    pub async fn download(&self, fetcher: &Fetcher, url: &str) -> Option<StoredImage> {
        let bytes = match fetcher.fetch_bytes(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(%url, error = %e, "Image fetch failed; dropping candidate");
                return None;
            }
        };

        let (fname, jpeg, width, height) = match encode_validated(&bytes, url) {
            Ok(encoded) => encoded,
            Err(e) => {
                debug!(%url, error = %e, "Image unusable; dropping candidate");
                return None;
            }
        };

        let path = self.dir.join(fname);
        if let Err(e) = tokio::fs::write(&path, jpeg).await {
            warn!(path = %path.display(), error = %e, "Failed writing image");
            return None;
        }

        debug!(path = %path.display(), width, height, "Stored image");
        Some(StoredImage {
            local_path: path.to_string_lossy().into_owned(),
            width,
            height,
        })
    }
}

/// Validate raw image bytes and re-encode them as JPEG.
///
/// Applies the byte cap, decodes, rejects images with either dimension below
/// the minimum, converts to RGB, and encodes at the fixed quality. Returns
/// the hash-derived filename, the JPEG bytes, and the original dimensions.
fn encode_validated(bytes: &[u8], url: &str) -> Result<(String, Vec<u8>, u32, u32)> {
    let capped = &bytes[..bytes.len().min(MAX_IMAGE_BYTES)];
    let img = image::load_from_memory(capped)?;

    let (width, height) = (img.width(), img.height());
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("image too small: {width}x{height}"),
        )
        .into());
    }

    let rgb = img.to_rgb8();
    let mut jpeg = Vec::new();
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut jpeg), JPEG_QUALITY);
    rgb.write_with_encoder(encoder)?;

    Ok((filename_for(url), jpeg, width, height))
}

/// Stable collision-resistant filename for a source URL: the first 16 hex
/// characters of its SHA-256 digest, with a `.jpg` extension.
fn filename_for(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut name = String::with_capacity(20);
    for byte in &digest[..8] {
        name.push_str(&format!("{byte:02x}"));
    }
    name.push_str(".jpg");
    name
}
