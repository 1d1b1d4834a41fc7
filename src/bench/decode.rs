/// Image decode timer
///
/// Times one decode from request to a fully decoded image. For a file
/// reference that includes fetching the bytes; for a data URL it includes
/// undoing the base64. Pixel decoding runs on the blocking pool, one image
/// at a time.
use std::time::{Duration, Instant};
use tokio::task;
use tracing::debug;

use super::encode::DataUrl;
use crate::error::Result;
use crate::state::data::FileSource;

/// What to decode
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// An external file (or a cached copy of one)
    Reference(FileSource),
    /// An inlined data URL
    DataUrl(DataUrl),
}

/// Decode `source` and return how long it took
pub async fn time_decode(source: ImageSource) -> Result<Duration> {
    let start = Instant::now();

    let bytes: Vec<u8> = match &source {
        ImageSource::Reference(file) => file.read().await?.to_vec(),
        ImageSource::DataUrl(url) => url.decode_bytes()?,
    };

    let (width, height) = task::spawn_blocking(move || -> Result<(u32, u32)> {
        let img = image::load_from_memory(&bytes)?;
        Ok((img.width(), img.height()))
    })
    .await??;

    let elapsed = start.elapsed();
    debug!("🖼️  Decoded {}x{} in {:?}", width, height, elapsed);
    Ok(elapsed)
}
