/// Single-file measurement routine
///
/// Produces one `MeasurementRecord` per image by timing, in order:
/// 1. the external reference decode (with a data-URL fallback)
/// 2. reading the file into a data URL
/// 3. decoding that data URL
///
/// Failures never escape: each one becomes an absent value in the record.
use std::time::Duration;
use tracing::{debug, warn};

use super::decode::{time_decode, ImageSource};
use super::encode::{read_as_data_url, DataUrl};
use crate::config::BenchConfig;
use crate::error::{BenchError, Result};
use crate::state::data::{
    MeasurementRecord, Recommendation, RecommendationKind, SelectedFile,
};
use crate::state::preview::{PreviewRef, PreviewRegistry};

const TINY_ASSET: &str = "Inline OK, tiny asset";
const INLINE_FASTER: &str = "Inline faster (measured), but cache tradeoffs apply";
const PREFER_EXTERNAL: &str = "Prefer external, smaller bundle and cacheable";

/// Time the decode of a preview reference, resolving it at request time
pub async fn time_preview_decode(
    registry: &PreviewRegistry,
    preview: Option<PreviewRef>,
) -> Result<Duration> {
    let preview = preview.ok_or(BenchError::PreviewRevoked(0))?;
    let source = registry
        .resolve(preview)
        .ok_or(BenchError::PreviewRevoked(preview.id()))?;
    time_decode(ImageSource::Reference(source)).await
}

/// Encode the file afresh and time decoding the result
async fn inline_decode(file: &SelectedFile) -> Result<Duration> {
    let url = read_as_data_url(file).await?;
    time_decode(ImageSource::DataUrl(url)).await
}

/// External decode time, falling back to a fresh data URL of the file
async fn external_decode(
    file: &SelectedFile,
    registry: &PreviewRegistry,
    preview: Option<PreviewRef>,
) -> Option<Duration> {
    match time_preview_decode(registry, preview).await {
        Ok(elapsed) => Some(elapsed),
        Err(first) => {
            debug!("🔁 Preview decode failed for {} ({}), retrying inline", file.name, first);
            match inline_decode(file).await {
                Ok(elapsed) => Some(elapsed),
                Err(e) => {
                    warn!("⚠️  External decode failed for {}: {}", file.name, e);
                    None
                }
            }
        }
    }
}

/// Size increase of `encoded` over `original`, in percent with one decimal
pub fn inflation_percent(original: u64, encoded: u64) -> Option<f64> {
    if original == 0 {
        return None;
    }
    let percent = (encoded as f64 - original as f64) / original as f64 * 100.0;
    Some((percent * 10.0).round() / 10.0)
}

/// Informational hint shown on each card
pub fn recommend(
    config: &BenchConfig,
    original_size: u64,
    base64_total: Duration,
    external: Option<Duration>,
) -> Recommendation {
    if original_size <= config.inline_threshold_bytes {
        return Recommendation {
            kind: RecommendationKind::Good,
            text: TINY_ASSET,
        };
    }

    // A zero inline total means nothing on that path was measured
    match external {
        Some(external)
            if !base64_total.is_zero() && base64_total + config.inline_margin() < external =>
        {
            Recommendation {
                kind: RecommendationKind::Good,
                text: INLINE_FASTER,
            }
        }
        _ => Recommendation {
            kind: RecommendationKind::Bad,
            text: PREFER_EXTERNAL,
        },
    }
}

/// Measure one file over both delivery strategies
pub async fn measure_file(
    file: &SelectedFile,
    registry: &PreviewRegistry,
    preview: Option<PreviewRef>,
    config: &BenchConfig,
) -> MeasurementRecord {
    let decode_time = external_decode(file, registry, preview).await;

    let read_start = std::time::Instant::now();
    let (data_url, read_time): (Option<DataUrl>, Option<Duration>) =
        match read_as_data_url(file).await {
            Ok(url) => (Some(url), Some(read_start.elapsed())),
            Err(e) => {
                warn!("⚠️  Could not read {}: {}", file.name, e);
                (None, None)
            }
        };

    let base64_decode_time = match &data_url {
        Some(url) => match time_decode(ImageSource::DataUrl(url.clone())).await {
            Ok(elapsed) => Some(elapsed),
            Err(e) => {
                warn!("⚠️  Base64 decode failed for {}: {}", file.name, e);
                None
            }
        },
        None => None,
    };

    let base64_size = data_url.as_ref().map(|url| url.len() as u64);
    let inflation = base64_size.and_then(|encoded| inflation_percent(file.size, encoded));
    let total_time = read_time.unwrap_or_default() + base64_decode_time.unwrap_or_default();

    debug!(
        "⏱️  {}: external {:?}, read {:?}, inline decode {:?}",
        file.name, decode_time, read_time, base64_decode_time
    );

    MeasurementRecord {
        original_size: file.size,
        base64_size,
        inflation_percent: inflation,
        read_time,
        base64_decode_time,
        decode_time,
        total_time,
        cached: false,
        recommendation: recommend(config, file.size, total_time, decode_time),
    }
}

/// Measure a file whose external copy was served from the cache.
///
/// The Base64 path is always measured against the original file; only the
/// external decode time is replaced by the cached one.
pub async fn measure_cached(
    file: &SelectedFile,
    registry: &PreviewRegistry,
    preview: Option<PreviewRef>,
    cached_decode: Option<Duration>,
    config: &BenchConfig,
) -> MeasurementRecord {
    let record = measure_file(file, registry, preview, config).await;
    MeasurementRecord {
        decode_time: cached_decode,
        cached: true,
        ..record
    }
}
