/// Base64 data-URL encoding
///
/// The inline strategy ships an image as `data:<mime>;base64,<payload>`.
/// Encoding is CPU-bound and runs on the blocking pool.
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;
use std::sync::Arc;
use tokio::task;
use tracing::debug;

use crate::error::{BenchError, Result};
use crate::state::data::SelectedFile;

const FALLBACK_MIME: &str = "application/octet-stream";

/// A complete `data:` URL with a base64 payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl(Arc<str>);

impl DataUrl {
    pub fn new(mime: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)).into())
    }

    fn split(&self) -> Option<(&str, &str)> {
        let rest = self.0.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mime = header.strip_suffix(";base64")?;
        Some((mime, payload))
    }

    pub fn mime(&self) -> &str {
        self.split().map(|(mime, _)| mime).unwrap_or_default()
    }

    /// Length of the whole URL, which is what an inlined asset weighs
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn decode_bytes(&self) -> Result<Vec<u8>> {
        let (_, payload) = self.split().ok_or(BenchError::InvalidDataUrl)?;
        Ok(STANDARD.decode(payload)?)
    }
}

/// MIME type for a file, from its extension and then its magic bytes
pub fn mime_for(file: &SelectedFile, bytes: &[u8]) -> &'static str {
    file.extension()
        .and_then(|ext| ImageFormat::from_extension(ext))
        .or_else(|| image::guess_format(bytes).ok())
        .map(|format| format.to_mime_type())
        .unwrap_or(FALLBACK_MIME)
}

/// Read a file and encode it as a data URL
pub async fn read_as_data_url(file: &SelectedFile) -> Result<DataUrl> {
    let bytes = file.source.read().await?;
    let mime = mime_for(file, &bytes);

    let url = task::spawn_blocking(move || DataUrl::new(mime, &bytes)).await?;
    debug!("📦 Encoded {} as {} ({} chars)", file.name, url.mime(), url.len());
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    impl DataUrl {
        /// Wrap an existing string, checking the `data:...;base64,` shape
        pub(crate) fn parse(s: &str) -> Result<Self> {
            let url = Self(s.into());
            url.split().ok_or(BenchError::InvalidDataUrl)?;
            Ok(url)
        }

        pub(crate) fn payload(&self) -> &str {
            self.split().map(|(_, payload)| payload).unwrap_or_default()
        }

        /// Size of the bytes the payload decodes to, derived from its length
        pub(crate) fn decoded_len(&self) -> usize {
            let payload = self.payload();
            let padding = payload.bytes().rev().take_while(|&b| b == b'=').count().min(2);
            (payload.len() * 3).div_ceil(4) - padding
        }

        pub(crate) fn as_str(&self) -> &str {
            &self.0
        }
    }

    #[test]
    fn test_known_encoding() {
        let url = DataUrl::new("image/png", b"hello");
        assert_eq!(url.as_str(), "data:image/png;base64,aGVsbG8=");
        assert_eq!(url.mime(), "image/png");
        assert_eq!(url.payload(), "aGVsbG8=");
        assert_eq!(url.decoded_len(), 5);
        assert_eq!(url.decode_bytes().unwrap(), b"hello");
    }

    #[test]
    fn test_payload_length_and_inflation() {
        for n in [1usize, 2, 3, 4, 1000, 3000, 4096] {
            let bytes = vec![0xABu8; n];
            let url = DataUrl::new("image/jpeg", &bytes);
            assert_eq!(url.payload().len(), n.div_ceil(3) * 4);
            assert!(url.len() >= n);
            assert_eq!(url.decoded_len(), n);
        }
    }

    #[test]
    fn test_parse_rejects_non_data_urls() {
        assert!(DataUrl::parse("https://example.com/a.png").is_err());
        assert!(DataUrl::parse("data:image/png,plain").is_err());
        assert!(DataUrl::parse("data:image/png;base64,aGk=").is_ok());
    }

    #[tokio::test]
    async fn test_read_as_data_url_uses_extension_mime() {
        let file = SelectedFile::from_bytes("photo.JPG", vec![1u8, 2, 3]);
        let url = read_as_data_url(&file).await.unwrap();
        assert_eq!(url.mime(), "image/jpeg");
        assert_eq!(url.decode_bytes().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_unknown_type_falls_back() {
        let file = SelectedFile::from_bytes("blob", b"zzzz".to_vec());
        let url = read_as_data_url(&file).await.unwrap();
        assert_eq!(url.mime(), FALLBACK_MIME);
    }

    #[tokio::test]
    async fn test_empty_file() {
        let file = SelectedFile::from_bytes("empty.png", Vec::<u8>::new());
        let url = read_as_data_url(&file).await.unwrap();
        assert_eq!(url.as_str(), "data:image/png;base64,");
    }

    #[tokio::test]
    async fn test_missing_file_is_a_read_error() {
        let file = SelectedFile {
            name: "gone.png".into(),
            size: 10,
            source: crate::state::data::FileSource::Disk("/nonexistent/gone.png".into()),
        };
        assert!(matches!(read_as_data_url(&file).await, Err(BenchError::Io(_))));
    }
}
