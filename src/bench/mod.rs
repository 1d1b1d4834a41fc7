/// Benchmark module
///
/// This module handles:
/// - Encoding files as Base64 data URLs
/// - Timing image decodes
/// - Measuring one file over both delivery strategies
/// - Running cold and warm batches over the whole selection
/// - Exporting results as JSON

pub mod batch;
pub mod decode;
pub mod encode;
pub mod measure;
pub mod report;
