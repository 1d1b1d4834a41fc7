/// JSON export of the current results
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::state::data::{CacheSummary, MeasurementRecord};
use crate::state::session::Session;

#[derive(Serialize, Debug)]
pub struct Report<'a> {
    pub generated_at: String,
    /// Which selection the results belong to, counted since startup
    pub selection: u64,
    pub cache: Option<CacheSummary>,
    pub files: Vec<ReportEntry<'a>>,
}

#[derive(Serialize, Debug)]
pub struct ReportEntry<'a> {
    pub index: usize,
    pub name: &'a str,
    #[serde(flatten)]
    pub record: &'a MeasurementRecord,
}

impl<'a> Report<'a> {
    pub fn from_session(session: &'a Session) -> Self {
        let files = session
            .records()
            .filter_map(|(index, record)| {
                let file = session.files().get(index)?;
                Some(ReportEntry {
                    index,
                    name: &file.name,
                    record,
                })
            })
            .collect();

        Self {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            selection: session.generation(),
            cache: session.cache_summary(),
            files,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        info!("💾 Exported {} result(s) to {}", self.files.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bench::batch::{Event, Progress};
    use crate::state::data::{Recommendation, RecommendationKind, SelectedFile};
    use crate::state::preview::PreviewRegistry;
    use std::time::Duration;

    #[test]
    fn test_report_shape() {
        let mut session = Session::new(PreviewRegistry::new());
        session.select(vec![SelectedFile::from_bytes("logo.png", vec![0u8; 3])]);
        session.apply(Progress {
            generation: session.generation(),
            event: Event::Measured {
                index: 0,
                record: MeasurementRecord {
                    original_size: 3,
                    base64_size: Some(26),
                    inflation_percent: Some(766.7),
                    read_time: Some(Duration::from_millis(2)),
                    base64_decode_time: None,
                    decode_time: Some(Duration::from_millis(4)),
                    total_time: Duration::from_millis(2),
                    cached: false,
                    recommendation: Recommendation {
                        kind: RecommendationKind::Good,
                        text: "Inline OK, tiny asset",
                    },
                },
            },
        });

        let json: serde_json::Value =
            serde_json::from_str(&Report::from_session(&session).to_json().unwrap()).unwrap();

        let entry = &json["files"][0];
        assert_eq!(entry["name"], "logo.png");
        assert_eq!(entry["base64_size"], 26);
        assert!((entry["read_time_ms"].as_f64().unwrap() - 2.0).abs() < 1e-9);
        assert!(entry["base64_decode_time_ms"].is_null());
        assert_eq!(entry["recommendation"]["kind"], "good");
        assert!(json["cache"].is_null());
        assert_eq!(json["selection"], 1);
    }
}
