use crate::config::Settings;
use crate::domain::migration::{
    CompletionMarker, MarkerRecord, MigrationError, SourceListStore, sources_channel,
};
use serde::Serialize;
use std::fmt::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub complete: bool,
    pub marker_file: PathBuf,
    pub marker: Option<MarkerRecord>,
    pub sources_file: PathBuf,
    /// Channel of the first deb entry in the sources file, if any.
    pub sources_channel: Option<String>,
    pub target_channel: String,
}

impl StatusReport {
    /// 人が読むための表示
    pub fn render(&self) -> String {
        let unknown = |value: &Option<String>| value.clone().unwrap_or_else(|| "Unknown".into());
        let mut out = String::from("\n=== Distiller Migration Status ===\n");

        let _ = writeln!(
            out,
            "Migration complete: {}",
            if self.complete { "Yes" } else { "No" }
        );
        match &self.marker {
            Some(record) => {
                let _ = writeln!(out, "Completed at: {}", unknown(&record.completed_at));
                let _ = writeln!(out, "Platform: {}", unknown(&record.platform));
                let _ = writeln!(out, "Genesis package: {}", unknown(&record.package));
                let _ = writeln!(out, "Recorded channel: {}", unknown(&record.channel));
            }
            None => {
                let _ = writeln!(out, "Marker: {} (absent)", self.marker_file.display());
            }
        }
        let _ = writeln!(
            out,
            "Sources channel: {} ({})",
            self.sources_channel.as_deref().unwrap_or("none"),
            self.sources_file.display()
        );
        let _ = writeln!(out, "Target channel: {}", self.target_channel);
        out
    }
}

/// 完了マーカーと sources ファイルから移行状態を報告する
pub struct ShowStatusUseCase {
    sources: Arc<dyn SourceListStore>,
}

impl ShowStatusUseCase {
    pub fn new(sources: Arc<dyn SourceListStore>) -> Self {
        Self { sources }
    }

    pub fn execute(&self, settings: &Settings) -> Result<StatusReport, MigrationError> {
        let marker = CompletionMarker::new(&settings.paths.marker_file);
        let record = marker.read()?;
        let sources_file = settings.repository.sources_file.clone();
        let sources_channel = self
            .sources
            .read(&sources_file)?
            .as_deref()
            .and_then(sources_channel);

        Ok(StatusReport {
            complete: record.is_some(),
            marker_file: marker.path().to_path_buf(),
            marker: record,
            sources_file,
            sources_channel,
            target_channel: settings.repository.target_channel.clone(),
        })
    }
}
