//! File-drop transport
//!
//! Writes the report body into a directory under its external filename.
//! The write is all-or-nothing: a temporary file is renamed into place.

use super::traits::{with_send_timeout, TransportProtocol, TransportSession, Transmission};
use crate::config::FileDropConfig;
use crate::domain::{Destination, ReportHeader, ReportId, Result, RetryItems, TransportError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory drop adapter
pub struct FileDropTransport {
    directory: PathBuf,
    create_dirs: bool,
    timeout: Duration,
}

impl FileDropTransport {
    /// Create an adapter writing into `config.directory`
    pub fn new(config: &FileDropConfig, timeout: Duration) -> Self {
        Self {
            directory: PathBuf::from(&config.directory),
            create_dirs: config.create_dirs,
            timeout,
        }
    }

    async fn write(&self, path: &Path, content: &[u8]) -> std::result::Result<(), TransportError> {
        if self.create_dirs {
            tokio::fs::create_dir_all(&self.directory).await?;
        }
        let partial = path.with_extension("partial");
        tokio::fs::write(&partial, content).await?;
        if let Err(e) = tokio::fs::rename(&partial, path).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl TransportProtocol for FileDropTransport {
    fn name(&self) -> &str {
        "file_drop"
    }

    async fn start_session(
        &self,
        _destination: &Destination,
    ) -> Result<Option<Box<dyn TransportSession>>> {
        Ok(None)
    }

    async fn send(
        &self,
        header: &ReportHeader,
        sent_report_id: ReportId,
        _retry_items: &RetryItems,
        _session: Option<&mut (dyn TransportSession + 'static)>,
    ) -> Transmission {
        let filename = header.external_filename(sent_report_id);
        let path = self.directory.join(&filename);
        let params = format!("file_drop path={}", path.display());

        let call = async {
            let Some(content) = header.content.as_deref() else {
                let e = TransportError::MissingContent(sent_report_id.to_string());
                return Transmission::retry_all(params.clone(), format!("file drop failed: {e}"));
            };

            match self.write(&path, content).await {
                Ok(()) => Transmission::delivered(
                    params.clone(),
                    format!("wrote {} bytes", content.len()),
                    header.report.item_count,
                ),
                Err(e) => {
                    tracing::warn!(
                        report_id = %sent_report_id,
                        path = %path.display(),
                        error = %e,
                        "File drop failed"
                    );
                    Transmission::retry_all(params.clone(), format!("file drop failed: {e}"))
                }
            }
        };

        with_send_timeout(self.timeout, params.clone(), call)
            .await
            .with_external_name(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReportBuilder, RetryOutcome, TransportKind};
    use tempfile::TempDir;

    fn header(content: Option<Vec<u8>>) -> ReportHeader {
        let report = ReportBuilder::new("covid-19", "covid-19").item_count(2).build();
        let destination =
            Destination::new("az-phd", "elr", "covid-19", "covid-19", TransportKind::FileDrop);
        ReportHeader::new(report, destination, content)
    }

    #[tokio::test]
    async fn test_writes_body_under_external_name() {
        let dir = TempDir::new().unwrap();
        let transport = FileDropTransport::new(
            &FileDropConfig {
                directory: dir.path().join("out").to_string_lossy().to_string(),
                create_dirs: true,
            },
            Duration::from_secs(5),
        );

        let header = header(Some(b"a,b\nc,d\n".to_vec()));
        let transmission = transport
            .send(&header, ReportId::new(), &RetryItems::first_attempt(), None)
            .await;

        assert_eq!(transmission.outcome, RetryOutcome::Delivered);
        let name = transmission.external_name.unwrap();
        let written = std::fs::read(dir.path().join("out").join(name)).unwrap();
        assert_eq!(written, b"a,b\nc,d\n");
    }

    #[tokio::test]
    async fn test_missing_directory_is_retry_all() {
        let dir = TempDir::new().unwrap();
        let transport = FileDropTransport::new(
            &FileDropConfig {
                directory: dir.path().join("absent").to_string_lossy().to_string(),
                create_dirs: false,
            },
            Duration::from_secs(5),
        );

        let transmission = transport
            .send(&header(Some(b"x".to_vec())), ReportId::new(), &RetryItems::first_attempt(), None)
            .await;
        assert_eq!(transmission.outcome, RetryOutcome::RetryAll);
    }

    #[tokio::test]
    async fn test_failed_rename_removes_partial_file() {
        let dir = TempDir::new().unwrap();
        let transport = FileDropTransport::new(
            &FileDropConfig {
                directory: dir.path().to_string_lossy().to_string(),
                create_dirs: true,
            },
            Duration::from_secs(5),
        );

        let header = header(Some(b"a,b\n".to_vec()));
        let sent_report_id = ReportId::new();
        let target = dir.path().join(header.external_filename(sent_report_id));
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("occupied"), b"x").unwrap();

        let transmission = transport
            .send(&header, sent_report_id, &RetryItems::first_attempt(), None)
            .await;

        assert_eq!(transmission.outcome, RetryOutcome::RetryAll);
        assert!(!target.with_extension("partial").exists());
    }

    #[tokio::test]
    async fn test_missing_content_is_retry_all() {
        let dir = TempDir::new().unwrap();
        let transport = FileDropTransport::new(
            &FileDropConfig {
                directory: dir.path().to_string_lossy().to_string(),
                create_dirs: true,
            },
            Duration::from_secs(5),
        );

        let transmission = transport
            .send(&header(None), ReportId::new(), &RetryItems::first_attempt(), None)
            .await;
        assert_eq!(transmission.outcome, RetryOutcome::RetryAll);
        assert!(transmission.result.contains("file drop failed"));
    }
}
