//! File ingestion: read a delivery file line by line and submit its boxes.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

use boxer_receiving::{BoxAggregator, BoxRecord, DropReason, Step};

use crate::sink::RecordSink;

/// Errors that end the ingestion of one file.
///
/// Format problems inside the file are not here: they are logged and
/// recovered from line by line.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The caller passed an unusable argument (e.g. an empty path).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The file could not be opened, or reading it failed midway.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl IngestError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Counters for one ingested file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub lines_read: u64,
    pub boxes_emitted: u64,
    /// Boxes thrown away because a malformed header interrupted them.
    pub boxes_discarded: u64,
    /// Content lines that contributed nothing (orphaned, malformed, bad quantity).
    pub lines_dropped: u64,
    /// Boxes the sink refused; they are lost for persistence.
    pub sink_failures: u64,
}

/// Drives delivery files through the aggregator into a [`RecordSink`].
///
/// Holds no per-file state: every call to [`IngestionPipeline::process`] gets
/// its own aggregator, so one pipeline can serve many files at once.
#[derive(Debug)]
pub struct IngestionPipeline<S> {
    sink: S,
}

impl<S: RecordSink> IngestionPipeline<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Ingest one file from start to end.
    pub async fn process(&self, path: impl AsRef<Path>) -> Result<IngestSummary, IngestError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(IngestError::invalid_argument("file path cannot be empty"));
        }

        let file = File::open(path)
            .await
            .map_err(|source| IngestError::io(path, source))?;

        let summary = self
            .ingest_reader(path, BufReader::new(file))
            .await
            .map_err(|source| {
                error!(path = %path.display(), error = %source, "uncaught error when processing file");
                IngestError::io(path, source)
            })?;

        info!(
            path = %path.display(),
            lines_read = summary.lines_read,
            boxes_emitted = summary.boxes_emitted,
            boxes_discarded = summary.boxes_discarded,
            lines_dropped = summary.lines_dropped,
            sink_failures = summary.sink_failures,
            "file ingested"
        );
        Ok(summary)
    }

    /// Ingest an already-open line source. `source` only labels log events.
    ///
    /// A read error stops ingestion at once; boxes submitted before it stay
    /// submitted and the box in progress is not flushed.
    pub async fn ingest_reader<R>(&self, source: &Path, reader: R) -> io::Result<IngestSummary>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut aggregator = BoxAggregator::new();
        let mut summary = IngestSummary::default();

        while let Some(line) = lines.next_line().await? {
            summary.lines_read += 1;
            let line_no = summary.lines_read;

            match aggregator.accept_line(&line) {
                Ok(Step::Emitted(record)) => self.submit(source, record, &mut summary).await,
                Ok(Step::Started(_) | Step::Appended | Step::Skipped) => {}
                Ok(Step::Dropped(DropReason::OrphanContent)) => {
                    summary.lines_dropped += 1;
                    debug!(
                        path = %source.display(),
                        line_no,
                        line = %line,
                        "content line without a preceding header dropped"
                    );
                }
                Ok(Step::Dropped(DropReason::Invalid(err))) => {
                    summary.lines_dropped += 1;
                    warn!(
                        path = %source.display(),
                        line_no,
                        line = %line,
                        error = %err,
                        "content line dropped"
                    );
                }
                Err(discard) => {
                    let discarded = discard.discarded.as_ref().map(|b| b.id_typed().to_string());
                    if discarded.is_some() {
                        summary.boxes_discarded += 1;
                    }
                    error!(
                        path = %source.display(),
                        line_no,
                        line = %line,
                        discarded_box = ?discarded,
                        error = %discard.cause,
                        "error during box processing; skipping current box"
                    );
                }
            }
        }

        if let Some(record) = aggregator.finish() {
            self.submit(source, record, &mut summary).await;
        }

        Ok(summary)
    }

    async fn submit(&self, source: &Path, record: BoxRecord, summary: &mut IngestSummary) {
        let box_id = record.id_typed().to_string();
        match self.sink.submit(record).await {
            Ok(()) => {
                summary.boxes_emitted += 1;
                debug!(path = %source.display(), box_id = %box_id, "box submitted");
            }
            Err(err) => {
                summary.sink_failures += 1;
                error!(path = %source.display(), box_id = %box_id, error = %err, "failed to store box");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use boxer_receiving::Content;

    use crate::sink::SinkError;

    /// Records every submission; optionally refuses some box identifiers.
    #[derive(Debug, Default)]
    struct RecordingSink {
        accepted: Mutex<Vec<BoxRecord>>,
        refuse: Vec<&'static str>,
    }

    impl RecordingSink {
        fn refusing(ids: &[&'static str]) -> Self {
            Self {
                accepted: Mutex::new(Vec::new()),
                refuse: ids.to_vec(),
            }
        }

        fn accepted(&self) -> Vec<BoxRecord> {
            self.accepted.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl RecordSink for RecordingSink {
        async fn submit(&self, record: BoxRecord) -> Result<(), SinkError> {
            if self.refuse.iter().any(|id| *id == record.id_typed().as_str()) {
                return Err(SinkError::Unavailable("refused by test".to_string()));
            }
            self.accepted.lock().unwrap().push(record);
            Ok(())
        }
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn ids(boxes: &[BoxRecord]) -> Vec<String> {
        boxes.iter().map(|b| b.id_typed().to_string()).collect()
    }

    const TWO_BOXES: &str = "HDR SUP1 BOX1\nLINE PO1 ISBN1 5\nLINE PO2 ISBN2 3\nHDR SUP2 BOX2\nLINE PO3 ISBN3 1\n";

    #[tokio::test]
    async fn submits_boxes_in_header_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "delivery.txt", TWO_BOXES.as_bytes());
        let pipeline = IngestionPipeline::new(RecordingSink::default());

        let summary = pipeline.process(&path).await.unwrap();

        let boxes = pipeline.sink().accepted();
        assert_eq!(ids(&boxes), vec!["BOX1", "BOX2"]);
        assert_eq!(boxes[0].supplier_id().as_str(), "SUP1");
        assert_eq!(
            boxes[0].contents(),
            &[Content::new("PO1", "ISBN1", 5), Content::new("PO2", "ISBN2", 3)]
        );
        assert_eq!(boxes[1].contents(), &[Content::new("PO3", "ISBN3", 1)]);
        assert_eq!(summary.lines_read, 5);
        assert_eq!(summary.boxes_emitted, 2);
    }

    #[tokio::test]
    async fn empty_path_is_an_invalid_argument() {
        let pipeline = IngestionPipeline::new(RecordingSink::default());
        let err = pipeline.process("").await.unwrap_err();
        assert!(matches!(err, IngestError::InvalidArgument(_)));
        assert!(pipeline.sink().accepted().is_empty());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = IngestionPipeline::new(RecordingSink::default());
        let err = pipeline.process(dir.path().join("absent.txt")).await.unwrap_err();
        match err {
            IngestError::Io { source, .. } => assert_eq!(source.kind(), io::ErrorKind::NotFound),
            other => panic!("expected io error, got {other:?}"),
        }
        assert!(pipeline.sink().accepted().is_empty());
    }

    #[tokio::test]
    async fn malformed_header_discards_only_the_interrupted_box() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "delivery.txt",
            b"HDR SUP1 BOX1\nLINE PO1 ISBN1 5\nHDR SUP2 BOX2\nLINE PO2 ISBN2 2\nHDR ONLYONE\nLINE PO3 ISBN3 3\nHDR SUP4 BOX4\nLINE PO4 ISBN4 4\n",
        );
        let pipeline = IngestionPipeline::new(RecordingSink::default());

        let summary = pipeline.process(&path).await.unwrap();

        assert_eq!(ids(&pipeline.sink().accepted()), vec!["BOX1", "BOX4"]);
        assert_eq!(summary.boxes_discarded, 1);
        // The line after the broken header has no box to go to.
        assert_eq!(summary.lines_dropped, 1);
    }

    #[tokio::test]
    async fn unparsable_quantity_drops_single_line() {
        let pipeline = IngestionPipeline::new(RecordingSink::default());
        let input: &[u8] = b"HDR SUP1 BOX1\r\nLINE PO1 ISBN1 abc\r\nLINE PO2 ISBN2 7\r\n";

        let summary = pipeline
            .ingest_reader(Path::new("inline"), input)
            .await
            .unwrap();

        let boxes = pipeline.sink().accepted();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].contents(), &[Content::new("PO2", "ISBN2", 7)]);
        assert_eq!(summary.lines_dropped, 1);
    }

    #[tokio::test]
    async fn sink_failure_does_not_stop_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "delivery.txt", TWO_BOXES.as_bytes());
        let pipeline = IngestionPipeline::new(RecordingSink::refusing(&["BOX1"]));

        let summary = pipeline.process(&path).await.unwrap();

        assert_eq!(ids(&pipeline.sink().accepted()), vec!["BOX2"]);
        assert_eq!(summary.sink_failures, 1);
        assert_eq!(summary.boxes_emitted, 1);
    }

    #[tokio::test]
    async fn read_failure_aborts_after_boxes_already_submitted() {
        let dir = tempfile::tempdir().unwrap();
        let mut contents = b"HDR SUP1 BOX1\nLINE PO1 ISBN1 1\nHDR SUP2 BOX2\n".to_vec();
        contents.extend_from_slice(&[0xff, 0xfe, b'\n']);
        contents.extend_from_slice(b"LINE PO2 ISBN2 2\n");
        let path = write_file(&dir, "broken.txt", &contents);
        let pipeline = IngestionPipeline::new(RecordingSink::default());

        let err = pipeline.process(&path).await.unwrap_err();

        match err {
            IngestError::Io { source, .. } => assert_eq!(source.kind(), io::ErrorKind::InvalidData),
            other => panic!("expected io error, got {other:?}"),
        }
        assert_eq!(ids(&pipeline.sink().accepted()), vec!["BOX1"]);
    }

    #[tokio::test]
    async fn reingesting_unchanged_file_repeats_emissions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "delivery.txt", TWO_BOXES.as_bytes());
        let first = IngestionPipeline::new(RecordingSink::default());
        let second = IngestionPipeline::new(RecordingSink::default());

        first.process(&path).await.unwrap();
        second.process(&path).await.unwrap();

        assert_eq!(first.sink().accepted(), second.sink().accepted());
    }

    #[tokio::test]
    async fn file_without_headers_emits_nothing() {
        let pipeline = IngestionPipeline::new(RecordingSink::default());
        let input: &[u8] = b"LINE PO1 ISBN1 1\n\nsome trailer\n";

        let summary = pipeline.ingest_reader(Path::new("inline"), input).await.unwrap();

        assert!(pipeline.sink().accepted().is_empty());
        assert_eq!(summary.lines_dropped, 1);
        assert_eq!(summary.lines_read, 3);
    }
}
