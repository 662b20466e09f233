//! Ingestion progress reporting.

use std::fmt;

/// Stages of an ingestion run, in the order they happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    /// Reading the source document.
    Loading,
    /// Splitting pages into chunks.
    Chunking,
    /// Embedding chunk batches; `processed` counts finished batches.
    Embedding,
    /// Writing the index bundle.
    Saving,
    /// Ingestion completed successfully.
    Done,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Loading => "loading",
            Self::Chunking => "chunking",
            Self::Embedding => "embedding",
            Self::Saving => "saving",
            Self::Done => "done",
        })
    }
}

/// Progress update during ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestProgress {
    /// Current stage.
    pub stage: IngestStage,
    /// Units finished in this stage.
    pub processed: usize,
    /// Units expected in this stage.
    pub total: usize,
}

impl IngestProgress {
    /// Creates a new progress update.
    #[must_use]
    pub const fn new(stage: IngestStage, processed: usize, total: usize) -> Self {
        Self {
            stage,
            processed,
            total,
        }
    }

    /// Whether the run has finished.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        matches!(self.stage, IngestStage::Done)
    }
}

impl fmt::Display for IngestProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.stage, self.processed, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        let progress = IngestProgress::new(IngestStage::Embedding, 3, 5);
        assert_eq!(progress.to_string(), "embedding 3/5");
        assert!(!progress.is_done());
        assert!(IngestProgress::new(IngestStage::Done, 1, 1).is_done());
    }
}
