mod reader;
mod writer;

pub use reader::read_reports;
pub use writer::write_reports;

use thiserror::Error;

/// Field delimiter for report rows. Chosen to never occur in free text.
pub const DELIM: &str = "!!=!!";

/// Marker identifying a worker-header line anywhere in the file.
pub const WORKER_MARKER: &str = "!!=!!H_ReportWorkerID!!=!!";

/// Grammar violations in the human-editable report format. Each variant
/// carries the offending text so the user can fix the file in one pass.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HapiError {
    #[error("delimiters count expected 2, got {found} in line '{line}'")]
    DelimiterCount { found: usize, line: String },

    #[error("parent block must be wrapped in [..]: '{text}'")]
    ParentFormat { text: String },

    #[error("child block must start with '->': '{text}'")]
    ChildFormat { text: String },

    #[error("missing 'Actions:' prefix in actions suffix: '{text}'")]
    ActionsFormat { text: String },

    #[error("unsupported work item type '{token}' in '{text}'")]
    UnknownType { token: String, text: String },

    #[error("expected at least a type and a '#'-prefixed title in '{text}'")]
    TooFewTokens { text: String },

    #[error("title must start with '#' in '{text}'")]
    MissingTitleMarker { text: String },

    #[error("{field} '{token}' is not a number in '{text}'")]
    BadTime {
        field: &'static str,
        token: String,
        text: String,
    },

    #[error("report line before any status header: '{line}'")]
    UnknownAggregator { line: String },
}
