//! Upload sessions and the debounced upload pipeline

pub mod pipeline;
pub mod tracker;

pub use pipeline::{FetchError, FileFetcher, FileRef, OutcomeNotifier, StagedFile, UploadCoordinator, UploadOutcome};
pub use tracker::{UploadSession, UploadTracker};
