//! Upload-and-publish orchestration.

mod cleanup;
mod pipeline;
mod types;

pub use cleanup::ScratchFiles;
pub use pipeline::{PipelineComponents, UploadPipeline};
pub use types::{OwnedVideo, PipelineStage, UploadError};
