//! Tubely media processing
//!
//! Everything between a validated upload and a published URL: scratch staging,
//! external tool invocation (probe and remux), thumbnail sinks, and the
//! [`UploadPipeline`] that orchestrates them.

pub mod command;
pub mod staging;
pub mod thumbnail;
pub mod upload;
pub mod validator;
pub mod video;

pub use command::{run_tool, CommandError, ToolOutput};
pub use staging::{extension_for, NamingMode, StagedAsset, StagingArea, StagingError};
pub use thumbnail::{
    DataUrlThumbnailSink, DiskThumbnailSink, MemoryThumbnailSink, PendingThumbnail, SinkError,
    StoredThumbnail, ThumbnailSink, ThumbnailStore,
};
pub use upload::{
    OwnedVideo, PipelineComponents, PipelineStage, ScratchFiles, UploadError, UploadPipeline,
};
pub use validator::{MediaValidator, ValidationError};
pub use video::{
    processed_path, FfmpegNormalizer, FfprobeProber, Normalizer, NormalizeError, Prober,
};
