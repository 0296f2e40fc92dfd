mod media;
mod video;

pub use media::{normalize_media_type, AspectCategory, MediaBlob, UploadKind};
pub use video::Video;
