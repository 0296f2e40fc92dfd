//! Video inspection and container normalisation via ffprobe/ffmpeg.

mod normalizer;
mod probe;

pub use normalizer::{processed_path, FfmpegNormalizer, NormalizeError, Normalizer};
pub use probe::{parse_dimensions, FfprobeProber, Prober};
