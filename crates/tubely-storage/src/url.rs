//! Public URL derivation for stored objects.
//!
//! The mode is fixed per deployment: an edge distribution when one is
//! configured, otherwise the backend's own direct URL.

/// Builds the externally reachable URL for a remote object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectUrlBuilder {
    /// Direct S3 URL. With a custom endpoint (MinIO etc.) path-style is used.
    Direct {
        bucket: String,
        region: String,
        endpoint: Option<String>,
    },
    /// Served through a content-delivery distribution host.
    Edge { host: String },
    /// Local backend served from a base URL.
    Local { base_url: String },
}

impl ObjectUrlBuilder {
    pub fn url_for(&self, key: &str) -> String {
        let key = key.trim_start_matches('/');
        match self {
            ObjectUrlBuilder::Direct {
                bucket,
                endpoint: Some(endpoint),
                ..
            } => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key),
            ObjectUrlBuilder::Direct {
                bucket,
                region,
                endpoint: None,
            } => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key),
            ObjectUrlBuilder::Edge { host } => {
                let host = host
                    .trim_start_matches("https://")
                    .trim_start_matches("http://")
                    .trim_end_matches('/');
                format!("https://{}/{}", host, key)
            }
            ObjectUrlBuilder::Local { base_url } => {
                format!("{}/{}", base_url.trim_end_matches('/'), key)
            }
        }
    }
}
