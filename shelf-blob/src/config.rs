/// Configuration shared by the blob stores
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Absolute max size allowed for a single blob
    pub max_blob_bytes: u64,

    /// Prefix of the references handed out by stores that serve their
    /// blobs over HTTP (e.g. `/uploads` or `https://cdn.example.com/covers`)
    pub public_url: String,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            max_blob_bytes: 10 * 1024 * 1024, // 10MB
            public_url: "/uploads".to_string(),
        }
    }
}

impl BlobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_blob_bytes(mut self, bytes: u64) -> Self {
        self.max_blob_bytes = bytes;
        self
    }

    pub fn with_public_url<S: Into<String>>(mut self, url: S) -> Self {
        self.public_url = url.into().trim_end_matches('/').to_string();
        self
    }
}
