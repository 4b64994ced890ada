use serde::{Deserialize, Serialize};

/// Download behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DownloadConfig {
    /// Write buffer size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Compare the file's MD5 with the digest the provider reports, when it reports one.
    #[serde(default = "default_verify_checksum")]
    pub verify_checksum: bool,
}

fn default_chunk_size() -> usize {
    8192
}

fn default_verify_checksum() -> bool {
    true
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            verify_checksum: default_verify_checksum(),
        }
    }
}
