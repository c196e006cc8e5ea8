//! Size checks and decoding for directly uploaded files.

use crate::config::LimitsConfig;
use crate::constants::truncate_chars;
use crate::models::SourceFile;

use super::SourceError;

const MIB: usize = 1024 * 1024;

/// A file received in a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Enforce the per-file and aggregate caps, then decode each file.
///
/// Runs before any upstream call. Content is decoded lossily and truncated
/// to `upload_content_chars` characters.
pub fn validate_uploads(
    uploads: Vec<Upload>,
    limits: &LimitsConfig,
) -> Result<Vec<SourceFile>, SourceError> {
    if let Some(big) = uploads.iter().find(|u| u.bytes.len() > limits.max_file_bytes) {
        return Err(SourceError::FileTooLarge {
            name: big.name.clone(),
            limit_mib: limits.max_file_bytes / MIB,
        });
    }

    let total: usize = uploads.iter().map(|u| u.bytes.len()).sum();
    if total > limits.max_total_bytes {
        return Err(SourceError::TotalTooLarge {
            limit_mib: limits.max_total_bytes / MIB,
        });
    }

    Ok(uploads
        .into_iter()
        .map(|upload| {
            let text = String::from_utf8_lossy(&upload.bytes);
            SourceFile {
                path: upload.name,
                content: truncate_chars(&text, limits.upload_content_chars).to_string(),
            }
        })
        .collect())
}
