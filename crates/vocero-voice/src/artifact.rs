//! Generated media files written into the public static directory.

use crate::error::VoiceError;
use futures_util::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// A fresh file name such as `response-<uuid>.mp3`.
pub fn artifact_file_name(extension: &str) -> String {
    format!("response-{}.{}", Uuid::new_v4(), extension)
}

/// Streams a response body into `dir/file_name`.
///
/// A partially written file is removed when the transfer fails.
pub(crate) async fn save_body(
    response: reqwest::Response,
    dir: &Path,
    file_name: &str,
) -> Result<u64, VoiceError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);

    let result = async {
        let mut file = tokio::fs::File::create(&path).await?;
        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        Ok::<_, VoiceError>(written)
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&path).await;
    }
    result
}
