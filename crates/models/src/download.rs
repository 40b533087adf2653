use std::path::PathBuf;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use crate::{is_downloaded, model_file, model_path, ModelError, Result, WhisperModel};

/// Upstream home of the ggml weights files.
const WEIGHTS_BASE_URL: &str = "https://huggingface.co/ggerganov/whisper.cpp/resolve/main";

/// Fetch a model's GGML weights into the local models directory and
/// return the weights file path.
///
/// `on_progress` receives `(downloaded_bytes, total_bytes)`; the total
/// comes from the server's content length when present, otherwise from
/// the model's size estimate. Bytes land under a `.part` name until the
/// transfer completes, so an interrupted download never satisfies
/// [`is_downloaded`](crate::is_downloaded). Already downloaded models
/// are a no-op.
pub async fn download_model<F>(model: WhisperModel, on_progress: F) -> Result<PathBuf>
where
    F: Fn(u64, u64),
{
    let dest = model_file(model);
    if is_downloaded(model) {
        return Ok(dest);
    }
    std::fs::create_dir_all(model_path(model))?;

    // ggml artifacts drop the family prefix: whisper-base.en -> ggml-base.en.bin
    let artifact = model.dir_name().replace("whisper-", "");
    let url = format!("{WEIGHTS_BASE_URL}/ggml-{artifact}.bin");
    tracing::info!("Downloading {} from {}", model.name(), url);

    let response = reqwest::get(&url)
        .await
        .map_err(|e| ModelError::DownloadFailed(e.to_string()))?;
    if !response.status().is_success() {
        return Err(ModelError::DownloadFailed(format!(
            "{url} returned HTTP {}",
            response.status()
        )));
    }
    let total_size = response
        .content_length()
        .unwrap_or_else(|| model.size_bytes());

    let partial = dest.with_extension("bin.part");
    let mut file = tokio::fs::File::create(&partial).await?;
    let mut stream = response.bytes_stream();
    let mut downloaded = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ModelError::DownloadFailed(e.to_string()))?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
        on_progress(downloaded, total_size);
    }
    file.flush().await?;
    drop(file);
    tokio::fs::rename(&partial, &dest).await?;

    tracing::info!("Model {} saved to {}", model.name(), dest.display());
    Ok(dest)
}
