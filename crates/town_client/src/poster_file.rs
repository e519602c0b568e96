//! Loading poster images as base64 data URLs.

use std::path::Path;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Reads `file` fully and returns it as `data:<mime>;base64,<payload>`.
/// Returns `Ok(None)` when no file was chosen.
pub async fn read_file_as_base64(file: Option<&Path>) -> Result<Option<String>> {
    let Some(path) = file else {
        return Ok(None);
    };

    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read poster image '{}'", path.display()))?;

    Ok(Some(to_data_url(path, &bytes)))
}

fn to_data_url(path: &Path, bytes: &[u8]) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    format!("data:{};base64,{}", mime.essence_str(), STANDARD.encode(bytes))
}

#[cfg(test)]
#[path = "tests/poster_file_tests.rs"]
mod tests;
