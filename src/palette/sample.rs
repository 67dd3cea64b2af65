//! Image loading and the fixed-size sample grid.

use super::ImageSource;
use anyhow::Context;
use image::imageops::FilterType;

/// Width and height of the sample grid.
pub const SAMPLE_SIZE: u32 = 50;

/// Fetch the raw encoded bytes for a source.
pub async fn load_bytes(http: &reqwest::Client, source: &ImageSource) -> anyhow::Result<Vec<u8>> {
    match source {
        ImageSource::Url(url) => {
            let response = http
                .get(url)
                .send()
                .await
                .with_context(|| format!("fetch {url}"))?;
            if !response.status().is_success() {
                anyhow::bail!("artwork fetch error: {}", response.status());
            }
            let bytes = response.bytes().await.context("read artwork body")?;
            Ok(bytes.to_vec())
        }
        ImageSource::Path(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("read {}", path.display())),
        ImageSource::Bytes(bytes) => Ok(bytes.clone()),
    }
}

/// Decode and resample to a `SAMPLE_SIZE` square, ignoring aspect ratio.
pub fn sample_grid(bytes: &[u8]) -> anyhow::Result<Vec<[u8; 4]>> {
    let img = image::load_from_memory(bytes).context("decode artwork")?;
    let small = img
        .resize_exact(SAMPLE_SIZE, SAMPLE_SIZE, FilterType::Triangle)
        .to_rgba8();
    Ok(small.pixels().map(|p| p.0).collect())
}
