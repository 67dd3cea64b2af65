//! Accent palette extraction from album artwork
//!
//! This module provides:
//! - Sampling of artwork into a fixed 50x50 grid
//! - Quantized color buckets scored for vibrance and mid lightness
//! - A fail-soft extractor that resolves to an empty palette on any failure

pub mod bucket;
pub mod hsl;
pub mod sample;

pub use bucket::palette_from_pixels;

use crate::config::PaletteConfig;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

/// A named accent color, `value` is `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccentColor {
    pub name: String,
    pub value: String,
}

impl AccentColor {
    fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Fallback accents applied when extraction yields nothing.
pub fn default_accents() -> Vec<AccentColor> {
    vec![
        AccentColor::new("Retro Orange", "#ff4d00"),
        AccentColor::new("Cyber Green", "#00ff9d"),
        AccentColor::new("Hot Pink", "#ff00cc"),
        AccentColor::new("Electric Blue", "#00d4ff"),
        AccentColor::new("Voltage Yellow", "#ffd500"),
    ]
}

/// Black or white text, whichever reads better on `hex` (YIQ threshold).
pub fn contrast_color(hex: &str) -> &'static str {
    let Some(rgb) = parse_hex(hex) else {
        return "#000000";
    };
    let [r, g, b] = rgb.map(u32::from);
    let yiq = (r * 299 + g * 587 + b * 114) / 1000;
    if yiq >= 128 { "#000000" } else { "#ffffff" }
}

fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.bytes().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Where artwork comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// `http://` and `https://` (any case) are URLs, anything else is a file path.
    pub fn parse(s: &str) -> Self {
        let has_scheme = |scheme: &str| {
            s.get(..scheme.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(scheme))
        };
        if has_scheme("http://") || has_scheme("https://") {
            Self::Url(s.to_string())
        } else {
            Self::Path(PathBuf::from(s))
        }
    }

    fn cache_key(&self) -> Option<String> {
        match self {
            Self::Url(url) => Some(url.clone()),
            Self::Path(path) => Some(path.display().to_string()),
            Self::Bytes(_) => None,
        }
    }
}

/// Palette extractor
pub struct PaletteExtractor {
    http: reqwest::Client,
    timeout: Option<Duration>,
    cache: Option<Mutex<LruCache<String, Vec<AccentColor>>>>,
}

impl PaletteExtractor {
    const USER_AGENT: &'static str = "sleevd/0.1.0";

    pub fn new(cfg: &PaletteConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(Self::USER_AGENT)
            .build()?;
        let timeout = (cfg.timeout_secs > 0).then(|| Duration::from_secs(cfg.timeout_secs));
        let cache = NonZeroUsize::new(cfg.cache_size).map(|n| Mutex::new(LruCache::new(n)));
        Ok(Self {
            http,
            timeout,
            cache,
        })
    }

    /// Up to five distinct accents for the artwork, best first.
    ///
    /// Never fails: load, decode and timeout errors are logged and produce
    /// an empty palette, which callers treat as "keep the current accent".
    pub async fn extract(&self, source: &ImageSource) -> Vec<AccentColor> {
        let key = source.cache_key();
        if let Some(hit) = key.as_deref().and_then(|k| self.cached(k)) {
            tracing::debug!(source = ?key, "palette cache hit");
            return hit;
        }

        let palette = match self.try_extract(source).await {
            Ok(palette) => palette,
            Err(e) => {
                tracing::warn!("could not extract palette: {e:#}");
                Vec::new()
            }
        };

        if let Some(k) = key
            && !palette.is_empty()
        {
            self.remember(k, palette.clone());
        }
        palette
    }

    async fn try_extract(&self, source: &ImageSource) -> anyhow::Result<Vec<AccentColor>> {
        let load = sample::load_bytes(&self.http, source);
        let bytes = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, load)
                .await
                .map_err(|_| anyhow::anyhow!("artwork load timed out after {limit:?}"))??,
            None => load.await?,
        };

        let pixels = tokio::task::spawn_blocking(move || sample::sample_grid(&bytes)).await??;
        Ok(palette_from_pixels(&pixels))
    }

    fn cached(&self, key: &str) -> Option<Vec<AccentColor>> {
        let mut cache = self.cache.as_ref()?.lock().ok()?;
        cache.get(key).cloned()
    }

    fn remember(&self, key: String, palette: Vec<AccentColor>) {
        if let Some(cache) = &self.cache
            && let Ok(mut cache) = cache.lock()
        {
            cache.put(key, palette);
        }
    }
}
