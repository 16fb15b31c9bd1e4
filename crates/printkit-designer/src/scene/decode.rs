//! Asynchronous image decoding.

use async_trait::async_trait;
use base64::Engine;
use printkit_core::SceneError;
use std::path::PathBuf;

use super::node::Bitmap;

/// Turns an image source (data URL, path) into pixels
#[async_trait]
pub trait ImageDecoder: Send + Sync {
    async fn decode(&self, src: &str) -> Result<Bitmap, SceneError>;
}

/// Shortened source for logs and errors; data URLs can be megabytes long
pub fn describe_src(src: &str) -> String {
    const MAX: usize = 48;
    if src.len() <= MAX {
        return src.to_string();
    }
    let cut = (0..=MAX).rev().find(|i| src.is_char_boundary(*i)).unwrap_or(0);
    format!("{}...", &src[..cut])
}

fn decode_error(src: &str, reason: impl std::fmt::Display) -> SceneError {
    SceneError::Decode {
        src: describe_src(src),
        reason: reason.to_string(),
    }
}

/// Decodes `data:` URLs (base64) and local files with the `image` crate.
///
/// Relative paths resolve against the optional base directory; remote URLs
/// are not fetched.
#[derive(Debug, Clone, Default)]
pub struct DataUrlDecoder {
    base_dir: Option<PathBuf>,
}

impl DataUrlDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    async fn read_bytes(&self, src: &str) -> Result<Vec<u8>, SceneError> {
        if let Some(rest) = src.strip_prefix("data:") {
            let (meta, payload) = rest
                .split_once(',')
                .ok_or_else(|| decode_error(src, "malformed data URL"))?;
            if !meta.ends_with(";base64") {
                return Err(decode_error(src, "only base64 data URLs are supported"));
            }
            return base64::engine::general_purpose::STANDARD
                .decode(payload.trim())
                .map_err(|e| decode_error(src, e));
        }

        if src.starts_with("http://") || src.starts_with("https://") {
            return Err(decode_error(src, "remote sources are not fetched"));
        }

        let relative = src.trim_start_matches('/');
        let path = match &self.base_dir {
            Some(base) => base.join(relative),
            None => PathBuf::from(src),
        };
        tokio::fs::read(&path)
            .await
            .map_err(|e| decode_error(src, format!("{}: {}", path.display(), e)))
    }
}

#[async_trait]
impl ImageDecoder for DataUrlDecoder {
    async fn decode(&self, src: &str) -> Result<Bitmap, SceneError> {
        let bytes = self.read_bytes(src).await?;
        let decoded = tokio::task::spawn_blocking(move || {
            image::load_from_memory(&bytes).map(|img| img.to_rgba8())
        })
        .await
        .map_err(|e| decode_error(src, e))?
        .map_err(|e| decode_error(src, e))?;

        let (width, height) = decoded.dimensions();
        tracing::debug!("Decoded {} ({}x{})", describe_src(src), width, height);
        Ok(Bitmap::new(width, height, decoded.into_raw()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_data_url(width: u32, height: u32) -> String {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(bytes)
        )
    }

    #[tokio::test]
    async fn test_decode_data_url() {
        let bitmap = DataUrlDecoder::new().decode(&png_data_url(3, 2)).await.unwrap();
        assert_eq!((bitmap.width, bitmap.height), (3, 2));
        assert_eq!(&bitmap.rgba[..4], &[10, 20, 30, 255]);
    }

    #[tokio::test]
    async fn test_decode_file_relative_to_base() {
        let dir = tempfile::tempdir().unwrap();
        image::RgbaImage::from_pixel(5, 5, image::Rgba([0, 0, 0, 255]))
            .save(dir.path().join("mockup.png"))
            .unwrap();

        let decoder = DataUrlDecoder::with_base_dir(dir.path());
        let bitmap = decoder.decode("/mockup.png").await.unwrap();
        assert_eq!(bitmap.width, 5);
    }

    #[tokio::test]
    async fn test_failures() {
        let decoder = DataUrlDecoder::new();
        for src in [
            "data:image/png;base64,!!!",
            "data:text/plain,hello",
            "https://example.com/a.png",
            "/definitely/missing.png",
            "data:image/png;base64,AAAA",
        ] {
            assert!(matches!(
                decoder.decode(src).await,
                Err(SceneError::Decode { .. })
            ));
        }
    }

    #[test]
    fn test_describe_src_truncates() {
        let long = format!("data:image/png;base64,{}", "A".repeat(100));
        let short = describe_src(&long);
        assert!(short.len() < 60);
        assert!(short.ends_with("..."));
        assert_eq!(describe_src("a.png"), "a.png");
    }
}
