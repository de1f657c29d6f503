use std::io::Cursor;
use std::path::PathBuf;

use bytes::Bytes;
use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use tracing::debug;

use crate::error::{Error, Result};

const JPEG_QUALITY: u8 = 80;

/// Stores uploaded files under `<root>/<category>/<timestamp>_<random>_<name>`
/// and re-encodes images to JPEG at a fixed quality.
#[derive(Clone)]
pub struct UploadService {
    root: PathBuf,
}

#[derive(Debug)]
pub struct StoredFile {
    /// Path relative to the uploads root, e.g. `resumes/17193..._x4k2jq_cv.pdf`.
    pub relative_path: String,
    /// Public URL served by the uploads static route.
    pub url: String,
}

impl UploadService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn store(
        &self,
        category: &str,
        original_name: &str,
        bytes: Bytes,
    ) -> Result<StoredFile> {
        if bytes.is_empty() {
            return Err(Error::BadRequest("uploaded file is empty".to_string()));
        }

        let (payload, name) = match recompress_image(&bytes, original_name) {
            Some(jpeg) => {
                debug!(original = original_name, "recompressed upload to jpeg");
                (Bytes::from(jpeg), replace_extension(original_name, "jpg"))
            }
            None => (bytes, original_name.to_string()),
        };

        let suffix: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();
        let file_name = format!(
            "{}_{}_{}",
            Utc::now().timestamp_millis(),
            suffix.to_lowercase(),
            sanitize_name(&name)
        );

        let dir = self.root.join(sanitize_name(category));
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), &payload).await?;

        let relative_path = format!("{}/{}", sanitize_name(category), file_name);
        let url = format!("/uploads/{}", relative_path);
        Ok(StoredFile { relative_path, url })
    }

    pub fn absolute_path(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path)
    }
}

fn sanitize_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

fn replace_extension(name: &str, ext: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) => format!("{}.{}", stem, ext),
        None => format!("{}.{}", name, ext),
    }
}

fn is_image_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ["jpg", "jpeg", "png", "webp", "gif", "bmp"]
        .iter()
        .any(|ext| lower.ends_with(&format!(".{}", ext)))
}

fn recompress_image(bytes: &[u8], name: &str) -> Option<Vec<u8>> {
    if !is_image_name(name) {
        return None;
    }
    let img = image::load_from_memory(bytes).ok()?;
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut out), JPEG_QUALITY);
    img.to_rgb8().write_with_encoder(encoder).ok()?;
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_hostile_names() {
        assert_eq!(sanitize_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_name("my resume (final).pdf"), "my_resume__final_.pdf");
        assert_eq!(sanitize_name(""), "file");
    }

    #[test]
    fn swaps_extension_for_recompressed_images() {
        assert_eq!(replace_extension("photo.png", "jpg"), "photo.jpg");
        assert_eq!(replace_extension("photo", "jpg"), "photo.jpg");
    }

    #[tokio::test]
    async fn stores_under_category_with_unique_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let service = UploadService::new(dir.path());
        let stored = service
            .store("resumes", "cv.pdf", Bytes::from_static(b"%PDF-1.4 test"))
            .await
            .unwrap();
        assert!(stored.relative_path.starts_with("resumes/"));
        assert!(stored.relative_path.ends_with("_cv.pdf"));
        assert!(stored.url.starts_with("/uploads/resumes/"));
        assert!(service.absolute_path(&stored.relative_path).exists());
    }

    #[tokio::test]
    async fn rejects_empty_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let service = UploadService::new(dir.path());
        assert!(service
            .store("resumes", "cv.pdf", Bytes::new())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn images_are_reencoded_as_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let service = UploadService::new(dir.path());

        let mut png = Vec::new();
        let img = image::DynamicImage::new_rgb8(4, 4);
        img.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let stored = service
            .store("sliders", "banner.png", Bytes::from(png))
            .await
            .unwrap();
        assert!(stored.relative_path.ends_with("_banner.jpg"));
        let written = std::fs::read(service.absolute_path(&stored.relative_path)).unwrap();
        assert_eq!(image::guess_format(&written).unwrap(), image::ImageFormat::Jpeg);
    }
}
