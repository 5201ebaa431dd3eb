//! Concurrent product-image fetching and processing.
//!
//! Images are numerous and independent, so this is the one deliberately
//! concurrent piece of the harvester: a bounded worker pool fetches URLs in
//! parallel and only the aggregate counts matter. Transport errors are
//! retried; a payload that fails to decode is not, since retrying cannot
//! fix a corrupt body.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use serde::Deserialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::constants::DEFAULT_USER_AGENT;
use crate::error::{Result, ScraperError};

pub const DEFAULT_MAX_SIZE: (u32, u32) = (600, 600);
const JPEG_QUALITY: u8 = 85;

/// One download work item: where to fetch from and where to write.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageTask {
    pub url: String,
    pub dest: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadStats {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
}

#[derive(Debug, Clone)]
pub struct ImageDownloader {
    http: reqwest::Client,
    max_workers: usize,
    max_retries: u32,
}

impl Default for ImageDownloader {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(30), 2)
    }
}

impl ImageDownloader {
    pub fn new(max_workers: usize, timeout: Duration, max_retries: u32) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            max_workers: max_workers.max(1),
            max_retries: max_retries.max(1),
        }
    }

    /// Fetch one image, flatten any alpha onto white, bound it to
    /// `max_size` preserving aspect ratio, and write a JPEG to `dest`.
    pub async fn download_image(&self, url: &str, dest: &Path, max_size: (u32, u32)) -> bool {
        for attempt in 0..self.max_retries {
            debug!("downloading image from {url} (attempt {})", attempt + 1);

            let response = match self
                .http
                .get(url)
                .send()
                .await
                .and_then(|response| response.error_for_status())
            {
                Ok(response) => response,
                Err(e) => {
                    warn!("HTTP error downloading {url}: {e}");
                    continue;
                }
            };

            let content_type = response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("")
                .to_string();
            if !content_type.starts_with("image/") {
                warn!("invalid content type '{content_type}' for {url}");
                return false;
            }

            let bytes = match response.bytes().await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("failed reading body for {url}: {e}");
                    continue;
                }
            };

            // Decode and processing failures are terminal.
            return match self.process_and_save(&bytes, dest, max_size) {
                Ok(()) => {
                    info!("saved image to {}", dest.display());
                    true
                }
                Err(e) => {
                    error!("error processing image {url}: {e}");
                    false
                }
            };
        }
        error!("failed to download {url} after {} attempts", self.max_retries);
        false
    }

    fn process_and_save(&self, bytes: &[u8], dest: &Path, max_size: (u32, u32)) -> Result<()> {
        let decoded = image::load_from_memory(bytes).map_err(|e| ScraperError::Image {
            message: e.to_string(),
        })?;
        let mut img = DynamicImage::ImageRgb8(flatten_to_rgb(&decoded));

        let (max_width, max_height) = max_size;
        if img.width() > max_width || img.height() > max_height {
            img = img.resize(max_width, max_height, FilterType::Lanczos3);
            debug!("resized image to {}x{}", img.width(), img.height());
        }

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(dest)?;
        let mut writer = std::io::BufWriter::new(file);
        let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
        img.write_with_encoder(encoder)
            .map_err(|e| ScraperError::Image {
                message: e.to_string(),
            })?;
        Ok(())
    }

    /// Run a worklist through a bounded pool. One task's failure never
    /// cancels the others; only aggregate counts come back.
    pub async fn download_images(&self, tasks: Vec<ImageTask>) -> DownloadStats {
        let mut stats = DownloadStats {
            total: tasks.len() as u64,
            ..Default::default()
        };
        info!(
            "starting download of {} images with {} workers",
            stats.total, self.max_workers
        );

        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut pool = JoinSet::new();
        for task in tasks {
            let downloader = self.clone();
            let semaphore = Arc::clone(&semaphore);
            pool.spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                downloader
                    .download_image(&task.url, &task.dest, DEFAULT_MAX_SIZE)
                    .await
            });
        }

        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(true) => stats.successful += 1,
                Ok(false) => stats.failed += 1,
                Err(e) => {
                    error!("image task failed to run: {e}");
                    stats.failed += 1;
                }
            }
        }

        info!(
            "image download complete: {} successful, {} failed out of {}",
            stats.successful, stats.failed, stats.total
        );
        stats
    }

    /// Lightweight existence probe: HEAD the URL and look at the declared
    /// content type without downloading the body.
    pub async fn validate_image_url(&self, url: &str) -> bool {
        if url.is_empty() {
            return false;
        }
        match self.http.head(url).send().await {
            Ok(response) => response
                .headers()
                .get(reqwest::header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map_or(false, |ct| ct.starts_with("image/")),
            Err(e) => {
                debug!("could not validate image URL {url}: {e}");
                false
            }
        }
    }
}

/// Composite any alpha channel over white; JPEG has no transparency.
fn flatten_to_rgb(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    let mut flattened = RgbImage::from_pixel(rgba.width(), rgba.height(), Rgb([255, 255, 255]));
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = f32::from(pixel[3]) / 255.0;
        let blend =
            |channel: u8| (f32::from(channel) * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        flattened.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }
    flattened
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, pixel: Rgba<u8>) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, pixel);
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn oversized_images_shrink_to_fit() {
        let downloader = ImageDownloader::default();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested/beer.jpg");

        let bytes = png_bytes(1200, 400, Rgba([10, 20, 30, 255]));
        downloader
            .process_and_save(&bytes, &dest, (600, 600))
            .unwrap();

        let saved = image::open(&dest).unwrap();
        assert!(saved.width() <= 600 && saved.height() <= 600);
        // Aspect ratio survives the shrink.
        assert_eq!(saved.width(), 600);
        assert_eq!(saved.height(), 200);
    }

    #[test]
    fn small_images_keep_their_size() {
        let downloader = ImageDownloader::default();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("beer.jpg");

        let bytes = png_bytes(300, 200, Rgba([10, 20, 30, 255]));
        downloader
            .process_and_save(&bytes, &dest, (600, 600))
            .unwrap();

        let saved = image::open(&dest).unwrap();
        assert_eq!((saved.width(), saved.height()), (300, 200));
    }

    #[test]
    fn transparent_pixels_flatten_to_white() {
        let fully_transparent = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            4,
            4,
            Rgba([200, 0, 0, 0]),
        ));
        let flattened = flatten_to_rgb(&fully_transparent);
        assert_eq!(flattened.get_pixel(0, 0), &Rgb([255, 255, 255]));

        let half = DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 128])));
        let blended = flatten_to_rgb(&half);
        let Rgb([r, g, b]) = *blended.get_pixel(0, 0);
        assert!(r > 120 && r < 135, "got {r}");
        assert_eq!((r, g), (b, b));
    }

    #[test]
    fn garbage_bytes_are_a_terminal_error() {
        let downloader = ImageDownloader::default();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("beer.jpg");
        let result = downloader.process_and_save(b"not an image", &dest, (600, 600));
        assert!(matches!(result, Err(ScraperError::Image { .. })));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn empty_worklist_completes_cleanly() {
        let downloader = ImageDownloader::default();
        let stats = downloader.download_images(Vec::new()).await;
        assert_eq!(stats, DownloadStats::default());
    }
}
