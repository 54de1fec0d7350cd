//! Visual regression of checkpoint screenshots against baselines

use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, Pixel, RgbaImage};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{E2eError, E2eResult};

/// Per-channel difference tolerated before a pixel counts as changed
/// (anti-aliasing, compression).
const CHANNEL_TOLERANCE: i32 = 5;

/// Result of comparing one checkpoint with its baseline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualDiff {
    /// Whether the images match (within threshold)
    pub matches: bool,

    /// Percentage of pixels that differ
    pub diff_percent: f64,

    pub diff_pixels: u64,
    pub total_pixels: u64,

    /// Red-marked diff image, written only when pixels differ
    pub diff_image_path: Option<PathBuf>,

    pub actual_hash: String,
    pub baseline_hash: String,
}

/// Configuration for visual testing
#[derive(Debug, Clone)]
pub struct VisualConfig {
    pub baseline_dir: PathBuf,
    pub diff_dir: PathBuf,
    /// Allowed share of differing pixels, 0.0 - 100.0
    pub threshold: f64,
    /// Promote the actual screenshot when a baseline is missing
    pub auto_update: bool,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            baseline_dir: PathBuf::from("test-results/baselines"),
            diff_dir: PathBuf::from("test-results/diffs"),
            threshold: 0.5,
            auto_update: false,
        }
    }
}

/// Compares checkpoint screenshots with stored baselines.
///
/// Baselines are keyed by `<scenario>/<checkpoint>` so scenarios with the
/// same step names never share an image.
pub struct VisualTester {
    config: VisualConfig,
}

impl VisualTester {
    pub fn new(config: VisualConfig) -> E2eResult<Self> {
        std::fs::create_dir_all(&config.baseline_dir)?;
        std::fs::create_dir_all(&config.diff_dir)?;
        Ok(Self { config })
    }

    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    /// Whether this run refreshes baselines instead of judging against them.
    pub fn auto_update(&self) -> bool {
        self.config.auto_update
    }

    fn baseline_path(&self, key: &str) -> PathBuf {
        self.config.baseline_dir.join(format!("{key}.png"))
    }

    /// Compare PNG bytes of checkpoint `key` with its baseline.
    pub fn compare(&self, key: &str, actual_png: &[u8]) -> E2eResult<VisualDiff> {
        let baseline_path = self.baseline_path(key);
        let actual_hash = hash_bytes(actual_png);

        if !baseline_path.exists() {
            if !self.config.auto_update {
                return Err(E2eError::BaselineNotFound(baseline_path.display().to_string()));
            }
            info!("Creating baseline for '{}' (auto-update enabled)", key);
            write_file(&baseline_path, actual_png)?;
            return Ok(VisualDiff {
                matches: true,
                diff_percent: 0.0,
                diff_pixels: 0,
                total_pixels: 0,
                diff_image_path: None,
                baseline_hash: actual_hash.clone(),
                actual_hash,
            });
        }

        let baseline_png = std::fs::read(&baseline_path)?;
        let baseline_hash = hash_bytes(&baseline_png);
        let actual_img = image::load_from_memory(actual_png)?;

        if actual_hash == baseline_hash {
            debug!("Checkpoint '{}' matches baseline exactly", key);
            return Ok(VisualDiff {
                matches: true,
                diff_percent: 0.0,
                diff_pixels: 0,
                total_pixels: u64::from(actual_img.width()) * u64::from(actual_img.height()),
                diff_image_path: None,
                actual_hash,
                baseline_hash,
            });
        }

        let baseline_img = image::load_from_memory(&baseline_png)?;
        if actual_img.dimensions() != baseline_img.dimensions() {
            warn!(
                "Checkpoint '{}' dimensions differ: actual {:?} vs baseline {:?}",
                key,
                actual_img.dimensions(),
                baseline_img.dimensions()
            );
        }

        let (diff_img, diff_pixels, total_pixels) = pixel_diff(&actual_img, &baseline_img);
        let diff_percent = if total_pixels == 0 {
            0.0
        } else {
            (diff_pixels as f64 / total_pixels as f64) * 100.0
        };
        let matches = diff_percent <= self.config.threshold;

        let diff_image_path = if diff_pixels > 0 {
            let path = self.config.diff_dir.join(format!("{key}-diff.png"));
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            diff_img.save(&path)?;
            Some(path)
        } else {
            None
        };

        if !matches {
            warn!(
                "Visual regression in '{}': {:.2}% pixels differ (threshold: {:.2}%)",
                key, diff_percent, self.config.threshold
            );
        }

        Ok(VisualDiff {
            matches,
            diff_percent,
            diff_pixels,
            total_pixels,
            diff_image_path,
            actual_hash,
            baseline_hash,
        })
    }

    /// Copy every checkpoint PNG under `screenshots_dir` over its baseline,
    /// keeping the relative `<scenario>/<checkpoint>` layout. Failure
    /// captures (`failed-*`) are never promoted. Returns the number promoted.
    pub fn update_baselines(&self, screenshots_dir: &Path) -> E2eResult<usize> {
        let mut promoted = 0;

        for entry in WalkDir::new(screenshots_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map(|ext| ext == "png").unwrap_or(false))
            .filter(|e| !e.file_name().to_string_lossy().starts_with("failed-"))
        {
            let Ok(relative) = entry.path().strip_prefix(screenshots_dir) else {
                continue;
            };
            let target = self.config.baseline_dir.join(relative);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
            debug!("Updated baseline {}", target.display());
            promoted += 1;
        }

        info!("Updated {} baseline(s)", promoted);
        Ok(promoted)
    }
}

fn pixel_diff(actual: &DynamicImage, baseline: &DynamicImage) -> (RgbaImage, u64, u64) {
    let (width, height) = actual.dimensions();
    let actual_rgba = actual.to_rgba8();
    let baseline_rgba = baseline.to_rgba8();

    let mut diff_img = RgbaImage::new(width, height);
    let mut diff_pixels = 0u64;
    let total_pixels = u64::from(width) * u64::from(height);

    for y in 0..height {
        for x in 0..width {
            let actual_pixel = actual_rgba.get_pixel(x, y);
            let differs = if x < baseline_rgba.width() && y < baseline_rgba.height() {
                pixels_differ(actual_pixel, baseline_rgba.get_pixel(x, y))
            } else {
                true
            };

            if differs {
                diff_pixels += 1;
                diff_img.put_pixel(x, y, image::Rgba([255, 0, 0, 255]));
            } else {
                let c = actual_pixel.channels();
                diff_img.put_pixel(x, y, image::Rgba([c[0] / 2, c[1] / 2, c[2] / 2, 128]));
            }
        }
    }

    (diff_img, diff_pixels, total_pixels)
}

fn pixels_differ(a: &image::Rgba<u8>, b: &image::Rgba<u8>) -> bool {
    a.channels()
        .iter()
        .zip(b.channels())
        .any(|(x, y)| (i32::from(*x) - i32::from(*y)).abs() > CHANNEL_TOLERANCE)
}

fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn write_file(path: &Path, data: &[u8]) -> E2eResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageOutputFormat;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png(width: u32, height: u32, paint: impl Fn(u32, u32) -> [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| image::Rgba(paint(x, y)));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageOutputFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn tester(tmp: &TempDir, auto_update: bool) -> VisualTester {
        VisualTester::new(VisualConfig {
            baseline_dir: tmp.path().join("baselines"),
            diff_dir: tmp.path().join("diffs"),
            threshold: 1.0,
            auto_update,
        })
        .unwrap()
    }

    #[test]
    fn test_visual_config_default() {
        let config = VisualConfig::default();
        assert_eq!(config.threshold, 0.5);
        assert!(!config.auto_update);
    }

    #[test]
    fn test_missing_baseline() {
        let tmp = TempDir::new().unwrap();
        let white = png(4, 4, |_, _| [255, 255, 255, 255]);

        let strict = tester(&tmp, false);
        assert!(matches!(
            strict.compare("checkout/01-login-page", &white),
            Err(E2eError::BaselineNotFound(_))
        ));

        let updating = tester(&tmp, true);
        let diff = updating.compare("checkout/01-login-page", &white).unwrap();
        assert!(diff.matches);
        assert!(tmp.path().join("baselines/checkout/01-login-page.png").exists());
    }

    #[test]
    fn test_identical_and_small_changes_match() {
        let tmp = TempDir::new().unwrap();
        let vt = tester(&tmp, true);
        let base = png(10, 10, |_, _| [200, 200, 200, 255]);
        vt.compare("a", &base).unwrap();

        assert_eq!(vt.compare("a", &base).unwrap().diff_pixels, 0);

        // Within channel tolerance everywhere.
        let shifted = png(10, 10, |_, _| [203, 198, 200, 255]);
        let diff = vt.compare("a", &shifted).unwrap();
        assert!(diff.matches);
        assert_eq!(diff.diff_pixels, 0);
    }

    #[test]
    fn test_regression_over_threshold() {
        let tmp = TempDir::new().unwrap();
        let vt = tester(&tmp, true);
        vt.compare("a", &png(10, 10, |_, _| [0, 0, 0, 255])).unwrap();

        // Top row turns white: 10 of 100 pixels.
        let changed = png(10, 10, |_, y| if y == 0 { [255, 255, 255, 255] } else { [0, 0, 0, 255] });
        let diff = vt.compare("a", &changed).unwrap();
        assert!(!diff.matches);
        assert_eq!(diff.diff_pixels, 10);
        assert!((diff.diff_percent - 10.0).abs() < 1e-9);
        assert!(diff.diff_image_path.unwrap().exists());
    }

    #[test]
    fn test_update_baselines_keeps_layout() {
        let tmp = TempDir::new().unwrap();
        let shots = tmp.path().join("screenshots");
        std::fs::create_dir_all(shots.join("find-order")).unwrap();
        std::fs::write(shots.join("find-order/01-login-page.png"), png(2, 2, |_, _| [1, 2, 3, 255])).unwrap();
        std::fs::write(shots.join("find-order/notes.txt"), "skip").unwrap();
        std::fs::write(shots.join("find-order/failed-sign-out.png"), png(2, 2, |_, _| [9, 9, 9, 255])).unwrap();

        let vt = tester(&tmp, false);
        assert_eq!(vt.update_baselines(&shots).unwrap(), 1);
        assert!(tmp.path().join("baselines/find-order/01-login-page.png").exists());
        assert!(!tmp.path().join("baselines/find-order/failed-sign-out.png").exists());
    }
}
