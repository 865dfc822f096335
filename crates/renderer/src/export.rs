use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use image::{DynamicImage, ImageFormat, RgbaImage};

pub const FILENAME_PREFIX: &str = "bubble-shift";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("unsupported export format '{0}'; expected png or jpg")]
    UnsupportedFormat(String),
    #[error("failed to capture frame to {path}: {message}")]
    Capture { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Png,
    Jpg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpg => "jpg",
        }
    }

    fn image_format(&self) -> ImageFormat {
        match self {
            ExportFormat::Png => ImageFormat::Png,
            ExportFormat::Jpg => ImageFormat::Jpeg,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpg),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Source of wall-clock time for export filenames.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// `bubble-shift-YYYY-MM-DDTHH-MM-SS.<ext>` in UTC.
pub fn export_filename(format: ExportFormat, at: DateTime<Utc>) -> String {
    let stamp: String = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
        .chars()
        .take(19)
        .collect();
    format!("{FILENAME_PREFIX}-{stamp}.{}", format.extension())
}

/// Writes straight RGBA pixels; JPEG drops the alpha channel first.
pub fn save_rgba(image: RgbaImage, path: &Path, format: ExportFormat) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create export directory {}", dir.display()))?;
    }
    let dynamic = DynamicImage::ImageRgba8(image);
    let encoded = match format {
        ExportFormat::Png => dynamic,
        ExportFormat::Jpg => DynamicImage::ImageRgb8(dynamic.to_rgb8()),
    };
    encoded
        .save_with_format(path, format.image_format())
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parses_formats() {
        assert_eq!("png".parse::<ExportFormat>().unwrap(), ExportFormat::Png);
        assert_eq!("JPG".parse::<ExportFormat>().unwrap(), ExportFormat::Jpg);
        assert_eq!("jpeg".parse::<ExportFormat>().unwrap(), ExportFormat::Jpg);
        assert!(matches!(
            "gif".parse::<ExportFormat>(),
            Err(ExportError::UnsupportedFormat(raw)) if raw == "gif"
        ));
    }

    #[test]
    fn filename_uses_truncated_utc_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            export_filename(ExportFormat::Png, at),
            "bubble-shift-2024-03-09T14-05-07.png"
        );
        assert_eq!(
            export_filename(ExportFormat::Jpg, FixedClock(at).now()),
            "bubble-shift-2024-03-09T14-05-07.jpg"
        );
    }

    #[test]
    fn saves_png_and_jpg() {
        let dir = tempfile::tempdir().unwrap();
        let image = RgbaImage::from_pixel(4, 2, image::Rgba([0, 100, 255, 255]));

        let png = dir.path().join("frame.png");
        save_rgba(image.clone(), &png, ExportFormat::Png).unwrap();
        let decoded = image::open(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (4, 2));
        assert_eq!(decoded.get_pixel(0, 0), &image::Rgba([0, 100, 255, 255]));

        let jpg = dir.path().join("frame.jpg");
        save_rgba(image, &jpg, ExportFormat::Jpg).unwrap();
        assert_eq!(image::open(&jpg).unwrap().to_rgb8().dimensions(), (4, 2));
    }
}
