//! Product image uploads.
//!
//! Uploaded bytes are classified by their leading magic bytes. The
//! client-declared content type is ignored so a renamed script cannot be
//! served back as an image.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest accepted image (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Most images accepted in one upload request.
pub const MAX_IMAGES_PER_UPLOAD: usize = 10;

/// Rejected upload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("image is empty")]
    Empty,
    #[error("image is {size} bytes; the limit is {MAX_IMAGE_BYTES}")]
    TooLarge { size: usize },
    #[error("unsupported image format (use JPEG, PNG, WebP or GIF)")]
    Unsupported,
}

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageKind {
    /// Detect the format from the first bytes of the file.
    #[must_use]
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(Self::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
            _ => None,
        }
    }

    /// MIME type to serve the image with.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }
}

/// Check an uploaded file and return its format.
///
/// # Errors
///
/// Returns `ImageError` if the file is empty, larger than
/// [`MAX_IMAGE_BYTES`], or not a recognized image.
pub fn check_image(bytes: &[u8]) -> Result<ImageKind, ImageError> {
    if bytes.is_empty() {
        return Err(ImageError::Empty);
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge { size: bytes.len() });
    }
    ImageKind::sniff(bytes).ok_or(ImageError::Unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13];

    #[test]
    fn test_sniff_known_formats() {
        assert_eq!(ImageKind::sniff(PNG_HEADER), Some(ImageKind::Png));
        assert_eq!(
            ImageKind::sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0, 16]),
            Some(ImageKind::Jpeg)
        );
        assert_eq!(ImageKind::sniff(b"GIF89a\x01\x00"), Some(ImageKind::Gif));
        assert_eq!(
            ImageKind::sniff(b"RIFF\x24\x00\x00\x00WEBPVP8 "),
            Some(ImageKind::Webp)
        );
        assert_eq!(ImageKind::Webp.content_type(), "image/webp");
    }

    #[test]
    fn test_sniff_rejects_lookalikes() {
        assert_eq!(ImageKind::sniff(b"<svg xmlns="), None);
        assert_eq!(ImageKind::sniff(b"RIFF\x24\x00\x00\x00WAVE"), None);
        assert_eq!(ImageKind::sniff(&[0x89, b'P', b'N']), None);
    }

    #[test]
    fn test_check_image_limits() {
        assert_eq!(check_image(&[]), Err(ImageError::Empty));
        assert_eq!(check_image(b"#!/bin/sh\n"), Err(ImageError::Unsupported));

        let mut big = PNG_HEADER.to_vec();
        big.resize(MAX_IMAGE_BYTES + 1, 0);
        assert_eq!(
            check_image(&big),
            Err(ImageError::TooLarge {
                size: MAX_IMAGE_BYTES + 1
            })
        );

        big.truncate(MAX_IMAGE_BYTES);
        assert_eq!(check_image(&big), Ok(ImageKind::Png));
    }
}
