//! Media-type policy: per-kind size limits and content-type allow-lists.

use serde::{Deserialize, Serialize};

pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;
pub const MAX_VIDEO_SIZE: usize = 100 * 1024 * 1024;

/// Media kinds accepted by the upload endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Parse the `type` form field. Anything other than "video" is treated as
    /// an image, matching the upload form's default.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("video") {
            MediaKind::Video
        } else {
            MediaKind::Image
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// Content type to declare for a multipart session where the real type is
    /// not known until the parts arrive.
    pub fn default_content_type(&self) -> &'static str {
        match self {
            MediaKind::Image => "image/jpeg",
            MediaKind::Video => "video/mp4",
        }
    }
}

/// Size limit and content-type allow-list for a single media kind.
#[derive(Debug, Clone)]
pub struct MediaLimits {
    pub max_file_size: usize,
    pub allowed_content_types: &'static [&'static str],
}

const IMAGE_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/heic",
    "image/heif",
];

const VIDEO_CONTENT_TYPES: &[&str] = &[
    "video/mp4",
    "video/quicktime",
    "video/x-msvideo",
    "video/webm",
];

impl MediaLimits {
    pub fn for_kind(kind: MediaKind) -> Self {
        match kind {
            MediaKind::Image => MediaLimits {
                max_file_size: MAX_IMAGE_SIZE,
                allowed_content_types: IMAGE_CONTENT_TYPES,
            },
            MediaKind::Video => MediaLimits {
                max_file_size: MAX_VIDEO_SIZE,
                allowed_content_types: VIDEO_CONTENT_TYPES,
            },
        }
    }

    pub fn allows_content_type(&self, content_type: &str) -> bool {
        self.allowed_content_types
            .iter()
            .any(|ct| ct.eq_ignore_ascii_case(content_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_defaults_to_image() {
        assert_eq!(MediaKind::parse("image"), MediaKind::Image);
        assert_eq!(MediaKind::parse("video"), MediaKind::Video);
        assert_eq!(MediaKind::parse("VIDEO"), MediaKind::Video);
        assert_eq!(MediaKind::parse("gallery"), MediaKind::Image);
    }

    #[test]
    fn image_limits_reject_video_types() {
        let limits = MediaLimits::for_kind(MediaKind::Image);
        assert!(limits.allows_content_type("image/png"));
        assert!(limits.allows_content_type("image/HEIC"));
        assert!(!limits.allows_content_type("video/mp4"));
        assert_eq!(limits.max_file_size, 10 * 1024 * 1024);
    }

    #[test]
    fn video_limits_allow_100_mib() {
        let limits = MediaLimits::for_kind(MediaKind::Video);
        assert!(limits.allows_content_type("video/webm"));
        assert!(!limits.allows_content_type("image/png"));
        assert_eq!(limits.max_file_size, 100 * 1024 * 1024);
    }
}
