use std::path::Path;

use crate::error::InputError;

/// Media type used for frames extracted from video
pub const STILL_FRAME_MIME: &str = "image/jpeg";

pub const IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];
pub const VIDEO_TYPES: &[&str] = &["video/mp4", "video/quicktime", "video/avi", "video/webm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

/// Lowercase, drop parameters, and fold common aliases
pub fn canonical_mime(mime_type: &str) -> String {
    let base = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match base.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg".to_string(),
        "video/x-msvideo" => "video/avi".to_string(),
        "video/mov" => "video/quicktime".to_string(),
        _ => base,
    }
}

/// Decide whether a media type is an accepted image or video
pub fn media_kind(mime_type: &str) -> Result<MediaKind, InputError> {
    let mime = canonical_mime(mime_type);

    if IMAGE_TYPES.contains(&mime.as_str()) {
        Ok(MediaKind::Image)
    } else if VIDEO_TYPES.contains(&mime.as_str()) {
        Ok(MediaKind::Video)
    } else {
        Err(InputError::UnsupportedMedia {
            mime_type: mime_type.to_string(),
        })
    }
}

/// Media type implied by a file extension
pub fn mime_from_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "avi" => "video/avi",
        "webm" => "video/webm",
        _ => return None,
    };
    Some(mime)
}

/// Media type sniffed from the leading bytes of an image
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        image::ImageFormat::Jpeg => Some("image/jpeg"),
        image::ImageFormat::Png => Some("image/png"),
        image::ImageFormat::WebP => Some("image/webp"),
        image::ImageFormat::Gif => Some("image/gif"),
        _ => None,
    }
}

/// Reject empty and oversized uploads
pub fn check_upload_size(len: usize, limit: usize) -> Result<(), InputError> {
    if len == 0 {
        return Err(InputError::Empty);
    }
    if len > limit {
        return Err(InputError::TooLarge { size: len, limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_kind() {
        assert_eq!(media_kind("image/png").unwrap(), MediaKind::Image);
        assert_eq!(media_kind("IMAGE/JPG").unwrap(), MediaKind::Image);
        assert_eq!(media_kind("video/mp4; codecs=avc1").unwrap(), MediaKind::Video);
        assert_eq!(media_kind("video/x-msvideo").unwrap(), MediaKind::Video);
        assert!(matches!(
            media_kind("application/pdf"),
            Err(InputError::UnsupportedMedia { .. })
        ));
    }

    #[test]
    fn test_mime_from_path() {
        assert_eq!(mime_from_path(Path::new("leaf.JPG")), Some("image/jpeg"));
        assert_eq!(mime_from_path(Path::new("clip.mov")), Some("video/quicktime"));
        assert_eq!(mime_from_path(Path::new("notes.txt")), None);
        assert_eq!(mime_from_path(Path::new("no_extension")), None);
    }

    #[test]
    fn test_sniff_image_mime() {
        let png_header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(sniff_image_mime(&png_header), Some("image/png"));
        assert_eq!(sniff_image_mime(b"hello"), None);
    }

    #[test]
    fn test_check_upload_size() {
        assert!(matches!(check_upload_size(0, 10), Err(InputError::Empty)));
        assert!(matches!(
            check_upload_size(11, 10),
            Err(InputError::TooLarge { size: 11, limit: 10 })
        ));
        assert!(check_upload_size(10, 10).is_ok());
    }
}
