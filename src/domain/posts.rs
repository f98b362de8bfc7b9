//! Post upload rules.

use super::error::DomainError;

/// Image formats accepted for new posts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Jpeg,
    Png,
    Gif,
}

impl ImageMime {
    /// Normalize an upload content type; anything mentioning jpeg, png or gif is accepted.
    pub fn from_content_type(content_type: &str) -> Result<Self, DomainError> {
        let lowered = content_type.to_ascii_lowercase();
        if lowered.contains("jpeg") {
            Ok(Self::Jpeg)
        } else if lowered.contains("png") {
            Ok(Self::Png)
        } else if lowered.contains("gif") {
            Ok(Self::Gif)
        } else {
            Err(DomainError::validation(
                "only jpg, png and gif images can be posted",
            ))
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
        }
    }
}
