use url::Url;

use super::DownloadError;
use crate::download::artifact::ValidationError;
use crate::download::stream::StreamError;

pub(super) fn from_stream_error(url: &Url, error: StreamError) -> DownloadError {
    match error {
        StreamError::Read { source, .. } => DownloadError::stream_interrupted(url.as_str(), source),
        StreamError::LimitExceeded { limit, received } => {
            DownloadError::too_large(url.as_str(), received, limit, false)
        }
    }
}

pub(super) fn from_validation_error(url: &Url, error: ValidationError) -> DownloadError {
    match error {
        ValidationError::InvalidType { content_type } => {
            DownloadError::invalid_type(url.as_str(), content_type)
        }
        ValidationError::TooLarge { size, limit } => {
            DownloadError::too_large(url.as_str(), size, limit, false)
        }
    }
}
