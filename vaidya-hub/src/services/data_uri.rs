//! Embeddable `data:<mime>;base64,<data>` strings

use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Largest accepted photo upload
pub const MAX_PHOTO_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DataUriError {
    #[error("Photo is empty")]
    Empty,

    #[error("Photo exceeds {} MiB", MAX_PHOTO_BYTES / (1024 * 1024))]
    TooLarge,

    #[error("Unsupported file type: {0}")]
    NotAnImage(String),

    #[error("Malformed data URI")]
    Malformed,

    #[error("Invalid base64 payload")]
    InvalidBase64,
}

/// Encode image bytes, sniffing the MIME type from the content
pub fn encode_image(bytes: &[u8]) -> Result<String, DataUriError> {
    if bytes.is_empty() {
        return Err(DataUriError::Empty);
    }
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(DataUriError::TooLarge);
    }

    let mime = match infer::get(bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => kind.mime_type(),
        Some(kind) => return Err(DataUriError::NotAnImage(kind.mime_type().to_string())),
        None => return Err(DataUriError::NotAnImage("unknown".to_string())),
    };

    Ok(encode(mime, bytes))
}

pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Split into MIME type and base64 payload without decoding
pub fn split(uri: &str) -> Result<(&str, &str), DataUriError> {
    let rest = uri.strip_prefix("data:").ok_or(DataUriError::Malformed)?;
    let (meta, payload) = rest.split_once(',').ok_or(DataUriError::Malformed)?;
    let mime = meta.strip_suffix(";base64").ok_or(DataUriError::Malformed)?;
    if mime.is_empty() {
        return Err(DataUriError::Malformed);
    }
    Ok((mime, payload))
}

/// Validate a client-encoded photo data URI
///
/// The declared MIME type must be `image/*` and the decoded payload must
/// sniff as an image within the size limit; returns the normalized URI.
pub fn validate_image(uri: &str) -> Result<String, DataUriError> {
    let (declared, payload) = split(uri.trim())?;
    // base64 expands by 4/3
    if payload.len() > MAX_PHOTO_BYTES / 3 * 4 + 4 {
        return Err(DataUriError::TooLarge);
    }
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|_| DataUriError::InvalidBase64)?;
    if !declared.starts_with("image/") {
        return Err(DataUriError::NotAnImage(declared.to_string()));
    }
    encode_image(&bytes)
}
