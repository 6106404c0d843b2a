/// `data:` URL encoding for images held in memory
///
/// Every image the studio passes around (upload, crop, model output) is kept
/// as a MIME type plus a standard base64 payload.

use base64::{engine::general_purpose::STANDARD, Engine};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StudioError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// e.g. "image/jpeg"
    pub mime_type: String,
    /// Base64 payload (no prefix)
    pub data: String,
}

impl DataUrl {
    /// Wrap an already base64-encoded payload
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Encode raw bytes
    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, STANDARD.encode(bytes))
    }

    /// Parse `data:<mime>;base64,<payload>`
    ///
    /// The MIME part runs up to the last `;base64,` marker; both parts must be non-empty.
    pub fn parse(url: &str) -> Result<Self> {
        let rest = url.strip_prefix("data:").ok_or(StudioError::InvalidDataUrl)?;
        let (mime_type, data) = rest
            .rsplit_once(";base64,")
            .ok_or(StudioError::InvalidDataUrl)?;

        if mime_type.is_empty() || data.is_empty() {
            return Err(StudioError::InvalidDataUrl);
        }

        Ok(Self::new(mime_type, data))
    }

    /// Decode the payload back into bytes
    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(self.data.trim())
            .map_err(|_| StudioError::InvalidDataUrl)
    }

    /// Size of the decoded payload, without decoding it
    pub fn approx_len(&self) -> usize {
        self.data.len() / 4 * 3
    }
}

impl fmt::Display for DataUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.data)
    }
}

impl FromStr for DataUrl {
    type Err = StudioError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_splits_mime_and_payload() {
        let url = DataUrl::parse("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(url.mime_type, "image/png");
        assert_eq!(url.data, "iVBORw0KGgo=");
    }

    #[test]
    fn test_display_matches_parse_input() {
        let text = "data:image/jpeg;base64,/9j/4AAQ";
        assert_eq!(DataUrl::parse(text).unwrap().to_string(), text);
    }

    #[test]
    fn test_mime_with_parameters() {
        let url: DataUrl = "data:image/svg+xml;charset=utf-8;base64,PHN2Zz4=".parse().unwrap();
        assert_eq!(url.mime_type, "image/svg+xml;charset=utf-8");
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in [
            "",
            "image/png;base64,AAAA",
            "data:image/png,AAAA",
            "data:;base64,AAAA",
            "data:image/png;base64,",
        ] {
            assert_eq!(DataUrl::parse(bad), Err(StudioError::InvalidDataUrl), "{bad}");
        }
    }

    #[test]
    fn test_bytes_survive_encoding() {
        let bytes = [0xFF, 0xD8, 0xFF, 0x00, 0x10];
        let url = DataUrl::from_bytes("image/jpeg", &bytes);
        assert_eq!(url.decode().unwrap(), bytes);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let url = DataUrl::new("image/png", "not base64!!");
        assert_eq!(url.decode(), Err(StudioError::InvalidDataUrl));
    }
}
