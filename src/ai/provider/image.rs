//! Image payload encoding shared by the vision adapters

use base64::Engine;

/// Base64-encoded image ready to send to a provider API
#[derive(Debug, Clone)]
pub struct ImageInput {
    pub data: String,
    pub media_type: &'static str,
}

impl ImageInput {
    /// Encode raw bytes, sniffing the media type from the magic number
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: sniff_media_type(bytes),
        }
    }

    /// Data URL for OpenAI-style APIs
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

fn sniff_media_type(bytes: &[u8]) -> &'static str {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        _ => {
            tracing::debug!("Unrecognized image signature, defaulting to image/jpeg");
            "image/jpeg"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_media_type() {
        assert_eq!(sniff_media_type(&[0x89, b'P', b'N', b'G', 0x0D]), "image/png");
        assert_eq!(sniff_media_type(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(sniff_media_type(b"RIFF\0\0\0\0WEBPVP8"), "image/webp");
        assert_eq!(sniff_media_type(b"hello"), "image/jpeg");
    }

    #[test]
    fn test_data_url() {
        let input = ImageInput::from_bytes(&[0xFF, 0xD8, 0xFF]);
        assert_eq!(input.data_url(), "data:image/jpeg;base64,/9j/");
    }
}
