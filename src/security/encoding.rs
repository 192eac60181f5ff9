use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;

/// URL-safe alphabet: unpadded on output, padding optional on input.
const URL_SAFE_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes bytes as URL-safe base64 without `=` padding.
pub fn encode_url_safe(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_ENGINE.encode(bytes)
}

/// Decodes URL-safe base64, with or without trailing padding.
pub fn decode_url_safe(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_ENGINE.decode(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_uses_url_safe_alphabet_without_padding() {
        // 0xfb 0xff encodes to "+/8=" in the standard alphabet
        let encoded = encode_url_safe([0xfb, 0xff]);
        assert_eq!(encoded, "-_8");
    }

    #[test]
    fn test_decode_accepts_optional_padding() {
        assert_eq!(decode_url_safe("-_8").unwrap(), vec![0xfb, 0xff]);
        assert_eq!(decode_url_safe("-_8=").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn test_decode_rejects_standard_alphabet() {
        assert!(decode_url_safe("+/8").is_err());
        assert!(decode_url_safe("not base64!").is_err());
    }

    #[test]
    fn test_encoded_output_needs_no_url_escaping() {
        let encoded = encode_url_safe((0u8..=255).collect::<Vec<_>>());
        assert!(encoded
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
