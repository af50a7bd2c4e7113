use super::{DocumentTextExtractor, ExtractionError};
use crate::outcome::Outcome;

/// Plain text: UTF-8 when valid, otherwise Latin-1.
pub struct TxtExtractor;

/// Latin-1 maps every byte to the code point of the same value, so it
/// cannot fail and no lossy pass is needed after it.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

impl DocumentTextExtractor for TxtExtractor {
    fn name(&self) -> &'static str {
        "txt"
    }

    fn extract(&self, bytes: &[u8]) -> Result<Outcome<String>, ExtractionError> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(Outcome::Full(text.to_string())),
            Err(_) => Ok(Outcome::degraded(decode_latin1(bytes), "decoded as latin-1")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_utf8() {
        let out = TxtExtractor.extract("naïve café".as_bytes()).unwrap();
        assert_eq!(out, Outcome::Full("naïve café".to_string()));
    }

    #[test]
    fn falls_back_to_latin1() {
        let out = TxtExtractor.extract(&[0x63, 0x61, 0x66, 0xe9]).unwrap();
        assert!(out.is_degraded());
        assert_eq!(out.value(), "café");
    }
}
