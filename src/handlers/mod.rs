pub mod food;
pub mod prescription;

pub use food::FoodScanHandler;
pub use prescription::PrescriptionScanHandler;

use once_cell::sync::Lazy;
use regex::Regex;

static DATA_URL_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:image/[a-z]+;base64,").unwrap());

/// Clients may send either raw base64 or a full data URL; the vision API
/// wants only the base64 payload.
pub fn strip_data_url_prefix(image: &str) -> &str {
    match DATA_URL_PREFIX_RE.find(image) {
        Some(prefix) => &image[prefix.end()..],
        None => image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_data_url_prefix() {
        assert_eq!(strip_data_url_prefix("data:image/jpeg;base64,aGVsbG8="), "aGVsbG8=");
        assert_eq!(strip_data_url_prefix("data:image/png;base64,abc"), "abc");
    }

    #[test]
    fn test_raw_base64_passes_through() {
        assert_eq!(strip_data_url_prefix("aGVsbG8="), "aGVsbG8=");
    }
}
