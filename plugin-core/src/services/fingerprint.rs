use sha2::{Digest, Sha256};

const DIGEST_HEX_CHARS: usize = 12;

/// Short, stable identifier for a page so logs can correlate requests
/// without carrying the markup itself.
pub fn page_digest(html: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(html.as_bytes());
    let mut hex = hex::encode(hasher.finalize());
    hex.truncate(DIGEST_HEX_CHARS);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_short_and_stable() {
        let a = page_digest("<html>a</html>");
        assert_eq!(a.len(), 12);
        assert_eq!(a, page_digest("<html>a</html>"));
        assert_ne!(a, page_digest("<html>b</html>"));
    }

    #[test]
    fn digest_of_empty_input_is_sha256_prefix() {
        assert_eq!(page_digest(""), "e3b0c44298fc");
    }
}
