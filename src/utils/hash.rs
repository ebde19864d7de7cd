//! Content hashing for cache-busting filenames.
//!
//! Uses blake3 for fast, deterministic content digests. The fingerprint is
//! the digest truncated to 12 hex chars, enough to make collisions between
//! sibling assets a non-concern while keeping filenames readable.
//!
//! # Usage
//!
//! ```ignore
//! use crate::utils::hash;
//!
//! let fp = hash::fingerprint(b"body { color: red }"); // -> "1b2c3d4e5f60"
//! ```

/// Number of hex chars embedded into hashed filenames.
pub const FINGERPRINT_LEN: usize = 12;

/// Compute the full blake3 digest of a byte slice as lowercase hex.
#[inline]
pub fn digest<T: AsRef<[u8]> + ?Sized>(data: &T) -> String {
    hex::encode(blake3::hash(data.as_ref()).as_bytes())
}

/// Compute a short content fingerprint for filenames
/// (e.g. `style.1b2c3d4e5f60.css`).
#[inline]
pub fn fingerprint<T: AsRef<[u8]> + ?Sized>(data: &T) -> String {
    let mut hex = digest(data);
    hex.truncate(FINGERPRINT_LEN);
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_deterministic() {
        let a = fingerprint(b"body { color: red }");
        let b = fingerprint(b"body { color: red }");
        assert_eq!(a, b);
        assert_eq!(a.len(), FINGERPRINT_LEN);
    }

    #[test]
    fn test_fingerprint_changes_with_content() {
        // A single changed byte must change the token
        let a = fingerprint(b"body { color: red }");
        let b = fingerprint(b"body { color: rad }");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_independent_of_name() {
        // Only content matters, never the path the bytes came from
        assert_eq!(fingerprint(b"same"), fingerprint(b"same"));
    }
}
