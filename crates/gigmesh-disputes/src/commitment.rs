//! Vote commitment hashing

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 commitment over a vote byte followed by the salt
///
/// The vote byte is `0x01` for favor-worker and `0x00` for favor-poster.
/// Jurors compute this client-side during the commit phase; the coordinator
/// recomputes it at reveal time.
pub fn vote_commitment(vote: bool, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update([vote as u8]);
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commitment_is_deterministic() {
        assert_eq!(
            vote_commitment(true, "salt-1"),
            vote_commitment(true, "salt-1")
        );
    }

    #[test]
    fn vote_and_salt_both_bind() {
        let base = vote_commitment(true, "salt-1");
        assert_ne!(base, vote_commitment(false, "salt-1"));
        assert_ne!(base, vote_commitment(true, "salt-2"));
    }

    #[test]
    fn commitment_is_hex_sha256() {
        let c = vote_commitment(false, "abc");
        assert_eq!(c.len(), 64);
        assert!(c.chars().all(|ch| ch.is_ascii_hexdigit()));
    }
}
