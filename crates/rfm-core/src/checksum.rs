//! SHA-256 content digest identifying a migration and linking the chain.

use sha2::{Digest, Sha256};

/// Compute the lowercase hex SHA-256 digest of migration content
pub fn compute_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
#[path = "checksum_test.rs"]
mod tests;
