//! Content digests for cache keys
//!
//! Keys only need to be stable for the lifetime of a process, so the
//! standard library hasher is sufficient. The digest also folds in the
//! total content length, which makes accidental collisions between
//! differently sized inputs impossible.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Incremental digest over a sequence of byte parts
#[derive(Default)]
pub struct ContentDigest {
    hasher: DefaultHasher,
    length: usize,
}

impl ContentDigest {
    /// Start an empty digest
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one part. Part boundaries are significant: `["ab", "c"]` and
    /// `["a", "bc"]` produce different digests.
    pub fn update(&mut self, part: impl AsRef<[u8]>) -> &mut Self {
        let part = part.as_ref();
        part.len().hash(&mut self.hasher);
        part.hash(&mut self.hasher);
        self.length += part.len();
        self
    }

    /// Render the digest as `<hash>-<length>` in lowercase hex
    pub fn finish(&self) -> String {
        format!("{:016x}-{:x}", self.hasher.finish(), self.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_content_same_digest() {
        let a = ContentDigest::new().update("void main() {}").update("#define A 1").finish();
        let b = ContentDigest::new().update("void main() {}").update("#define A 1").finish();
        assert_eq!(a, b);
    }

    #[test]
    fn test_part_boundaries_matter() {
        let a = ContentDigest::new().update("ab").update("c").finish();
        let b = ContentDigest::new().update("a").update("bc").finish();
        assert_ne!(a, b);
    }
}
