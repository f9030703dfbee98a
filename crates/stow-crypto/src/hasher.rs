use stow_types::Cid;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so identical bytes hashed for different purposes never
/// collide.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for stored content.
    pub const CONTENT: Self = Self {
        domain: "stow-content-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }

    /// Hash-derived identifier for `data`.
    pub fn cid(&self, data: &[u8]) -> Cid {
        Cid::from_digest(self.hash(data))
    }

    /// Verify that `data` hashes to the digest embedded in `cid`.
    ///
    /// Returns `None` when `cid` carries no digest and cannot be verified.
    pub fn verify(&self, data: &[u8], cid: &Cid) -> Option<bool> {
        cid.digest().map(|expected| self.hash(data) == expected)
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}
