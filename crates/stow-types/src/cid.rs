use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Prefix carried by every hash-derived identifier.
pub const DIGEST_PREFIX: &str = "b3";

/// Prefix carried by every randomly minted identifier.
pub const RANDOM_PREFIX: &str = "cid-";

/// Longest identifier accepted; identifiers double as file names.
pub const MAX_CID_LEN: usize = 255;

const RANDOM_SUFFIX_LEN: usize = 7;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Characters that are forbidden anywhere in an identifier.
const FORBIDDEN_CHARS: &[char] = &['/', '\\', '\0'];

/// Opaque identifier for an immutable piece of stored content.
///
/// Consumers may only compare identifiers for equality or by textual prefix.
/// Identifiers minted by [`CidScheme::Blake3`] embed the content digest and
/// can be verified with [`Cid::digest`]; identifiers from any other source
/// (including [`CidScheme::Random`] and legacy stores) are plain strings.
///
/// Every `Cid` is safe to use as a single file name: it is non-empty, has no
/// path separators or NUL bytes, and does not start with `.`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cid(String);

impl Cid {
    /// Parse and validate an identifier from its textual form.
    pub fn parse(s: impl Into<String>) -> Result<Self, TypeError> {
        let s = s.into();
        let reject = |reason: &str| TypeError::InvalidCid {
            cid: s.clone(),
            reason: reason.to_string(),
        };

        if s.is_empty() {
            return Err(reject("must not be empty"));
        }
        if s.len() > MAX_CID_LEN {
            return Err(reject("too long"));
        }
        if s.starts_with('.') {
            return Err(reject("must not start with '.'"));
        }
        if let Some(ch) = s.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
            return Err(reject(&format!("contains forbidden character: {ch:?}")));
        }
        Ok(Self(s))
    }

    /// Build a hash-derived identifier from a 32-byte digest.
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(format!("{DIGEST_PREFIX}{}", hex::encode(digest)))
    }

    /// Mint a random identifier of the form `cid-<millis>-<7 base36 chars>`.
    pub fn random(unix_millis: u128) -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..RANDOM_SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();
        Self(format!("{RANDOM_PREFIX}{unix_millis}-{suffix}"))
    }

    /// The textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The embedded digest, if this identifier was hash-derived.
    pub fn digest(&self) -> Option<[u8; 32]> {
        let hex_part = self.0.strip_prefix(DIGEST_PREFIX)?;
        if hex_part.len() != 64 {
            return None;
        }
        let bytes = hex::decode(hex_part).ok()?;
        bytes.try_into().ok()
    }

    /// Returns `true` if the textual form starts with `prefix`.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }

    /// Abbreviated form for log lines and terminal output.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(14)
            .map_or(self.0.len(), |(i, _)| i);
        &self.0[..end]
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({})", self.short())
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Cid {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Cid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl From<Cid> for String {
    fn from(cid: Cid) -> Self {
        cid.0
    }
}

impl AsRef<str> for Cid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// How the content store mints identifiers for new content.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CidScheme {
    /// Identifier derived from a BLAKE3 hash of the content. Identical
    /// content maps to the identical identifier.
    #[default]
    Blake3,
    /// Identifier built from wall-clock time and a random suffix. Identical
    /// content maps to distinct identifiers.
    Random,
}

impl CidScheme {
    /// Lowercase scheme name as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blake3 => "blake3",
            Self::Random => "random",
        }
    }
}

impl fmt::Display for CidScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CidScheme {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blake3" => Ok(Self::Blake3),
            "random" => Ok(Self::Random),
            other => Err(TypeError::UnknownScheme(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn digest_cid_exposes_its_digest() {
        let cid = Cid::from_digest([7u8; 32]);
        assert!(cid.has_prefix(DIGEST_PREFIX));
        assert_eq!(cid.as_str().len(), 66);
        assert_eq!(cid.digest(), Some([7u8; 32]));
    }

    #[test]
    fn random_cid_has_no_digest() {
        let cid = Cid::random(1_700_000_000_000);
        assert!(cid.as_str().starts_with("cid-1700000000000-"));
        assert_eq!(cid.as_str().len(), "cid-1700000000000-".len() + 7);
        assert!(cid.digest().is_none());
    }

    #[test]
    fn random_cids_differ() {
        let a = Cid::random(1);
        let b = Cid::random(1);
        assert_ne!(a, b);
    }

    #[test]
    fn legacy_identifiers_parse() {
        let cid = Cid::parse("mock-cid-1700000000000-abc1234").unwrap();
        assert_eq!(cid.as_str(), "mock-cid-1700000000000-abc1234");
        assert!(cid.digest().is_none());
    }

    #[test]
    fn b3_prefix_with_bad_hex_has_no_digest() {
        let cid = Cid::parse("b3-not-a-digest").unwrap();
        assert!(cid.digest().is_none());
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        assert!(Cid::parse("").is_err());
        assert!(Cid::parse(".").is_err());
        assert!(Cid::parse("..").is_err());
        assert!(Cid::parse(".hidden").is_err());
        assert!(Cid::parse("a/b").is_err());
        assert!(Cid::parse("a\\b").is_err());
        assert!(Cid::parse("a\0b").is_err());
        assert!(Cid::parse("x".repeat(MAX_CID_LEN + 1)).is_err());
    }

    #[test]
    fn short_truncates_long_identifiers() {
        let cid = Cid::from_digest([0xab; 32]);
        assert_eq!(cid.short(), "b3abababababab");
        let tiny = Cid::parse("a1").unwrap();
        assert_eq!(tiny.short(), "a1");
    }

    #[test]
    fn serde_uses_plain_string() {
        let cid = Cid::parse("a1").unwrap();
        let json = serde_json::to_string(&cid).unwrap();
        assert_eq!(json, "\"a1\"");
        let back: Cid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cid);
        assert!(serde_json::from_str::<Cid>("\"../etc\"").is_err());
    }

    #[test]
    fn scheme_names() {
        assert_eq!(CidScheme::default(), CidScheme::Blake3);
        assert_eq!("random".parse::<CidScheme>().unwrap(), CidScheme::Random);
        assert!("sha1".parse::<CidScheme>().is_err());
        assert_eq!(CidScheme::Blake3.to_string(), "blake3");
    }

    proptest! {
        #[test]
        fn plain_names_always_parse(name in "[a-zA-Z0-9_-][a-zA-Z0-9._-]{0,60}") {
            let cid = Cid::parse(name.clone()).unwrap();
            prop_assert_eq!(cid.as_str(), name.as_str());
        }
    }
}
