use std::time::{SystemTime, UNIX_EPOCH};

use stow_crypto::ContentHasher;
use stow_types::{Cid, CidScheme};

/// Mint the identifier for newly added content under `scheme`.
pub fn mint_cid(scheme: CidScheme, data: &[u8]) -> Cid {
    match scheme {
        CidScheme::Blake3 => ContentHasher::CONTENT.cid(data),
        CidScheme::Random => Cid::random(unix_millis()),
    }
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
