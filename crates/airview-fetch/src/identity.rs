use rand::RngCore;
use std::fmt;

/// Bytes of the digest kept as the address.
const ADDRESS_BYTES: usize = 20;

/// The local network identity requests are signed as.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    address: String,
}

impl Identity {
    /// Fresh ephemeral identity; the address is a hex fingerprint.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        let digest = blake3::hash(&seed);

        Self {
            address: hex::encode(&digest.as_bytes()[..ADDRESS_BYTES]),
        }
    }

    pub fn from_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}
