use std::fmt;

use rand::rngs::OsRng;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

fn invalid_key(what: &str) -> LedgerError {
    LedgerError::InvalidKey(what.to_string())
}

/// Wallet address: lowercase hex of a secp256k1 public key.
/// Keys derived here use the compressed (33 byte) form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Wrap an address string as-is. No key validation happens here;
    /// an address that is not a public key simply never verifies.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Address of a public key (hex of the compressed encoding).
    pub fn from_public_key(pk: &PublicKey) -> Self {
        Self(hex::encode(pk.serialize()))
    }

    /// Normalize a hex public key (compressed or uncompressed) into its address.
    pub fn from_public_key_hex(pubkey_hex: &str) -> Result<Self> {
        let bytes = hex::decode(pubkey_hex.trim())
            .map_err(|_| invalid_key("invalid pubkey hex"))?;
        let pk = PublicKey::from_slice(&bytes)
            .map_err(|_| invalid_key("invalid pubkey bytes"))?;
        Ok(Self::from_public_key(&pk))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Parse back into a public key, if this address is one.
    pub fn to_public_key(&self) -> Option<PublicKey> {
        let bytes = hex::decode(&self.0).ok()?;
        PublicKey::from_slice(&bytes).ok()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A secp256k1 key pair standing in for the external key provider.
pub struct Wallet {
    secret: SecretKey,
    address: Address,
}

impl Wallet {
    /// Generate a fresh key pair from the OS RNG.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret, pk) = secp.generate_keypair(&mut OsRng);
        Self {
            secret,
            address: Address::from_public_key(&pk),
        }
    }

    /// Load a wallet from a hex-encoded 32 byte private key.
    pub fn from_secret_hex(secret_hex: &str) -> Result<Self> {
        let bytes = hex::decode(secret_hex.trim())
            .map_err(|_| invalid_key("invalid private key hex"))?;
        let secret = SecretKey::from_slice(&bytes)
            .map_err(|_| invalid_key("invalid private key bytes"))?;
        let secp = Secp256k1::signing_only();
        let pk = PublicKey::from_secret_key(&secp, &secret);
        Ok(Self {
            secret,
            address: Address::from_public_key(&pk),
        })
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.secret
    }

    /// Hex of the 32 byte private key.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret.secret_bytes())
    }
}

impl fmt::Debug for Wallet {
    // never print the secret
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEMO_KEY: &str = "90e84207f5d37ce2ae9643883800bb119362a0f889be88eaaa04c3d0eabc26a5";

    #[test]
    fn secret_hex_round_trips_to_same_address() {
        let w = Wallet::from_secret_hex(DEMO_KEY).unwrap();
        assert_eq!(w.secret_hex(), DEMO_KEY);
        let again = Wallet::from_secret_hex(&w.secret_hex()).unwrap();
        assert_eq!(w.address(), again.address());
    }

    #[test]
    fn generated_address_is_compressed_pubkey_hex() {
        let w = Wallet::generate();
        assert_eq!(w.address().as_str().len(), 66);
        assert!(w.address().to_public_key().is_some());
    }

    #[test]
    fn uncompressed_pubkey_normalizes_to_compressed_address() {
        let w = Wallet::generate();
        let pk = w.address().to_public_key().unwrap();
        let uncompressed = hex::encode(pk.serialize_uncompressed());
        let normalized = Address::from_public_key_hex(&uncompressed).unwrap();
        assert_eq!(&normalized, w.address());
    }

    #[test]
    fn rejects_bad_key_material() {
        let bad = Wallet::from_secret_hex("zz");
        assert!(matches!(bad, Err(LedgerError::InvalidKey(_))));
        assert!(Address::from_public_key_hex("00ff").is_err());
        let not_a_key = Address::new("public key goes here");
        assert!(not_a_key.to_public_key().is_none());
    }

    #[test]
    fn debug_hides_secret() {
        let w = Wallet::from_secret_hex(DEMO_KEY).unwrap();
        assert!(!format!("{w:?}").contains(DEMO_KEY));
    }
}
