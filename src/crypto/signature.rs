use log::debug;
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};

use crate::error::{LedgerError, Result};
use crate::wallet::Address;

/// ECDSA over secp256k1 for 32 byte message digests.
/// Signatures travel as hex-encoded DER.
#[derive(Debug, Clone)]
pub struct SignatureEngine {
    secp: Secp256k1<All>,
}

impl Default for SignatureEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SignatureEngine {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
        }
    }

    /// Address (compressed pubkey hex) belonging to `secret`.
    pub fn address_of(&self, secret: &SecretKey) -> Address {
        Address::from_public_key(&PublicKey::from_secret_key(&self.secp, secret))
    }

    /// Sign a digest, returning the hex DER signature.
    pub fn sign(&self, secret: &SecretKey, digest: &[u8; 32]) -> String {
        let msg = Message::from_digest(*digest);
        let sig = self.secp.sign_ecdsa(&msg, secret);
        hex::encode(&*sig.serialize_der())
    }

    /// Check `signature_hex` against `address` for `digest`.
    ///
    /// An empty signature is an error so "never signed" stays distinct from
    /// "signed badly". Anything else that fails to verify, including
    /// undecodable signatures and addresses that are not public keys, is
    /// `Ok(false)`.
    pub fn verify(
        &self,
        address: &Address,
        digest: &[u8; 32],
        signature_hex: &str,
    ) -> Result<bool> {
        if signature_hex.is_empty() {
            return Err(LedgerError::MissingSignature);
        }

        let Some(pk) = address.to_public_key() else {
            debug!("verify: address {address} is not a public key");
            return Ok(false);
        };

        let bytes = hex::decode(signature_hex).unwrap_or_default();
        let Ok(sig) = Signature::from_der(&bytes) else {
            debug!("verify: signature is not hex DER");
            return Ok(false);
        };

        let msg = Message::from_digest(*digest);
        Ok(self.secp.verify_ecdsa(&msg, &sig, &pk).is_ok())
    }
}
