use secp256k1::SecretKey;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::crypto::{SignatureEngine, sha256};
use crate::error::{LedgerError, Result};
use crate::wallet::Address;

/// Origin of a transfer: a wallet, or the protocol minting a reward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<Address>", into = "Option<Address>")]
pub enum Sender {
    Mint,
    Wallet(Address),
}

impl Sender {
    pub fn address(&self) -> Option<&Address> {
        match self {
            Sender::Mint => None,
            Sender::Wallet(addr) => Some(addr),
        }
    }
}

impl From<Option<Address>> for Sender {
    fn from(value: Option<Address>) -> Self {
        value.map_or(Sender::Mint, Sender::Wallet)
    }
}

impl From<Sender> for Option<Address> {
    fn from(value: Sender) -> Self {
        match value {
            Sender::Mint => None,
            Sender::Wallet(addr) => Some(addr),
        }
    }
}

impl From<Address> for Sender {
    fn from(value: Address) -> Self {
        Sender::Wallet(value)
    }
}

/// A value transfer. Once mined into a block it is never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub(crate) from: Sender,
    pub(crate) to: Address,
    pub(crate) amount: u64,
    /// Hex-encoded DER ECDSA signature over `content_digest()`
    pub(crate) signature: Option<String>,
}

impl Transaction {
    /// Unsigned transfer from a wallet.
    pub fn new(from: impl Into<Sender>, to: Address, amount: u64) -> Self {
        Self {
            from: from.into(),
            to,
            amount,
            signature: None,
        }
    }

    /// Minting transaction paying `amount` to `to`. Never signed.
    pub fn reward(to: Address, amount: u64) -> Self {
        Self::new(Sender::Mint, to, amount)
    }

    pub fn from(&self) -> &Sender {
        &self.from
    }

    pub fn to(&self) -> &Address {
        &self.to
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn is_reward(&self) -> bool {
        self.from == Sender::Mint
    }

    /// Signing payload: `"{from}:{to}:{amount}"`, with an empty `from` for mints.
    pub fn signing_payload(&self) -> String {
        let from = self.from.address().map(Address::as_str).unwrap_or("");
        format!("{}:{}:{}", from, self.to, self.amount)
    }

    /// SHA-256 of the signing payload. The signature is not part of it.
    pub fn content_digest(&self) -> [u8; 32] {
        sha256(self.signing_payload().as_bytes())
    }

    pub fn hash(&self) -> String {
        hex::encode(self.content_digest())
    }

    /// Sign with the sender's private key. The key must belong to `from`.
    pub fn sign(&mut self, engine: &SignatureEngine, secret: &SecretKey) -> Result<()> {
        let Sender::Wallet(from) = &self.from else {
            return Err(LedgerError::WrongSigner);
        };
        if &engine.address_of(secret) != from {
            return Err(LedgerError::WrongSigner);
        }

        let digest = self.content_digest();
        self.signature = Some(engine.sign(secret, &digest));
        Ok(())
    }

    /// Rewards are valid by construction. Transfers must carry a signature
    /// that verifies under `from`.
    pub fn is_valid(&self, engine: &SignatureEngine) -> Result<bool> {
        let Sender::Wallet(from) = &self.from else {
            return Ok(true);
        };
        let signature = self.signature.as_deref().unwrap_or("");
        engine.verify(from, &self.content_digest(), signature)
    }

    /// Canonical JSON used inside block digests. Keys are emitted sorted
    /// (`amount`, `from`, `signature`, `to`); a mint has `from: null`.
    pub fn canonical_json(&self) -> Value {
        json!({
            "amount": self.amount,
            "from": self.from.address().map(Address::as_str),
            "signature": self.signature,
            "to": self.to.as_str(),
        })
    }
}
