//! Domain-separated digests signed by accounts and attesters.

use cosmwasm_std::Addr;
use sha2::{Digest, Sha256};

use crate::codec::TableWriter;
use crate::intent::{Intent, SignedCall};
use crate::nonce::Nonce;

pub const DOMAIN_NAME: &str = "RelayIntents/Orchestrator";
pub const DOMAIN_VERSION: &str = "1";
pub const SETTLER_WRITE_TAG: &str = "RelayIntents/Settler/write";

const DIGEST_PREFIX: [u8; 2] = [0x19, 0x01];

/// Where a digest is valid: one orchestrator on one chain
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Domain {
    pub chain_id: u64,
    pub verifying_contract: Addr,
}

impl Domain {
    pub fn new(chain_id: u64, verifying_contract: Addr) -> Self {
        Self {
            chain_id,
            verifying_contract,
        }
    }

    /// Domain separator; the chain id is left out for multichain nonces
    pub fn separator(&self, multichain: bool) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(DOMAIN_NAME.as_bytes());
        hasher.update(DOMAIN_VERSION.as_bytes());
        if !multichain {
            hasher.update(self.chain_id.to_be_bytes());
        }
        hasher.update(self.verifying_contract.as_bytes());
        hasher.finalize().into()
    }

    fn typed(&self, nonce: &Nonce, struct_hash: [u8; 32]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(DIGEST_PREFIX);
        hasher.update(self.separator(nonce.is_multichain()));
        hasher.update(struct_hash);
        hasher.finalize().into()
    }
}

fn hash_all<'a>(items: impl IntoIterator<Item = &'a [u8]>) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for item in items {
        hasher.update(Sha256::digest(item));
    }
    hasher.finalize().into()
}

/// Digest the account signs for an intent
///
/// Filler-chosen fields (actual payment amount and recipient, funder and
/// its signature, settler context) and the signatures themselves are not
/// covered.
pub fn intent_digest(domain: &Domain, intent: &Intent) -> [u8; 32] {
    let pre_calls: Vec<Vec<u8>> = intent.pre_calls.iter().map(SignedCall::encode).collect();
    let transfers: Vec<Vec<u8>> = intent
        .fund_transfers
        .iter()
        .map(|t| t.encode())
        .collect();

    let struct_bytes = TableWriter::new()
        .bool(intent.is_multichain)
        .str(intent.eoa.as_str())
        .bytes(&Sha256::digest(intent.execution_data.as_slice()))
        .bytes(&intent.nonce.to_bytes())
        .str(intent.payer().as_str())
        .str(&intent.payment_token)
        .u128(intent.payment_max_amount.u128())
        .u64(intent.combined_gas)
        .bytes(&hash_all(pre_calls.iter().map(Vec::as_slice)))
        .bytes(&hash_all(transfers.iter().map(Vec::as_slice)))
        .str(intent.settler.as_ref().map(Addr::as_str).unwrap_or(""))
        .u64(intent.expiry)
        .finish();

    domain.typed(&intent.nonce, Sha256::digest(&struct_bytes).into())
}

/// Digest a pre-call signer signs; `eoa` is the resolved signer
pub fn pre_call_digest(domain: &Domain, eoa: &Addr, pre_call: &SignedCall) -> [u8; 32] {
    let struct_bytes = TableWriter::new()
        .str(eoa.as_str())
        .bytes(&Sha256::digest(pre_call.execution_data.as_slice()))
        .bytes(&pre_call.nonce.to_bytes())
        .finish();

    domain.typed(&pre_call.nonce, Sha256::digest(&struct_bytes).into())
}

/// Preimage an oracle owner signs to attest a settlement
pub fn settler_write_preimage(
    settler: &str,
    sender: &str,
    settlement_id: &[u8],
    chain_id: u64,
) -> Vec<u8> {
    TableWriter::new()
        .str(SETTLER_WRITE_TAG)
        .str(settler)
        .str(sender)
        .bytes(settlement_id)
        .u64(chain_id)
        .finish()
}
