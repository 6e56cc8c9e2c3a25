use cosmwasm_std::{Addr, Binary};
use relay_intents_types::{verify_secp256k1, Transfer};
use thiserror::Error;
use tracing::{debug, warn};

use crate::ledger::{Ledger, LedgerError};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FunderError {
    #[error("invalid funder signature")]
    InvalidSignature,

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// What a funder is asked to pay for
#[derive(Debug, Clone, Copy)]
pub struct FundContext<'a> {
    pub eoa: &'a Addr,
    pub digest: &'a [u8; 32],
    pub transfers: &'a [Transfer],
    pub signature: &'a [u8],
    /// Set only by `simulate`; lets an unsigned intent be estimated
    pub simulation: bool,
}

/// Payer of last resort for output-chain transfers
pub trait Funder: Send + Sync {
    fn address(&self) -> &Addr;

    fn fund(&self, ctx: &FundContext<'_>, ledger: &mut Ledger) -> Result<(), FunderError>;
}

/// Pays from its own ledger balance when its signer approved the digest
#[derive(Debug, Clone)]
pub struct SimpleFunder {
    address: Addr,
    signer_public_key: Binary,
}

impl SimpleFunder {
    pub fn new(address: Addr, signer_public_key: Binary) -> Self {
        Self {
            address,
            signer_public_key,
        }
    }
}

impl Funder for SimpleFunder {
    fn address(&self) -> &Addr {
        &self.address
    }

    fn fund(&self, ctx: &FundContext<'_>, ledger: &mut Ledger) -> Result<(), FunderError> {
        if let Err(e) = verify_secp256k1(ctx.digest, ctx.signature, &self.signer_public_key) {
            if !ctx.simulation {
                return Err(FunderError::InvalidSignature);
            }
            warn!(funder = %self.address, error = %e, "ignoring funder signature in simulation");
        }

        for transfer in ctx.transfers {
            ledger.transfer(&self.address, ctx.eoa, &transfer.token, transfer.amount)?;
        }
        debug!(funder = %self.address, eoa = %ctx.eoa, transfers = ctx.transfers.len(), "funded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::Uint128;
    use relay_intents_types::{derive_public_key, sign_message};

    const SIGNER: [u8; 32] = [0x33; 32];

    fn setup() -> (SimpleFunder, Ledger, Addr) {
        let funder = SimpleFunder::new(
            Addr::unchecked("funder"),
            derive_public_key(&SIGNER).unwrap(),
        );
        let mut ledger = Ledger::new();
        ledger
            .credit(funder.address(), "uatom", Uint128::new(1_000))
            .unwrap();
        (funder, ledger, Addr::unchecked("user"))
    }

    #[test]
    fn test_signed_funding() {
        let (funder, mut ledger, eoa) = setup();
        let digest = [4u8; 32];
        let signature = sign_message(&digest, &SIGNER).unwrap();
        let transfers = [Transfer::new("uatom", 250)];
        let ctx = FundContext {
            eoa: &eoa,
            digest: &digest,
            transfers: &transfers,
            signature: &signature,
            simulation: false,
        };
        funder.fund(&ctx, &mut ledger).unwrap();
        assert_eq!(ledger.balance(&eoa, "uatom"), Uint128::new(250));
    }

    #[test]
    fn test_bad_signature_rejected_outside_simulation() {
        let (funder, mut ledger, eoa) = setup();
        let digest = [4u8; 32];
        let transfers = [Transfer::new("uatom", 250)];
        let mut ctx = FundContext {
            eoa: &eoa,
            digest: &digest,
            transfers: &transfers,
            signature: &[0u8; 64],
            simulation: false,
        };
        assert_eq!(
            funder.fund(&ctx, &mut ledger),
            Err(FunderError::InvalidSignature)
        );
        assert_eq!(ledger.balance(&eoa, "uatom"), Uint128::zero());

        ctx.simulation = true;
        funder.fund(&ctx, &mut ledger).unwrap();
        assert_eq!(ledger.balance(&eoa, "uatom"), Uint128::new(250));
    }

    #[test]
    fn test_insufficient_funder_balance() {
        let (funder, mut ledger, eoa) = setup();
        let digest = [4u8; 32];
        let signature = sign_message(&digest, &SIGNER).unwrap();
        let transfers = [Transfer::new("uatom", 5_000)];
        let ctx = FundContext {
            eoa: &eoa,
            digest: &digest,
            transfers: &transfers,
            signature: &signature,
            simulation: false,
        };
        assert!(matches!(
            funder.fund(&ctx, &mut ledger),
            Err(FunderError::Ledger(_))
        ));
    }
}
