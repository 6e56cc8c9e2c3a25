use cosmwasm_std::{Addr, Binary, Uint128};

use crate::call::{decode_calls, encode_calls, Call, Transfer};
use crate::codec::{DecodeError, DecodeLimits, Table, TableWriter};
use crate::nonce::Nonce;

fn optional_addr(value: String) -> Option<Addr> {
    if value.is_empty() {
        None
    } else {
        Some(Addr::unchecked(value))
    }
}

fn addr_str(addr: &Option<Addr>) -> &str {
    addr.as_ref().map(Addr::as_str).unwrap_or("")
}

/// A signed sub-batch executed before the main intent is validated
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedCall {
    /// Signer; `None` falls back to the parent intent's eoa
    pub eoa: Option<Addr>,
    pub execution_data: Binary,
    pub nonce: Nonce,
    pub signature: Binary,
}

impl SignedCall {
    pub const FIELDS: usize = 4;

    pub fn new(eoa: Option<Addr>, calls: &[Call], nonce: Nonce) -> Self {
        Self {
            eoa,
            execution_data: Binary::from(encode_calls(calls)),
            nonce,
            signature: Binary::default(),
        }
    }

    pub fn with_signature(mut self, signature: impl Into<Binary>) -> Self {
        self.signature = signature.into();
        self
    }

    pub fn calls(&self, limits: &DecodeLimits) -> Result<Vec<Call>, DecodeError> {
        decode_calls(&self.execution_data, limits)
    }

    pub fn encode(&self) -> Vec<u8> {
        TableWriter::new()
            .str(addr_str(&self.eoa))
            .bytes(&self.execution_data)
            .bytes(&self.nonce.to_bytes())
            .bytes(&self.signature)
            .finish()
    }

    pub fn decode(bytes: &[u8], limits: &DecodeLimits) -> Result<Self, DecodeError> {
        let table = Table::parse(bytes, Self::FIELDS, limits)?;
        let execution_data = table.bytes(1)?;
        decode_calls(execution_data, limits).map_err(|e| DecodeError::Invalid {
            field: 1,
            reason: e.to_string(),
        })?;
        Ok(Self {
            eoa: optional_addr(table.string(0)?),
            execution_data: Binary::from(execution_data),
            nonce: Nonce::from_bytes(table.fixed(2)?),
            signature: Binary::from(table.bytes(3)?),
        })
    }
}

/// Field positions of an encoded intent
pub mod field {
    pub const EOA: usize = 0;
    pub const EXECUTION_DATA: usize = 1;
    pub const NONCE: usize = 2;
    pub const PAYER: usize = 3;
    pub const PAYMENT_TOKEN: usize = 4;
    pub const PAYMENT_AMOUNT: usize = 5;
    pub const PAYMENT_MAX_AMOUNT: usize = 6;
    pub const COMBINED_GAS: usize = 7;
    pub const PRE_CALLS: usize = 8;
    pub const FUND_TRANSFERS: usize = 9;
    pub const SETTLER: usize = 10;
    pub const SETTLER_CONTEXT: usize = 11;
    pub const EXPIRY: usize = 12;
    pub const IS_MULTICHAIN: usize = 13;
    pub const FUNDER: usize = 14;
    pub const FUNDER_SIGNATURE: usize = 15;
    pub const PAYMENT_RECIPIENT: usize = 16;
    pub const SIGNATURE: usize = 17;
    pub const PAYMENT_SIGNATURE: usize = 18;
    pub const SUPPORTED_ACCOUNT_IMPLEMENTATION: usize = 19;

    pub const COUNT: usize = 20;
}

/// A user's signed request: an execution batch plus payment terms
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Intent {
    /// Account that signed the intent
    pub eoa: Addr,

    /// Encoded call batch
    pub execution_data: Binary,

    pub nonce: Nonce,

    /// Account paying the fee; `None` means the eoa pays
    pub payer: Option<Addr>,
    pub payment_token: String,
    /// Chosen by the filler, bounded by `payment_max_amount`
    pub payment_amount: Uint128,
    pub payment_max_amount: Uint128,
    pub combined_gas: u64,

    pub pre_calls: Vec<SignedCall>,

    /// Only present on the output chain
    pub fund_transfers: Vec<Transfer>,

    pub settler: Option<Addr>,
    pub settler_context: Binary,

    /// Unix seconds; 0 never expires
    pub expiry: u64,
    pub is_multichain: bool,

    pub funder: Option<Addr>,
    pub funder_signature: Binary,

    /// Fee destination; `None` means the orchestrator
    pub payment_recipient: Option<Addr>,

    pub signature: Binary,
    pub payment_signature: Binary,

    /// Implementation label the account must be running
    pub supported_account_implementation: Option<String>,
}

impl Intent {
    /// Create a new intent builder
    pub fn builder(eoa: impl Into<String>) -> IntentBuilder {
        IntentBuilder::new(eoa)
    }

    pub fn calls(&self, limits: &DecodeLimits) -> Result<Vec<Call>, DecodeError> {
        decode_calls(&self.execution_data, limits)
    }

    pub fn payer(&self) -> &Addr {
        self.payer.as_ref().unwrap_or(&self.eoa)
    }

    /// Check if the intent has expired
    pub fn is_expired(&self, now: u64) -> bool {
        self.expiry != 0 && now > self.expiry
    }

    /// Intents that move funds on the output chain and report to a settler
    pub fn is_output(&self) -> bool {
        self.settler.is_some() && !self.fund_transfers.is_empty()
    }

    pub fn encode(&self) -> Vec<u8> {
        TableWriter::new()
            .str(self.eoa.as_str())
            .bytes(&self.execution_data)
            .bytes(&self.nonce.to_bytes())
            .str(addr_str(&self.payer))
            .str(&self.payment_token)
            .u128(self.payment_amount.u128())
            .u128(self.payment_max_amount.u128())
            .u64(self.combined_gas)
            .list(self.pre_calls.iter().map(SignedCall::encode))
            .list(self.fund_transfers.iter().map(Transfer::encode))
            .str(addr_str(&self.settler))
            .bytes(&self.settler_context)
            .u64(self.expiry)
            .bool(self.is_multichain)
            .str(addr_str(&self.funder))
            .bytes(&self.funder_signature)
            .str(addr_str(&self.payment_recipient))
            .bytes(&self.signature)
            .bytes(&self.payment_signature)
            .str(self.supported_account_implementation.as_deref().unwrap_or(""))
            .finish()
    }

    /// Decode and fully validate an intent from untrusted bytes
    pub fn decode(bytes: &[u8], limits: &DecodeLimits) -> Result<Self, DecodeError> {
        let table = Table::parse(bytes, field::COUNT, limits)?;

        let eoa = table.string(field::EOA)?;
        if eoa.is_empty() {
            return Err(DecodeError::Invalid {
                field: field::EOA,
                reason: "empty eoa".to_string(),
            });
        }

        let execution_data = table.bytes(field::EXECUTION_DATA)?;
        decode_calls(execution_data, limits).map_err(|e| DecodeError::Invalid {
            field: field::EXECUTION_DATA,
            reason: e.to_string(),
        })?;

        let pre_calls = table
            .list(field::PRE_CALLS, limits.max_pre_calls)?
            .into_iter()
            .map(|raw| SignedCall::decode(raw, limits))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DecodeError::Invalid {
                field: field::PRE_CALLS,
                reason: e.to_string(),
            })?;

        let fund_transfers = table
            .list(field::FUND_TRANSFERS, limits.max_list_len)?
            .into_iter()
            .map(|raw| Transfer::decode(raw, limits))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DecodeError::Invalid {
                field: field::FUND_TRANSFERS,
                reason: e.to_string(),
            })?;

        let supported = table.string(field::SUPPORTED_ACCOUNT_IMPLEMENTATION)?;

        Ok(Self {
            eoa: Addr::unchecked(eoa),
            execution_data: Binary::from(execution_data),
            nonce: Nonce::from_bytes(table.fixed(field::NONCE)?),
            payer: optional_addr(table.string(field::PAYER)?),
            payment_token: table.string(field::PAYMENT_TOKEN)?,
            payment_amount: Uint128::new(table.u128(field::PAYMENT_AMOUNT)?),
            payment_max_amount: Uint128::new(table.u128(field::PAYMENT_MAX_AMOUNT)?),
            combined_gas: table.u64(field::COMBINED_GAS)?,
            pre_calls,
            fund_transfers,
            settler: optional_addr(table.string(field::SETTLER)?),
            settler_context: Binary::from(table.bytes(field::SETTLER_CONTEXT)?),
            expiry: table.u64(field::EXPIRY)?,
            is_multichain: table.bool(field::IS_MULTICHAIN)?,
            funder: optional_addr(table.string(field::FUNDER)?),
            funder_signature: Binary::from(table.bytes(field::FUNDER_SIGNATURE)?),
            payment_recipient: optional_addr(table.string(field::PAYMENT_RECIPIENT)?),
            signature: Binary::from(table.bytes(field::SIGNATURE)?),
            payment_signature: Binary::from(table.bytes(field::PAYMENT_SIGNATURE)?),
            supported_account_implementation: if supported.is_empty() {
                None
            } else {
                Some(supported)
            },
        })
    }
}

/// Builder for constructing intents
#[derive(Clone, Debug)]
pub struct IntentBuilder {
    intent: Intent,
}

impl IntentBuilder {
    pub fn new(eoa: impl Into<String>) -> Self {
        Self {
            intent: Intent {
                eoa: Addr::unchecked(eoa.into()),
                execution_data: Binary::from(encode_calls(&[])),
                nonce: Nonce::default(),
                payer: None,
                payment_token: String::new(),
                payment_amount: Uint128::zero(),
                payment_max_amount: Uint128::zero(),
                combined_gas: 0,
                pre_calls: vec![],
                fund_transfers: vec![],
                settler: None,
                settler_context: Binary::default(),
                expiry: 0,
                is_multichain: false,
                funder: None,
                funder_signature: Binary::default(),
                payment_recipient: None,
                signature: Binary::default(),
                payment_signature: Binary::default(),
                supported_account_implementation: None,
            },
        }
    }

    pub fn calls(mut self, calls: &[Call]) -> Self {
        self.intent.execution_data = Binary::from(encode_calls(calls));
        self
    }

    pub fn nonce(mut self, nonce: Nonce) -> Self {
        self.intent.is_multichain = nonce.is_multichain();
        self.intent.nonce = nonce;
        self
    }

    pub fn payment(mut self, token: impl Into<String>, amount: u128, max_amount: u128) -> Self {
        self.intent.payment_token = token.into();
        self.intent.payment_amount = Uint128::new(amount);
        self.intent.payment_max_amount = Uint128::new(max_amount);
        self
    }

    pub fn payer(mut self, payer: impl Into<String>) -> Self {
        self.intent.payer = Some(Addr::unchecked(payer.into()));
        self
    }

    pub fn payment_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.intent.payment_recipient = Some(Addr::unchecked(recipient.into()));
        self
    }

    pub fn combined_gas(mut self, gas: u64) -> Self {
        self.intent.combined_gas = gas;
        self
    }

    pub fn pre_call(mut self, pre_call: SignedCall) -> Self {
        self.intent.pre_calls.push(pre_call);
        self
    }

    pub fn fund_transfer(mut self, transfer: Transfer) -> Self {
        self.intent.fund_transfers.push(transfer);
        self
    }

    pub fn funder(mut self, funder: impl Into<String>) -> Self {
        self.intent.funder = Some(Addr::unchecked(funder.into()));
        self
    }

    pub fn settler(mut self, settler: impl Into<String>, context: impl Into<Binary>) -> Self {
        self.intent.settler = Some(Addr::unchecked(settler.into()));
        self.intent.settler_context = context.into();
        self
    }

    pub fn expiry(mut self, expiry: u64) -> Self {
        self.intent.expiry = expiry;
        self
    }

    pub fn multichain(mut self, is_multichain: bool) -> Self {
        self.intent.is_multichain = is_multichain;
        self
    }

    pub fn supported_account_implementation(mut self, label: impl Into<String>) -> Self {
        self.intent.supported_account_implementation = Some(label.into());
        self
    }

    /// Build the intent (unsigned)
    pub fn build(self) -> Intent {
        self.intent
    }
}
