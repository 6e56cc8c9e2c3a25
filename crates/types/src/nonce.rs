/// Top 16 bits of a sequence key that mark a chain-independent nonce
pub const MULTICHAIN_NONCE_PREFIX: u16 = 0xc1d0;

/// Upper 192 bits of a nonce; each key owns an independent counter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceKey(pub [u8; 24]);

impl SequenceKey {
    pub const ZERO: SequenceKey = SequenceKey([0u8; 24]);

    /// Build a multichain key whose low bytes carry `tail`
    pub fn multichain(tail: u64) -> Self {
        let mut key = [0u8; 24];
        key[..2].copy_from_slice(&MULTICHAIN_NONCE_PREFIX.to_be_bytes());
        key[16..].copy_from_slice(&tail.to_be_bytes());
        Self(key)
    }

    pub fn from_u64(value: u64) -> Self {
        let mut key = [0u8; 24];
        key[16..].copy_from_slice(&value.to_be_bytes());
        Self(key)
    }

    pub fn is_multichain(&self) -> bool {
        u16::from_be_bytes([self.0[0], self.0[1]]) == MULTICHAIN_NONCE_PREFIX
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// 256-bit nonce: 192-bit sequence key followed by a 64-bit counter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Nonce {
    pub key: SequenceKey,
    pub seq: u64,
}

impl Nonce {
    pub fn new(key: SequenceKey, seq: u64) -> Self {
        Self { key, seq }
    }

    pub fn is_multichain(&self) -> bool {
        self.key.is_multichain()
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        out[..24].copy_from_slice(&self.key.0);
        out[24..].copy_from_slice(&self.seq.to_be_bytes());
        out
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        let mut key = [0u8; 24];
        key.copy_from_slice(&bytes[..24]);
        let mut seq = [0u8; 8];
        seq.copy_from_slice(&bytes[24..]);
        Self {
            key: SequenceKey(key),
            seq: u64::from_be_bytes(seq),
        }
    }
}
