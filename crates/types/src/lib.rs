pub mod call;
pub mod codec;
pub mod digest;
pub mod intent;
pub mod key;
pub mod merkle;
pub mod nonce;
pub mod settler;
pub mod signature;

pub use call::*;
pub use codec::{DecodeError, DecodeLimits};
pub use digest::*;
pub use intent::*;
pub use key::*;
pub use merkle::MerkleTree;
pub use nonce::*;
pub use settler::*;
pub use signature::*;
