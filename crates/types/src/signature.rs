use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use cosmwasm_std::Binary;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::codec::{DecodeError, DecodeLimits, Table, TableWriter};
use crate::key::{Key, KeyHash, KeyType};
use crate::merkle;

/// Errors that can occur during signature verification
#[derive(Debug, Error, PartialEq)]
pub enum SignatureError {
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("missing signature")]
    MissingSignature,

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("webauthn assertion rejected: {0}")]
    WebAuthn(String),

    #[error("merkle proof does not reach the signed root")]
    InvalidMerkleProof,

    #[error("signature verification failed")]
    VerificationFailed,

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Verify a compact secp256k1 signature; `message` is hashed with sha256
pub fn verify_secp256k1(
    message: &[u8],
    signature: &[u8],
    public_key: &[u8],
) -> Result<(), SignatureError> {
    use k256::ecdsa::{signature::Verifier, Signature, VerifyingKey};

    if signature.is_empty() {
        return Err(SignatureError::MissingSignature);
    }

    let verifying_key = VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))?;

    let sig = Signature::from_slice(signature)
        .map_err(|e| SignatureError::InvalidSignature(e.to_string()))?;

    verifying_key
        .verify(message, &sig)
        .map_err(|_| SignatureError::VerificationFailed)
}

/// Verify a raw `r || s` P-256 signature; `message` is hashed with sha256
pub fn verify_p256(
    message: &[u8],
    signature: &[u8],
    public_key: &[u8],
) -> Result<(), SignatureError> {
    use p256::ecdsa::{signature::Verifier, Signature, VerifyingKey};

    if signature.is_empty() {
        return Err(SignatureError::MissingSignature);
    }

    let verifying_key = VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|e| SignatureError::InvalidPublicKey(e.to_string()))?;

    let sig = Signature::from_slice(signature)
        .map_err(|e| SignatureError::InvalidSignature(e.to_string()))?;

    verifying_key
        .verify(message, &sig)
        .map_err(|_| SignatureError::VerificationFailed)
}

/// A WebAuthn assertion as produced by a platform authenticator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebAuthnAuth {
    pub authenticator_data: Vec<u8>,
    pub client_data_json: String,
    /// Byte index of `"challenge":"..."` inside the client data
    pub challenge_index: u32,
    /// Byte index of `"type":"webauthn.get"` inside the client data
    pub type_index: u32,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

const AUTH_DATA_MIN_LEN: usize = 37;
const AUTH_DATA_FLAGS: usize = 32;
const FLAG_USER_PRESENT: u8 = 0x01;
const WEBAUTHN_TYPE: &str = "\"type\":\"webauthn.get\"";

impl WebAuthnAuth {
    pub const FIELDS: usize = 6;

    pub fn encode(&self) -> Vec<u8> {
        TableWriter::new()
            .bytes(&self.authenticator_data)
            .str(&self.client_data_json)
            .u32(self.challenge_index)
            .u32(self.type_index)
            .bytes(&self.r)
            .bytes(&self.s)
            .finish()
    }

    pub fn decode(bytes: &[u8], limits: &DecodeLimits) -> Result<Self, DecodeError> {
        let table = Table::parse(bytes, Self::FIELDS, limits)?;
        let client_data = table.bytes(1)?;
        Ok(Self {
            authenticator_data: table.bytes(0)?.to_vec(),
            client_data_json: String::from_utf8(client_data.to_vec())
                .map_err(|_| DecodeError::InvalidUtf8 { field: 1 })?,
            challenge_index: table.u32(2)?,
            type_index: table.u32(3)?,
            r: table.fixed(4)?,
            s: table.fixed(5)?,
        })
    }

    /// Check the assertion binds `challenge` and verify it against a P-256 key
    pub fn verify(&self, challenge: &[u8], public_key: &[u8]) -> Result<(), SignatureError> {
        if self.authenticator_data.len() < AUTH_DATA_MIN_LEN {
            return Err(SignatureError::WebAuthn(
                "authenticator data too short".to_string(),
            ));
        }
        if self.authenticator_data[AUTH_DATA_FLAGS] & FLAG_USER_PRESENT == 0 {
            return Err(SignatureError::WebAuthn("user not present".to_string()));
        }

        let client_data = self.client_data_json.as_bytes();
        let at = |index: u32| client_data.get(index as usize..).unwrap_or_default();

        if !at(self.type_index).starts_with(WEBAUTHN_TYPE.as_bytes()) {
            return Err(SignatureError::WebAuthn("unexpected type".to_string()));
        }

        let expected = format!("\"challenge\":\"{}\"", URL_SAFE_NO_PAD.encode(challenge));
        if !at(self.challenge_index).starts_with(expected.as_bytes()) {
            return Err(SignatureError::WebAuthn("challenge mismatch".to_string()));
        }

        let mut message = self.authenticator_data.clone();
        message.extend_from_slice(&Sha256::digest(client_data));

        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.r);
        rs[32..].copy_from_slice(&self.s);
        verify_p256(&message, &rs, public_key)
    }
}

/// Dispatches verification on the stored key type
#[derive(Clone, Debug)]
pub enum Verifier<'a> {
    Secp256k1 { public_key: &'a [u8] },
    P256 { public_key: &'a [u8] },
    WebAuthnP256 { public_key: &'a [u8] },
}

impl<'a> Verifier<'a> {
    pub fn for_key(key: &'a Key) -> Self {
        let public_key = key.public_key.as_slice();
        match key.key_type {
            KeyType::Secp256k1 => Verifier::Secp256k1 { public_key },
            KeyType::P256 => Verifier::P256 { public_key },
            KeyType::WebAuthnP256 => Verifier::WebAuthnP256 { public_key },
        }
    }

    pub fn verify(
        &self,
        digest: &[u8],
        signature: &[u8],
        limits: &DecodeLimits,
    ) -> Result<(), SignatureError> {
        match self {
            Verifier::Secp256k1 { public_key } => verify_secp256k1(digest, signature, public_key),
            Verifier::P256 { public_key } => verify_p256(digest, signature, public_key),
            Verifier::WebAuthnP256 { public_key } => {
                WebAuthnAuth::decode(signature, limits)?.verify(digest, public_key)
            }
        }
    }
}

/// Length of a bare root signature
pub const ROOT_SIGNATURE_LEN: usize = 64;
const WRAP_SUFFIX_LEN: usize = 33;

/// A signature tagged with the key that produced it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WrappedSignature {
    /// Compact secp256k1 signature by the account's own root key
    Root(Vec<u8>),
    /// `inner || key_hash || prehash`
    Key {
        inner: Vec<u8>,
        key_hash: KeyHash,
        prehash: bool,
    },
}

impl WrappedSignature {
    pub fn parse(bytes: &[u8]) -> Result<Self, SignatureError> {
        if bytes.is_empty() {
            return Err(SignatureError::MissingSignature);
        }
        if bytes.len() == ROOT_SIGNATURE_LEN {
            return Ok(WrappedSignature::Root(bytes.to_vec()));
        }
        if bytes.len() <= WRAP_SUFFIX_LEN {
            return Err(SignatureError::EncodingError(format!(
                "wrapped signature too short: {} bytes",
                bytes.len()
            )));
        }

        let split = bytes.len() - WRAP_SUFFIX_LEN;
        let prehash = match bytes[bytes.len() - 1] {
            0 => false,
            1 => true,
            other => {
                return Err(SignatureError::EncodingError(format!(
                    "invalid prehash flag {other}"
                )))
            }
        };
        let key_hash = KeyHash::from_slice(&bytes[split..bytes.len() - 1])
            .map_err(|e| SignatureError::EncodingError(e.to_string()))?;

        Ok(WrappedSignature::Key {
            inner: bytes[..split].to_vec(),
            key_hash,
            prehash,
        })
    }

    pub fn wrap(inner: &[u8], key_hash: &KeyHash, prehash: bool) -> Vec<u8> {
        let mut out = inner.to_vec();
        out.extend_from_slice(key_hash.as_bytes());
        out.push(prehash as u8);
        out
    }
}

/// One signature over a Merkle root covering several digests
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleSignature {
    pub proof: Vec<[u8; 32]>,
    pub root: [u8; 32],
    pub root_signature: Vec<u8>,
}

impl MerkleSignature {
    pub const FIELDS: usize = 3;

    pub fn encode(&self) -> Vec<u8> {
        TableWriter::new()
            .list(&self.proof)
            .bytes(&self.root)
            .bytes(&self.root_signature)
            .finish()
    }

    pub fn decode(bytes: &[u8], limits: &DecodeLimits) -> Result<Self, DecodeError> {
        let table = Table::parse(bytes, Self::FIELDS, limits)?;
        let proof = table
            .list(0, limits.max_list_len)?
            .into_iter()
            .enumerate()
            .map(|(i, node)| {
                node.try_into().map_err(|_| DecodeError::Invalid {
                    field: 0,
                    reason: format!("proof node {i} is {} bytes", node.len()),
                })
            })
            .collect::<Result<Vec<[u8; 32]>, DecodeError>>()?;
        Ok(Self {
            proof,
            root: table.fixed(1)?,
            root_signature: table.bytes(2)?.to_vec(),
        })
    }

    /// Check `leaf` is included under the signed root
    pub fn check_leaf(&self, leaf: &[u8; 32]) -> Result<(), SignatureError> {
        if merkle::verify_proof(leaf, &self.proof, &self.root) {
            Ok(())
        } else {
            Err(SignatureError::InvalidMerkleProof)
        }
    }
}

fn signing_key_bytes(private_key_bytes: &[u8]) -> Result<[u8; 32], SignatureError> {
    private_key_bytes.try_into().map_err(|_| {
        SignatureError::EncodingError(format!(
            "private key must be 32 bytes, got {}",
            private_key_bytes.len()
        ))
    })
}

/// Sign a message using secp256k1 with a given private key
///
/// This is a helper function for testing and client-side signing.
pub fn sign_message(message: &[u8], private_key_bytes: &[u8]) -> Result<Binary, SignatureError> {
    use k256::ecdsa::{signature::Signer, Signature, SigningKey};

    let secret = signing_key_bytes(private_key_bytes)?;
    let signing_key = SigningKey::from_bytes(&secret.into())
        .map_err(|e| SignatureError::EncodingError(e.to_string()))?;

    let signature: Signature = signing_key.sign(message);
    Ok(Binary::from(signature.to_bytes().to_vec()))
}

/// Compressed secp256k1 public key for a private key
pub fn derive_public_key(private_key_bytes: &[u8]) -> Result<Binary, SignatureError> {
    use k256::ecdsa::SigningKey;

    let secret = signing_key_bytes(private_key_bytes)?;
    let signing_key = SigningKey::from_bytes(&secret.into())
        .map_err(|e| SignatureError::EncodingError(e.to_string()))?;

    Ok(Binary::from(
        signing_key.verifying_key().to_sec1_bytes().to_vec(),
    ))
}

/// Sign a message with a P-256 key, returning `r || s`
pub fn sign_p256(message: &[u8], private_key_bytes: &[u8]) -> Result<Binary, SignatureError> {
    use p256::ecdsa::{signature::Signer, Signature, SigningKey};

    let secret = signing_key_bytes(private_key_bytes)?;
    let signing_key = SigningKey::from_bytes(&secret.into())
        .map_err(|e| SignatureError::EncodingError(e.to_string()))?;

    let signature: Signature = signing_key.sign(message);
    Ok(Binary::from(signature.to_bytes().to_vec()))
}

/// Compressed P-256 public key for a private key
pub fn derive_p256_public_key(private_key_bytes: &[u8]) -> Result<Binary, SignatureError> {
    use p256::ecdsa::SigningKey;

    let secret = signing_key_bytes(private_key_bytes)?;
    let signing_key = SigningKey::from_bytes(&secret.into())
        .map_err(|e| SignatureError::EncodingError(e.to_string()))?;

    Ok(Binary::from(
        signing_key.verifying_key().to_sec1_bytes().to_vec(),
    ))
}

/// Produce an encoded WebAuthn assertion over `challenge`, as an authenticator would
pub fn sign_webauthn(challenge: &[u8], private_key_bytes: &[u8]) -> Result<Vec<u8>, SignatureError> {
    let mut authenticator_data = Sha256::digest(b"relay.example").to_vec();
    authenticator_data.push(FLAG_USER_PRESENT | 0x04);
    authenticator_data.extend_from_slice(&[0, 0, 0, 1]);

    let prefix = "{\"type\":\"webauthn.get\",";
    let client_data_json = format!(
        "{prefix}\"challenge\":\"{}\",\"origin\":\"https://relay.example\"}}",
        URL_SAFE_NO_PAD.encode(challenge)
    );

    let mut message = authenticator_data.clone();
    message.extend_from_slice(&Sha256::digest(client_data_json.as_bytes()));
    let signature = sign_p256(&message, private_key_bytes)?;

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&signature[..32]);
    s.copy_from_slice(&signature[32..]);

    Ok(WebAuthnAuth {
        authenticator_data,
        client_data_json,
        challenge_index: prefix.len() as u32,
        type_index: 1,
        r,
        s,
    }
    .encode())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: [u8; 32] = [0x42; 32];

    #[test]
    fn test_secp256k1_round_trip() {
        let pk = derive_public_key(&SECRET).unwrap();
        assert_eq!(pk.len(), 33);
        let sig = sign_message(b"digest", &SECRET).unwrap();
        assert!(verify_secp256k1(b"digest", &sig, &pk).is_ok());
        assert_eq!(
            verify_secp256k1(b"other", &sig, &pk),
            Err(SignatureError::VerificationFailed)
        );
    }

    #[test]
    fn test_p256_round_trip() {
        let pk = derive_p256_public_key(&SECRET).unwrap();
        let sig = sign_p256(b"digest", &SECRET).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(verify_p256(b"digest", &sig, &pk).is_ok());
        assert!(verify_p256(b"digest", &sig, &derive_public_key(&SECRET).unwrap()).is_err());
    }

    #[test]
    fn test_webauthn_assertion() {
        let pk = derive_p256_public_key(&SECRET).unwrap();
        let challenge = [7u8; 32];
        let encoded = sign_webauthn(&challenge, &SECRET).unwrap();
        let auth = WebAuthnAuth::decode(&encoded, &DecodeLimits::default()).unwrap();
        assert!(auth.verify(&challenge, &pk).is_ok());
        assert!(matches!(
            auth.verify(&[8u8; 32], &pk),
            Err(SignatureError::WebAuthn(_))
        ));
    }

    #[test]
    fn test_webauthn_requires_user_presence() {
        let pk = derive_p256_public_key(&SECRET).unwrap();
        let challenge = [7u8; 32];
        let encoded = sign_webauthn(&challenge, &SECRET).unwrap();
        let mut auth = WebAuthnAuth::decode(&encoded, &DecodeLimits::default()).unwrap();
        auth.authenticator_data[AUTH_DATA_FLAGS] &= !FLAG_USER_PRESENT;
        assert_eq!(
            auth.verify(&challenge, &pk),
            Err(SignatureError::WebAuthn("user not present".to_string()))
        );
    }

    #[test]
    fn test_webauthn_rejects_wrong_type() {
        let pk = derive_p256_public_key(&SECRET).unwrap();
        let challenge = [7u8; 32];
        let encoded = sign_webauthn(&challenge, &SECRET).unwrap();
        let mut auth = WebAuthnAuth::decode(&encoded, &DecodeLimits::default()).unwrap();
        assert!(auth.client_data_json.contains("webauthn.get"));
        auth.client_data_json = auth.client_data_json.replace("webauthn.get", "webauthn.create");
        assert_eq!(
            auth.verify(&challenge, &pk),
            Err(SignatureError::WebAuthn("unexpected type".to_string()))
        );
    }

    #[test]
    fn test_webauthn_index_out_of_range() {
        let pk = derive_p256_public_key(&SECRET).unwrap();
        let challenge = [7u8; 32];
        let encoded = sign_webauthn(&challenge, &SECRET).unwrap();
        let mut auth = WebAuthnAuth::decode(&encoded, &DecodeLimits::default()).unwrap();
        auth.challenge_index = u32::MAX;
        assert!(auth.verify(&challenge, &pk).is_err());
    }

    #[test]
    fn test_wrapped_signature_parsing() {
        let hash = KeyHash([9u8; 32]);
        let wrapped = WrappedSignature::wrap(&[1u8; 64], &hash, true);
        assert_eq!(wrapped.len(), 97);
        assert_eq!(
            WrappedSignature::parse(&wrapped).unwrap(),
            WrappedSignature::Key {
                inner: vec![1u8; 64],
                key_hash: hash,
                prehash: true,
            }
        );
        assert_eq!(
            WrappedSignature::parse(&[3u8; 64]).unwrap(),
            WrappedSignature::Root(vec![3u8; 64])
        );
        assert_eq!(
            WrappedSignature::parse(&[]),
            Err(SignatureError::MissingSignature)
        );
        assert!(WrappedSignature::parse(&[0u8; 33]).is_err());

        let mut bad_flag = wrapped;
        *bad_flag.last_mut().unwrap() = 2;
        assert!(WrappedSignature::parse(&bad_flag).is_err());
    }

    #[test]
    fn test_merkle_signature_leaf_check() {
        let leaves = [[1u8; 32], [2u8; 32]];
        let tree = merkle::MerkleTree::new(&leaves);
        let sig = MerkleSignature {
            proof: tree.proof(1),
            root: tree.root,
            root_signature: vec![0u8; 64],
        };
        let decoded = MerkleSignature::decode(&sig.encode(), &DecodeLimits::default()).unwrap();
        assert_eq!(decoded, sig);
        assert!(decoded.check_leaf(&[2u8; 32]).is_ok());
        assert_eq!(
            decoded.check_leaf(&[1u8; 32]),
            Err(SignatureError::InvalidMerkleProof)
        );
    }
}
