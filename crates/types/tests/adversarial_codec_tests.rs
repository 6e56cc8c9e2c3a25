/// Adversarial tests for the intent wire format
///
/// These tests feed the decoder hostile input:
/// - Corrupted offsets and lengths in every position
/// - Truncated and extended payloads
/// - Oversized variable-length fields (settler context, payment signature)

use cosmwasm_std::Binary;
use relay_intents_types::intent::field;
use relay_intents_types::{
    Call, DecodeError, DecodeLimits, Intent, Nonce, SequenceKey, SignedCall, Transfer,
};

fn sample_intent() -> Intent {
    let pre_call = SignedCall::new(
        None,
        &[Call::new("cosmos1user", 0, b"{}".to_vec())],
        Nonce::new(SequenceKey::from_u64(1), 0),
    )
    .with_signature(vec![7u8; 64]);

    let mut intent = Intent::builder("cosmos1user")
        .calls(&[Call::new("cosmos1dex", 5, b"{\"swap\":{}}".to_vec())])
        .nonce(Nonce::new(SequenceKey::ZERO, 0))
        .payment("uatom", 1, 2)
        .pre_call(pre_call)
        .fund_transfer(Transfer::new("uatom", 10))
        .settler("cosmos1settler", b"[1,2]".to_vec())
        .build();
    intent.signature = Binary::from(vec![1u8; 64]);
    intent.payment_signature = Binary::from(vec![2u8; 64]);
    intent
}

/// Byte offset of each field's length prefix, read from the header
fn segment_starts(encoded: &[u8]) -> Vec<usize> {
    (0..field::COUNT)
        .map(|i| {
            let at = 2 + 4 * i;
            u32::from_be_bytes(encoded[at..at + 4].try_into().unwrap()) as usize
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// HEADER CORRUPTION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_every_offset_corruption_rejected() {
    let encoded = sample_intent().encode();
    let header_end = 2 + 4 * field::COUNT;
    for i in 2..header_end {
        let mut corrupted = encoded.clone();
        corrupted[i] = corrupted[i].wrapping_add(1);
        assert!(
            Intent::decode(&corrupted, &DecodeLimits::default()).is_err(),
            "offset byte {i} corruption decoded"
        );
    }
}

#[test]
fn test_every_length_prefix_corruption_rejected() {
    let encoded = sample_intent().encode();
    for (field_index, start) in segment_starts(&encoded).into_iter().enumerate() {
        for byte in start..start + 4 {
            let mut corrupted = encoded.clone();
            corrupted[byte] ^= 0x10;
            assert!(
                Intent::decode(&corrupted, &DecodeLimits::default()).is_err(),
                "length corruption in field {field_index} decoded"
            );
        }
    }
}

#[test]
fn test_every_truncation_rejected() {
    let encoded = sample_intent().encode();
    for len in 0..encoded.len() {
        assert!(Intent::decode(&encoded[..len], &DecodeLimits::default()).is_err());
    }
}

#[test]
fn test_appended_bytes_rejected() {
    let mut encoded = sample_intent().encode();
    encoded.extend_from_slice(&[0u8; 3]);
    assert_eq!(
        Intent::decode(&encoded, &DecodeLimits::default()).unwrap_err(),
        DecodeError::TrailingBytes(3)
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// VARIABLE-LENGTH FIELD TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_settler_context_length_corruption_rejected() {
    let encoded = sample_intent().encode();
    let start = segment_starts(&encoded)[field::SETTLER_CONTEXT];
    for delta in [1u32, 2, 0x100, 0xffff_0000] {
        let mut corrupted = encoded.clone();
        let len = u32::from_be_bytes(corrupted[start..start + 4].try_into().unwrap());
        corrupted[start..start + 4].copy_from_slice(&len.wrapping_add(delta).to_be_bytes());
        assert!(Intent::decode(&corrupted, &DecodeLimits::default()).is_err());
    }
}

#[test]
fn test_payment_signature_length_corruption_rejected() {
    let encoded = sample_intent().encode();
    let start = segment_starts(&encoded)[field::PAYMENT_SIGNATURE];
    for delta in [1u32, 63, 0x8000_0000] {
        let mut corrupted = encoded.clone();
        let len = u32::from_be_bytes(corrupted[start..start + 4].try_into().unwrap());
        corrupted[start..start + 4].copy_from_slice(&len.wrapping_sub(delta).to_be_bytes());
        assert!(Intent::decode(&corrupted, &DecodeLimits::default()).is_err());
    }
}

#[test]
fn test_oversized_settler_context_rejected() {
    let mut intent = sample_intent();
    intent.settler_context = Binary::from(vec![0u8; 2048]);
    let limits = DecodeLimits {
        max_field_len: 1024,
        ..DecodeLimits::default()
    };
    assert!(matches!(
        Intent::decode(&intent.encode(), &limits),
        Err(DecodeError::FieldTooLarge {
            field: field::SETTLER_CONTEXT,
            ..
        })
    ));
}

#[test]
fn test_oversized_address_rejected() {
    let mut intent = sample_intent();
    intent.payer = Some(cosmwasm_std::Addr::unchecked("x".repeat(200)));
    assert!(matches!(
        Intent::decode(&intent.encode(), &DecodeLimits::default()),
        Err(DecodeError::FieldTooLarge {
            field: field::PAYER,
            ..
        })
    ));
}

#[test]
fn test_invalid_multichain_flag_rejected() {
    let encoded = sample_intent().encode();
    let start = segment_starts(&encoded)[field::IS_MULTICHAIN];
    let mut corrupted = encoded;
    corrupted[start + 4] = 7;
    assert_eq!(
        Intent::decode(&corrupted, &DecodeLimits::default()).unwrap_err(),
        DecodeError::InvalidBool {
            field: field::IS_MULTICHAIN,
            value: 7
        }
    );
}

#[test]
fn test_nested_pre_call_corruption_rejected() {
    let encoded = sample_intent().encode();
    let start = segment_starts(&encoded)[field::PRE_CALLS];
    // list header: u32 count, u32 offset, then the pre-call table starting with its version byte
    let pre_call_version = start + 4 + 4 + 4 + 4;
    let mut corrupted = encoded;
    corrupted[pre_call_version] = 9;
    assert!(matches!(
        Intent::decode(&corrupted, &DecodeLimits::default()),
        Err(DecodeError::Invalid {
            field: field::PRE_CALLS,
            ..
        })
    ));
}
