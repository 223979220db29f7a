// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Approve-and-call payload decoding.
//!
//! When a sender approves the engine through the token's approve-and-call
//! entry point, the token forwards an opaque byte payload. Amount and sender
//! are already known from the approval; the payload only has to name the
//! receiver.
//!
//! ## Layout
//!
//! ```text
//! [ 0..32)  header word (ABI offset), opaque
//! [32..64)  header word (ABI length), opaque
//! [64..96)  receiver, left-padded to 32 bytes (12 zero bytes + 20 address bytes)
//! [96.. )   ignored
//! ```

use alloy::primitives::U256;

use crate::error::WireError;
use crate::models::Account;

/// Size of one ABI word.
pub const WORD: usize = 32;

/// Minimum payload length: two header words plus the receiver word.
pub const MIN_PAYLOAD_LEN: usize = 3 * WORD;

/// Header words written by [`encode_receiver`].
const HEADER_OFFSET: u64 = 0x80;
const HEADER_LENGTH: u64 = 0x40;

const ADDRESS_LEN: usize = 20;
const PADDING_LEN: usize = WORD - ADDRESS_LEN;

/// Extract the receiver from an approve-and-call payload.
pub fn decode_receiver(payload: &[u8]) -> Result<Account, WireError> {
    if payload.len() < MIN_PAYLOAD_LEN {
        return Err(WireError::MalformedPayload(format!(
            "payload is {} bytes, expected at least {MIN_PAYLOAD_LEN}",
            payload.len()
        )));
    }

    let offset = U256::from_be_slice(&payload[..WORD]);
    let length = U256::from_be_slice(&payload[WORD..2 * WORD]);
    tracing::trace!(%offset, %length, "Decoding approve-and-call payload");

    let word = &payload[2 * WORD..3 * WORD];
    let (padding, address) = word.split_at(PADDING_LEN);
    if padding.iter().any(|b| *b != 0) {
        return Err(WireError::MalformedPayload(
            "receiver word has non-zero padding".to_string(),
        ));
    }

    let mut bytes = [0u8; ADDRESS_LEN];
    bytes.copy_from_slice(address);
    Ok(Account::from_bytes(bytes))
}

/// Build the canonical payload naming `receiver`.
pub fn encode_receiver(receiver: &Account) -> Vec<u8> {
    let mut payload = Vec::with_capacity(MIN_PAYLOAD_LEN);
    payload.extend_from_slice(&U256::from(HEADER_OFFSET).to_be_bytes::<WORD>());
    payload.extend_from_slice(&U256::from(HEADER_LENGTH).to_be_bytes::<WORD>());
    payload.extend_from_slice(&[0u8; PADDING_LEN]);
    payload.extend_from_slice(receiver.as_slice());
    payload
}

/// Parse a hex payload (with or without `0x`).
pub fn payload_from_hex(raw: &str) -> Result<Vec<u8>, WireError> {
    alloy::hex::decode(raw.trim())
        .map_err(|e| WireError::MalformedPayload(format!("payload is not valid hex: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receiver() -> Account {
        "0x742d35cc6634c0532925a3b844bc9e7595f4ab12".parse().unwrap()
    }

    #[test]
    fn decodes_fixture_payload() {
        // Same shape the token fixtures build: 0x80, 0x40, padded receiver.
        let hex = concat!(
            "0000000000000000000000000000000000000000000000000000000000000080",
            "0000000000000000000000000000000000000000000000000000000000000040",
            "000000000000000000000000742d35cc6634c0532925a3b844bc9e7595f4ab12",
        );
        let payload = payload_from_hex(&format!("0x{hex}")).unwrap();

        assert_eq!(decode_receiver(&payload).unwrap(), receiver());
        assert_eq!(encode_receiver(&receiver()), payload);
    }

    #[test]
    fn header_values_are_opaque() {
        let mut payload = encode_receiver(&receiver());
        payload[..WORD].fill(0xff);
        payload[WORD..2 * WORD].fill(0x00);
        assert_eq!(decode_receiver(&payload).unwrap(), receiver());
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut payload = encode_receiver(&receiver());
        payload.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode_receiver(&payload).unwrap(), receiver());
    }

    #[test]
    fn short_payload_is_malformed() {
        let payload = encode_receiver(&receiver());
        for len in [0, WORD, 2 * WORD, MIN_PAYLOAD_LEN - 1] {
            let err = decode_receiver(&payload[..len]).unwrap_err();
            assert!(matches!(err, WireError::MalformedPayload(_)), "len {len}");
        }
    }

    #[test]
    fn dirty_padding_is_malformed() {
        let mut payload = encode_receiver(&receiver());
        payload[2 * WORD] = 0x01;
        assert!(matches!(
            decode_receiver(&payload),
            Err(WireError::MalformedPayload(_))
        ));
    }

    #[test]
    fn invalid_hex_is_malformed() {
        assert!(matches!(
            payload_from_hex("0xzz"),
            Err(WireError::MalformedPayload(_))
        ));
    }
}
