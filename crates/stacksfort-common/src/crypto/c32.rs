//! Crockford-style base-32 (c32) and c32check encoding used by Stacks addresses
//!
//! Bytes are packed from the least significant end, so leading zero bytes are
//! carried explicitly as leading `'0'` characters.

use sha2::{Digest, Sha256};

use crate::error::AddressError;

/// c32 alphabet (no I, L, O, U)
pub const C32_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Length of the c32check checksum in bytes
pub const CHECKSUM_LENGTH: usize = 4;

/// Encode bytes as c32
pub fn encode(data: &[u8]) -> String {
    let mut out: Vec<u8> = Vec::with_capacity(data.len() * 8 / 5 + 1);
    let mut carry: u16 = 0;
    let mut carry_bits: u32 = 0;

    for &byte in data.iter().rev() {
        carry |= (byte as u16) << carry_bits;
        carry_bits += 8;
        while carry_bits >= 5 {
            out.push(C32_ALPHABET[(carry & 0x1f) as usize]);
            carry >>= 5;
            carry_bits -= 5;
        }
    }
    if carry_bits > 0 {
        out.push(C32_ALPHABET[(carry & 0x1f) as usize]);
    }

    // `out` is little-endian here: trailing zeros are the leading digits
    while out.last() == Some(&b'0') {
        out.pop();
    }
    for _ in data.iter().take_while(|b| **b == 0) {
        out.push(b'0');
    }

    out.reverse();
    out.into_iter().map(char::from).collect()
}

/// Decode c32 text. Only canonical upper-case digits are accepted.
pub fn decode(input: &str) -> Result<Vec<u8>, AddressError> {
    let digits = input
        .chars()
        .map(digit_value)
        .collect::<Result<Vec<u8>, AddressError>>()?;

    let mut out: Vec<u8> = Vec::with_capacity(digits.len() * 5 / 8 + 1);
    let mut carry: u16 = 0;
    let mut carry_bits: u32 = 0;

    for &digit in digits.iter().rev() {
        carry |= (digit as u16) << carry_bits;
        carry_bits += 5;
        if carry_bits >= 8 {
            out.push((carry & 0xff) as u8);
            carry >>= 8;
            carry_bits -= 8;
        }
    }
    if carry_bits > 0 {
        out.push(carry as u8);
    }

    while out.last() == Some(&0) {
        out.pop();
    }
    for _ in digits.iter().take_while(|d| **d == 0) {
        out.push(0);
    }

    out.reverse();
    Ok(out)
}

/// Encode `data` under `version` with a 4-byte double-SHA-256 checksum.
///
/// The version is rendered as a single leading c32 digit, so it must be < 32.
pub fn check_encode(version: u8, data: &[u8]) -> Result<String, AddressError> {
    if version >= 32 {
        return Err(AddressError::UnsupportedVersion(version));
    }

    let mut payload = data.to_vec();
    payload.extend_from_slice(&checksum(version, data));

    let mut out = String::with_capacity(payload.len() * 8 / 5 + 2);
    out.push(C32_ALPHABET[version as usize] as char);
    out.push_str(&encode(&payload));
    Ok(out)
}

/// Decode c32check text into `(version, data)`, verifying the checksum.
pub fn check_decode(input: &str) -> Result<(u8, Vec<u8>), AddressError> {
    let mut chars = input.chars();
    let version_char = chars
        .next()
        .ok_or_else(|| AddressError::Invalid("empty c32check string".to_string()))?;
    let version = digit_value(version_char)?;

    let payload = decode(chars.as_str())?;
    if payload.len() < CHECKSUM_LENGTH {
        return Err(AddressError::Invalid(format!(
            "c32check payload too short: {} bytes",
            payload.len()
        )));
    }

    let (data, expected) = payload.split_at(payload.len() - CHECKSUM_LENGTH);
    if checksum(version, data) != expected {
        return Err(AddressError::ChecksumMismatch(input.to_string()));
    }

    Ok((version, data.to_vec()))
}

fn checksum(version: u8, data: &[u8]) -> [u8; CHECKSUM_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update([version]);
    hasher.update(data);
    let once = hasher.finalize();
    let twice = Sha256::digest(once);

    let mut out = [0u8; CHECKSUM_LENGTH];
    out.copy_from_slice(&twice[..CHECKSUM_LENGTH]);
    out
}

fn digit_value(c: char) -> Result<u8, AddressError> {
    C32_ALPHABET
        .iter()
        .position(|&a| a as char == c)
        .map(|p| p as u8)
        .ok_or(AddressError::InvalidCharacter(c))
}
