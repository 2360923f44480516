//! Stark-curve ECDSA signing for edgeX API authentication.
//!
//! edgeX authenticates private requests with an ECDSA signature over the
//! STARK curve:
//!
//! ```text
//! hash      = Keccak-256(content)
//! signature = StarkECDSA(private_key, hash mod 2^251)
//! header    = hex(r) || hex(s)
//! ```
//!
//! The curve only accepts messages below 2^251, so the top five bits of the
//! 256-bit digest are cleared before signing. [`sign`] and [`verify`] apply
//! the same reduction.

use sha3::{Digest, Keccak256};
use starknet_crypto::{Felt, get_public_key, rfc6979_generate_k};

use crate::error::EdgexError;

/// Number of RFC 6979 seeds tried before giving up on a signature.
const MAX_NONCE_ATTEMPTS: u64 = 8;

/// Mask applied to the most significant byte of a message hash to stay
/// below 2^251.
const TOP_BYTE_MASK: u8 = 0x07;

/// Order of the Stark curve generator, big-endian. Private keys must be below it.
const CURVE_ORDER: [u8; 32] = [
    0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x10,
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xb7, 0x81, 0x12, 0x6d, 0xca, 0xe7, 0xb2, 0x32,
    0x1e, 0x66, 0xa2, 0x41, 0xad, 0xc6, 0x4d, 0x2f,
];

/// A Stark ECDSA signature.
///
/// Both components are 64 lowercase hex digits without a `0x` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarkSignature {
    /// The `r` scalar.
    pub r: String,
    /// The `s` scalar.
    pub s: String,
}

impl StarkSignature {
    /// Value of the signature header: `r` immediately followed by `s`.
    pub fn to_header_value(&self) -> String {
        format!("{}{}", self.r, self.s)
    }

    /// Split a 128 digit header value back into its components.
    pub fn from_header_value(value: &str) -> Result<Self, EdgexError> {
        if value.len() != 128 || !value.is_ascii() {
            return Err(EdgexError::Format(format!(
                "signature must be 128 hex digits, got {}",
                value.len()
            )));
        }
        let (r, s) = value.split_at(64);
        Ok(Self {
            r: r.to_string(),
            s: s.to_string(),
        })
    }
}

/// Keccak-256 of the exact UTF-8 bytes of `message`, as 64 hex digits.
pub fn message_hash(message: &str) -> String {
    hex::encode(Keccak256::digest(message.as_bytes()))
}

/// Sign a message hash with a Stark private key.
///
/// The nonce is derived deterministically (RFC 6979), so signing the same
/// hash with the same key always yields the same signature.
///
/// # Example
///
/// ```rust
/// use edgex_api_client::auth::stark::{message_hash, public_key, sign, verify};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let key = "0x2f8c9e4b1a7d3c5e6f0a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f6";
/// let hash = message_hash("1700000000000GET/api/v1/private/assets/42");
/// let signature = sign(key, &hash)?;
/// assert!(verify(&public_key(key)?, &hash, &signature)?);
/// # Ok(())
/// # }
/// ```
pub fn sign(private_key_hex: &str, message_hash_hex: &str) -> Result<StarkSignature, EdgexError> {
    let private_key = parse_private_key(private_key_hex)?;
    let message = parse_message_hash(message_hash_hex)?;

    let mut seed: Option<Felt> = None;
    for attempt in 1..=MAX_NONCE_ATTEMPTS {
        let k = rfc6979_generate_k(&message, &private_key, seed.as_ref());
        match starknet_crypto::sign(&private_key, &message, &k) {
            Ok(signature) => {
                return Ok(StarkSignature {
                    r: felt_to_hex(&signature.r),
                    s: felt_to_hex(&signature.s),
                });
            }
            Err(err) => {
                tracing::debug!(attempt, "Stark nonce rejected: {:?}", err);
                seed = Some(Felt::from(attempt));
            }
        }
    }

    Err(EdgexError::Format(
        "could not find a valid signing nonce for this message".to_string(),
    ))
}

/// Verify a signature against a public key (the x coordinate, in hex).
///
/// Returns `Ok(false)` for well-formed inputs that do not verify, including
/// out-of-range `r`/`s` values and keys that are not on the curve.
pub fn verify(
    public_key_hex: &str,
    message_hash_hex: &str,
    signature: &StarkSignature,
) -> Result<bool, EdgexError> {
    let public_key = Felt::from_bytes_be(&parse_hex_scalar("public key", public_key_hex)?);
    let message = parse_message_hash(message_hash_hex)?;
    let r = Felt::from_bytes_be(&parse_hex_scalar("signature r", &signature.r)?);
    let s = Felt::from_bytes_be(&parse_hex_scalar("signature s", &signature.s)?);

    match starknet_crypto::verify(&public_key, &message, &r, &s) {
        Ok(valid) => Ok(valid),
        Err(err) => {
            tracing::debug!("Stark signature rejected: {:?}", err);
            Ok(false)
        }
    }
}

/// Derive the public key (x coordinate, 64 hex digits) of a private key.
pub fn public_key(private_key_hex: &str) -> Result<String, EdgexError> {
    let private_key = parse_private_key(private_key_hex)?;
    Ok(felt_to_hex(&get_public_key(&private_key)))
}

fn parse_private_key(input: &str) -> Result<Felt, EdgexError> {
    let bytes = parse_hex_scalar("private key", input)?;
    if bytes.iter().all(|b| *b == 0) {
        return Err(EdgexError::Format("private key must not be zero".to_string()));
    }
    if bytes >= CURVE_ORDER {
        return Err(EdgexError::Format(
            "private key is outside the Stark curve order".to_string(),
        ));
    }
    Ok(Felt::from_bytes_be(&bytes))
}

fn parse_message_hash(input: &str) -> Result<Felt, EdgexError> {
    let mut bytes = parse_hex_scalar("message hash", input)?;
    bytes[0] &= TOP_BYTE_MASK;
    Ok(Felt::from_bytes_be(&bytes))
}

/// Parse up to 64 hex digits (optional `0x`) into a big-endian 32 byte array.
fn parse_hex_scalar(label: &str, input: &str) -> Result<[u8; 32], EdgexError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if digits.is_empty() {
        return Err(EdgexError::Format(format!("{label} is empty")));
    }
    if digits.len() > 64 {
        return Err(EdgexError::Format(format!(
            "{label} has {} hex digits, at most 64 allowed",
            digits.len()
        )));
    }

    let padded = format!("{digits:0>64}");
    let mut bytes = [0u8; 32];
    hex::decode_to_slice(&padded, &mut bytes)
        .map_err(|e| EdgexError::Format(format!("{label} is not valid hex: {e}")))?;
    Ok(bytes)
}

fn felt_to_hex(value: &Felt) -> String {
    hex::encode(value.to_bytes_be())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE_KEY: &str = "0x2f8c9e4b1a7d3c5e6f0a1b2c3d4e5f60718293a4b5c6d7e8f90a1b2c3d4e5f6";

    #[test]
    fn test_message_hash_is_keccak256() {
        // Keccak-256 of the empty string.
        assert_eq!(
            message_hash(""),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(message_hash("1700000000000GET/api/v1/public/time").len(), 64);
    }

    #[test]
    fn test_sign_is_deterministic() {
        let hash = message_hash("1700000000000GET/api/v1/private/assets/42");
        let sig1 = sign(PRIVATE_KEY, &hash).unwrap();
        let sig2 = sign(PRIVATE_KEY, &hash).unwrap();
        assert_eq!(sig1, sig2);
        assert_eq!(sig1.r.len(), 64);
        assert_eq!(sig1.s.len(), 64);
        assert_eq!(sig1.to_header_value().len(), 128);
    }

    #[test]
    fn test_sign_verify_roundtrip() {
        let hash = message_hash("1700000000000POST/api/v1/private/orders");
        let signature = sign(PRIVATE_KEY, &hash).unwrap();
        let public = public_key(PRIVATE_KEY).unwrap();
        assert!(verify(&public, &hash, &signature).unwrap());
    }

    #[test]
    fn test_verify_rejects_other_message() {
        let hash = message_hash("1700000000000GET/api/v1/private/assets/42");
        let other = message_hash("1700000000001GET/api/v1/private/assets/42");
        let signature = sign(PRIVATE_KEY, &hash).unwrap();
        let public = public_key(PRIVATE_KEY).unwrap();
        assert!(!verify(&public, &other, &signature).unwrap());
    }

    #[test]
    fn test_verify_rejects_other_key() {
        let hash = message_hash("content");
        let signature = sign(PRIVATE_KEY, &hash).unwrap();
        let other_public = public_key("0x1").unwrap();
        assert!(!verify(&other_public, &hash, &signature).unwrap());
    }

    #[test]
    fn test_different_messages_give_different_signatures() {
        let sig1 = sign(PRIVATE_KEY, &message_hash("a")).unwrap();
        let sig2 = sign(PRIVATE_KEY, &message_hash("b")).unwrap();
        assert_ne!(sig1, sig2);
    }

    #[test]
    fn test_prefix_is_optional() {
        let hash = message_hash("content");
        let with_prefix = sign(PRIVATE_KEY, &hash).unwrap();
        let without_prefix = sign(PRIVATE_KEY.trim_start_matches("0x"), &format!("0x{hash}")).unwrap();
        assert_eq!(with_prefix, without_prefix);
    }

    #[test]
    fn test_malformed_hex_is_format_error() {
        let err = sign("0xnot-hex", &message_hash("content")).unwrap_err();
        assert!(matches!(err, EdgexError::Format(_)));

        let err = sign(PRIVATE_KEY, "zz").unwrap_err();
        assert!(matches!(err, EdgexError::Format(_)));

        let too_long = "1".repeat(65);
        let err = sign(PRIVATE_KEY, &too_long).unwrap_err();
        assert!(matches!(err, EdgexError::Format(_)));
    }

    #[test]
    fn test_zero_private_key_is_format_error() {
        let err = sign("0x0", &message_hash("content")).unwrap_err();
        assert!(matches!(err, EdgexError::Format(_)));
    }

    #[test]
    fn test_private_key_range_follows_curve_order() {
        let hash = message_hash("content");

        let largest = "0x0800000000000010ffffffffffffffffb781126dcae7b2321e66a241adc64d2e";
        let signature = sign(largest, &hash).unwrap();
        assert!(verify(&public_key(largest).unwrap(), &hash, &signature).unwrap());
        // n - 1 is the negation of 1, so both share an x coordinate.
        assert_eq!(public_key(largest).unwrap(), public_key("0x1").unwrap());

        let top_byte_eight = "0x0800000000000000000000000000000000000000000000000000000000000001";
        let signature = sign(top_byte_eight, &hash).unwrap();
        assert!(verify(&public_key(top_byte_eight).unwrap(), &hash, &signature).unwrap());

        for out_of_range in [
            "0x0800000000000010ffffffffffffffffb781126dcae7b2321e66a241adc64d2f",
            "0x0800000000000011000000000000000000000000000000000000000000000000",
            "0xffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
        ] {
            let err = public_key(out_of_range).unwrap_err();
            assert!(matches!(err, EdgexError::Format(_)));
        }
    }

    #[test]
    fn test_header_value_roundtrip() {
        let signature = sign(PRIVATE_KEY, &message_hash("content")).unwrap();
        let parsed = StarkSignature::from_header_value(&signature.to_header_value()).unwrap();
        assert_eq!(parsed, signature);
        assert!(StarkSignature::from_header_value("abc").is_err());
    }
}
