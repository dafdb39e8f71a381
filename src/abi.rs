/*!
ABI helpers for destination-chain application calls

Method selectors are the first four bytes of the SHA-512/256 digest of the
method signature; logged return values are prefixed with the digest of
`return`. Arguments are encoded big-endian with fixed-width byte arrays
zero-padded on the right.
*/

use crate::error::ProtocolError;
use crate::types::Address;
use sha2::{Digest, Sha512_256};

/// Prefix carried by logged ABI return values (`sha512_256("return")[..4]`)
pub const RETURN_PREFIX: [u8; 4] = [0x15, 0x1f, 0x7c, 0x75];

/// ARC-72 ownership query
pub const OWNER_OF_SIGNATURE: &str = "arc72_ownerOf(uint256)address";

/// Bridge mint entrypoint
pub const MINT_TO_SIGNATURE: &str =
    "mintTo(address,byte[256],uint256,byte[256],uint64)uint256";

/// Width of the fixed byte-array arguments in the mint signature
pub const FIXED_ARG_WIDTH: usize = 256;

/// Compute the 4-byte selector for a method signature
pub fn method_selector(signature: &str) -> [u8; 4] {
    let digest = Sha512_256::digest(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&digest[..4]);
    selector
}

/// Encode a uint64 argument
pub fn encode_uint64(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Encode a uint256 argument from a native id
pub fn encode_uint256(value: u64) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[24..].copy_from_slice(&value.to_be_bytes());
    out
}

/// Encode an address argument
pub fn encode_address(address: &Address) -> [u8; 32] {
    *address.as_bytes()
}

/// Encode a fixed-width byte array, zero-padded on the right
pub fn encode_fixed_bytes(data: &[u8], width: usize) -> Result<Vec<u8>, ProtocolError> {
    if data.len() > width {
        return Err(ProtocolError::OversizedArgument {
            len: data.len(),
            width,
        });
    }
    let mut out = vec![0u8; width];
    out[..data.len()].copy_from_slice(data);
    Ok(out)
}

/// Decode an address returned through a simulation log
///
/// The log is the return prefix followed by the 32-byte owner address; the
/// all-zero address means the token does not exist.
pub fn decode_address_return(log: &[u8]) -> Result<Address, ProtocolError> {
    if log.len() != RETURN_PREFIX.len() + 32 || log[..4] != RETURN_PREFIX {
        return Err(ProtocolError::MalformedReturn);
    }
    let mut key = [0u8; 32];
    key.copy_from_slice(&log[4..]);
    Ok(Address(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_selectors() {
        assert_eq!(hex::encode(method_selector(OWNER_OF_SIGNATURE)), "79096a14");
        assert_eq!(hex::encode(method_selector(MINT_TO_SIGNATURE)), "263a44d3");
        assert_eq!(hex::encode(method_selector("return")), "151f7c75");
    }

    #[test]
    fn test_uint_encoding() {
        assert_eq!(encode_uint64(42)[7], 42);
        let wide = encode_uint256(42);
        assert_eq!(wide[31], 42);
        assert!(wide[..24].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_fixed_bytes_padding() {
        let encoded = encode_fixed_bytes(b"ipfs://x", 16).unwrap();
        assert_eq!(encoded.len(), 16);
        assert_eq!(&encoded[..8], b"ipfs://x");
        assert!(encoded[8..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_fixed_bytes_overflow() {
        let err = encode_fixed_bytes(&[1u8; 20], 16).unwrap_err();
        assert!(matches!(err, ProtocolError::OversizedArgument { len: 20, width: 16 }));
    }

    #[test]
    fn test_decode_owner_log() {
        let mut log = RETURN_PREFIX.to_vec();
        log.extend_from_slice(&[0u8; 32]);
        assert_eq!(decode_address_return(&log).unwrap(), Address::ZERO);

        let mut owned = RETURN_PREFIX.to_vec();
        owned.extend_from_slice(&[7u8; 32]);
        assert_eq!(decode_address_return(&owned).unwrap(), Address([7u8; 32]));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_address_return(&[0u8; 36]).is_err());
        assert!(decode_address_return(&RETURN_PREFIX).is_err());
    }
}
