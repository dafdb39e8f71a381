/*!
NFT metadata-spec detection

Classifies an asset's metadata scheme from its registered URL, display name
and reserve address. ARC19 is attempted first since it rewrites the URL;
assets matching no supported scheme are rejected and never tracked.
*/

use crate::error::SpecError;
use crate::types::{Address, AssetId};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod template;

/// Supported metadata schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NftSpec {
    Arc3,
    Arc19,
    Arc69,
    Arc72,
}

impl fmt::Display for NftSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NftSpec::Arc3 => write!(f, "arc3"),
            NftSpec::Arc19 => write!(f, "arc19"),
            NftSpec::Arc69 => write!(f, "arc69"),
            NftSpec::Arc72 => write!(f, "arc72"),
        }
    }
}

/// ARC3 marker rules: name equals the marker, name carries the suffix
/// marker, or the URL ends with the fragment marker
fn is_arc3(url: &str, name: &str) -> bool {
    name == "arc3" || name.ends_with("@arc3") || url.ends_with("#arc3")
}

/// Classify an asset and produce its canonical metadata URL
pub fn classify(
    asset_id: AssetId,
    url: &str,
    name: &str,
    reserve: &Address,
) -> Result<(NftSpec, String), SpecError> {
    if let Some(parsed) = template::reconstruct(url, reserve)? {
        return Ok((NftSpec::Arc19, parsed));
    }
    if is_arc3(url, name) {
        return Ok((NftSpec::Arc3, url.to_string()));
    }
    Err(SpecError::Unrecognized { asset_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arc3_markers() {
        assert!(is_arc3("ipfs://meta", "arc3"));
        assert!(is_arc3("ipfs://meta", "foo@arc3"));
        assert!(is_arc3("ipfs://meta#arc3", "foo"));
        assert!(!is_arc3("ipfs://meta", "foo"));
        assert!(!is_arc3("ipfs://meta", "arc3plus"));
    }

    #[test]
    fn test_classify_arc3_keeps_url() {
        let (spec, url) = classify(42, "ipfs://meta#arc3", "My NFT", &Address([1u8; 32])).unwrap();
        assert_eq!(spec, NftSpec::Arc3);
        assert_eq!(url, "ipfs://meta#arc3");
    }

    #[test]
    fn test_classify_arc19_rewrites_url() {
        let (spec, url) = classify(
            42,
            "template-ipfs://{ipfscid:0:dag-pb:reserve:sha2-256}",
            "My NFT",
            &Address([1u8; 32]),
        )
        .unwrap();
        assert_eq!(spec, NftSpec::Arc19);
        assert_eq!(url, "ipfs://QmNQa1FSTXNHmrjjfgUW3Px3Vkke4oKiFWdigWkYSux2Pi");
    }

    #[test]
    fn test_classify_prefers_arc19() {
        // an arc3-marked name does not shadow a matching template URL
        let (spec, _) = classify(
            42,
            "template-ipfs://{ipfscid:1:raw:reserve:sha2-256}",
            "foo@arc3",
            &Address([1u8; 32]),
        )
        .unwrap();
        assert_eq!(spec, NftSpec::Arc19);
    }

    #[test]
    fn test_classify_rejects_unknown() {
        let err = classify(42, "https://example.com/meta.json", "foo", &Address([1u8; 32]))
            .unwrap_err();
        assert_eq!(err, SpecError::Unrecognized { asset_id: 42 });
    }

    #[test]
    fn test_template_errors_propagate() {
        let err = classify(
            42,
            "template-ipfs://{ipfscid:9:nope}",
            "arc3",
            &Address([1u8; 32]),
        )
        .unwrap_err();
        assert_eq!(err, SpecError::UnknownTemplate);
    }
}
