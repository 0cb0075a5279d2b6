//! Identity and remote-signing data types.

use serde::{Deserialize, Serialize};

use crate::blockchain::types::Pubkey;

/// Metadata the provider returns for an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMetadata {
    pub email: String,
    /// Account address in base58, as the provider reports it.
    pub public_address: String,
}

/// An authenticated user. Immutable while the session is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub email: String,
    pub account_address: Pubkey,
}

/// Serialization options passed to the remote signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignOptions {
    pub require_all_signatures: bool,
    pub verify_signatures: bool,
}

impl SignOptions {
    /// Partial-signature mode: the signer adds only its own signature.
    pub const fn partial() -> Self {
        Self {
            require_all_signatures: false,
            verify_signatures: true,
        }
    }
}

/// What the remote signer hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    /// Full wire bytes of the signed transaction.
    pub raw_transaction: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_wire_names() {
        let meta: UserMetadata = serde_json::from_str(
            r#"{"email":"a@b.com","publicAddress":"11111111111111111111111111111111"}"#,
        )
        .unwrap();
        assert_eq!(meta.email, "a@b.com");
        assert_eq!(meta.public_address, "11111111111111111111111111111111");
    }

    #[test]
    fn test_partial_sign_options() {
        let json = serde_json::to_value(SignOptions::partial()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "requireAllSignatures": false, "verifySignatures": true })
        );
    }
}
