//! Session tokens from the OS CSPRNG.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use murmur_core::session::TokenGenerator;
use murmur_core::session::token::TOKEN_BYTES;
use murmur_types::error::SessionError;
use rand::RngCore;
use rand::rngs::OsRng;

/// `TokenGenerator` producing 256 random bits, base64url without padding
/// (43 characters, cookie-safe).
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRngTokenGenerator;

impl TokenGenerator for OsRngTokenGenerator {
    fn generate(&self) -> Result<String, SessionError> {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| SessionError::Token(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_shape() {
        let token = OsRngTokenGenerator.generate().unwrap();
        assert_eq!(token.len(), 43);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_eq!(URL_SAFE_NO_PAD.decode(&token).unwrap().len(), TOKEN_BYTES);
    }

    #[test]
    fn test_tokens_are_unique() {
        let tokens: HashSet<String> = (0..256)
            .map(|_| OsRngTokenGenerator.generate().unwrap())
            .collect();
        assert_eq!(tokens.len(), 256);
    }
}
