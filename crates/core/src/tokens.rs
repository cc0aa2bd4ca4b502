//! Refresh-token and personal-access-token material.
//!
//! Secrets are generated here and only their SHA-256 digests leave the
//! process boundary into storage. Plaintext is handed to the client once.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;

use crate::hashing::sha256_hex;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fixed literal prefix that marks a bearer credential as a PAT.
pub const PAT_PREFIX: &str = "mcp_pat_";

/// Number of random alphanumeric characters after [`PAT_PREFIX`].
pub const PAT_SECRET_LENGTH: usize = 40;

/// Number of secret characters kept as a non-secret display prefix.
pub const PAT_DISPLAY_PREFIX_LENGTH: usize = 8;

/// Maximum length of a PAT's human-chosen name.
pub const MAX_PAT_NAME_LENGTH: usize = 100;

/// Random bytes in a refresh token before base64url encoding.
pub const REFRESH_TOKEN_BYTES: usize = 32;

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// A freshly minted secret: plaintext for the client, digest for storage.
#[derive(Debug, Clone)]
pub struct GeneratedToken {
    pub plaintext: String,
    /// Non-secret characters shown in listings. Empty for refresh tokens.
    pub display_prefix: String,
    pub hash: String,
}

/// Generate a new personal access token (`mcp_pat_` + 40 alphanumerics).
pub fn generate_pat() -> GeneratedToken {
    let secret: String = rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(PAT_SECRET_LENGTH)
        .map(char::from)
        .collect();

    let display_prefix = secret[..PAT_DISPLAY_PREFIX_LENGTH].to_string();
    let plaintext = format!("{PAT_PREFIX}{secret}");
    let hash = hash_token(&plaintext);

    GeneratedToken {
        plaintext,
        display_prefix,
        hash,
    }
}

/// Generate an opaque refresh token from 32 random bytes, base64url encoded
/// without padding.
pub fn generate_refresh_token() -> GeneratedToken {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rand::rng().fill(&mut bytes);

    let plaintext = URL_SAFE_NO_PAD.encode(bytes);
    let hash = hash_token(&plaintext);

    GeneratedToken {
        plaintext,
        display_prefix: String::new(),
        hash,
    }
}

// ---------------------------------------------------------------------------
// Inspection
// ---------------------------------------------------------------------------

/// Digest used to look up a presented token.
pub fn hash_token(token: &str) -> String {
    sha256_hex(token.as_bytes())
}

/// Whether a raw bearer value should take the PAT authentication path.
pub fn is_pat(token: &str) -> bool {
    token.starts_with(PAT_PREFIX)
}

/// Display prefix of a presented PAT, safe to log. `None` for non-PATs.
pub fn pat_display_prefix(token: &str) -> Option<&str> {
    let secret = token.strip_prefix(PAT_PREFIX)?;
    secret.get(..PAT_DISPLAY_PREFIX_LENGTH.min(secret.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pat_shape() {
        let pat = generate_pat();
        assert!(pat.plaintext.starts_with(PAT_PREFIX));
        assert_eq!(pat.plaintext.len(), PAT_PREFIX.len() + PAT_SECRET_LENGTH);
        assert!(pat.plaintext[PAT_PREFIX.len()..]
            .chars()
            .all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(pat.display_prefix.len(), PAT_DISPLAY_PREFIX_LENGTH);
        assert_eq!(pat_display_prefix(&pat.plaintext), Some(pat.display_prefix.as_str()));
        assert_eq!(pat.hash, hash_token(&pat.plaintext));
    }

    #[test]
    fn refresh_token_is_43_base64url_chars() {
        let token = generate_refresh_token();
        assert_eq!(token.plaintext.len(), 43);
        assert!(token
            .plaintext
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(
            URL_SAFE_NO_PAD.decode(&token.plaintext).unwrap().len(),
            REFRESH_TOKEN_BYTES
        );
        assert!(!is_pat(&token.plaintext));
        assert_eq!(token.hash.len(), 64);
    }

    #[test]
    fn consecutive_tokens_differ() {
        let a = generate_refresh_token();
        let b = generate_refresh_token();
        assert_ne!(a.plaintext, b.plaintext);
        assert_ne!(a.hash, b.hash);
        assert_ne!(generate_pat().plaintext, generate_pat().plaintext);
    }

    #[test]
    fn pat_detection_is_prefix_based() {
        assert!(is_pat("mcp_pat_abc"));
        assert!(!is_pat("eyJhbGciOiJIUzI1NiJ9.x.y"));
        assert_eq!(pat_display_prefix("mcp_pat_abc"), Some("abc"));
        assert_eq!(pat_display_prefix("Bearer x"), None);
    }
}
