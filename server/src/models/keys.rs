use serde::{Deserialize, Serialize};

/// A saved API key as shown to the client: alias plus a masked preview,
/// never the secret itself.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SavedKey {
    pub id: String,
    pub alias: String,
    pub masked: String,
}

/// Secret material kept server-side only.
#[derive(Debug, Clone)]
pub struct StoredKey {
    pub alias: String,
    pub secret: String,
}

/// How the client wants a request authenticated: a previously saved key
/// (`mode: "saved"`, by id) or a freshly typed one (`mode: "new"`, optionally
/// saved under an alias).
#[derive(Debug, Deserialize, Clone)]
pub struct KeyPayload {
    pub mode: String,
    pub id: Option<String>,
    pub key: Option<String>,
    pub alias: Option<String>,
}

/// Masked preview of a secret: first four and last four characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_shows_head_and_tail_only() {
        assert_eq!(mask_secret("AIzaSyExample3x9z"), "AIza...3x9z");
    }

    #[test]
    fn short_secrets_are_fully_hidden() {
        assert_eq!(mask_secret("curta"), "****");
        assert_eq!(mask_secret("12345678"), "****");
    }
}
