use super::*;

const SESSION_DURATION: std::time::Duration = std::time::Duration::from_secs(24 * 60 * 60);

/// HS256 signing and verification of session tokens.
pub struct Crypto {
    encoding: jsonwebtoken::EncodingKey,
    decoding: jsonwebtoken::DecodingKey,
}

impl Crypto {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: jsonwebtoken::EncodingKey::from_secret(secret),
            decoding: jsonwebtoken::DecodingKey::from_secret(secret),
        }
    }
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            log::warn!("[auth] JWT_SECRET is not set, tokens are signed with an empty key");
            String::default()
        });
        Self::new(secret.as_bytes())
    }
    pub fn encode(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        jsonwebtoken::encode(&jsonwebtoken::Header::default(), claims, &self.encoding)
    }
    pub fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &jsonwebtoken::Validation::default())
            .map(|data| data.claims)
    }
    pub fn hash(token: &str) -> Vec<u8> {
        use sha2::Digest;
        sha2::Sha256::digest(token.as_bytes()).to_vec()
    }
    pub const fn duration() -> std::time::Duration {
        SESSION_DURATION
    }
}

/// Lowercase hex of `bytes`.
pub fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut s, b| {
        let _ = write!(s, "{:02x}", b);
        s
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sm_core::ID;

    #[test]
    fn tokens_verify_under_their_own_key() {
        let crypto = Crypto::new(b"alpha");
        let claims = Claims::new(ID::default(), ID::default(), "alice".into());
        let token = crypto.encode(&claims).unwrap();
        assert_eq!(crypto.decode(&token).unwrap(), claims);
        assert!(Crypto::new(b"beta").decode(&token).is_err());
        assert!(!claims.expired());
    }
    #[test]
    fn hex_is_lowercase_and_padded() {
        assert_eq!(hex(&[0x00, 0x0f, 0xab]), "000fab");
        assert_eq!(hex(&Crypto::hash("")).len(), 64);
    }
}
