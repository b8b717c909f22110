use super::Authenticator;
use super::Claims;
use super::Member;

const ACCESS_TOKEN_DURATION: std::time::Duration = std::time::Duration::from_secs(15 * 60);

/// JWT signing and verification (HS256).
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
        Self::new(
            std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| String::default())
                .as_bytes(),
        )
    }
    pub fn encode(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        jsonwebtoken::encode(&jsonwebtoken::Header::default(), claims, &self.encoding)
    }
    pub fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &jsonwebtoken::Validation::default())
            .map(|data| data.claims)
    }
    pub const fn duration() -> std::time::Duration {
        ACCESS_TOKEN_DURATION
    }
}

#[async_trait::async_trait]
impl Authenticator for Crypto {
    async fn authenticate(&self, credential: &str) -> Option<Member> {
        self.decode(credential)
            .ok()
            .filter(|claims| !claims.expired())
            .map(|claims| claims.member())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riverboat_core::ID;
    use riverboat_core::Unique;

    #[tokio::test]
    async fn token_roundtrip() {
        let crypto = Crypto::new(b"table-test-secret");
        let id = ID::default();
        let claims = Claims::new(id, "river".into());
        let token = crypto.encode(&claims).unwrap();
        let member = crypto.authenticate(&token).await.unwrap();
        assert_eq!(member.id(), id);
        assert_eq!(member.username(), "river");
    }

    #[tokio::test]
    async fn garbage_rejected() {
        let crypto = Crypto::new(b"table-test-secret");
        assert!(crypto.authenticate("not-a-token").await.is_none());
    }

    #[tokio::test]
    async fn wrong_key_rejected() {
        let signer = Crypto::new(b"one-secret");
        let verifier = Crypto::new(b"another-secret");
        let token = signer
            .encode(&Claims::new(ID::default(), "river".into()))
            .unwrap();
        assert!(verifier.authenticate(&token).await.is_none());
    }
}
