//! Client-held cart for anonymous sessions.
//!
//! The staged lines travel as an HS256-signed JWT in a cookie, so the server
//! keeps no state for visitors who have not logged in yet.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::cart::{aggregate_staged, StagedCartItem};
use crate::domain::errors::DomainError;

pub const STAGED_CART_COOKIE: &str = "staged_cart";

pub const STAGED_CART_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
struct StagedCartClaims {
    items: Vec<StagedCartItem>,
    iat: i64,
    exp: i64,
}

#[derive(Clone)]
pub struct StagedCartCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl StagedCartCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self::with_ttl(secret, Duration::days(STAGED_CART_TTL_DAYS))
    }

    pub fn with_ttl(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn encode(&self, items: &[StagedCartItem]) -> Result<String, DomainError> {
        let now = Utc::now();
        let claims = StagedCartClaims {
            items: items.to_vec(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| DomainError::Internal(format!("failed to sign staged cart: {e}")))
    }

    /// Fails on a bad signature, an expired token, or malformed content.
    pub fn decode(&self, token: &str) -> Result<Vec<StagedCartItem>, DomainError> {
        decode::<StagedCartClaims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims.items)
            .map_err(|e| DomainError::invalid(format!("staged cart token rejected: {e}")))
    }

    /// Adds a line to the staged cart carried by `token` and returns the
    /// re-signed token. A missing or unreadable token starts an empty cart.
    pub fn add_item(
        &self,
        token: Option<&str>,
        item: StagedCartItem,
    ) -> Result<(String, Vec<StagedCartItem>), DomainError> {
        let mut items = match token {
            Some(token) => self.decode(token).unwrap_or_else(|e| {
                log::warn!("Discarding staged cart: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };
        items.push(item);
        let items = aggregate_staged(&items)?;
        let token = self.encode(&items)?;
        Ok((token, items))
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    const SECRET: &[u8] = b"staged-cart-test-secret";

    fn line(product_id: Uuid, quantity: i32) -> StagedCartItem {
        StagedCartItem {
            product_id,
            quantity,
        }
    }

    #[test]
    fn decodes_what_it_encodes() {
        let codec = StagedCartCodec::new(SECRET);
        let items = vec![line(Uuid::new_v4(), 2)];

        let token = codec.encode(&items).expect("encode");

        assert_eq!(codec.decode(&token).expect("decode"), items);
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let token = StagedCartCodec::new(b"other-secret")
            .encode(&[line(Uuid::new_v4(), 1)])
            .expect("encode");

        let err = StagedCartCodec::new(SECRET)
            .decode(&token)
            .expect_err("wrong key");

        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let codec = StagedCartCodec::with_ttl(SECRET, Duration::hours(-2));
        let token = codec.encode(&[line(Uuid::new_v4(), 1)]).expect("encode");

        assert!(codec.decode(&token).is_err());
    }

    #[test]
    fn adding_an_existing_product_sums_the_quantity() {
        let codec = StagedCartCodec::new(SECRET);
        let product = Uuid::new_v4();

        let (token, _) = codec.add_item(None, line(product, 1)).expect("first add");
        let (token, items) = codec
            .add_item(Some(&token), line(product, 2))
            .expect("second add");

        assert_eq!(items, vec![line(product, 3)]);
        assert_eq!(codec.decode(&token).expect("decode"), items);
    }

    #[test]
    fn garbage_token_starts_a_fresh_cart() {
        let codec = StagedCartCodec::new(SECRET);
        let product = Uuid::new_v4();

        let (_, items) = codec
            .add_item(Some("not-a-jwt"), line(product, 1))
            .expect("add");

        assert_eq!(items, vec![line(product, 1)]);
    }
}
