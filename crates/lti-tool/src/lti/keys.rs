//! Tool RSA key pairs, JWK publication and RS256 signing.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::KeyError;

/// A public key in JWK form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicJwk {
    pub kty: String,
    pub alg: String,
    #[serde(rename = "use")]
    pub key_use: String,
    pub kid: String,
    pub n: String,
    pub e: String,
}

impl PublicJwk {
    fn from_rsa(key: &RsaPublicKey) -> Self {
        let n = URL_SAFE_NO_PAD.encode(key.n().to_bytes_be());
        let e = URL_SAFE_NO_PAD.encode(key.e().to_bytes_be());
        Self {
            kty: "RSA".to_string(),
            alg: "RS256".to_string(),
            key_use: "sig".to_string(),
            kid: thumbprint(&n, &e),
            n,
            e,
        }
    }
}

/// The document served from `/jwks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeySet {
    pub keys: Vec<PublicJwk>,
}

impl PublicKeySet {
    /// Add a key unless one with the same kid is already present.
    pub fn push_unique(&mut self, jwk: &PublicJwk) {
        if !self.keys.iter().any(|k| k.kid == jwk.kid) {
            self.keys.push(jwk.clone());
        }
    }
}

/// RFC 7638 SHA-256 thumbprint of an RSA key.
///
/// `n` and `e` are the base64url members; the hashed document has its members
/// in lexicographic order with no whitespace.
#[must_use]
pub fn thumbprint(n: &str, e: &str) -> String {
    let canonical = format!(r#"{{"e":"{e}","kty":"RSA","n":"{n}"}}"#);
    URL_SAFE_NO_PAD.encode(Sha256::digest(canonical.as_bytes()))
}

/// One of the tool's signing keys.
#[derive(Clone)]
pub struct ToolKey {
    encoding: EncodingKey,
    jwk: PublicJwk,
}

impl ToolKey {
    /// Build from a private key PEM and an optional public key PEM.
    ///
    /// Both PKCS#8 and PKCS#1 encodings are accepted. Without a public key
    /// the public half is derived from the private key.
    ///
    /// # Errors
    ///
    /// Returns error if either PEM is unreadable or the halves do not match.
    pub fn from_pem(private_pem: &str, public_pem: Option<&str>) -> Result<Self, KeyError> {
        let private = RsaPrivateKey::from_pkcs8_pem(private_pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(private_pem))
            .map_err(|e| KeyError::Private(e.to_string()))?;
        let derived = private.to_public_key();

        if let Some(pem) = public_pem {
            let public = RsaPublicKey::from_public_key_pem(pem)
                .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
                .map_err(|e| KeyError::Public(e.to_string()))?;
            if public != derived {
                return Err(KeyError::Mismatch);
            }
        }

        let encoding = EncodingKey::from_rsa_pem(private_pem.as_bytes())?;

        Ok(Self { encoding, jwk: PublicJwk::from_rsa(&derived) })
    }

    /// Key id (RFC 7638 thumbprint).
    #[must_use]
    pub fn kid(&self) -> &str {
        &self.jwk.kid
    }

    /// Public half as a JWK.
    #[must_use]
    pub fn public_jwk(&self) -> &PublicJwk {
        &self.jwk
    }

    /// Sign `claims` as an RS256 JWT carrying this key's kid.
    ///
    /// # Errors
    ///
    /// Returns error if the claims cannot be serialized or signed.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, jsonwebtoken::errors::Error> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.jwk.kid.clone());
        jsonwebtoken::encode(&header, claims, &self.encoding)
    }
}

impl std::fmt::Debug for ToolKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolKey").field("kid", &self.jwk.kid).finish()
    }
}
