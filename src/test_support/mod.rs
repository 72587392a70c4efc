// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fixtures shared by unit tests: RSA keys, a token builder and JWKS bodies.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};

/// Private key whose public half is published in the test JWKS.
pub const SIGNING_KEY_PEM: &str = include_str!("signing_key.pem");

/// Private key that is never published.
pub const ROGUE_KEY_PEM: &str = include_str!("rogue_key.pem");

/// RSA modulus of [`SIGNING_KEY_PEM`], base64url.
pub const SIGNING_KEY_N: &str = "13keRSy_axZxEd8daeKgA9Ko5cM_vvuIPkhBQigJyyTv0yMPISU3NsyTk8MLXZczq3sjUH40VHE9HMeCoBofnB4P1wMYUGrIqU3AoKxaJcaUSjDRaiP-i3fdsM3cihSfMBqtj5p7wzEEbxdbjmDh-AHJXYrJOSI7UAMUtnd-LvB_pm-_q8hp264tc-fUQQBtmAYoy4PJQ067sEkf_w2Ln8BXPQ97zPv1VyBeXWFkNGVp7cY87BuQOol8O_1Ude1M0lbno3ieKwURMT_7Q7y7kzwgusz_ZMvh0qrWJuVEZ-qkmvsaAP6cwrIKFRfG9BV6Ontb_mti6iBQcFfViS6ElQ";

/// RSA modulus of [`ROGUE_KEY_PEM`], base64url.
pub const ROGUE_KEY_N: &str = "svLdeiD_btVP0x29fM0TegnMQ57L22fBQz8PJJomnClym7-ne1dV270dS3YPnK00Kf7Yoa-XJuIA9aZ53HVIvTxGUIfoz192B_srG48x1zfu6kqv-0hcSzczeMVMyfIZUaOXhGoxnc3uBMilFhiKM-2OnvToXckV7VUodtbFaETxDGkdlF7fuNSSTbSkz5ns0ugxAHKUgoRcbZc3rQo590hAlpCOwNIXXvxfE4nJCazQWMlzzNXaIOAZ3aoDKvjFvI-tSYZCQyJNI1k76GyPBMzVanXRXX-RNSpaLOVhCT0hKIA7cXjnjf_5S7jKBhpJPa9YE_922OlWb_-6BzzD9Q";

pub const KEY_ID: &str = "test-key";
pub const ISSUER: &str = "https://login.example.com";
pub const AUDIENCE: &str = "api.example.com";
pub const SUBJECT: &str = "a6b404b1-98af-41a2-8e7f-e4061dc0bf86";

pub fn now_secs() -> i64 {
    Utc::now().timestamp()
}

/// A JWKS document with one RSA key.
pub fn jwks_body(kid: &str, modulus: &str) -> Value {
    json!({
        "keys": [{
            "kty": "RSA",
            "kid": kid,
            "use": "sig",
            "alg": "RS256",
            "n": modulus,
            "e": "AQAB",
        }]
    })
}

/// Builds signed test access tokens.
pub struct TokenBuilder {
    claims: Map<String, Value>,
    kid: Option<String>,
    key_pem: &'static str,
}

impl TokenBuilder {
    /// A valid token for the admin sample user, expiring in 15 minutes.
    pub fn new() -> Self {
        let claims = json!({
            "sub": SUBJECT,
            "iss": ISSUER,
            "aud": AUDIENCE,
            "iat": now_secs(),
            "exp": now_secs() + 900,
            "scope": "openid profile investments transactions",
            "client_id": "spa-client",
            "manager_id": "20116",
            "role": "admin",
        });

        Self {
            claims: claims.as_object().cloned().unwrap_or_default(),
            kid: Some(KEY_ID.to_string()),
            key_pem: SIGNING_KEY_PEM,
        }
    }

    pub fn claim(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.claims.insert(name.to_string(), value.into());
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.claims.remove(name);
        self
    }

    pub fn kid(mut self, kid: Option<&str>) -> Self {
        self.kid = kid.map(str::to_string);
        self
    }

    pub fn signed_with(mut self, key_pem: &'static str) -> Self {
        self.key_pem = key_pem;
        self
    }

    pub fn sign(self) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.kid;
        let key = EncodingKey::from_rsa_pem(self.key_pem.as_bytes()).unwrap();
        encode(&header, &Value::Object(self.claims), &key).unwrap()
    }
}
