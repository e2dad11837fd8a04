//! Cookie signing scheme.
//!
//! This module replicates the host application's cookie-signing
//! algorithm. The scheme is a frozen contract: the signing key is
//! derived by keyed-hashing the username, a short fragment of the
//! stored credential hash, the expiration, and the session token with
//! the shared secret; the cookie signature is then an HMAC of
//! `username|expiration|token` under that derived key. Any drift from
//! the host's implementation silently invalidates every session, so
//! changes here must be coordinated with the host and covered by the
//! contract tests below.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

fn hmac_hex(key: &[u8], message: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// The short credential-hash fragment folded into key derivation.
///
/// Portable hashes (`$P$`) and vanilla bcrypt (`$2y$`) take four
/// characters past the prefix and cost fields; any other format takes
/// the last four, avoiding long scheme-specific prefixes.
pub fn credential_fragment(credential_hash: &str) -> &str {
    if credential_hash.starts_with("$P$") || credential_hash.starts_with("$2y$") {
        credential_hash.get(8..12).unwrap_or(credential_hash)
    } else {
        credential_hash
            .get(credential_hash.len().saturating_sub(4)..)
            .unwrap_or(credential_hash)
    }
}

/// Derive the per-cookie signing key, hex-encoded.
pub fn derive_signing_key(
    secret: &str,
    username: &str,
    fragment: &str,
    expiration: i64,
    token: &str,
) -> String {
    hmac_hex(
        secret.as_bytes(),
        &format!("{username}|{fragment}|{expiration}|{token}"),
    )
}

/// Compute the signature a genuine cookie would carry.
pub fn expected_signature(signing_key: &str, username: &str, expiration: i64, token: &str) -> String {
    hmac_hex(
        signing_key.as_bytes(),
        &format!("{username}|{expiration}|{token}"),
    )
}

/// Constant-time signature comparison.
pub fn signatures_match(expected: &str, presented: &str) -> bool {
    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

/// Derive the session-registry key for a session token.
pub fn session_verifier(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Produce a complete signed cookie value.
///
/// The issuing side of the contract; used by fixtures and by any
/// tooling that needs to mint a cookie the authenticator will accept.
pub fn compose_cookie(
    secret: &str,
    username: &str,
    credential_hash: &str,
    expiration: i64,
    token: &str,
) -> String {
    let fragment = credential_fragment(credential_hash);
    let key = derive_signing_key(secret, username, fragment, expiration, token);
    let signature = expected_signature(&key, username, expiration, token);
    format!("{username}|{expiration}|{token}|{signature}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key";

    #[test]
    fn fragment_for_bcrypt_hash() {
        // "$2y$10$" prefix is seven chars; fragment starts one past it.
        let hash = "$2y$10$abcdefghijklmnopqrstuv";
        assert_eq!(credential_fragment(hash), "bcde");
    }

    #[test]
    fn fragment_for_portable_hash() {
        let hash = "$P$B12345678abcdefghijklmnopqrst";
        assert_eq!(credential_fragment(hash), "5678");
    }

    #[test]
    fn fragment_for_other_hash_takes_tail() {
        assert_eq!(credential_fragment("argon2id$somethinglong1234"), "1234");
        assert_eq!(credential_fragment("abc"), "abc");
    }

    #[test]
    fn compose_then_verify_round_trip() {
        let hash = "$2y$10$abcdefghijklmnopqrstuv";
        let cookie = compose_cookie(SECRET, "alice", hash, 4_000_000_000, "tok123");
        let fields: Vec<&str> = cookie.split('|').collect();
        assert_eq!(fields.len(), 4);

        let key = derive_signing_key(SECRET, "alice", credential_fragment(hash), 4_000_000_000, "tok123");
        let expected = expected_signature(&key, "alice", 4_000_000_000, "tok123");
        assert!(signatures_match(&expected, fields[3]));
    }

    #[test]
    fn signature_depends_on_every_field() {
        let hash = "$2y$10$abcdefghijklmnopqrstuv";
        let key = derive_signing_key(SECRET, "alice", credential_fragment(hash), 4_000_000_000, "tok123");
        let base = expected_signature(&key, "alice", 4_000_000_000, "tok123");

        assert_ne!(base, expected_signature(&key, "bob", 4_000_000_000, "tok123"));
        assert_ne!(base, expected_signature(&key, "alice", 4_000_000_001, "tok123"));
        assert_ne!(base, expected_signature(&key, "alice", 4_000_000_000, "tok124"));

        let other_key = derive_signing_key("other-secret", "alice", "bcde", 4_000_000_000, "tok123");
        assert_ne!(base, expected_signature(&other_key, "alice", 4_000_000_000, "tok123"));
    }

    #[test]
    fn verifier_is_stable_hex_sha256() {
        let v = session_verifier("tok123");
        assert_eq!(v.len(), 64);
        assert_eq!(v, session_verifier("tok123"));
        assert_ne!(v, session_verifier("tok124"));
    }
}
