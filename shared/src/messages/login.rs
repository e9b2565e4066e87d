use ring::hmac;

/// Length of a login digest in bytes
pub const LOGIN_DIGEST_LEN: usize = 32;

/// `HMAC-SHA256(secret, challenge)`, the expected answer to a login challenge
pub fn login_digest(secret: &[u8], challenge: &[u8]) -> Vec<u8> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    hmac::sign(&key, challenge).as_ref().to_vec()
}

/// Constant-time check of a challenge response
pub fn verify_login(secret: &[u8], challenge: &[u8], response: &[u8]) -> bool {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret);
    hmac::verify(&key, challenge, response).is_ok()
}
