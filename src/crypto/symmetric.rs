//! Authenticated symmetric encryption for fixed-size payloads
//!
//! A hash-based scheme built from SHA-256: the plaintext is XORed with a
//! counter-mode mask stream derived from (key, nonce), and a truncated
//! SHA-256 tag over the ciphertext makes decryption under the wrong key
//! detectable. Nonces are drawn fresh per encryption and shipped with the
//! ciphertext, so the same key may seal several rows.

use crate::{Result, YaoError};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Nonce length in bytes
pub const NONCE_LENGTH: usize = 16;

/// Authentication tag length in bytes
pub const TAG_LENGTH: usize = 16;

const MASK_DOMAIN: &[u8] = b"yao-mpc/mask/v1";
const TAG_DOMAIN: &[u8] = b"yao-mpc/tag/v1";

/// 认证密文结构
///
/// 固定布局 `nonce ‖ body ‖ tag`，因此密文可以编码为字节串后再被外层加密，
/// 支持混淆表行所需的双重加密嵌套。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    pub nonce: [u8; NONCE_LENGTH],
    pub body: Vec<u8>,
    pub tag: [u8; TAG_LENGTH],
}

impl Ciphertext {
    /// Flatten to the fixed `nonce ‖ body ‖ tag` byte layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_LENGTH + self.body.len() + TAG_LENGTH);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.body);
        out.extend_from_slice(&self.tag);
        out
    }

    /// Parse the fixed byte layout produced by [`Ciphertext::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(YaoError::CryptoFailure(
                "ciphertext shorter than nonce and tag".to_string(),
            ));
        }
        let mut nonce = [0u8; NONCE_LENGTH];
        nonce.copy_from_slice(&bytes[..NONCE_LENGTH]);
        let mut tag = [0u8; TAG_LENGTH];
        tag.copy_from_slice(&bytes[bytes.len() - TAG_LENGTH..]);
        let body = bytes[NONCE_LENGTH..bytes.len() - TAG_LENGTH].to_vec();
        Ok(Ciphertext { nonce, body, tag })
    }
}

fn mask_block(key: &[u8], nonce: &[u8; NONCE_LENGTH], counter: u32) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(MASK_DOMAIN);
    hasher.update(key);
    hasher.update(nonce);
    hasher.update(counter.to_le_bytes());
    hasher.finalize().into()
}

fn apply_mask(key: &[u8], nonce: &[u8; NONCE_LENGTH], data: &mut [u8]) {
    for (counter, chunk) in data.chunks_mut(32).enumerate() {
        let block = mask_block(key, nonce, counter as u32);
        for (byte, mask) in chunk.iter_mut().zip(block.iter()) {
            *byte ^= mask;
        }
    }
}

fn compute_tag(key: &[u8], nonce: &[u8; NONCE_LENGTH], body: &[u8]) -> [u8; TAG_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(TAG_DOMAIN);
    hasher.update(key);
    hasher.update(nonce);
    hasher.update(body);
    let digest = hasher.finalize();
    let mut tag = [0u8; TAG_LENGTH];
    tag.copy_from_slice(&digest[..TAG_LENGTH]);
    tag
}

/// 加密载荷
///
/// 生成新鲜随机 nonce，用掩码流加密明文，并对密文计算认证标签。
pub fn seal<R: RngCore + CryptoRng>(key: &[u8], plaintext: &[u8], rng: &mut R) -> Ciphertext {
    let mut nonce = [0u8; NONCE_LENGTH];
    rng.fill_bytes(&mut nonce);

    let mut body = plaintext.to_vec();
    apply_mask(key, &nonce, &mut body);
    let tag = compute_tag(key, &nonce, &body);

    Ciphertext { nonce, body, tag }
}

/// 解密载荷
///
/// 先校验标签再去掩码。标签不匹配（错误密钥或篡改）返回 `CryptoFailure`。
pub fn open(key: &[u8], ciphertext: &Ciphertext) -> Result<Vec<u8>> {
    let expected = compute_tag(key, &ciphertext.nonce, &ciphertext.body);
    if expected != ciphertext.tag {
        return Err(YaoError::CryptoFailure(
            "authentication tag mismatch".to_string(),
        ));
    }
    let mut plaintext = ciphertext.body.clone();
    apply_mask(key, &ciphertext.nonce, &mut plaintext);
    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn test_seal_open_roundtrip() {
        let key = b"0123456789abcdef";
        let plaintext = b"seventeen bytes!!";

        let ciphertext = seal(key, plaintext, &mut thread_rng());
        let recovered = open(key, &ciphertext).unwrap();
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn test_open_with_wrong_key_fails() {
        let ciphertext = seal(b"correct key 1234", b"payload", &mut thread_rng());
        assert!(open(b"wrong key 123456", &ciphertext).is_err());
    }

    #[test]
    fn test_tampered_body_detected() {
        let key = b"0123456789abcdef";
        let mut ciphertext = seal(key, b"payload", &mut thread_rng());
        ciphertext.body[0] ^= 0x01;
        assert!(open(key, &ciphertext).is_err());
    }

    #[test]
    fn test_long_payload_masking() {
        // Payloads longer than one SHA-256 block exercise the counter stream.
        let key = b"0123456789abcdef";
        let plaintext = vec![0xa5u8; 100];

        let ciphertext = seal(key, &plaintext, &mut thread_rng());
        assert_ne!(ciphertext.body, plaintext);
        assert_eq!(open(key, &ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn test_byte_layout_roundtrip() {
        let ciphertext = seal(b"0123456789abcdef", b"nested layer", &mut thread_rng());
        let bytes = ciphertext.to_bytes();
        assert_eq!(Ciphertext::from_bytes(&bytes).unwrap(), ciphertext);
    }

    #[test]
    fn test_from_bytes_rejects_truncated() {
        assert!(Ciphertext::from_bytes(&[0u8; NONCE_LENGTH]).is_err());
    }

    #[test]
    fn test_same_plaintext_distinct_ciphertexts() {
        let key = b"0123456789abcdef";
        let c1 = seal(key, b"payload", &mut thread_rng());
        let c2 = seal(key, b"payload", &mut thread_rng());
        assert_ne!(c1, c2);
    }
}
