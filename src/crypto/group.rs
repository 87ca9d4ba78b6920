//! Prime-order group for Diffie-Hellman style oblivious transfer
//!
//! Fixes the named group required by the wire protocol: RFC 3526 MODP group
//! 14 (2048-bit safe prime p, generator g = 2). Since p ≡ 7 (mod 8), 2 is a
//! quadratic residue and generates the subgroup of prime order q = (p-1)/2.
//! The OT base point C is a hash-to-group constant (a squared digest), so
//! neither party knows its discrete logarithm.

use crate::{Result, YaoError};
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::One;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

const BASE_POINT_DOMAIN: &[u8] = b"yao-mpc/ot-base-point/v1";

/// RFC 3526 group 14 prime, 2048 bits.
const MODP2048_PRIME_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1",
    "29024E088A67CC74020BBEA63B139B22514A08798E3404DD",
    "EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245",
    "E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED",
    "EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3D",
    "C2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F",
    "83655D23DCA3AD961C62F356208552BB9ED529077096966D",
    "670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B",
    "E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9",
    "DE2BCBF6955817183995497CEA956AE515D2261898FA0510",
    "15728E5A8AACAA68FFFFFFFFFFFFFFFF",
);

/// 不经意传输使用的素数阶循环群
///
/// 持有群参数：模数 p、子群阶 q、生成元 g 以及离散对数未知的固定基点 C。
/// 所有元素运算都在模 p 下进行，标量运算在模 q 下进行。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtGroup {
    /// 安全素数模数 p
    pub prime: BigUint,
    /// 子群的素数阶 q = (p - 1) / 2
    pub order: BigUint,
    /// 子群生成元 g
    pub generator: BigUint,
    /// 固定基点 C，双方都不知道其离散对数
    pub base_point: BigUint,
}

static MODP2048: OnceLock<OtGroup> = OnceLock::new();

impl OtGroup {
    /// The group published with the protocol version: RFC 3526 group 14.
    pub fn modp2048() -> &'static OtGroup {
        MODP2048.get_or_init(|| {
            let prime = BigUint::parse_bytes(MODP2048_PRIME_HEX.as_bytes(), 16)
                .expect("RFC 3526 prime constant parses");
            let order = (&prime - BigUint::one()) >> 1u8;
            let generator = BigUint::from(2u8);
            let base_point = derive_base_point(&prime);
            OtGroup {
                prime,
                order,
                generator,
                base_point,
            }
        })
    }

    /// 模幂运算 base^exp mod p
    pub fn pow(&self, base: &BigUint, exp: &BigUint) -> BigUint {
        base.modpow(exp, &self.prime)
    }

    /// 群元素乘法 a · b mod p
    pub fn mul(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % &self.prime
    }

    /// 模逆运算，使用扩展欧几里得算法
    pub fn inverse(&self, a: &BigUint) -> Result<BigUint> {
        let p = BigInt::from(self.prime.clone());
        let ext = BigInt::from(a.clone()).extended_gcd(&p);
        if !ext.gcd.is_one() {
            return Err(YaoError::CryptoFailure(
                "no modular inverse exists".to_string(),
            ));
        }
        let x = ((ext.x % &p) + &p) % &p;
        x.to_biguint()
            .ok_or_else(|| YaoError::CryptoFailure("negative inverse residue".to_string()))
    }

    /// 子群成员检查
    ///
    /// 要求 1 < h < p 且 h^q ≡ 1 (mod p)，排除单位元、p-1 等小阶元素。
    pub fn is_member(&self, h: &BigUint) -> bool {
        if h <= &BigUint::one() || h >= &self.prime {
            return false;
        }
        self.pow(h, &self.order).is_one()
    }

    /// 在 [1, q) 内均匀采样标量
    ///
    /// 使用拒绝采样避免取模偏差。
    pub fn random_scalar<R: RngCore + CryptoRng>(&self, rng: &mut R) -> BigUint {
        let bits = self.order.bits();
        let len = ((bits + 7) / 8) as usize;
        let excess = (len as u64 * 8 - bits) as u32;
        loop {
            let mut buf = vec![0u8; len];
            rng.fill_bytes(&mut buf);
            buf[0] >>= excess;
            let candidate = BigUint::from_bytes_be(&buf);
            if candidate >= BigUint::one() && candidate < self.order {
                return candidate;
            }
        }
    }

    /// 从网络字节解析群元素并做成员检查
    pub fn element_from_bytes(&self, bytes: &[u8]) -> Result<BigUint> {
        let h = BigUint::from_bytes_be(bytes);
        if !self.is_member(&h) {
            return Err(YaoError::OTFailure(
                "received element outside the prime-order subgroup".to_string(),
            ));
        }
        Ok(h)
    }
}

fn derive_base_point(prime: &BigUint) -> BigUint {
    // Expand the domain tag to the width of p, reduce, then square into the
    // quadratic-residue subgroup.
    let mut bytes = Vec::with_capacity(256);
    for counter in 0u32..8 {
        let mut hasher = Sha256::new();
        hasher.update(BASE_POINT_DOMAIN);
        hasher.update(counter.to_le_bytes());
        bytes.extend_from_slice(&hasher.finalize());
    }
    let seed = BigUint::from_bytes_be(&bytes) % prime;
    (&seed * &seed) % prime
}

/// 从共享秘密派生对称密钥
///
/// KDF(K) = SHA-256(domain ‖ K 的大端字节)，用于加密 OT 消息。
pub fn derive_key(shared_secret: &BigUint) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"yao-mpc/ot-kdf/v1");
    hasher.update(shared_secret.to_bytes_be());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn test_generator_is_member() {
        let group = OtGroup::modp2048();
        assert!(group.is_member(&group.generator));
    }

    #[test]
    fn test_base_point_is_member() {
        let group = OtGroup::modp2048();
        assert!(group.is_member(&group.base_point));
    }

    #[test]
    fn test_identity_and_overflow_rejected() {
        let group = OtGroup::modp2048();
        assert!(!group.is_member(&BigUint::one()));
        assert!(!group.is_member(&group.prime));
        // p - 1 has order 2, so the exponent check must reject it.
        assert!(!group.is_member(&(&group.prime - BigUint::one())));
    }

    #[test]
    fn test_inverse_roundtrip() {
        let group = OtGroup::modp2048();
        let x = group.random_scalar(&mut thread_rng());
        let h = group.pow(&group.generator, &x);
        let inv = group.inverse(&h).unwrap();
        assert!(group.mul(&h, &inv).is_one());
    }

    #[test]
    fn test_random_scalar_in_range() {
        let group = OtGroup::modp2048();
        for _ in 0..8 {
            let s = group.random_scalar(&mut thread_rng());
            assert!(s >= BigUint::one() && s < group.order);
        }
    }

    #[test]
    fn test_derive_key_deterministic() {
        let k1 = derive_key(&BigUint::from(42u8));
        let k2 = derive_key(&BigUint::from(42u8));
        assert_eq!(k1, k2);
        assert_ne!(k1, derive_key(&BigUint::from(43u8)));
    }
}
