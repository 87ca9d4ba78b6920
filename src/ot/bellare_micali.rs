//! Bellare-Micali 1-out-of-2 oblivious transfer
//!
//! Chosen-base-point Diffie-Hellman construction over the fixed MODP group.
//! Group elements travel as big-endian byte strings and are membership
//! checked on receipt.

use crate::crypto::{derive_key, open, seal, Ciphertext, OtGroup};
use crate::{Result, YaoError};
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

/// 接收方的第一条消息：一对群元素 (h₀, h₁)，满足 h₀ · h₁ = C
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtPublicPair {
    pub h0: Vec<u8>,
    pub h1: Vec<u8>,
}

/// 发送方的回复：每个槽位一个临时公钥 g^{yᵢ} 和密封的消息 mᵢ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OtReply {
    pub g_y0: Vec<u8>,
    pub sealed0: Ciphertext,
    pub g_y1: Vec<u8>,
    pub sealed1: Ciphertext,
}

/// OT 接收方
///
/// 持有选择位与秘密标量 x。接收方只知道 h_c = g^x 的离散对数，
/// h₁₋c = C · (g^x)⁻¹ 的离散对数与基点 C 绑定，对其不可知。
#[derive(Debug, Clone)]
pub struct OtReceiver {
    choice: u8,
    x: BigUint,
}

impl OtReceiver {
    /// 用新鲜随机标量初始化一次传输
    pub fn new<R: RngCore + CryptoRng>(group: &OtGroup, choice: u8, rng: &mut R) -> Self {
        OtReceiver {
            choice: choice & 1,
            x: group.random_scalar(rng),
        }
    }

    /// 构造发往发送方的 (h₀, h₁)
    pub fn public_pair(&self, group: &OtGroup) -> Result<OtPublicPair> {
        let g_x = group.pow(&group.generator, &self.x);
        let other = group.mul(&group.base_point, &group.inverse(&g_x)?);
        let (h0, h1) = if self.choice == 0 {
            (&g_x, &other)
        } else {
            (&other, &g_x)
        };
        Ok(OtPublicPair {
            h0: h0.to_bytes_be(),
            h1: h1.to_bytes_be(),
        })
    }

    /// 从发送方回复中恢复所选消息
    pub fn recover(&self, group: &OtGroup, reply: &OtReply) -> Result<Vec<u8>> {
        // Membership-check both slots; only the chosen one is used.
        let g_y0 = group.element_from_bytes(&reply.g_y0)?;
        let g_y1 = group.element_from_bytes(&reply.g_y1)?;

        let (g_y, sealed) = if self.choice == 0 {
            (g_y0, &reply.sealed0)
        } else {
            (g_y1, &reply.sealed1)
        };
        let key = derive_key(&group.pow(&g_y, &self.x));
        open(&key, sealed)
            .map_err(|_| YaoError::OTFailure("chosen message failed to decrypt".to_string()))
    }
}

/// OT 发送方
///
/// 无状态：一次回复消耗一对消息与接收方的公开对。
#[derive(Debug, Clone, Copy)]
pub struct OtSender;

impl OtSender {
    /// 校验接收方的公开对并密封两个消息
    ///
    /// 拒绝非子群元素和 h₀ · h₁ ≠ C 的公开对，两种情况都报 `OTFailure`。
    pub fn respond<R: RngCore + CryptoRng>(
        group: &OtGroup,
        pair: &OtPublicPair,
        m0: &[u8],
        m1: &[u8],
        rng: &mut R,
    ) -> Result<OtReply> {
        let h0 = group.element_from_bytes(&pair.h0)?;
        let h1 = group.element_from_bytes(&pair.h1)?;
        if group.mul(&h0, &h1) != group.base_point {
            return Err(YaoError::OTFailure(
                "receiver pair does not multiply to the base point".to_string(),
            ));
        }

        let seal_slot = |h: &BigUint, message: &[u8], rng: &mut R| {
            let y = group.random_scalar(rng);
            let g_y = group.pow(&group.generator, &y);
            let key = derive_key(&group.pow(h, &y));
            (g_y.to_bytes_be(), seal(&key, message, rng))
        };

        let (g_y0, sealed0) = seal_slot(&h0, m0, rng);
        let (g_y1, sealed1) = seal_slot(&h1, m1, rng);
        Ok(OtReply {
            g_y0,
            sealed0,
            g_y1,
            sealed1,
        })
    }
}

/// 在一个进程内完整执行一次 OT，用于测试与文档
pub fn execute_ot<R: RngCore + CryptoRng>(
    m0: &[u8],
    m1: &[u8],
    choice: u8,
    rng: &mut R,
) -> Result<Vec<u8>> {
    let group = OtGroup::modp2048();
    let receiver = OtReceiver::new(group, choice, rng);
    let pair = receiver.public_pair(group)?;
    let reply = OtSender::respond(group, &pair, m0, m1, rng)?;
    receiver.recover(group, &reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;

    #[test]
    fn test_ot_choice_0() {
        let result = execute_ot(b"alpha", b"beta", 0, &mut thread_rng()).unwrap();
        assert_eq!(result, b"alpha");
    }

    #[test]
    fn test_ot_choice_1() {
        let result = execute_ot(b"alpha", b"beta", 1, &mut thread_rng()).unwrap();
        assert_eq!(result, b"beta");
    }

    #[test]
    fn test_pair_multiplies_to_base_point() {
        let group = OtGroup::modp2048();
        for choice in 0..=1u8 {
            let receiver = OtReceiver::new(group, choice, &mut thread_rng());
            let pair = receiver.public_pair(group).unwrap();
            let h0 = group.element_from_bytes(&pair.h0).unwrap();
            let h1 = group.element_from_bytes(&pair.h1).unwrap();
            assert_eq!(group.mul(&h0, &h1), group.base_point);
        }
    }

    #[test]
    fn test_sender_rejects_forged_pair() {
        let group = OtGroup::modp2048();
        let receiver = OtReceiver::new(group, 0, &mut thread_rng());
        let mut pair = receiver.public_pair(group).unwrap();

        // Replace h1 with an unrelated subgroup element; the product check
        // must fail even though both halves are valid members.
        let z = group.random_scalar(&mut thread_rng());
        pair.h1 = group.pow(&group.generator, &z).to_bytes_be();

        let err = OtSender::respond(group, &pair, b"m0", b"m1", &mut thread_rng())
            .expect_err("forged pair must be rejected");
        assert!(matches!(err, YaoError::OTFailure(_)));
    }

    #[test]
    fn test_sender_rejects_non_member() {
        let group = OtGroup::modp2048();
        let receiver = OtReceiver::new(group, 0, &mut thread_rng());
        let mut pair = receiver.public_pair(group).unwrap();
        pair.h0 = vec![1];
        assert!(OtSender::respond(group, &pair, b"m0", b"m1", &mut thread_rng()).is_err());
    }

    #[test]
    fn test_tampered_reply_detected() {
        let group = OtGroup::modp2048();
        let receiver = OtReceiver::new(group, 0, &mut thread_rng());
        let pair = receiver.public_pair(group).unwrap();
        let mut reply =
            OtSender::respond(group, &pair, b"m0", b"m1", &mut thread_rng()).unwrap();
        reply.sealed0.body[0] ^= 0x01;
        assert!(receiver.recover(group, &reply).is_err());
    }

    #[test]
    fn test_wrong_slot_key_cannot_open() {
        // The receiver's derived key opens only its chosen slot.
        let group = OtGroup::modp2048();
        let receiver = OtReceiver::new(group, 0, &mut thread_rng());
        let pair = receiver.public_pair(group).unwrap();
        let reply = OtSender::respond(group, &pair, b"m0", b"m1", &mut thread_rng()).unwrap();

        let g_y1 = group.element_from_bytes(&reply.g_y1).unwrap();
        let key = derive_key(&group.pow(&g_y1, &receiver.x));
        assert!(open(&key, &reply.sealed1).is_err());
    }
}
