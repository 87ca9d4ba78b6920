//! # 随机数工具函数 (Random Utility Functions)
//!
//! 本模块提供密码学安全的随机数生成功能，用于线密钥、p 比特和 nonce 的采样。
//! 所有函数显式接收 `RngCore + CryptoRng`，便于测试时注入确定性种子；
//! 协议代码统一以 `thread_rng()`（操作系统熵源重播种）作为入口。

use super::{WireKey, KEY_LENGTH};
use rand::{CryptoRng, Rng, RngCore};

/// 生成指定长度的随机字节序列
pub fn random_bytes<R: RngCore + CryptoRng>(rng: &mut R, len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rng.fill_bytes(&mut bytes);
    bytes
}

/// 生成随机线密钥
///
/// 两个线密钥必须相互独立；调用方对同一条线调用两次即可。
pub fn random_key<R: RngCore + CryptoRng>(rng: &mut R) -> WireKey {
    let mut key = [0u8; KEY_LENGTH];
    rng.fill_bytes(&mut key);
    key
}

/// 均匀采样一个比特，返回 0 或 1
pub fn random_bit<R: RngCore + CryptoRng>(rng: &mut R) -> u8 {
    rng.gen_range(0..=1)
}
