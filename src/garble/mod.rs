//! # 混淆电路模块 (Garbled Circuits)
//!
//! 本模块实现姚氏协议的电路混淆与混淆求值。
//!
//! ## 核心概念
//!
//! ### 线密钥与 p 比特 (Point-and-Permute)
//! - 每条线 w 有两个独立随机密钥 `keys[w][0]`、`keys[w][1]` 和一个随机
//!   p 比特 `p[w]`
//! - 线上传输的是「加密比特」`encr_bit = 明文比特 XOR p[w]`，
//!   它对求值方可见但不泄露明文比特
//! - 混淆表的行按加密比特索引，求值方仅凭可观察值即可定位唯一的行，
//!   每个门只需一次解密
//!
//! ### 门混淆
//! 对二元门 g、输入 (u, v)、输出 w，每个输入组合 (bu, bv) 产生一行：
//! 载荷 `keys[w][g(bu,bv)] ‖ (g(bu,bv) XOR p[w])` 先在第一个输入的密钥
//! `keys[u][bu]` 下加密，再在第二个输入的密钥 `keys[v][bv]` 下加密，
//! 存放在外部可见索引 `(bu XOR p[u], bv XOR p[v])` 处。一元 NOT 门用
//! 两行单层加密的表。
//!
//! ### 一次性
//! 同一个混淆电路绝不能在两组输入上求值，否则求值方会同时看到某条线的
//! 两个密钥。每次求值前必须重新混淆。

pub mod evaluator;
pub mod garbler;

pub use evaluator::*;
pub use garbler::*;

use crate::crypto::{Ciphertext, WireKey, KEY_LENGTH};
use crate::{Result, YaoError};
use serde::{Deserialize, Serialize};

/// 混淆表行载荷长度：线密钥加一个加密比特字节
pub const ROW_PAYLOAD_LENGTH: usize = KEY_LENGTH + 1;

/// 线的运行时值：线密钥与加密比特
///
/// 求值过程中每条线恰好携带一个这样的对。对输入线来说，它由输入方选定
/// （混淆方直接发送，求值方经由不经意传输获取）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveWire {
    /// 与该线当前明文比特对应的密钥
    pub key: WireKey,
    /// 加密比特 = 明文比特 XOR p 比特
    pub encr_bit: u8,
}

impl ActiveWire {
    /// Fixed `key ‖ encr_bit` layout, also the OT message body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ROW_PAYLOAD_LENGTH);
        out.extend_from_slice(&self.key);
        out.push(self.encr_bit);
        out
    }

    /// Parse the fixed layout; `None` on bad length or a non-bit byte.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != ROW_PAYLOAD_LENGTH || bytes[KEY_LENGTH] > 1 {
            return None;
        }
        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(&bytes[..KEY_LENGTH]);
        Some(ActiveWire {
            key,
            encr_bit: bytes[KEY_LENGTH],
        })
    }
}

/// 混淆表
///
/// 行按外部可见的加密比特索引：一元门两行（索引 eu），
/// 二元门四行（索引 eu·2 + ev）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GarbledTable {
    /// NOT 门的两行表
    Unary { rows: Vec<Ciphertext> },
    /// 二元门的四行表
    Binary { rows: Vec<Ciphertext> },
}

impl GarbledTable {
    /// 取一元门在加密比特 `eu` 处的行
    pub fn unary_row(&self, eu: u8) -> Result<&Ciphertext> {
        match self {
            GarbledTable::Unary { rows } => rows.get(eu as usize),
            GarbledTable::Binary { .. } => None,
        }
        .ok_or(YaoError::MalformedGarbledTable)
    }

    /// 取二元门在加密比特 `(eu, ev)` 处的行
    pub fn binary_row(&self, eu: u8, ev: u8) -> Result<&Ciphertext> {
        match self {
            GarbledTable::Binary { rows } => rows.get((eu as usize) * 2 + ev as usize),
            GarbledTable::Unary { .. } => None,
        }
        .ok_or(YaoError::MalformedGarbledTable)
    }
}
