//! # 密码学原语模块 (Crypto Primitives)
//!
//! 本模块提供混淆电路协议所需的三类底层原语：
//!
//! - **对称加密**: 对定长载荷的认证加密，用于混淆表的行加密与 OT 消息加密。
//!   采用 SHA-256 计数器掩码流加上截断 SHA-256 标签，每行使用新鲜随机 nonce，
//!   解密失败（密钥不匹配或密文被篡改）可以被检测。
//! - **循环群**: RFC 3526 2048 位 MODP 群上的素数阶子群运算，
//!   为 Bellare-Micali 式不经意传输提供模幂、求逆与成员检查。
//! - **随机数**: 密码学安全随机数辅助函数。所有接口显式接收
//!   `RngCore + CryptoRng`，调用方以操作系统熵源（如 `thread_rng`）为种子。
//!
//! ## 线密钥 (Wire Keys)
//!
//! 每条电路线有两个独立均匀随机的 16 字节密钥，分别代表比特 0 和 1。
//! 求值方在一次求值中每条线只会见到其中一个。

pub mod group;
pub mod random;
pub mod symmetric;

pub use group::*;
pub use random::*;
pub use symmetric::*;

/// 线密钥长度（字节）
pub const KEY_LENGTH: usize = 16;

/// 线密钥类型，128 位随机值
///
/// 每条线有两个密钥，分别对应逻辑值 0 和 1。
/// 密钥的随机性是混淆电路安全性的基础。
pub type WireKey = [u8; KEY_LENGTH];
