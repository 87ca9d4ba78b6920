//! # Yao MPC - 姚氏混淆电路两方安全计算库 (Yao's Garbled Circuits Two-Party Computation)
//!
//! 这是一个用 Rust 实现的两方安全函数求值库，基于姚氏混淆电路协议。
//! 两个互不信任的参与方 —— 混淆方 (Garbler, 持有输入 a) 和求值方
//! (Evaluator, 持有输入 b) —— 在不泄露各自输入的前提下共同计算布尔电路 f(a, b)。
//!
//! ## 核心组件 (Core Components)
//!
//! ### 密码学原语 (Crypto Primitives)
//! - **对称加密**: 基于 SHA-256 掩码流的定长载荷认证加密
//! - **循环群**: RFC 3526 2048 位 MODP 群，用于 Diffie-Hellman 式不经意传输
//! - **随机数**: 操作系统熵源种子的密码学安全随机数
//!
//! ### 电路模型 (Circuit Model)
//! - **电路解析**: JSON 电路描述的解析与校验
//! - **明文求值**: 用于本地测试与正确性对照的布尔求值
//!
//! ### 混淆电路 (Garbled Circuits)
//! - **电路混淆**: 每条线两个随机密钥与一个 p 比特 (point-and-permute)
//! - **门混淆**: 真值表按输入 p 比特置换后双重加密
//! - **电路求值**: 仅凭可观察的加密比特定位表行并解密
//!
//! ### 不经意传输 (Oblivious Transfer)
//! - **Bellare-Micali 1-out-of-2 OT**: 求值方获取其输入线密钥而不泄露选择位
//!
//! ### 两方协议 (Two-Party Protocol)
//! - **消息协议**: 长度前缀帧上的结构化消息交换
//! - **角色驱动**: Garbler 主动拨号，Evaluator 监听并运行状态机
//!
//! ## 安全模型 (Security Model)
//!
//! 协议在半诚实 (semi-honest) 模型下安全：参与方遵循协议，但可能试图从
//! 通信记录中推断额外信息。不提供抗恶意求值方的保证，也不包含 Free-XOR、
//! row reduction 等现代优化。每次求值必须使用全新的混淆电路。
//!
//! ## 使用示例 (Usage)
//!
//! ```no_run
//! use yao_mpc::circuit::CircuitBundle;
//! use yao_mpc::garble::{evaluate, GarbledCircuit};
//! use rand::thread_rng;
//!
//! # fn main() -> yao_mpc::Result<()> {
//! let bundle = CircuitBundle::from_path("circuits/default.json")?;
//! let circuit = &bundle.circuits[0];
//!
//! let garbled = GarbledCircuit::build(circuit.clone(), &mut thread_rng())?;
//! let a_inputs = garbled.select_inputs(&circuit.alice, &[1])?;
//! let b_inputs = garbled.select_inputs(&circuit.bob, &[1])?;
//! let outputs = evaluate(
//!     circuit,
//!     garbled.tables(),
//!     &garbled.pbits_out(),
//!     &a_inputs,
//!     &b_inputs,
//! )?;
//! # Ok(())
//! # }
//! ```

pub mod circuit;
pub mod crypto;
pub mod garble;
pub mod ot;
pub mod protocol;

pub use circuit::*;
pub use garble::*;
pub use ot::*;
pub use protocol::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum YaoError {
    #[error("Invalid circuit: {0}")]
    InvalidCircuit(String),
    #[error("Malformed garbled table")]
    MalformedGarbledTable,
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),
    #[error("Oblivious transfer failure: {0}")]
    OTFailure(String),
    #[error("Transport closed by peer")]
    TransportClosed,
    #[error("Cryptographic failure: {0}")]
    CryptoFailure(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for YaoError {
    fn from(e: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match e.kind() {
            ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe => YaoError::TransportClosed,
            _ => YaoError::ProtocolViolation(format!("i/o error: {}", e)),
        }
    }
}

impl From<serde_json::Error> for YaoError {
    fn from(e: serde_json::Error) -> Self {
        YaoError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, YaoError>;
