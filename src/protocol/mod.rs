//! # 两方协议模块 (Two-Party Protocol)
//!
//! 本模块实现姚氏协议的消息层与两个角色：
//!
//! - **Garbler (Alice)**: 主动拨号方。为每次求值重新混淆电路，发送电路
//!   设置与自己的输入线值，并作为不经意传输的发送方答复求值方。
//! - **Evaluator (Bob)**: 被动监听方。接受连接后运行会话状态机
//!   `LISTENING → RECEIVED_CIRCUIT → AWAITING_INPUTS → OT_IN_PROGRESS →
//!   EVALUATING → DONE`，求值后把输出发回。
//!
//! ## 每次求值的消息流
//!
//! | 步骤 | 方向 | 内容 |
//! |------|------|------|
//! | 1 | G → E | CIRCUIT_SETUP：电路、混淆表、输出线 p 比特 |
//! | 2 | E → G | ACK |
//! | 3 | G → E | GARBLER_INPUTS：混淆方输入线的 (密钥, 加密比特) |
//! | 4 | E ↔ G | OT_RECEIVER / OT_SENDER：求值方输入线的不经意传输 |
//! | 5 | E | 混淆求值 |
//! | 6 | E → G | OUTPUT：输出比特 |
//!
//! 消息承载在 4 字节大端长度前缀的帧里，帧体为 bincode 序列化的
//! [`Message`]。同一个混淆电路绝不复用：每次求值都从步骤 1 重新开始。
//!
//! ## 能力接口
//!
//! 角色对输入来源和输出去向是多态的：[`InputProvider`] 提供每次求值的
//! 明文输入比特（交互式 shell、固定队列等），[`OutputSink`] 接收每次
//! 求值的输出映射。

pub mod evaluator;
pub mod garbler;
pub mod local;
pub mod messages;
pub mod transport;

pub use evaluator::*;
pub use garbler::*;
pub use local::*;
pub use messages::*;
pub use transport::*;

use crate::circuit::WireId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// 网络配置
///
/// 求值方在 `host:port` 上监听，混淆方拨号到同一地址。
/// 环境变量 `YAO_HOST` / `YAO_PORT` 可覆盖默认值。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetConfig {
    /// 主机地址
    pub host: String,
    /// 端口
    pub port: u16,
}

impl Default for NetConfig {
    fn default() -> Self {
        NetConfig {
            host: "127.0.0.1".to_string(),
            port: 4321,
        }
    }
}

impl NetConfig {
    /// 从环境变量读取配置，缺省回落到 [`Default`]
    pub fn from_env() -> Self {
        let default = NetConfig::default();
        let host = std::env::var("YAO_HOST").unwrap_or(default.host);
        let port = std::env::var("YAO_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(default.port);
        NetConfig { host, port }
    }

    /// `host:port` 形式的套接字地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 输入提供者能力
///
/// 每次求值前被询问一次；返回 `None` 表示没有更多输入，结束该电路的
/// 求值循环。返回的比特串长度必须等于 `wires.len()`。
pub trait InputProvider {
    fn next_bits(&mut self, circuit_id: &str, wires: &[WireId]) -> Option<Vec<u8>>;
}

/// 输出接收者能力
///
/// 每次求值结束后收到输出线到比特的映射。
pub trait OutputSink {
    fn report(&mut self, circuit_id: &str, outputs: &BTreeMap<WireId, u8>);
}

/// 固定队列输入提供者，用于测试与非交互运行
#[derive(Debug, Clone, Default)]
pub struct FixedInputs {
    queue: VecDeque<Vec<u8>>,
}

impl FixedInputs {
    pub fn new<I: IntoIterator<Item = Vec<u8>>>(inputs: I) -> Self {
        FixedInputs {
            queue: inputs.into_iter().collect(),
        }
    }
}

impl InputProvider for FixedInputs {
    fn next_bits(&mut self, _circuit_id: &str, wires: &[WireId]) -> Option<Vec<u8>> {
        let bits = self.queue.pop_front()?;
        debug_assert_eq!(bits.len(), wires.len());
        Some(bits)
    }
}

/// 收集所有求值结果的输出接收者
#[derive(Debug, Clone, Default)]
pub struct CollectOutputs {
    pub results: Vec<(String, BTreeMap<WireId, u8>)>,
}

impl OutputSink for CollectOutputs {
    fn report(&mut self, circuit_id: &str, outputs: &BTreeMap<WireId, u8>) {
        self.results.push((circuit_id.to_string(), outputs.clone()));
    }
}

/// 把每次求值结果打印到标准输出的接收者
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintOutputs;

impl OutputSink for PrintOutputs {
    fn report(&mut self, circuit_id: &str, outputs: &BTreeMap<WireId, u8>) {
        let bits: Vec<String> = outputs.values().map(|b| b.to_string()).collect();
        println!("{}: outputs {:?} = {}", circuit_id, outputs.keys().collect::<Vec<_>>(), bits.join(" "));
    }
}
