//! Wire protocol messages
//!
//! One frame carries one serialized [`Message`]. The enum variant is the
//! top-level tag discriminating message kinds; payload structs carry the
//! actual material.

use crate::circuit::{Circuit, WireId};
use crate::garble::{ActiveWire, GarbledTable};
use crate::ot::{OtPublicPair, OtReply};
use crate::YaoError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 协议版本字符串
///
/// 指明消息布局与 OT 群参数；双方必须一致。
pub const PROTOCOL_VERSION: &str = "yao-mpc/1 ot-group=rfc3526-modp2048";

/// CIRCUIT_SETUP 载荷：一次求值所需的全部混淆材料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitSetup {
    /// 协议版本，含 OT 群标识
    pub version: String,
    /// 电路描述
    pub circuit: Circuit,
    /// 每个门的混淆表
    pub garbled_tables: BTreeMap<WireId, GarbledTable>,
    /// 输出线的 p 比特
    pub pbits_out: BTreeMap<WireId, u8>,
}

/// OT_RECEIVER 载荷
///
/// 正常路径是每条求值方输入线一个盲化对；`Clear` 是仅限本地测试的
/// 短路模式，直接泄露明文选择位。两种载荷的元素顺序都与电路声明的
/// 求值方输入线顺序一致。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OtReceiverPayload {
    Blinded(Vec<OtPublicPair>),
    Clear(Vec<u8>),
}

/// OT_SENDER 载荷，与 [`OtReceiverPayload`] 的两种形式一一对应
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OtSenderPayload {
    Encrypted(Vec<OtReply>),
    Direct(Vec<ActiveWire>),
}

/// 协议消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    CircuitSetup(CircuitSetup),
    Ack,
    GarblerInputs(Vec<(WireId, ActiveWire)>),
    OtReceiver(OtReceiverPayload),
    OtSender(OtSenderPayload),
    Output(Vec<(WireId, u8)>),
    Error(String),
}

impl Message {
    /// 消息种类名称，用于日志与协议错误报告
    pub fn kind(&self) -> &'static str {
        match self {
            Message::CircuitSetup(_) => "CIRCUIT_SETUP",
            Message::Ack => "ACK",
            Message::GarblerInputs(_) => "GARBLER_INPUTS",
            Message::OtReceiver(_) => "OT_RECEIVER",
            Message::OtSender(_) => "OT_SENDER",
            Message::Output(_) => "OUTPUT",
            Message::Error(_) => "ERROR",
        }
    }
}

/// 收到与协议步骤不符的消息时构造 `ProtocolViolation`
///
/// 对端的 ERROR 消息原样并入原因，便于诊断。
pub fn unexpected(expected: &str, got: &Message) -> YaoError {
    match got {
        Message::Error(reason) => {
            YaoError::ProtocolViolation(format!("peer reported error: {}", reason))
        }
        other => YaoError::ProtocolViolation(format!("expected {}, got {}", expected, other.kind())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kinds() {
        assert_eq!(Message::Ack.kind(), "ACK");
        assert_eq!(Message::Output(vec![(3, 1)]).kind(), "OUTPUT");
    }

    #[test]
    fn test_bincode_roundtrip() {
        let message = Message::GarblerInputs(vec![(
            1,
            ActiveWire {
                key: [9u8; 16],
                encr_bit: 1,
            },
        )]);
        let bytes = bincode::serialize(&message).unwrap();
        let back: Message = bincode::deserialize(&bytes).unwrap();
        assert_eq!(message, back);
    }

    #[test]
    fn test_unexpected_carries_peer_error() {
        let err = unexpected("ACK", &Message::Error("boom".to_string()));
        assert!(err.to_string().contains("boom"));
    }
}
