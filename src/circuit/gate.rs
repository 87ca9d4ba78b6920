//! Gate kinds and the gate record of the circuit description

use super::WireId;
use serde::{Deserialize, Serialize};

/// 门类型枚举
///
/// 电路描述支持的全部布尔门。NOT 是唯一的一元门，其余都是二元门。
/// JSON 电路文件中以大写名称表示（"AND"、"XNOR" 等）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GateKind {
    Not,
    Or,
    And,
    Xor,
    Xnor,
    Nor,
    Nand,
}

impl GateKind {
    /// 门的输入线数量
    pub fn arity(self) -> usize {
        match self {
            GateKind::Not => 1,
            _ => 2,
        }
    }

    /// 对明文比特求值
    ///
    /// `inputs` 的长度必须等于 [`GateKind::arity`]，每个元素 ∈ {0, 1}。
    pub fn apply(self, inputs: &[u8]) -> u8 {
        match self {
            GateKind::Not => 1 ^ inputs[0],
            GateKind::Or => inputs[0] | inputs[1],
            GateKind::And => inputs[0] & inputs[1],
            GateKind::Xor => inputs[0] ^ inputs[1],
            GateKind::Xnor => 1 ^ inputs[0] ^ inputs[1],
            GateKind::Nor => 1 ^ (inputs[0] | inputs[1]),
            GateKind::Nand => 1 ^ (inputs[0] & inputs[1]),
        }
    }
}

/// 逻辑门结构
///
/// `id` 既是门的标识符也是其输出线的标识符；`inputs` 引用先前定义的线。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    /// 门的输出线标识符
    pub id: WireId,
    /// 门的类型
    #[serde(rename = "type")]
    pub kind: GateKind,
    /// 输入线标识符列表，NOT 为 1 条，其余为 2 条
    #[serde(rename = "in")]
    pub inputs: Vec<WireId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truth_tables() {
        for (a, b) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            assert_eq!(GateKind::And.apply(&[a, b]), a & b);
            assert_eq!(GateKind::Or.apply(&[a, b]), a | b);
            assert_eq!(GateKind::Xor.apply(&[a, b]), a ^ b);
            assert_eq!(GateKind::Xnor.apply(&[a, b]), 1 - (a ^ b));
            assert_eq!(GateKind::Nor.apply(&[a, b]), 1 - (a | b));
            assert_eq!(GateKind::Nand.apply(&[a, b]), 1 - (a & b));
        }
        assert_eq!(GateKind::Not.apply(&[0]), 1);
        assert_eq!(GateKind::Not.apply(&[1]), 0);
    }

    #[test]
    fn test_arity() {
        assert_eq!(GateKind::Not.arity(), 1);
        assert_eq!(GateKind::Nand.arity(), 2);
    }

    #[test]
    fn test_gate_json_field_names() {
        let gate: Gate = serde_json::from_str(r#"{"id": 3, "type": "AND", "in": [1, 2]}"#).unwrap();
        assert_eq!(gate.id, 3);
        assert_eq!(gate.kind, GateKind::And);
        assert_eq!(gate.inputs, vec![1, 2]);

        let back = serde_json::to_string(&gate).unwrap();
        assert!(back.contains(r#""type":"AND""#));
        assert!(back.contains(r#""in":[1,2]"#));
    }
}
