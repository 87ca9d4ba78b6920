//! Circuit bundle parsing and validation
//!
//! Consumes the JSON schema documented in the module docs and rejects every
//! malformed description with `InvalidCircuit` before any protocol work
//! begins.

use super::{Circuit, WireId};
use crate::{Result, YaoError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// 电路捆绑包
///
/// 一个命名的电路集合，对应一个 JSON 电路文件。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBundle {
    /// 捆绑包名称
    pub name: String,
    /// 电路列表
    pub circuits: Vec<Circuit>,
}

impl CircuitBundle {
    /// 从 JSON 文本解析并校验电路捆绑包
    pub fn from_json(json: &str) -> Result<Self> {
        let bundle: CircuitBundle = serde_json::from_str(json)
            .map_err(|e| YaoError::InvalidCircuit(format!("malformed circuit file: {}", e)))?;
        if bundle.circuits.is_empty() {
            return Err(YaoError::InvalidCircuit(
                "bundle contains no circuits".to_string(),
            ));
        }
        for circuit in &bundle.circuits {
            circuit.validate()?;
        }
        Ok(bundle)
    }

    /// 从文件路径读取电路捆绑包
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            YaoError::InvalidCircuit(format!(
                "cannot read circuit file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json(&json)
    }
}

impl Circuit {
    /// 校验电路描述
    ///
    /// 检查项：
    /// - `gates` 与 `out` 非空（`alice`、`bob` 允许为空）
    /// - 线标识符唯一：参与方输入线之间、输入线与门输出线之间互不重复
    /// - 门的输入线数量与门类型匹配
    /// - 门的输入只引用参与方输入线或先前门的输出线（拓扑序）
    /// - 输出线必须是已定义的线
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| Err(YaoError::InvalidCircuit(reason));

        if self.gates.is_empty() {
            return fail(format!("circuit {} has no gates", self.id));
        }
        if self.out.is_empty() {
            return fail(format!("circuit {} has no output wires", self.id));
        }

        let mut defined: HashSet<WireId> = HashSet::new();
        for wire in self.alice.iter().chain(self.bob.iter()) {
            if !defined.insert(*wire) {
                return fail(format!(
                    "circuit {}: input wire {} declared twice",
                    self.id, wire
                ));
            }
        }

        for gate in &self.gates {
            if gate.inputs.len() != gate.kind.arity() {
                return fail(format!(
                    "circuit {}: gate {} has {} inputs, {:?} takes {}",
                    self.id,
                    gate.id,
                    gate.inputs.len(),
                    gate.kind,
                    gate.kind.arity()
                ));
            }
            for wire in &gate.inputs {
                if !defined.contains(wire) {
                    return fail(format!(
                        "circuit {}: gate {} references undefined wire {}",
                        self.id, gate.id, wire
                    ));
                }
            }
            if !defined.insert(gate.id) {
                return fail(format!(
                    "circuit {}: wire {} is defined more than once",
                    self.id, gate.id
                ));
            }
        }

        for wire in &self.out {
            if !defined.contains(wire) {
                return fail(format!(
                    "circuit {}: output wire {} is undefined",
                    self.id, wire
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{Gate, GateKind};

    fn bundle_json() -> &'static str {
        r#"{
            "name": "test bundle",
            "circuits": [
                {
                    "id": "and",
                    "alice": [1],
                    "bob": [2],
                    "out": [3],
                    "gates": [{"id": 3, "type": "AND", "in": [1, 2]}]
                }
            ]
        }"#
    }

    #[test]
    fn test_parse_valid_bundle() {
        let bundle = CircuitBundle::from_json(bundle_json()).unwrap();
        assert_eq!(bundle.name, "test bundle");
        assert_eq!(bundle.circuits.len(), 1);
        assert_eq!(bundle.circuits[0].gates[0].kind, GateKind::And);
    }

    #[test]
    fn test_parse_serialize_reparse_equivalence() {
        let bundle = CircuitBundle::from_json(bundle_json()).unwrap();
        let json = serde_json::to_string(&bundle).unwrap();
        let reparsed = CircuitBundle::from_json(&json).unwrap();
        assert_eq!(bundle, reparsed);
    }

    #[test]
    fn test_unknown_gate_kind_rejected() {
        let json = bundle_json().replace("AND", "MAJ");
        assert!(CircuitBundle::from_json(&json).is_err());
    }

    #[test]
    fn test_missing_party_lists_default_empty() {
        let json = r#"{
            "name": "n",
            "circuits": [
                {
                    "id": "not",
                    "bob": [1],
                    "out": [2],
                    "gates": [{"id": 2, "type": "NOT", "in": [1]}]
                }
            ]
        }"#;
        let bundle = CircuitBundle::from_json(json).unwrap();
        assert!(bundle.circuits[0].alice.is_empty());
    }

    fn circuit(gates: Vec<Gate>, alice: Vec<WireId>, bob: Vec<WireId>, out: Vec<WireId>) -> Circuit {
        Circuit {
            id: "c".to_string(),
            alice,
            bob,
            out,
            gates,
        }
    }

    #[test]
    fn test_arity_mismatch_rejected() {
        let c = circuit(
            vec![Gate {
                id: 3,
                kind: GateKind::Not,
                inputs: vec![1, 2],
            }],
            vec![1],
            vec![2],
            vec![3],
        );
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_forward_reference_rejected() {
        // Gate 3 reads wire 4 which is only defined by the later gate.
        let c = circuit(
            vec![
                Gate {
                    id: 3,
                    kind: GateKind::And,
                    inputs: vec![1, 4],
                },
                Gate {
                    id: 4,
                    kind: GateKind::Not,
                    inputs: vec![2],
                },
            ],
            vec![1],
            vec![2],
            vec![3],
        );
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_duplicate_gate_output_rejected() {
        let c = circuit(
            vec![
                Gate {
                    id: 3,
                    kind: GateKind::And,
                    inputs: vec![1, 2],
                },
                Gate {
                    id: 3,
                    kind: GateKind::Or,
                    inputs: vec![1, 2],
                },
            ],
            vec![1],
            vec![2],
            vec![3],
        );
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_overlapping_party_inputs_rejected() {
        let c = circuit(
            vec![Gate {
                id: 3,
                kind: GateKind::And,
                inputs: vec![1, 1],
            }],
            vec![1],
            vec![1],
            vec![3],
        );
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_undefined_output_rejected() {
        let c = circuit(
            vec![Gate {
                id: 3,
                kind: GateKind::And,
                inputs: vec![1, 2],
            }],
            vec![1],
            vec![2],
            vec![9],
        );
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_output_may_be_direct_input() {
        let c = circuit(
            vec![Gate {
                id: 3,
                kind: GateKind::And,
                inputs: vec![1, 2],
            }],
            vec![1],
            vec![2],
            vec![1, 3],
        );
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_empty_alice_is_legal() {
        let c = circuit(
            vec![Gate {
                id: 2,
                kind: GateKind::Not,
                inputs: vec![1],
            }],
            vec![],
            vec![1],
            vec![2],
        );
        assert!(c.validate().is_ok());
    }
}
