//! # 电路模型模块 (Circuit Model)
//!
//! 本模块定义布尔电路的表示方法：线、门以及按参与方划分的输入线。
//! 电路是一个有向无环图，门按拓扑序排列，每个门的输入只引用参与方输入线
//! 或先前门的输出线。电路既可以明文求值（本地测试），也可以被混淆后安全求值。
//!
//! ## 电路文件格式
//!
//! 电路以 JSON 捆绑包的形式描述，一个捆绑包可含多个电路：
//!
//! ```json
//! {
//!   "name": "bool circuits",
//!   "circuits": [
//!     {
//!       "id": "and",
//!       "alice": [1],
//!       "bob": [2],
//!       "out": [3],
//!       "gates": [{"id": 3, "type": "AND", "in": [1, 2]}]
//!     }
//!   ]
//! }
//! ```
//!
//! `alice` 是混淆方 (Garbler) 的输入线，`bob` 是求值方 (Evaluator) 的输入线，
//! 两者都可以为空（该方不提供输入）。解析后的电路经过完整校验，
//! 任何违反约束的描述都会返回 `InvalidCircuit`。

pub mod gate;
pub mod parser;

pub use gate::*;
pub use parser::*;

use crate::{Result, YaoError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// 线标识符类型
///
/// 用于唯一标识电路中的每条线。门的标识符就是其输出线的标识符。
pub type WireId = u32;

/// 布尔电路结构
///
/// 表示一个完整的布尔电路，门按拓扑序排列。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// 电路标识符
    pub id: String,
    /// 混淆方 (Alice) 的输入线，有序
    #[serde(default)]
    pub alice: Vec<WireId>,
    /// 求值方 (Bob) 的输入线，有序
    #[serde(default)]
    pub bob: Vec<WireId>,
    /// 输出线，有序
    pub out: Vec<WireId>,
    /// 门列表，拓扑序
    pub gates: Vec<Gate>,
}

impl Circuit {
    /// 电路中所有携带值的线：参与方输入线加上每个门的输出线
    ///
    /// 按定义顺序返回，无重复（以校验过的电路为前提）。
    pub fn wires(&self) -> Vec<WireId> {
        let mut wires = Vec::with_capacity(self.alice.len() + self.bob.len() + self.gates.len());
        wires.extend_from_slice(&self.alice);
        wires.extend_from_slice(&self.bob);
        wires.extend(self.gates.iter().map(|g| g.id));
        wires
    }

    /// 明文求值
    ///
    /// `a_bits` 和 `b_bits` 分别按 `alice` 和 `bob` 的线序提供输入比特。
    /// 返回输出线到比特的映射。用于本地穷举模式和混淆求值的正确性对照。
    pub fn eval_plain(&self, a_bits: &[u8], b_bits: &[u8]) -> Result<BTreeMap<WireId, u8>> {
        if a_bits.len() != self.alice.len() || b_bits.len() != self.bob.len() {
            return Err(YaoError::InvalidCircuit(format!(
                "circuit {} expects {}+{} input bits, got {}+{}",
                self.id,
                self.alice.len(),
                self.bob.len(),
                a_bits.len(),
                b_bits.len()
            )));
        }

        let mut values: HashMap<WireId, u8> = HashMap::new();
        for (wire, bit) in self.alice.iter().zip(a_bits) {
            values.insert(*wire, bit & 1);
        }
        for (wire, bit) in self.bob.iter().zip(b_bits) {
            values.insert(*wire, bit & 1);
        }

        for gate in &self.gates {
            let mut inputs = Vec::with_capacity(gate.inputs.len());
            for wire in &gate.inputs {
                let value = values.get(wire).ok_or_else(|| {
                    YaoError::InvalidCircuit(format!(
                        "gate {} reads undefined wire {}",
                        gate.id, wire
                    ))
                })?;
                inputs.push(*value);
            }
            values.insert(gate.id, gate.kind.apply(&inputs));
        }

        let mut outputs = BTreeMap::new();
        for wire in &self.out {
            let value = values.get(wire).ok_or_else(|| {
                YaoError::InvalidCircuit(format!("output wire {} is undefined", wire))
            })?;
            outputs.insert(*wire, *value);
        }
        Ok(outputs)
    }
}
