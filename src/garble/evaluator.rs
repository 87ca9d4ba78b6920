//! Garbled circuit evaluation
//!
//! Runs a garbled circuit given the runtime (key, encr_bit) pair of every
//! input wire. Row lookup uses only the observable encrypted bits, so a
//! single double-decryption happens per binary gate.

use super::{ActiveWire, GarbledTable};
use crate::circuit::{Circuit, WireId};
use crate::crypto::{open, Ciphertext};
use crate::{Result, YaoError};
use std::collections::{BTreeMap, HashMap};

/// 混淆求值
///
/// 按拓扑序处理每个门：用两条输入线的加密比特定位表行，先在第二个输入的
/// 密钥下解密外层，再在第一个输入的密钥下解密内层，得到输出线的运行时值。
/// 最后对每条输出线计算 `encr_bit XOR pbits_out[w]` 还原明文比特。
///
/// 行缺失或在给定密钥下无法解密都是致命的 `MalformedGarbledTable` 错误。
pub fn evaluate(
    circuit: &Circuit,
    tables: &BTreeMap<WireId, GarbledTable>,
    pbits_out: &BTreeMap<WireId, u8>,
    a_inputs: &HashMap<WireId, ActiveWire>,
    b_inputs: &HashMap<WireId, ActiveWire>,
) -> Result<BTreeMap<WireId, u8>> {
    let mut values: HashMap<WireId, ActiveWire> = HashMap::new();
    for (wire, active) in a_inputs.iter().chain(b_inputs.iter()) {
        values.insert(*wire, *active);
    }

    for gate in &circuit.gates {
        let table = tables
            .get(&gate.id)
            .ok_or(YaoError::MalformedGarbledTable)?;
        let active = if gate.kind.arity() == 1 {
            let u = input_value(&values, gate.inputs[0], gate.id)?;
            let row = table.unary_row(u.encr_bit)?;
            decode_payload(&open_row(&u.key, row)?)?
        } else {
            let u = input_value(&values, gate.inputs[0], gate.id)?;
            let v = input_value(&values, gate.inputs[1], gate.id)?;
            let row = table.binary_row(u.encr_bit, v.encr_bit)?;
            let inner_bytes = open_row(&v.key, row)?;
            let inner = Ciphertext::from_bytes(&inner_bytes)
                .map_err(|_| YaoError::MalformedGarbledTable)?;
            decode_payload(&open_row(&u.key, &inner)?)?
        };
        values.insert(gate.id, active);
    }

    let mut outputs = BTreeMap::new();
    for wire in &circuit.out {
        let active = values
            .get(wire)
            .ok_or_else(|| YaoError::InvalidCircuit(format!("output wire {} undefined", wire)))?;
        let pbit = pbits_out.get(wire).ok_or_else(|| {
            YaoError::ProtocolViolation(format!("missing p-bit for output wire {}", wire))
        })?;
        outputs.insert(*wire, active.encr_bit ^ pbit);
    }
    Ok(outputs)
}

fn input_value(
    values: &HashMap<WireId, ActiveWire>,
    wire: WireId,
    gate: WireId,
) -> Result<ActiveWire> {
    values.get(&wire).copied().ok_or_else(|| {
        YaoError::InvalidCircuit(format!("gate {} reads wire {} with no value", gate, wire))
    })
}

fn open_row(key: &[u8], row: &Ciphertext) -> Result<Vec<u8>> {
    open(key, row).map_err(|_| YaoError::MalformedGarbledTable)
}

fn decode_payload(bytes: &[u8]) -> Result<ActiveWire> {
    ActiveWire::from_bytes(bytes).ok_or(YaoError::MalformedGarbledTable)
}
