//! Garbled circuit construction
//!
//! Builds the full garbling of a validated circuit: per-wire key pairs and
//! p-bits, then one encrypted, permuted truth table per gate.

use super::{ActiveWire, GarbledTable};
use crate::circuit::{Circuit, Gate, WireId};
use crate::crypto::{random_bit, random_key, seal, Ciphertext, WireKey};
use crate::{Result, YaoError};
use rand::{CryptoRng, RngCore};
use std::collections::{BTreeMap, HashMap};

/// 混淆电路结构
///
/// 由混淆方构造并持有。求值方只会收到其中的电路描述、混淆表与输出线
/// p 比特；线密钥与其余 p 比特留在混淆方一侧。
#[derive(Debug, Clone)]
pub struct GarbledCircuit {
    circuit: Circuit,
    keys: HashMap<WireId, (WireKey, WireKey)>,
    pbits: HashMap<WireId, u8>,
    tables: BTreeMap<WireId, GarbledTable>,
}

impl GarbledCircuit {
    /// 混淆电路
    ///
    /// 对每条线采样密钥对与 p 比特，再按拓扑序为每个门构造混淆表。
    /// 给定相同的 RNG 状态，结果是确定性的。
    pub fn build<R: RngCore + CryptoRng>(circuit: Circuit, rng: &mut R) -> Result<Self> {
        circuit.validate()?;

        let mut keys = HashMap::new();
        let mut pbits = HashMap::new();
        for wire in circuit.wires() {
            keys.insert(wire, (random_key(rng), random_key(rng)));
            pbits.insert(wire, random_bit(rng));
        }

        let mut tables = BTreeMap::new();
        for gate in &circuit.gates {
            let table = if gate.kind.arity() == 1 {
                garble_unary(gate, &keys, &pbits, rng)?
            } else {
                garble_binary(gate, &keys, &pbits, rng)?
            };
            tables.insert(gate.id, table);
        }

        Ok(GarbledCircuit {
            circuit,
            keys,
            pbits,
            tables,
        })
    }

    /// 底层电路描述
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// 每个门的混淆表
    pub fn tables(&self) -> &BTreeMap<WireId, GarbledTable> {
        &self.tables
    }

    /// 输出线的 p 比特，明文发送给求值方用于解码输出
    pub fn pbits_out(&self) -> BTreeMap<WireId, u8> {
        self.circuit
            .out
            .iter()
            .filter_map(|w| self.pbits.get(w).map(|p| (*w, *p)))
            .collect()
    }

    /// 某条输入线在明文比特 `bit` 下的运行时值
    pub fn select_input(&self, wire: WireId, bit: u8) -> Result<ActiveWire> {
        let (key0, key1) = self
            .keys
            .get(&wire)
            .ok_or_else(|| YaoError::InvalidCircuit(format!("unknown wire {}", wire)))?;
        let pbit = self.pbits[&wire];
        let bit = bit & 1;
        Ok(ActiveWire {
            key: if bit == 0 { *key0 } else { *key1 },
            encr_bit: bit ^ pbit,
        })
    }

    /// 一组输入线按给定比特串选定的运行时值
    pub fn select_inputs(
        &self,
        wires: &[WireId],
        bits: &[u8],
    ) -> Result<HashMap<WireId, ActiveWire>> {
        if wires.len() != bits.len() {
            return Err(YaoError::InvalidCircuit(format!(
                "{} input wires but {} bits",
                wires.len(),
                bits.len()
            )));
        }
        wires
            .iter()
            .zip(bits)
            .map(|(w, b)| Ok((*w, self.select_input(*w, *b)?)))
            .collect()
    }

    /// 某条输入线的两个运行时值 (比特 0 的在前)
    ///
    /// 混淆方把这两个值作为一次不经意传输的消息对。
    pub fn input_pair(&self, wire: WireId) -> Result<(ActiveWire, ActiveWire)> {
        Ok((self.select_input(wire, 0)?, self.select_input(wire, 1)?))
    }
}

fn wire_keys<'a>(
    keys: &'a HashMap<WireId, (WireKey, WireKey)>,
    wire: WireId,
) -> Result<&'a (WireKey, WireKey)> {
    keys.get(&wire)
        .ok_or_else(|| YaoError::InvalidCircuit(format!("no keys for wire {}", wire)))
}

fn key_for(pair: &(WireKey, WireKey), bit: u8) -> &WireKey {
    if bit == 0 {
        &pair.0
    } else {
        &pair.1
    }
}

fn garble_unary<R: RngCore + CryptoRng>(
    gate: &Gate,
    keys: &HashMap<WireId, (WireKey, WireKey)>,
    pbits: &HashMap<WireId, u8>,
    rng: &mut R,
) -> Result<GarbledTable> {
    let u = gate.inputs[0];
    let keys_u = wire_keys(keys, u)?;
    let keys_w = wire_keys(keys, gate.id)?;
    let (p_u, p_w) = (pbits[&u], pbits[&gate.id]);

    let mut rows: Vec<Option<Ciphertext>> = vec![None; 2];
    for bu in 0..=1u8 {
        let b_out = gate.kind.apply(&[bu]);
        let payload = ActiveWire {
            key: *key_for(keys_w, b_out),
            encr_bit: b_out ^ p_w,
        }
        .to_bytes();
        rows[(bu ^ p_u) as usize] = Some(seal(key_for(keys_u, bu), &payload, rng));
    }

    collect_rows(rows).map(|rows| GarbledTable::Unary { rows })
}

fn garble_binary<R: RngCore + CryptoRng>(
    gate: &Gate,
    keys: &HashMap<WireId, (WireKey, WireKey)>,
    pbits: &HashMap<WireId, u8>,
    rng: &mut R,
) -> Result<GarbledTable> {
    let (u, v) = (gate.inputs[0], gate.inputs[1]);
    let keys_u = wire_keys(keys, u)?;
    let keys_v = wire_keys(keys, v)?;
    let keys_w = wire_keys(keys, gate.id)?;
    let (p_u, p_v, p_w) = (pbits[&u], pbits[&v], pbits[&gate.id]);

    let mut rows: Vec<Option<Ciphertext>> = vec![None; 4];
    for bu in 0..=1u8 {
        for bv in 0..=1u8 {
            let b_out = gate.kind.apply(&[bu, bv]);
            let payload = ActiveWire {
                key: *key_for(keys_w, b_out),
                encr_bit: b_out ^ p_w,
            }
            .to_bytes();
            // Inner layer under the first input's key, outer under the second's.
            let inner = seal(key_for(keys_u, bu), &payload, rng);
            let outer = seal(key_for(keys_v, bv), &inner.to_bytes(), rng);
            let (eu, ev) = (bu ^ p_u, bv ^ p_v);
            rows[(eu as usize) * 2 + ev as usize] = Some(outer);
        }
    }

    collect_rows(rows).map(|rows| GarbledTable::Binary { rows })
}

fn collect_rows(rows: Vec<Option<Ciphertext>>) -> Result<Vec<Ciphertext>> {
    rows.into_iter()
        .map(|r| r.ok_or(YaoError::MalformedGarbledTable))
        .collect()
}
