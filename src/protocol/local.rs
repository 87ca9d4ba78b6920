//! Local single-process driver
//!
//! Runs a circuit bundle without any network peer, either printing the
//! exhaustive evaluation over all input assignments or dumping the garbled
//! tables. Every printed row uses its own fresh garbling and is
//! cross-checked against plaintext evaluation.

use crate::circuit::{Circuit, CircuitBundle, WireId};
use crate::garble::{evaluate, GarbledCircuit, GarbledTable};
use crate::{Result, YaoError};
use rand::thread_rng;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

/// 本地模式的打印方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintMode {
    /// 打印穷举求值表（默认）
    Circuit,
    /// 打印混淆表
    Table,
}

impl PrintMode {
    /// 解析命令行模式名
    pub fn parse(mode: &str) -> Option<Self> {
        match mode {
            "circuit" => Some(PrintMode::Circuit),
            "table" => Some(PrintMode::Table),
            _ => None,
        }
    }
}

/// 穷举模式下允许的参与方输入线总数上限
const MAX_EXHAUSTIVE_INPUTS: usize = 20;

/// 本地运行入口
///
/// 解析电路文件并对其中每个电路执行所选的打印模式。返回最后一个电路
/// 最后一行（全 1 赋值）的输出映射；`Table` 模式返回空映射。
pub fn run_local<P: AsRef<Path>>(circuit_path: P, mode: PrintMode) -> Result<BTreeMap<WireId, u8>> {
    let bundle = CircuitBundle::from_path(circuit_path)?;
    info!(name = %bundle.name, ?mode, "local run");

    let mut last_outputs = BTreeMap::new();
    for circuit in &bundle.circuits {
        println!("======== {} ========", circuit.id);
        match mode {
            PrintMode::Circuit => last_outputs = print_evaluation(circuit)?,
            PrintMode::Table => print_tables(circuit)?,
        }
        println!();
    }
    Ok(last_outputs)
}

fn print_evaluation(circuit: &Circuit) -> Result<BTreeMap<WireId, u8>> {
    let n = circuit.alice.len() + circuit.bob.len();
    if n > MAX_EXHAUSTIVE_INPUTS {
        return Err(YaoError::InvalidCircuit(format!(
            "circuit {} has {} input wires, too many for exhaustive mode",
            circuit.id, n
        )));
    }

    let mut last_outputs = BTreeMap::new();
    for assignment in 0..(1u64 << n) {
        let bits: Vec<u8> = (0..n)
            .map(|i| ((assignment >> (n - 1 - i)) & 1) as u8)
            .collect();
        let (a_bits, b_bits) = bits.split_at(circuit.alice.len());

        let garbled = GarbledCircuit::build(circuit.clone(), &mut thread_rng())?;
        let a_inputs = garbled.select_inputs(&circuit.alice, a_bits)?;
        let b_inputs = garbled.select_inputs(&circuit.bob, b_bits)?;
        let outputs = evaluate(
            circuit,
            garbled.tables(),
            &garbled.pbits_out(),
            &a_inputs,
            &b_inputs,
        )?;

        let plain = circuit.eval_plain(a_bits, b_bits)?;
        if outputs != plain {
            return Err(YaoError::CryptoFailure(format!(
                "garbled evaluation of {} disagrees with plaintext on {}",
                circuit.id,
                fmt_bits(&bits)
            )));
        }

        println!(
            "  Alice{:?} = {} Bob{:?} = {}  Outputs{:?} = {}",
            circuit.alice,
            fmt_bits(a_bits),
            circuit.bob,
            fmt_bits(b_bits),
            circuit.out,
            fmt_outputs(&circuit.out, &outputs),
        );
        last_outputs = outputs;
    }
    Ok(last_outputs)
}

fn print_tables(circuit: &Circuit) -> Result<()> {
    let garbled = GarbledCircuit::build(circuit.clone(), &mut thread_rng())?;
    for (gate_id, table) in garbled.tables() {
        match table {
            GarbledTable::Unary { rows } => {
                for (index, row) in rows.iter().enumerate() {
                    println!("  gate {} row[{}] = {}", gate_id, index, fmt_hex(&row.to_bytes()));
                }
            }
            GarbledTable::Binary { rows } => {
                for (index, row) in rows.iter().enumerate() {
                    println!(
                        "  gate {} row[{}, {}] = {}",
                        gate_id,
                        index / 2,
                        index % 2,
                        fmt_hex(&row.to_bytes())
                    );
                }
            }
        }
    }
    Ok(())
}

fn fmt_bits(bits: &[u8]) -> String {
    bits.iter()
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn fmt_outputs(order: &[WireId], outputs: &BTreeMap<WireId, u8>) -> String {
    order
        .iter()
        .filter_map(|w| outputs.get(w))
        .map(|b| b.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn fmt_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_print_mode_parse() {
        assert_eq!(PrintMode::parse("circuit"), Some(PrintMode::Circuit));
        assert_eq!(PrintMode::parse("table"), Some(PrintMode::Table));
        assert_eq!(PrintMode::parse("bogus"), None);
    }

    #[test]
    fn test_fmt_helpers() {
        assert_eq!(fmt_bits(&[1, 0, 1]), "1 0 1");
        assert_eq!(fmt_hex(&[0xab, 0x01]), "ab01");
    }
}
