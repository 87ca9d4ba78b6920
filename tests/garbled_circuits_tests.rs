//! 混淆电路测试
//!
//! 包含电路解析, 混淆, 求值以及与明文求值对照的端到端测试

use proptest::prelude::*;
use rand::thread_rng;
use std::collections::BTreeMap;
use yao_mpc::circuit::{Circuit, CircuitBundle, Gate, GateKind, WireId};
use yao_mpc::garble::{evaluate, GarbledCircuit};

const DEFAULT_BUNDLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/circuits/default.json");
const MAX4_BUNDLE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/circuits/max4.json");

fn garble_and_eval(circuit: &Circuit, a_bits: &[u8], b_bits: &[u8]) -> BTreeMap<WireId, u8> {
    let garbled = GarbledCircuit::build(circuit.clone(), &mut thread_rng()).unwrap();
    let a_inputs = garbled.select_inputs(&circuit.alice, a_bits).unwrap();
    let b_inputs = garbled.select_inputs(&circuit.bob, b_bits).unwrap();
    evaluate(
        circuit,
        garbled.tables(),
        &garbled.pbits_out(),
        &a_inputs,
        &b_inputs,
    )
    .unwrap()
}

fn bundle_circuit(path: &str, id: &str) -> Circuit {
    CircuitBundle::from_path(path)
        .unwrap()
        .circuits
        .into_iter()
        .find(|c| c.id == id)
        .unwrap_or_else(|| panic!("no circuit {} in {}", id, path))
}

fn bits(n: u64, width: usize) -> Vec<u8> {
    (0..width)
        .map(|i| ((n >> (width - 1 - i)) & 1) as u8)
        .collect()
}

// ===== Scenario: AND of one bit each =====

#[test]
fn test_and_circuit_truth_table() {
    let circuit = bundle_circuit(DEFAULT_BUNDLE, "and");
    for (a, b) in [(1, 1), (1, 0), (0, 1), (0, 0)] {
        let outputs = garble_and_eval(&circuit, &[a], &[b]);
        assert_eq!(outputs[&3], a & b, "AND({}, {})", a, b);
    }
}

// ===== Scenario: 2-bit equality =====

#[test]
fn test_eq2_circuit() {
    let circuit = bundle_circuit(DEFAULT_BUNDLE, "eq2");
    let outputs = garble_and_eval(&circuit, &bits(0b10, 2), &bits(0b10, 2));
    assert_eq!(outputs[&7], 1);
    let outputs = garble_and_eval(&circuit, &bits(0b10, 2), &bits(0b11, 2));
    assert_eq!(outputs[&7], 0);
}

// ===== Scenario: 4-bit greater-than =====

#[test]
fn test_gt4_circuit() {
    let circuit = bundle_circuit(DEFAULT_BUNDLE, "gt4");
    let cases = [
        (0b1010, 0b0101, 1),
        (0b0011, 0b0011, 0),
        (0b0000, 0b1111, 0),
    ];
    for (a, b, expected) in cases {
        let outputs = garble_and_eval(&circuit, &bits(a, 4), &bits(b, 4));
        assert_eq!(outputs[&25], expected, "gt4({:04b}, {:04b})", a, b);
    }
}

#[test]
fn test_gt4_exhaustive_against_comparison() {
    let circuit = bundle_circuit(DEFAULT_BUNDLE, "gt4");
    for a in 0u64..16 {
        for b in 0u64..16 {
            let outputs = garble_and_eval(&circuit, &bits(a, 4), &bits(b, 4));
            assert_eq!(outputs[&25], (a > b) as u8, "gt4({:04b}, {:04b})", a, b);
        }
    }
}

// ===== Scenario: exhaustive equivalence with plaintext evaluation =====

#[test]
fn test_default_bundle_matches_plaintext_on_all_inputs() {
    let bundle = CircuitBundle::from_path(DEFAULT_BUNDLE).unwrap();
    for circuit in &bundle.circuits {
        let n = circuit.alice.len() + circuit.bob.len();
        for assignment in 0..(1u64 << n) {
            let all = bits(assignment, n);
            let (a_bits, b_bits) = all.split_at(circuit.alice.len());
            let garbled_outputs = garble_and_eval(circuit, a_bits, b_bits);
            let plain_outputs = circuit.eval_plain(a_bits, b_bits).unwrap();
            assert_eq!(garbled_outputs, plain_outputs, "{} on {:?}", circuit.id, all);
        }
    }
}

#[test]
fn test_max4_computes_maximum() {
    let circuit = bundle_circuit(MAX4_BUNDLE, "max4");
    for a in 0u64..16 {
        for b in 0u64..16 {
            let outputs = garble_and_eval(&circuit, &bits(a, 4), &bits(b, 4));
            let value = circuit
                .out
                .iter()
                .fold(0u64, |acc, w| (acc << 1) | outputs[w] as u64);
            assert_eq!(value, a.max(b), "max4({}, {})", a, b);
        }
    }
}

// ===== Boundary behaviors =====

#[test]
fn test_xor_only_circuit() {
    // No free-XOR optimization: XOR gates still carry full garbled tables.
    let circuit = Circuit {
        id: "xor-chain".to_string(),
        alice: vec![1, 2],
        bob: vec![3],
        out: vec![5],
        gates: vec![
            Gate {
                id: 4,
                kind: GateKind::Xor,
                inputs: vec![1, 2],
            },
            Gate {
                id: 5,
                kind: GateKind::Xor,
                inputs: vec![4, 3],
            },
        ],
    };
    for assignment in 0..8u64 {
        let all = bits(assignment, 3);
        let outputs = garble_and_eval(&circuit, &all[..2], &all[2..]);
        assert_eq!(outputs[&5], all[0] ^ all[1] ^ all[2]);
    }
}

#[test]
fn test_single_not_gate_circuit() {
    let circuit = Circuit {
        id: "not".to_string(),
        alice: vec![1],
        bob: vec![],
        out: vec![2],
        gates: vec![Gate {
            id: 2,
            kind: GateKind::Not,
            inputs: vec![1],
        }],
    };
    assert_eq!(garble_and_eval(&circuit, &[0], &[])[&2], 1);
    assert_eq!(garble_and_eval(&circuit, &[1], &[])[&2], 0);
}

#[test]
fn test_empty_alice_circuit() {
    let circuit = Circuit {
        id: "bob-only".to_string(),
        alice: vec![],
        bob: vec![1, 2],
        out: vec![3],
        gates: vec![Gate {
            id: 3,
            kind: GateKind::Nor,
            inputs: vec![1, 2],
        }],
    };
    for (a, b) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
        let outputs = garble_and_eval(&circuit, &[], &[a, b]);
        assert_eq!(outputs[&3], 1 - (a | b));
    }
}

#[test]
fn test_output_wire_may_be_direct_input() {
    let circuit = Circuit {
        id: "passthrough".to_string(),
        alice: vec![1],
        bob: vec![2],
        out: vec![1, 3],
        gates: vec![Gate {
            id: 3,
            kind: GateKind::And,
            inputs: vec![1, 2],
        }],
    };
    let outputs = garble_and_eval(&circuit, &[1], &[0]);
    assert_eq!(outputs[&1], 1);
    assert_eq!(outputs[&3], 0);
}

#[test]
fn test_independent_garblings_disagree_on_keys_agree_on_outputs() {
    let circuit = bundle_circuit(DEFAULT_BUNDLE, "eq2");
    let g1 = GarbledCircuit::build(circuit.clone(), &mut thread_rng()).unwrap();
    let g2 = GarbledCircuit::build(circuit.clone(), &mut thread_rng()).unwrap();
    assert_ne!(
        g1.select_input(1, 0).unwrap().key,
        g2.select_input(1, 0).unwrap().key
    );

    for assignment in 0..16u64 {
        let all = bits(assignment, 4);
        let (a_bits, b_bits) = all.split_at(2);
        let eval_with = |g: &GarbledCircuit| {
            evaluate(
                &circuit,
                g.tables(),
                &g.pbits_out(),
                &g.select_inputs(&circuit.alice, a_bits).unwrap(),
                &g.select_inputs(&circuit.bob, b_bits).unwrap(),
            )
            .unwrap()
        };
        assert_eq!(eval_with(&g1), eval_with(&g2));
    }
}

// ===== Randomized equivalence =====

const ALL_KINDS: [GateKind; 7] = [
    GateKind::Not,
    GateKind::Or,
    GateKind::And,
    GateKind::Xor,
    GateKind::Xnor,
    GateKind::Nor,
    GateKind::Nand,
];

/// Builds a valid random circuit over two Alice wires and two Bob wires.
fn build_random_circuit(plan: &[(usize, prop::sample::Index, prop::sample::Index)]) -> Circuit {
    let mut wires: Vec<WireId> = vec![1, 2, 3, 4];
    let mut gates = Vec::with_capacity(plan.len());
    for (i, (kind_index, in1, in2)) in plan.iter().enumerate() {
        let id = 5 + i as WireId;
        let kind = ALL_KINDS[kind_index % ALL_KINDS.len()];
        let mut inputs = vec![wires[in1.index(wires.len())]];
        if kind.arity() == 2 {
            inputs.push(wires[in2.index(wires.len())]);
        }
        gates.push(Gate { id, kind, inputs });
        wires.push(id);
    }
    let out = vec![*wires.last().unwrap()];
    Circuit {
        id: "random".to_string(),
        alice: vec![1, 2],
        bob: vec![3, 4],
        out,
        gates,
    }
}

proptest! {
    #[test]
    fn prop_garbled_evaluation_matches_plaintext(
        plan in prop::collection::vec(
            (0usize..7, any::<prop::sample::Index>(), any::<prop::sample::Index>()),
            1..24,
        )
    ) {
        let circuit = build_random_circuit(&plan);
        prop_assert!(circuit.validate().is_ok());
        for assignment in 0..16u64 {
            let all = bits(assignment, 4);
            let (a_bits, b_bits) = all.split_at(2);
            let garbled_outputs = garble_and_eval(&circuit, a_bits, b_bits);
            let plain_outputs = circuit.eval_plain(a_bits, b_bits).unwrap();
            prop_assert_eq!(&garbled_outputs, &plain_outputs);
        }
    }
}
