//! Interactive shell for the Yao protocol library
//!
//! A thin driver over the three library entry points: `alice` dials the
//! evaluator with inputs typed on stdin, `bob` listens and evaluates, and
//! `local` prints an exhaustive evaluation or the garbled tables.

use anyhow::{bail, Context, Result};
use std::io::{stdin, stdout, Write};
use yao_mpc::circuit::WireId;
use yao_mpc::protocol::{
    run_evaluator, run_garbler, run_local, InputProvider, NetConfig, PrintMode,
};

const USAGE: &str = "usage: yao_cli <alice|bob|local> [-c circuit.json] \
[--no-oblivious-transfer] [-m circuit|table] [-l level]";

struct Args {
    party: String,
    circuit: String,
    enable_ot: bool,
    mode: PrintMode,
    loglevel: tracing::Level,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let party = args.next().with_context(|| USAGE.to_string())?;

    let mut parsed = Args {
        party,
        circuit: "circuits/default.json".to_string(),
        enable_ot: true,
        mode: PrintMode::Circuit,
        loglevel: tracing::Level::WARN,
    };

    while let Some(flag) = args.next() {
        match flag.as_str() {
            "-c" | "--circuit" => {
                parsed.circuit = args.next().context("-c requires a path")?;
            }
            "--no-oblivious-transfer" => parsed.enable_ot = false,
            "-m" => {
                let mode = args.next().context("-m requires a mode")?;
                parsed.mode = PrintMode::parse(&mode)
                    .with_context(|| format!("unknown print mode '{}'", mode))?;
            }
            "-l" | "--loglevel" => {
                let level = args.next().context("-l requires a level")?;
                parsed.loglevel = level
                    .parse()
                    .with_context(|| format!("unknown log level '{}'", level))?;
            }
            other => bail!("unknown flag '{}'\n{}", other, USAGE),
        }
    }
    Ok(parsed)
}

/// Prompts the operator for one bit string per evaluation round.
struct StdinInputs {
    party: &'static str,
}

impl InputProvider for StdinInputs {
    fn next_bits(&mut self, circuit_id: &str, wires: &[WireId]) -> Option<Vec<u8>> {
        loop {
            print!(
                "{} inputs for circuit '{}' ({} bits, e.g. {}; 'q' to finish): ",
                self.party,
                circuit_id,
                wires.len(),
                "1".repeat(wires.len().max(1)),
            );
            let _ = stdout().flush();

            let mut line = String::new();
            if stdin().read_line(&mut line).is_err() {
                return None;
            }
            // Accept "[1,0,1,0]" and "1 0 1 0" alike.
            let cleaned: String = line
                .chars()
                .filter(|c| !matches!(c, '[' | ']' | ',' | ' ' | '\n' | '\r'))
                .collect();
            if cleaned.is_empty() || cleaned == "q" {
                return None;
            }
            if cleaned.len() == wires.len() && cleaned.chars().all(|c| c == '0' || c == '1') {
                return Some(cleaned.bytes().map(|b| b - b'0').collect());
            }
            println!("expected {} bits of 0/1, got '{}'", wires.len(), cleaned);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = parse_args()?;
    tracing_subscriber::fmt()
        .with_max_level(args.loglevel)
        .init();

    let config = NetConfig::from_env();
    match args.party.as_str() {
        "alice" => {
            let outputs = run_garbler(
                &args.circuit,
                StdinInputs { party: "Alice" },
                args.enable_ot,
                config,
            )
            .await?;
            if !outputs.is_empty() {
                println!("final outputs: {:?}", outputs);
            }
        }
        "bob" => {
            run_evaluator(StdinInputs { party: "Bob" }, args.enable_ot, config).await?;
        }
        "local" => {
            run_local(&args.circuit, args.mode)?;
        }
        other => bail!("unknown party '{}'\n{}", other, USAGE),
    }
    Ok(())
}
