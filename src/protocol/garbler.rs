//! Garbler role (Alice)
//!
//! The garbler owns the circuit bundle, dials the evaluator and drives the
//! message flow. A fresh garbling is produced for every evaluation; garbled
//! material is never reused across inputs.

use super::messages::{
    unexpected, CircuitSetup, Message, OtReceiverPayload, OtSenderPayload, PROTOCOL_VERSION,
};
use super::transport::FramedStream;
use super::{CollectOutputs, InputProvider, NetConfig, OutputSink};
use crate::circuit::{Circuit, CircuitBundle, WireId};
use crate::crypto::OtGroup;
use crate::garble::{ActiveWire, GarbledCircuit};
use crate::ot::OtSender;
use crate::{Result, YaoError};
use rand::thread_rng;
use std::collections::BTreeMap;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// 混淆方角色
///
/// 对输入来源与输出去向多态：`provider` 在每次求值前给出 Alice 的明文
/// 输入比特，`sink` 接收每次求值的输出。
#[derive(Debug)]
pub struct Garbler<P, S> {
    bundle: CircuitBundle,
    provider: P,
    sink: S,
    enable_ot: bool,
    config: NetConfig,
}

impl<P: InputProvider, S: OutputSink> Garbler<P, S> {
    pub fn new(
        bundle: CircuitBundle,
        provider: P,
        sink: S,
        enable_ot: bool,
        config: NetConfig,
    ) -> Self {
        Garbler {
            bundle,
            provider,
            sink,
            enable_ot,
            config,
        }
    }

    /// 拨号求值方并逐电路运行求值循环
    ///
    /// 每个电路反复询问输入提供者，直到其返回 `None`；随后处理下一个
    /// 电路。返回最后一次求值的输出映射。
    pub async fn run(&mut self) -> Result<BTreeMap<WireId, u8>> {
        let addr = self.config.addr();
        info!(address = %addr, name = %self.bundle.name, "garbler connecting");
        let stream = TcpStream::connect(&addr).await?;
        let mut framed = FramedStream::new(stream);

        let mut last_outputs = BTreeMap::new();
        let circuits = self.bundle.circuits.clone();
        for circuit in &circuits {
            while let Some(bits) = self.provider.next_bits(&circuit.id, &circuit.alice) {
                let outputs = self.evaluate_once(&mut framed, circuit, &bits).await?;
                self.sink.report(&circuit.id, &outputs);
                last_outputs = outputs;
            }
        }
        Ok(last_outputs)
    }

    /// 执行一次完整的求值交换（步骤 1-6）
    async fn evaluate_once<T: AsyncRead + AsyncWrite + Unpin>(
        &mut self,
        framed: &mut FramedStream<T>,
        circuit: &Circuit,
        bits: &[u8],
    ) -> Result<BTreeMap<WireId, u8>> {
        if bits.len() != circuit.alice.len() {
            return Err(YaoError::ProtocolViolation(format!(
                "input provider returned {} bits for {} garbler wires",
                bits.len(),
                circuit.alice.len()
            )));
        }
        let garbled = GarbledCircuit::build(circuit.clone(), &mut thread_rng())?;

        debug!(circuit = %circuit.id, "sending circuit setup");
        framed
            .send(&Message::CircuitSetup(CircuitSetup {
                version: PROTOCOL_VERSION.to_string(),
                circuit: circuit.clone(),
                garbled_tables: garbled.tables().clone(),
                pbits_out: garbled.pbits_out(),
            }))
            .await?;
        match framed.recv().await? {
            Message::Ack => {}
            other => return Err(unexpected("ACK", &other)),
        }

        let mut a_inputs: Vec<(WireId, ActiveWire)> = Vec::with_capacity(circuit.alice.len());
        for (wire, bit) in circuit.alice.iter().zip(bits) {
            a_inputs.push((*wire, garbled.select_input(*wire, *bit)?));
        }
        framed.send(&Message::GarblerInputs(a_inputs)).await?;

        // OT phase: the evaluator always sends its receiver payload, even
        // when it owns no input wires.
        match framed.recv().await? {
            Message::OtReceiver(OtReceiverPayload::Blinded(pairs)) => {
                if pairs.len() != circuit.bob.len() {
                    return Err(YaoError::ProtocolViolation(format!(
                        "OT batch of {} pairs for {} evaluator wires",
                        pairs.len(),
                        circuit.bob.len()
                    )));
                }
                let group = OtGroup::modp2048();
                let mut replies = Vec::with_capacity(pairs.len());
                for (wire, pair) in circuit.bob.iter().zip(&pairs) {
                    let (zero, one) = garbled.input_pair(*wire)?;
                    replies.push(OtSender::respond(
                        group,
                        pair,
                        &zero.to_bytes(),
                        &one.to_bytes(),
                        &mut thread_rng(),
                    )?);
                }
                debug!(circuit = %circuit.id, transfers = replies.len(), "answered OT batch");
                framed
                    .send(&Message::OtSender(OtSenderPayload::Encrypted(replies)))
                    .await?;
            }
            Message::OtReceiver(OtReceiverPayload::Clear(selection)) => {
                if self.enable_ot {
                    return Err(YaoError::ProtocolViolation(
                        "plaintext selection bits while oblivious transfer is enabled".to_string(),
                    ));
                }
                if selection.len() != circuit.bob.len() {
                    return Err(YaoError::ProtocolViolation(format!(
                        "{} selection bits for {} evaluator wires",
                        selection.len(),
                        circuit.bob.len()
                    )));
                }
                warn!(circuit = %circuit.id, "oblivious transfer disabled, sending selected keys directly");
                let mut pairs = Vec::with_capacity(selection.len());
                for (wire, bit) in circuit.bob.iter().zip(&selection) {
                    pairs.push(garbled.select_input(*wire, *bit)?);
                }
                framed
                    .send(&Message::OtSender(OtSenderPayload::Direct(pairs)))
                    .await?;
            }
            other => return Err(unexpected("OT_RECEIVER", &other)),
        }

        let outputs = match framed.recv().await? {
            Message::Output(list) => list.into_iter().collect::<BTreeMap<_, _>>(),
            other => return Err(unexpected("OUTPUT", &other)),
        };
        debug!(circuit = %circuit.id, ?outputs, "evaluation round complete");
        Ok(outputs)
    }
}

/// 运行混淆方的入口
///
/// 解析电路文件，拨号求值方，对每个电路消费 `provider` 给出的全部输入。
/// 返回最后一次求值的输出映射（没有任何求值时为空映射）。
pub async fn run_garbler<P: InputProvider, Q: AsRef<Path>>(
    circuit_path: Q,
    provider: P,
    enable_ot: bool,
    config: NetConfig,
) -> Result<BTreeMap<WireId, u8>> {
    let bundle = CircuitBundle::from_path(circuit_path)?;
    let mut garbler = Garbler::new(bundle, provider, CollectOutputs::default(), enable_ot, config);
    garbler.run().await
}
