//! Evaluator role (Bob)
//!
//! The evaluator listens for garbler connections and runs each session's
//! state machine to completion. A closed socket between evaluations ends
//! the session cleanly; mid-evaluation failures abort the session, and the
//! accept loop keeps listening either way.

use super::messages::{
    unexpected, CircuitSetup, Message, OtReceiverPayload, OtSenderPayload, PROTOCOL_VERSION,
};
use super::transport::FramedStream;
use super::{InputProvider, NetConfig, OutputSink, PrintOutputs};
use crate::circuit::{Circuit, WireId};
use crate::crypto::OtGroup;
use crate::garble::{evaluate, ActiveWire};
use crate::ot::OtReceiver;
use crate::{Result, YaoError};
use rand::thread_rng;
use std::collections::HashMap;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// 求值方会话状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorState {
    Listening,
    ReceivedCircuit,
    AwaitingInputs,
    OtInProgress,
    Evaluating,
    Done,
}

/// 求值方角色
#[derive(Debug)]
pub struct Evaluator<P, S> {
    provider: P,
    sink: S,
    enable_ot: bool,
    config: NetConfig,
}

impl<P: InputProvider, S: OutputSink> Evaluator<P, S> {
    pub fn new(provider: P, sink: S, enable_ot: bool, config: NetConfig) -> Self {
        Evaluator {
            provider,
            sink,
            enable_ot,
            config,
        }
    }

    /// 绑定监听地址并接受连接，直到收到中断信号
    ///
    /// 每个连接串行服务到会话结束。会话级错误（包括对端中途断开）只
    /// 中止该会话，接受循环继续监听。
    pub async fn listen(&mut self) -> Result<()> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr).await?;
        info!(address = %addr, "evaluator listening");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupt received, stop listening");
                    return Ok(());
                }
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                            continue;
                        }
                    };
                    info!(%peer, "garbler connected");
                    match self.serve(FramedStream::new(stream)).await {
                        Ok(()) => info!(%peer, "session finished"),
                        Err(YaoError::TransportClosed) => {
                            info!(%peer, "peer closed mid-session");
                        }
                        Err(e) => error!(%peer, error = %e, "session aborted"),
                    }
                }
            }
        }
    }

    /// 在一条连接上运行会话：依次处理每个求值回合
    ///
    /// 回合之间收到对端关闭是会话的正常结束；回合内部的任何错误都是
    /// 致命的，向对端尽力发送 ERROR 后返回。
    pub async fn serve<T: AsyncRead + AsyncWrite + Unpin>(
        &mut self,
        mut framed: FramedStream<T>,
    ) -> Result<()> {
        loop {
            let mut state = EvaluatorState::Listening;
            debug!(?state, "awaiting circuit setup");
            let setup = match framed.recv().await {
                Ok(Message::CircuitSetup(setup)) => setup,
                Ok(other) => {
                    return Err(report_failure(&mut framed, unexpected("CIRCUIT_SETUP", &other)).await);
                }
                Err(YaoError::TransportClosed) => return Ok(()),
                Err(e) => return Err(e),
            };
            state = EvaluatorState::ReceivedCircuit;
            debug!(circuit = %setup.circuit.id, ?state, "received circuit setup");

            match self.serve_round(&mut framed, setup, &mut state).await {
                Ok(()) => {
                    debug_assert_eq!(state, EvaluatorState::Done);
                }
                Err(e @ YaoError::TransportClosed) => return Err(e),
                Err(e) => return Err(report_failure(&mut framed, e).await),
            }
        }
    }

    async fn serve_round<T: AsyncRead + AsyncWrite + Unpin>(
        &mut self,
        framed: &mut FramedStream<T>,
        setup: CircuitSetup,
        state: &mut EvaluatorState,
    ) -> Result<()> {
        if setup.version != PROTOCOL_VERSION {
            return Err(YaoError::ProtocolViolation(format!(
                "version mismatch: peer runs {}, this side {}",
                setup.version, PROTOCOL_VERSION
            )));
        }
        setup.circuit.validate()?;
        framed.send(&Message::Ack).await?;

        *state = EvaluatorState::AwaitingInputs;
        let circuit = &setup.circuit;
        let a_inputs: HashMap<WireId, ActiveWire> = match framed.recv().await? {
            Message::GarblerInputs(list) => list.into_iter().collect(),
            other => return Err(unexpected("GARBLER_INPUTS", &other)),
        };
        if a_inputs.len() != circuit.alice.len()
            || !circuit.alice.iter().all(|w| a_inputs.contains_key(w))
        {
            return Err(YaoError::ProtocolViolation(
                "garbler inputs do not cover its declared wires".to_string(),
            ));
        }

        let bits = self
            .provider
            .next_bits(&circuit.id, &circuit.bob)
            .ok_or_else(|| {
                YaoError::ProtocolViolation("evaluator has no input for this round".to_string())
            })?;
        if bits.len() != circuit.bob.len() {
            return Err(YaoError::ProtocolViolation(format!(
                "provider returned {} bits for {} wires",
                bits.len(),
                circuit.bob.len()
            )));
        }

        *state = EvaluatorState::OtInProgress;
        let b_inputs = if self.enable_ot {
            self.transfer_inputs(framed, circuit, &bits).await?
        } else {
            self.request_inputs_clear(framed, circuit, &bits).await?
        };

        *state = EvaluatorState::Evaluating;
        let outputs = evaluate(
            circuit,
            &setup.garbled_tables,
            &setup.pbits_out,
            &a_inputs,
            &b_inputs,
        )?;
        framed
            .send(&Message::Output(outputs.iter().map(|(w, b)| (*w, *b)).collect()))
            .await?;
        self.sink.report(&circuit.id, &outputs);

        *state = EvaluatorState::Done;
        debug!(circuit = %circuit.id, ?state, "round complete");
        Ok(())
    }

    /// 通过不经意传输取得自己输入线的 (密钥, 加密比特) 对
    async fn transfer_inputs<T: AsyncRead + AsyncWrite + Unpin>(
        &mut self,
        framed: &mut FramedStream<T>,
        circuit: &Circuit,
        bits: &[u8],
    ) -> Result<HashMap<WireId, ActiveWire>> {
        let group = OtGroup::modp2048();
        let receivers: Vec<OtReceiver> = bits
            .iter()
            .map(|bit| OtReceiver::new(group, *bit, &mut thread_rng()))
            .collect();
        let pairs = receivers
            .iter()
            .map(|r| r.public_pair(group))
            .collect::<Result<Vec<_>>>()?;
        framed
            .send(&Message::OtReceiver(OtReceiverPayload::Blinded(pairs)))
            .await?;

        let replies = match framed.recv().await? {
            Message::OtSender(OtSenderPayload::Encrypted(replies)) => replies,
            other => return Err(unexpected("OT_SENDER", &other)),
        };
        if replies.len() != receivers.len() {
            return Err(YaoError::ProtocolViolation(format!(
                "{} OT replies for {} transfers",
                replies.len(),
                receivers.len()
            )));
        }

        let mut inputs = HashMap::with_capacity(circuit.bob.len());
        for (wire, (receiver, reply)) in circuit.bob.iter().zip(receivers.iter().zip(&replies)) {
            let bytes = receiver.recover(group, reply)?;
            let active = ActiveWire::from_bytes(&bytes).ok_or_else(|| {
                YaoError::OTFailure("recovered message is not a wire input".to_string())
            })?;
            inputs.insert(*wire, active);
        }
        debug!(circuit = %circuit.id, transfers = inputs.len(), "OT batch complete");
        Ok(inputs)
    }

    /// 短路模式：直接把明文选择位发给混淆方，仅限本地测试
    async fn request_inputs_clear<T: AsyncRead + AsyncWrite + Unpin>(
        &mut self,
        framed: &mut FramedStream<T>,
        circuit: &Circuit,
        bits: &[u8],
    ) -> Result<HashMap<WireId, ActiveWire>> {
        warn!(circuit = %circuit.id, "oblivious transfer disabled, revealing selection bits");
        framed
            .send(&Message::OtReceiver(OtReceiverPayload::Clear(bits.to_vec())))
            .await?;
        let pairs = match framed.recv().await? {
            Message::OtSender(OtSenderPayload::Direct(pairs)) => pairs,
            other => return Err(unexpected("OT_SENDER", &other)),
        };
        if pairs.len() != circuit.bob.len() {
            return Err(YaoError::ProtocolViolation(format!(
                "{} direct inputs for {} wires",
                pairs.len(),
                circuit.bob.len()
            )));
        }
        Ok(circuit.bob.iter().copied().zip(pairs).collect())
    }
}

/// 尽力向对端报告错误，然后把错误交还给调用方
async fn report_failure<T: AsyncRead + AsyncWrite + Unpin>(
    framed: &mut FramedStream<T>,
    err: YaoError,
) -> YaoError {
    let _ = framed.send(&Message::Error(err.to_string())).await;
    err
}

/// 运行求值方的入口
///
/// 一直监听直到中断信号；每次求值的输出打印到标准输出。
pub async fn run_evaluator<P: InputProvider>(
    provider: P,
    enable_ot: bool,
    config: NetConfig,
) -> Result<()> {
    let mut evaluator = Evaluator::new(provider, PrintOutputs, enable_ot, config);
    evaluator.listen().await
}
