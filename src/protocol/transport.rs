//! Length-prefixed frame transport
//!
//! Each frame is a 4-byte big-endian body length followed by the bincode
//! serialized [`Message`]. The framing is generic over any async byte
//! stream, so sessions run identically over TCP sockets and in-memory
//! duplex pipes in tests.

use super::messages::Message;
use crate::{Result, YaoError};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// 单帧最大长度（字节）
///
/// 超长帧按协议违规处理，防止对端诱导超额分配。
pub const MAX_FRAME_LENGTH: u32 = 16 * 1024 * 1024;

/// 帧化的可靠字节流
#[derive(Debug)]
pub struct FramedStream<S> {
    stream: S,
}

impl<S: AsyncRead + AsyncWrite + Unpin> FramedStream<S> {
    pub fn new(stream: S) -> Self {
        FramedStream { stream }
    }

    /// 发送一条消息
    pub async fn send(&mut self, message: &Message) -> Result<()> {
        let body =
            bincode::serialize(message).map_err(|e| YaoError::Serialization(e.to_string()))?;
        if body.len() as u64 > MAX_FRAME_LENGTH as u64 {
            return Err(YaoError::ProtocolViolation(format!(
                "outgoing {} frame of {} bytes exceeds limit",
                message.kind(),
                body.len()
            )));
        }
        self.stream.write_all(&(body.len() as u32).to_be_bytes()).await?;
        self.stream.write_all(&body).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// 接收一条消息
    ///
    /// 对端关闭连接报 `TransportClosed`；长度前缀越界或帧体无法解码报
    /// `ProtocolViolation`。
    pub async fn recv(&mut self) -> Result<Message> {
        let mut length_bytes = [0u8; 4];
        self.stream.read_exact(&mut length_bytes).await?;
        let length = u32::from_be_bytes(length_bytes);
        if length == 0 || length > MAX_FRAME_LENGTH {
            return Err(YaoError::ProtocolViolation(format!(
                "frame length {} out of range",
                length
            )));
        }
        let mut body = vec![0u8; length as usize];
        self.stream.read_exact(&mut body).await?;
        bincode::deserialize(&body)
            .map_err(|e| YaoError::ProtocolViolation(format!("undecodable frame: {}", e)))
    }
}
