//! Per-connection session state machine (C10): AwaitImei -> Authenticated ->
//! Closed. Buffers reads until a complete frame is available rather than
//! assuming one `read` returns exactly one frame (spec.md §9 Open Question 5).

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::SessionError;
use crate::frame::{decode_frame, peek_data_length};
use log::{debug, info, warn};
use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const MAX_HANDSHAKE_READ: usize = 2048;

#[derive(Debug, PartialEq, Eq)]
pub enum SessionState {
    AwaitImei,
    Authenticated,
    Closed,
}

pub struct Session {
    pub peer_addr: SocketAddr,
    pub imei: Option<String>,
    pub state: SessionState,
}

impl Session {
    pub fn new(peer_addr: SocketAddr) -> Self {
        Session {
            peer_addr,
            imei: None,
            state: SessionState::AwaitImei,
        }
    }

    /// Drives the session to completion: handshake, then the ingest loop.
    /// Returns `Ok(())` on any clean close (EOF, decode error); only socket
    /// errors other than EOF are surfaced so the caller can log at a higher
    /// severity.
    pub async fn run<S>(&mut self, mut socket: S, config: &Config, dispatcher: &Dispatcher) -> Result<(), SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut buf: Vec<u8> = Vec::new();
        if !self.handshake(&mut socket, &mut buf).await? {
            self.state = SessionState::Closed;
            return Ok(());
        }

        let mut read_buf = [0u8; MAX_HANDSHAKE_READ];
        loop {
            // Buffer until a full frame (header + data_length bytes + CRC) is present.
            loop {
                if buf.len() >= 8 {
                    let data_length = match peek_data_length(&buf) {
                        Ok(v) => v,
                        Err(_) => break, // not enough buffered yet to even read the length field
                    };
                    let total = 8 + data_length as usize + 4;
                    if buf.len() >= total {
                        break;
                    }
                }
                let n = socket.read(&mut read_buf).await?;
                if n == 0 {
                    return if buf.is_empty() {
                        self.close_cleanly()
                    } else {
                        Err(SessionError::Eof)
                    };
                }
                buf.extend_from_slice(&read_buf[..n]);
            }

            let data_length = peek_data_length(&buf)?;
            let total = 8 + data_length as usize + 4;
            let frame_bytes: Vec<u8> = buf.drain(..total).collect();

            let imei = self.imei.clone().expect("authenticated sessions always have an imei");
            let decoded = match decode_frame(&frame_bytes, &imei) {
                Ok(d) => d,
                Err(e) => {
                    warn!("frame decode failed for {}: {e}", self.peer_addr);
                    self.state = SessionState::Closed;
                    return Ok(());
                }
            };

            if !decoded.crc_ok {
                warn!("crc mismatch on frame from {}", self.peer_addr);
                if config.strict_crc {
                    self.state = SessionState::Closed;
                    return Ok(());
                }
            }

            let record_count = decoded.records.len();
            let mut tasks = dispatcher.dispatch(&imei, decoded.records, frame_bytes);
            while tasks.join_next().await.is_some() {}

            let ack = [0u8, 0, 0, record_count as u8];
            socket.write_all(&ack).await?;
        }
    }

    fn close_cleanly(&mut self) -> Result<(), SessionError> {
        self.state = SessionState::Closed;
        Ok(())
    }

    /// Reads exactly the IMEI frame (`u16_be length || digits`) out of the
    /// socket, buffering as needed since a client may pipeline its first
    /// data frame right behind the handshake in the same TCP segment.
    /// Anything buffered past the IMEI is left in `buf` for the ingest loop.
    async fn handshake<S>(&mut self, socket: &mut S, buf: &mut Vec<u8>) -> Result<bool, SessionError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut read_buf = [0u8; MAX_HANDSHAKE_READ];
        while buf.len() < 2 {
            let n = socket.read(&mut read_buf).await?;
            if n == 0 {
                return Err(SessionError::Eof);
            }
            buf.extend_from_slice(&read_buf[..n]);
        }
        let length = u16::from_be_bytes([buf[0], buf[1]]) as usize;
        let total = 2 + length;
        while buf.len() < total {
            let n = socket.read(&mut read_buf).await?;
            if n == 0 {
                return Err(SessionError::Eof);
            }
            buf.extend_from_slice(&read_buf[..n]);
        }

        let imei_frame: Vec<u8> = buf.drain(..total).collect();
        match crate::imei::decode_imei(&imei_frame) {
            Ok(imei) if imei.len() == 15 => {
                info!("imei {imei} authenticated from {}", self.peer_addr);
                self.imei = Some(imei);
                self.state = SessionState::Authenticated;
                socket.write_all(&[0x01]).await?;
                Ok(true)
            }
            Ok(imei) => {
                warn!("rejecting imei of invalid length {} from {}", imei.len(), self.peer_addr);
                socket.write_all(&[0x00]).await?;
                Ok(false)
            }
            Err(e) => {
                debug!("imei decode failed from {}: {e}", self.peer_addr);
                socket.write_all(&[0x00]).await?;
                Ok(false)
            }
        }
    }
}
