// Copyright 2015-2018 Aerospike, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A scripted stand-in for a cluster node. It speaks just enough of the
//! wire protocol to read request frames and play back canned responses,
//! close the socket mid-request, or go silent.

#![allow(dead_code)]

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// How the server treats each accepted connection.
pub enum Mode {
    /// Read whole request frames and answer each with the canned response.
    Reply(Vec<u8>),

    /// Read at most this many bytes, then close the connection.
    CloseAfter(usize),

    /// Read request frames and never answer.
    Silent,
}

pub struct MockServer {
    pub addr: String,
    /// Raw request frames (proto header + body) seen by the server.
    pub requests: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl MockServer {
    pub async fn start(mode: Mode) -> MockServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        let mode = Arc::new(mode);

        tokio::spawn(async move {
            loop {
                let (socket, _) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => return,
                };
                let mode = mode.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    serve_connection(socket, &mode, &tx).await;
                });
            }
        });

        MockServer { addr, requests: rx }
    }

    /// Next request frame the server has seen, if any.
    pub fn take_request(&mut self) -> Option<Vec<u8>> {
        self.requests.try_recv().ok()
    }
}

async fn serve_connection(
    mut socket: TcpStream,
    mode: &Mode,
    tx: &mpsc::UnboundedSender<Vec<u8>>,
) {
    match mode {
        Mode::Reply(response) => loop {
            let frame = match read_frame(&mut socket).await {
                Some(frame) => frame,
                None => return,
            };
            let _ = tx.send(frame);
            if socket.write_all(response).await.is_err() {
                return;
            }
        },
        Mode::CloseAfter(limit) => {
            let mut seen = Vec::new();
            let mut buf = [0u8; 256];
            while seen.len() < *limit {
                let want = (*limit - seen.len()).min(buf.len());
                match socket.read(&mut buf[..want]).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => seen.extend_from_slice(&buf[..n]),
                }
            }
            let _ = tx.send(seen);
            // dropping the socket closes the connection
        }
        Mode::Silent => {
            let mut buf = [0u8; 4096];
            loop {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => return,
                    Ok(n) => {
                        let _ = tx.send(buf[..n].to_vec());
                    }
                }
            }
        }
    }
}

async fn read_frame(socket: &mut TcpStream) -> Option<Vec<u8>> {
    let mut header = [0u8; 8];
    socket.read_exact(&mut header).await.ok()?;
    let size = (u64::from_be_bytes(header) & 0xFFFF_FFFF_FFFF) as usize;
    let mut frame = header.to_vec();
    frame.resize(8 + size, 0);
    socket.read_exact(&mut frame[8..]).await.ok()?;
    Some(frame)
}

/// A header-only response frame carrying a result code, generation and
/// void-time.
pub fn header_response(result_code: u8, generation: u32, expiration: u32) -> Vec<u8> {
    response_frame(result_code, generation, expiration, &[])
}

/// A response frame with one op per `(bin name, particle type, payload)`
/// triple.
pub fn record_response(
    result_code: u8,
    generation: u32,
    expiration: u32,
    bins: &[(&str, u8, &[u8])],
) -> Vec<u8> {
    response_frame(result_code, generation, expiration, bins)
}

fn response_frame(
    result_code: u8,
    generation: u32,
    expiration: u32,
    bins: &[(&str, u8, &[u8])],
) -> Vec<u8> {
    let mut ops = Vec::new();
    for (name, particle, payload) in bins {
        let op_size = 4 + name.len() + payload.len();
        ops.extend_from_slice(&(op_size as u32).to_be_bytes());
        ops.push(1); // read op
        ops.push(*particle);
        ops.push(0); // version
        ops.push(name.len() as u8);
        ops.extend_from_slice(name.as_bytes());
        ops.extend_from_slice(payload);
    }

    let mut frame = vec![0u8; 30];
    let size = (22 + ops.len()) as u64 | (2u64 << 56) | (3u64 << 48);
    frame[0..8].copy_from_slice(&size.to_be_bytes());
    frame[8] = 22;
    frame[13] = result_code;
    frame[14..18].copy_from_slice(&generation.to_be_bytes());
    frame[18..22].copy_from_slice(&expiration.to_be_bytes());
    frame[28..30].copy_from_slice(&(bins.len() as u16).to_be_bytes());
    frame.extend_from_slice(&ops);
    frame
}
