// Copyright 2015-2018 Aerospike, Inc.
//
// Portions may be licensed to Aerospike, Inc. under one or more contributor
// license agreements.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy of
// the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations under
// the License.

use std::ops::Add;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::commands::buffer::Buffer;
use crate::errors::{Error, Result};
use crate::policy::ClientPolicy;

/// A single client-server connection with its associated message buffer.
/// The stream runs with `TCP_NODELAY` so small request frames are not held
/// back by the kernel.
#[derive(Debug)]
pub struct Connection {
    // duration after which connection is considered idle
    idle_timeout: Option<Duration>,
    idle_deadline: Option<Instant>,

    // connection object
    conn: TcpStream,

    pub buffer: Buffer,
}

impl Connection {
    pub async fn new(addr: &str, policy: &ClientPolicy) -> Result<Self> {
        let connect_timeout = policy.timeout.unwrap_or(Duration::from_secs(10));
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(addr)).await;
        let stream = match stream {
            Ok(Ok(stream)) => stream,
            _ => {
                return Err(Error::Connection(
                    "Could not open network connection".to_string(),
                ))
            }
        };
        stream.set_nodelay(true)?;

        let mut conn = Connection {
            buffer: Buffer::new(policy.buffer_reclaim_threshold),
            conn: stream,
            idle_timeout: policy.idle_timeout,
            idle_deadline: None,
        };
        conn.refresh();
        Ok(conn)
    }

    pub async fn close(&mut self) {
        let _s = self.conn.shutdown().await;
    }

    /// Send the whole encoded request frame.
    pub async fn flush(&mut self) -> Result<()> {
        self.conn.write_all(&self.buffer.data_buffer).await?;
        self.refresh();
        Ok(())
    }

    /// Read exactly `size` bytes into the message buffer and rewind it for
    /// parsing.
    pub async fn read_buffer(&mut self, size: usize) -> Result<()> {
        self.buffer.resize_buffer(size)?;
        self.conn.read_exact(&mut self.buffer.data_buffer).await?;
        self.buffer.reset_offset();
        self.refresh();
        Ok(())
    }

    pub fn is_idle(&self) -> bool {
        self.idle_deadline
            .map_or(false, |idle_dl| Instant::now() >= idle_dl)
    }

    fn refresh(&mut self) {
        self.idle_deadline = None;
        if let Some(idle_to) = self.idle_timeout {
            self.idle_deadline = Some(Instant::now().add(idle_to));
        };
    }
}
