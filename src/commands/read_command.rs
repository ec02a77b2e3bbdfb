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

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::cluster::{Cluster, Node};
use crate::commands::buffer;
use crate::commands::{Command, SingleCommand};
use crate::errors::{Error, Result};
use crate::net::Connection;
use crate::policy::{ReadPolicy, RetryPolicy};
use crate::value::bytes_to_particle;
use crate::{Bins, Key, Record, ResultCode, Value};

pub struct ReadCommand<'a> {
    pub single_command: SingleCommand<'a>,
    pub record: Option<Record>,
    policy: &'a ReadPolicy,
    bins: Bins,
}

// Decode the field and op tables of a response body. A truncated table is
// logged and parsed as far as it goes.
pub(super) fn parse_bins(
    conn: &mut Connection,
    field_count: usize,
    op_count: usize,
) -> Result<HashMap<String, Value>> {
    let mut bins: HashMap<String, Value> = HashMap::with_capacity(op_count);

    // There can be fields in the response (setname etc). For now, ignore
    // them. Expose them to the API if needed in the future.
    for _ in 0..field_count {
        if conn.buffer.remaining() < 4 {
            warn!("Poorly formatted response: truncated field table");
            return Ok(bins);
        }
        let field_size = conn.buffer.read_u32(None) as usize;
        if conn.buffer.remaining() < field_size {
            warn!("Poorly formatted response: truncated field");
            return Ok(bins);
        }
        conn.buffer.skip(field_size);
    }

    for _ in 0..op_count {
        if conn.buffer.remaining() < 8 {
            warn!("Poorly formatted response: truncated op table");
            return Ok(bins);
        }
        let op_size = conn.buffer.read_u32(None) as usize;
        conn.buffer.skip(1);
        let particle_type = conn.buffer.read_u8(None);
        conn.buffer.skip(1);
        let name_size = conn.buffer.read_u8(None) as usize;
        if op_size < 4 + name_size || conn.buffer.remaining() < op_size - 4 {
            warn!("Poorly formatted response: truncated op");
            return Ok(bins);
        }
        let name: String = conn.buffer.read_str(name_size)?;

        let particle_bytes_size = op_size - (4 + name_size);
        let value = match bytes_to_particle(particle_type, &mut conn.buffer, particle_bytes_size) {
            Ok(value) => value,
            Err(err) => {
                // Deliver what decoded so far.
                warn!("Poorly formatted response: {}", err);
                return Ok(bins);
            }
        };

        if !value.is_nil() {
            bins.insert(name, value);
        }
    }

    Ok(bins)
}

impl<'a> ReadCommand<'a> {
    pub fn new(policy: &'a ReadPolicy, cluster: Arc<Cluster>, key: &'a Key, bins: Bins) -> Self {
        ReadCommand {
            single_command: SingleCommand::new(cluster, key, false),
            bins,
            policy,
            record: None,
        }
    }

    pub async fn execute(&mut self) -> Result<()> {
        // Reads always retry internally; admission throttling applies when
        // the cluster's read throttle switch is on.
        let policy = self.policy;
        let may_throttle = self.single_command.cluster.should_throttle(false);
        SingleCommand::execute(policy, self, RetryPolicy::Retry, may_throttle).await
    }
}

#[async_trait::async_trait]
impl<'a> Command for ReadCommand<'a> {
    fn cluster(&self) -> Arc<Cluster> {
        self.single_command.cluster.clone()
    }

    async fn write_timeout(
        &mut self,
        conn: &mut Connection,
        timeout: Option<Duration>,
    ) -> Result<()> {
        conn.buffer.write_timeout(timeout);
        Ok(())
    }

    async fn write_buffer(&mut self, conn: &mut Connection) -> Result<()> {
        conn.flush().await
    }

    fn prepare_buffer(&mut self, conn: &mut Connection) -> Result<()> {
        conn.buffer.set_read(self.single_command.key, &self.bins)
    }

    async fn get_node(&self) -> Option<Arc<Node>> {
        self.single_command.get_node().await
    }

    async fn parse_result(&mut self, conn: &mut Connection) -> Result<()> {
        if let Err(err) = conn
            .read_buffer(buffer::MSG_TOTAL_HEADER_SIZE as usize)
            .await
        {
            warn!("Parse result error: {}", err);
            return Err(err);
        }

        conn.buffer.reset_offset();
        let sz = conn.buffer.read_u64(Some(0));
        let header_length = conn.buffer.read_u8(Some(8));
        let result_code = conn.buffer.read_u8(Some(13));
        let generation = conn.buffer.read_u32(Some(14));
        let expiration = conn.buffer.read_u32(Some(18));
        let field_count = conn.buffer.read_u16(Some(26)) as usize; // almost certainly 0
        let op_count = conn.buffer.read_u16(Some(28)) as usize;
        let receive_size = ((sz & 0xFFFF_FFFF_FFFF) - u64::from(header_length)) as usize;

        // Read remaining message bytes
        if receive_size > 0 {
            if let Err(err) = conn.read_buffer(receive_size).await {
                warn!("Parse result error: {}", err);
                return Err(err);
            }
        }

        match ResultCode::from(result_code) {
            ResultCode::Ok => {
                let bins = parse_bins(conn, field_count, op_count)?;
                self.record = Some(Record::new(bins, generation, expiration));
                Ok(())
            }
            rc => Err(Error::ServerError(rc)),
        }
    }
}
