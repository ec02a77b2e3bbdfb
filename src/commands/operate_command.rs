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

use std::sync::Arc;
use std::time::Duration;

use crate::cluster::{Cluster, Node};
use crate::commands::read_command::parse_bins;
use crate::commands::{buffer, Command, SingleCommand};
use crate::errors::{Error, Result};
use crate::net::Connection;
use crate::operations::Operation;
use crate::policy::WritePolicy;
use crate::{Key, Record, ResultCode};

pub struct OperateCommand<'a> {
    pub single_command: SingleCommand<'a>,
    pub record: Option<Record>,
    policy: &'a WritePolicy,
    operations: &'a [Operation<'a>],
    is_write: bool,
}

impl<'a> OperateCommand<'a> {
    pub fn new(
        policy: &'a WritePolicy,
        cluster: Arc<Cluster>,
        key: &'a Key,
        operations: &'a [Operation<'a>],
    ) -> Self {
        let is_write = operations.iter().any(Operation::is_write);
        OperateCommand {
            single_command: SingleCommand::new(cluster, key, is_write),
            record: None,
            policy,
            operations,
            is_write,
        }
    }

    pub async fn execute(&mut self) -> Result<()> {
        let policy = self.policy;
        // Admission throttling keys off whether any of the ops writes.
        let may_throttle = self.single_command.cluster.should_throttle(self.is_write);
        SingleCommand::execute(policy, self, policy.retry, may_throttle).await
    }
}

#[async_trait::async_trait]
impl<'a> Command for OperateCommand<'a> {
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
        conn.buffer.set_operate(
            self.policy,
            self.single_command.key,
            self.operations,
        )
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
        let field_count = conn.buffer.read_u16(Some(26)) as usize;
        let op_count = conn.buffer.read_u16(Some(28)) as usize;
        let receive_size = ((sz & 0xFFFF_FFFF_FFFF) - u64::from(header_length)) as usize;

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
