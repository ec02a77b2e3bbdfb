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

pub mod buffer;
pub mod delete_command;
pub mod operate_command;
pub mod particle_type;
pub mod read_command;
pub mod single_command;
pub mod write_command;

mod field_type;

use std::sync::Arc;
use std::time::Duration;

pub use self::delete_command::DeleteCommand;
pub use self::operate_command::OperateCommand;
pub use self::particle_type::ParticleType;
pub use self::read_command::ReadCommand;
pub use self::single_command::SingleCommand;
pub use self::write_command::WriteCommand;

use crate::cluster::{Cluster, Node};
use crate::errors::{Error, Result};
use crate::net::Connection;

// Command interface implemented by every verb; the engine in
// `single_command` drives these hooks.
#[async_trait::async_trait]
pub trait Command {
    fn cluster(&self) -> Arc<Cluster>;
    fn prepare_buffer(&mut self, conn: &mut Connection) -> Result<()>;
    async fn write_timeout(
        &mut self,
        conn: &mut Connection,
        timeout: Option<Duration>,
    ) -> Result<()>;
    async fn write_buffer(&mut self, conn: &mut Connection) -> Result<()>;
    async fn get_node(&self) -> Option<Arc<Node>>;
    async fn parse_result(&mut self, conn: &mut Connection) -> Result<()>;
}

// A server-returned result code means the connection delivered a complete,
// well-framed response and can safely be reused.
pub fn keep_connection(err: &Error) -> bool {
    matches!(err, Error::ServerError(_))
}
