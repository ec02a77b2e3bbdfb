// Copyright 2015-2020 Aerospike, Inc.
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

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::missing_errors_doc
)]

//! An asynchronous, pure-Rust client for the Citrusleaf/Aerospike key-value
//! protocol.
//!
//! The client routes single-record operations (read, write, delete,
//! arithmetic add, multi-op) to cluster nodes over pooled TCP connections,
//! retries transparently on transient socket failures, and enforces a
//! per-transaction deadline.
//!
//! # Examples
//!
//! ```rust,no_run
//! #[macro_use]
//! extern crate citrusleaf;
//!
//! use citrusleaf::{Bins, Client, ClientPolicy, ReadPolicy, WritePolicy};
//!
//! #[tokio::main]
//! async fn main() {
//!     let cpolicy = ClientPolicy::default();
//!     let hosts = std::env::var("CITRUSLEAF_HOSTS")
//!         .unwrap_or_else(|_| String::from("127.0.0.1:3000"));
//!     let client = Client::new(&cpolicy, &hosts)
//!         .await
//!         .expect("Failed to connect to cluster");
//!
//!     let rpolicy = ReadPolicy::default();
//!     let wpolicy = WritePolicy::default();
//!     let key = as_key!("test", "demo", "k1");
//!     let bins = [as_bin!("int", 123), as_bin!("str", "Hello, World!")];
//!
//!     client.put(&wpolicy, &key, &bins).await.unwrap();
//!     let rec = client.get(&rpolicy, &key, Bins::All).await;
//!     println!("Record: {}", rec.unwrap());
//!
//!     let existed = client.delete(&wpolicy, &key).await.unwrap();
//!     println!("existed (should be true): {}", existed);
//!
//!     client.close().await;
//! }
//! ```

extern crate byteorder;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate rand;
extern crate ripemd;

pub use bin::{Bin, Bins};
pub use client::Client;
pub use cluster::{ClusterStats, Node, RuntimeOptions, StatsSnapshot};
pub use commands::particle_type::ParticleType;
pub use errors::{Error, Result};
pub use key::{calculate_digest, Key, DIGEST_SIZE};
pub use net::{Host, ToHosts};
pub use operations::{Operation, OperationType};
pub use policy::{
    ClientPolicy, Expiration, GenerationPolicy, Policy, ReadPolicy, RetryPolicy, ThrottleConfig,
    WritePolicy,
};
pub use record::Record;
pub use result_code::ResultCode;
pub use value::{BlobType, Value};

pub mod errors;
mod value;
#[macro_use]
mod bin;
#[macro_use]
mod key;
mod client;
mod cluster;
mod commands;
mod net;
pub mod operations;
pub mod policy;
mod record;
mod result_code;

#[cfg(test)]
extern crate hex;
