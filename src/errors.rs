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

//! Error and Result types for the client.
//!
//! # Examples
//!
//! Handling an error returned by the client.
//!
//! ```rust,no_run
//! use citrusleaf::*;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let hosts = std::env::var("CITRUSLEAF_HOSTS").unwrap();
//! let policy = ClientPolicy::default();
//! let client = Client::new(&policy, &hosts).await.expect("Failed to connect to cluster");
//! let key = as_key!("test", "demo", "someKey");
//! match client.get(&ReadPolicy::default(), &key, Bins::All).await {
//!     Ok(record) => println!("Record: {}", record),
//!     Err(Error::ServerError(ResultCode::NotFound)) => {
//!         println!("No such record: {}", key);
//!     }
//!     Err(err) => println!("Error fetching record: {}", err),
//! }
//! # }
//! ```

#![allow(missing_docs)]

use crate::ResultCode;

/// Errors the client can produce. Every variant maps onto one of the stable
/// [`ResultCode`] integers via [`Error::result_code`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The client received a server response that it was not able to process.
    #[error("Bad server response: {0}")]
    BadResponse(String),

    /// The client was not able to communicate with the cluster due to some
    /// issue with the network connection.
    #[error("Unable to communicate with server cluster: {0}")]
    Connection(String),

    /// One or more of the arguments passed to the client are invalid.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Cluster node is invalid or no node is available for the request.
    #[error("Invalid cluster node: {0}")]
    InvalidNode(String),

    /// Exceeded max. number of connections per node.
    #[error("Too many connections")]
    NoMoreConnections,

    /// Server responded with a result code indicating an error condition.
    #[error("Server error: {0}")]
    ServerError(ResultCode),

    /// The request was dropped before any server contact to throttle load on
    /// an unhealthy node.
    #[error("Request throttled")]
    Throttled,

    /// The transaction deadline elapsed before a complete response arrived.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Error interpreting a sequence of u8 as a UTF-8 encoded string.
    #[error(transparent)]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Error during an I/O operation.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error parsing an IP or socket address.
    #[error(transparent)]
    ParseAddr(#[from] std::net::AddrParseError),

    /// Error parsing an integer.
    #[error(transparent)]
    ParseInt(#[from] std::num::ParseIntError),
}

impl Error {
    /// The stable result code corresponding to this error.
    pub fn result_code(&self) -> ResultCode {
        match self {
            Error::ServerError(rc) => *rc,
            Error::Timeout(_) => ResultCode::Timeout,
            Error::Throttled => ResultCode::Throttled,
            Error::InvalidArgument(_) | Error::ParseAddr(_) | Error::ParseInt(_) => {
                ResultCode::ParameterError
            }
            _ => ResultCode::ClientError,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
