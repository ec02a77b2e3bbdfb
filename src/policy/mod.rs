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

//! Policy types encapsulate optional parameters for various client operations.

mod client_policy;
mod expiration;
mod generation_policy;
mod read_policy;
mod write_policy;

pub use self::client_policy::{ClientPolicy, ThrottleConfig};
pub use self::expiration::Expiration;
pub use self::generation_policy::GenerationPolicy;
pub use self::read_policy::ReadPolicy;
pub use self::write_policy::{RetryPolicy, WritePolicy};

use std::time::Duration;
use tokio::time::Instant;

/// Trait implemented by all per-transaction policy types.
pub trait Policy {
    #[doc(hidden)]
    /// Deadline for the current transaction based on the specified timeout.
    /// For internal use only.
    fn deadline(&self) -> Option<Instant>;

    /// Total transaction timeout. The timeout is tracked on the client and
    /// also sent to the server along with the transaction in the wire
    /// protocol. The client will most likely time out first, but the server
    /// has the capability to time out the transaction as well.
    ///
    /// Default: 0 (no timeout). Supported, but a bit dangerous.
    fn timeout(&self) -> Option<Duration>;
}

#[doc(hidden)]
/// Policy-like object that encapsulates a base policy instance.
pub trait PolicyLike {
    /// Retrieve a reference to the base policy.
    fn base(&self) -> &BasePolicy;
}

impl<T> Policy for T
where
    T: PolicyLike,
{
    fn deadline(&self) -> Option<Instant> {
        self.base().deadline()
    }

    fn timeout(&self) -> Option<Duration> {
        self.base().timeout()
    }
}

/// Common parameters shared by all per-transaction policy types.
#[derive(Debug, Clone)]
pub struct BasePolicy {
    /// Transaction timeout. The wall-clock deadline is taken when the
    /// transaction starts; once it elapses the transaction fails with a
    /// timeout no matter how many internal retries are still possible.
    pub timeout: Option<Duration>,
}

impl Policy for BasePolicy {
    fn deadline(&self) -> Option<Instant> {
        self.timeout.map(|timeout| Instant::now() + timeout)
    }

    fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl Default for BasePolicy {
    fn default() -> BasePolicy {
        BasePolicy {
            timeout: Some(Duration::new(30, 0)),
        }
    }
}
