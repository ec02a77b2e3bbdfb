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

use std::sync::Arc;

use crate::cluster::{Cluster, ClusterStats, Node, RuntimeOptions};
use crate::commands::{DeleteCommand, OperateCommand, ReadCommand, WriteCommand};
use crate::errors::{Error, Result};
use crate::net::ToHosts;
use crate::operations::{Operation, OperationType};
use crate::policy::{ClientPolicy, ReadPolicy, WritePolicy};
use crate::{Bin, Bins, Key, Record, Value};

/// Instantiate a Client instance to access a database cluster and perform
/// database operations.
///
/// Each record operation takes a policy carrying the transaction timeout and,
/// for writes, the retry/generation/expiration parameters.
///
/// The client is thread-safe: it can be shared freely between tasks and
/// threads (wrap it in an [`Arc`] or clone the cheap handle).
#[derive(Clone)]
pub struct Client {
    cluster: Arc<Cluster>,
}

impl Client {
    /// Initializes a client with the given policy and set of seed hosts.
    ///
    /// Connections are established lazily, so an unreachable seed surfaces
    /// on the first transaction rather than here. An empty seed list is
    /// accepted; transactions park until [`Client::add_seeds`] supplies a
    /// node or their deadline fires.
    pub async fn new(policy: &ClientPolicy, hosts: &(dyn ToHosts + Send + Sync)) -> Result<Self> {
        let hosts = hosts.to_hosts()?;
        let cluster = Cluster::new(policy.clone(), &hosts).await?;

        Ok(Client { cluster })
    }

    /// Closes the connections to the database cluster. Parked transactions
    /// are woken and fail promptly.
    pub async fn close(&self) {
        self.cluster.close().await;
    }

    /// Register additional seed hosts with a running client. Transactions
    /// parked for want of a node are woken.
    pub async fn add_seeds(&self, hosts: &(dyn ToHosts + Send + Sync)) -> Result<()> {
        let hosts = hosts.to_hosts()?;
        self.cluster.add_seeds(&hosts).await
    }

    /// Returns the list of known nodes.
    pub async fn nodes(&self) -> Vec<Arc<Node>> {
        self.cluster.nodes().await
    }

    /// Request counters for this client's cluster.
    pub fn stats(&self) -> &ClusterStats {
        self.cluster.stats()
    }

    /// Change the admission throttle switches while the client is running.
    pub fn update_runtime_options(&self, options: &RuntimeOptions) {
        self.cluster.update_runtime_options(options);
    }

    /// Read record bins for the specified key: either named bins or
    /// `Bins::All` for the whole record.
    ///
    /// # Examples
    ///
    /// Fetch a single bin of a record.
    ///
    /// ```rust,no_run
    /// # use citrusleaf::*;
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let hosts = std::env::var("CITRUSLEAF_HOSTS").unwrap();
    /// # let client = Client::new(&ClientPolicy::default(), &hosts).await.unwrap();
    /// let key = as_key!("test", "demo", "mykey");
    /// match client.get(&ReadPolicy::default(), &key, ["value"]).await {
    ///     Ok(record) => println!("bins: {:?}", record.bins),
    ///     Err(Error::ServerError(ResultCode::NotFound)) => println!("no such record"),
    ///     Err(err) => println!("error: {}", err),
    /// }
    /// # }
    /// ```
    pub async fn get<T>(&self, policy: &ReadPolicy, key: &Key, bins: T) -> Result<Record>
    where
        T: Into<Bins> + Send,
    {
        Self::validate_key(key)?;
        let bins = bins.into();

        let mut command = ReadCommand::new(policy, self.cluster.clone(), key, bins);
        command.execute().await?;
        Ok(command.record.unwrap())
    }

    /// Write record bins for the specified key.
    ///
    /// # Examples
    ///
    /// Write a record with a single integer bin.
    ///
    /// ```rust,no_run
    /// # use citrusleaf::*;
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let hosts = std::env::var("CITRUSLEAF_HOSTS").unwrap();
    /// # let client = Client::new(&ClientPolicy::default(), &hosts).await.unwrap();
    /// let key = as_key!("test", "demo", "mykey");
    /// let bin = as_bin!("i", 42);
    /// match client.put(&WritePolicy::default(), &key, &[bin]).await {
    ///     Ok(()) => println!("record written"),
    ///     Err(err) => println!("error: {}", err),
    /// }
    /// # }
    /// ```
    pub async fn put<'a, 'b>(
        &self,
        policy: &'a WritePolicy,
        key: &'a Key,
        bins: &'a [Bin<'b>],
    ) -> Result<()> {
        Self::validate_key(key)?;

        let mut command = WriteCommand::new(
            policy,
            self.cluster.clone(),
            key,
            bins,
            OperationType::Write,
        );
        command.execute().await
    }

    /// Add integer bin values to existing record bin values. The bin values
    /// must be integers.
    pub async fn add<'a, 'b>(
        &self,
        policy: &'a WritePolicy,
        key: &'a Key,
        bins: &'a [Bin<'b>],
    ) -> Result<()> {
        Self::validate_key(key)?;
        for bin in bins {
            if !matches!(bin.value, Value::Int(_)) {
                return Err(Error::InvalidArgument(format!(
                    "Bin `{}`: add requires an integer value",
                    bin.name
                )));
            }
        }

        let mut command =
            WriteCommand::new(policy, self.cluster.clone(), key, bins, OperationType::Incr);
        command.execute().await
    }

    /// Delete a record for the specified key. Returns whether a record
    /// existed on the server before deletion.
    pub async fn delete(&self, policy: &WritePolicy, key: &Key) -> Result<bool> {
        Self::validate_key(key)?;

        let mut command = DeleteCommand::new(policy, self.cluster.clone(), key);
        command.execute().await?;
        Ok(command.existed)
    }

    /// Perform multiple read/write/add operations on a single record in one
    /// database call.
    ///
    /// # Examples
    ///
    /// Increment a counter and read it back in one round trip.
    ///
    /// ```rust,no_run
    /// # use citrusleaf::*;
    /// use citrusleaf::operations;
    /// # #[tokio::main]
    /// # async fn main() {
    /// # let hosts = std::env::var("CITRUSLEAF_HOSTS").unwrap();
    /// # let client = Client::new(&ClientPolicy::default(), &hosts).await.unwrap();
    /// let key = as_key!("test", "demo", "mykey");
    /// let step = as_bin!("count", 1);
    /// let ops = [operations::add(&step), operations::get_bin("count")];
    /// match client.operate(&WritePolicy::default(), &key, &ops).await {
    ///     Ok(record) => println!("count: {:?}", record.bins.get("count")),
    ///     Err(err) => println!("error: {}", err),
    /// }
    /// # }
    /// ```
    pub async fn operate(
        &self,
        policy: &WritePolicy,
        key: &Key,
        operations: &[Operation<'_>],
    ) -> Result<Record> {
        Self::validate_key(key)?;

        let mut command = OperateCommand::new(policy, self.cluster.clone(), key, operations);
        command.execute().await?;
        Ok(command.record.unwrap())
    }

    fn validate_key(key: &Key) -> Result<()> {
        if key.namespace.is_empty() {
            return Err(Error::InvalidArgument("Namespace must not be empty".into()));
        }
        Ok(())
    }
}
