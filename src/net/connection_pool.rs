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

use std::mem;
use std::ops::{Deref, DerefMut, Drop};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::errors::{Error, Result};
use crate::net::{Connection, Host};
use crate::policy::ClientPolicy;

// Idle connections waiting for reuse. The stack is LIFO: the most recently
// used connection sits on top, so cold connections drift to the bottom and
// age out via their idle deadline.
#[derive(Debug)]
struct Idle {
    stack: Vec<Connection>,
    closed: bool,
}

#[derive(Debug)]
struct PoolShared {
    host: Host,
    policy: ClientPolicy,
    idle: Mutex<Idle>,

    // Every live connection, idle or checked out. A slot is reserved here
    // before a connect is attempted and given back only when the connection
    // is closed, so the node can never exceed `max_conns_per_node` even
    // while connects are in flight.
    open: AtomicUsize,
}

/// Per-node connection pool. Checkout hands out the warmest idle connection
/// or dials a new one within the node's connection budget; the returned
/// [`PooledConnection`] puts itself back on drop.
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    shared: Arc<PoolShared>,
}

impl ConnectionPool {
    pub fn new(host: Host, policy: ClientPolicy) -> Self {
        ConnectionPool {
            shared: Arc::new(PoolShared {
                host,
                policy,
                idle: Mutex::new(Idle {
                    stack: Vec::new(),
                    closed: false,
                }),
                open: AtomicUsize::new(0),
            }),
        }
    }

    // The lock is held only for stack operations, never across an await.
    fn idle(&self) -> MutexGuard<'_, Idle> {
        self.shared
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn get(&self) -> Result<PooledConnection> {
        // Reuse the warmest idle connection, shedding any that sat past
        // their idle deadline.
        let (reused, stale) = {
            let mut idle = self.idle();
            if idle.closed {
                return Err(Error::Connection("Connection pool is closed".to_string()));
            }

            let mut stale = Vec::new();
            let mut reused = None;
            while let Some(conn) = idle.stack.pop() {
                if conn.is_idle() {
                    stale.push(conn);
                } else {
                    reused = Some(conn);
                    break;
                }
            }
            (reused, stale)
        };

        if !stale.is_empty() {
            self.shared.open.fetch_sub(stale.len(), Ordering::Relaxed);
            drop(stale);
        }

        if let Some(conn) = reused {
            return Ok(PooledConnection {
                pool: self.clone(),
                conn: Some(conn),
            });
        }

        // Nothing to reuse: claim a slot within the node's budget, then
        // dial. The slot is surrendered if the connect fails.
        let budget = self.shared.policy.max_conns_per_node;
        let claimed = self
            .shared
            .open
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |open| {
                if open < budget {
                    Some(open + 1)
                } else {
                    None
                }
            });
        if claimed.is_err() {
            return Err(Error::NoMoreConnections);
        }

        match Connection::new(&self.shared.host.address(), &self.shared.policy).await {
            Ok(conn) => Ok(PooledConnection {
                pool: self.clone(),
                conn: Some(conn),
            }),
            Err(err) => {
                self.shared.open.fetch_sub(1, Ordering::Relaxed);
                Err(err)
            }
        }
    }

    // Return path: push the connection back on top of the stack. Entirely
    // synchronous, so it can run from a Drop impl.
    fn release(&self, conn: Connection) {
        let mut idle = self.idle();
        if idle.closed {
            drop(idle);
            self.shared.open.fetch_sub(1, Ordering::Relaxed);
            drop(conn);
            return;
        }
        idle.stack.push(conn);
    }

    // Give up the connection's slot without pooling it. Dropping the
    // connection closes the socket.
    fn discard(&self, conn: Connection) {
        self.shared.open.fetch_sub(1, Ordering::Relaxed);
        drop(conn);
    }

    /// Number of open connections, pooled or checked out.
    pub fn open_conns(&self) -> usize {
        self.shared.open.load(Ordering::Relaxed)
    }

    /// Shut the pool: close all idle connections and refuse further
    /// checkouts. Connections still checked out close when discarded or
    /// returned.
    pub async fn close(&self) {
        let drained = {
            let mut idle = self.idle();
            idle.closed = true;
            mem::take(&mut idle.stack)
        };

        self.shared.open.fetch_sub(drained.len(), Ordering::Relaxed);
        for mut conn in drained {
            conn.close().await;
        }
    }
}

/// A connection checked out of a node's pool. Dropping it puts the
/// connection back; [`PooledConnection::invalidate`] closes it instead and
/// gives up its pool slot.
#[derive(Debug)]
pub struct PooledConnection {
    pool: ConnectionPool,
    pub conn: Option<Connection>,
}

impl PooledConnection {
    pub fn invalidate(mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.discard(conn);
        }
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn.as_ref().unwrap()
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().unwrap()
    }
}
