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

#[macro_use]
extern crate citrusleaf;

mod common;

use std::convert::TryInto;
use std::time::{Duration, Instant};

use citrusleaf::policy::{
    ClientPolicy, ReadPolicy, RetryPolicy, ThrottleConfig, WritePolicy,
};
use citrusleaf::{Client, Error, Host, ResultCode, RuntimeOptions, Value};

use common::{header_response, record_response, MockServer, Mode};

fn policies_with_timeout(ms: u64) -> (ReadPolicy, WritePolicy) {
    let mut rpolicy = ReadPolicy::default();
    rpolicy.base_policy.timeout = Some(Duration::from_millis(ms));
    let mut wpolicy = WritePolicy::default();
    wpolicy.base_policy.timeout = Some(Duration::from_millis(ms));
    (rpolicy, wpolicy)
}

async fn client_for(addr: &str) -> Client {
    Client::new(&ClientPolicy::default(), &addr.to_string())
        .await
        .expect("Failed to create client")
}

// A put against a server that echoes success: the request frame is
// well-formed and the call resolves cleanly.
#[tokio::test]
async fn put_success() {
    let _ = env_logger::try_init();

    let mut server = MockServer::start(Mode::Reply(header_response(0, 3, 0))).await;
    let client = client_for(&server.addr).await;

    let (_, wpolicy) = policies_with_timeout(200);
    let key = as_key!("test", "s", "k1");
    let bins = [as_bin!("value", 42)];

    client.put(&wpolicy, &key, &bins).await.unwrap();

    let request = server.take_request().expect("server saw no request");
    // cl_proto: version 2, type cl_msg, 48-bit size = frame length - 8
    assert_eq!(2, request[0]);
    assert_eq!(3, request[1]);
    let sz = u64::from_be_bytes(request[0..8].try_into().unwrap()) & 0xFFFF_FFFF_FFFF;
    assert_eq!(request.len() as u64 - 8, sz);
    // write bit set, transaction ttl carries the timeout
    assert_eq!(1, request[10]);
    assert_eq!(
        200,
        u32::from_be_bytes(request[22..26].try_into().unwrap())
    );

    let stats = client.stats().snapshot();
    assert_eq!(1, stats.n_req_successes);
    assert_eq!(0, stats.n_req_failures);
    assert_eq!(0, stats.requests_in_progress);

    client.close().await;
}

// A get against a server that answers NOTFOUND surfaces the server code
// and no bins.
#[tokio::test]
async fn get_not_found() {
    let _ = env_logger::try_init();

    let server = MockServer::start(Mode::Reply(header_response(2, 0, 0))).await;
    let client = client_for(&server.addr).await;

    let (rpolicy, _) = policies_with_timeout(200);
    let key = as_key!("test", "s", "k1");

    match client.get(&rpolicy, &key, ["value"]).await {
        Err(Error::ServerError(ResultCode::NotFound)) => (),
        other => panic!("expected NOTFOUND, got {:?}", other.map(|r| r.bins)),
    }

    // the server answered, so the transaction counts as carried out
    let stats = client.stats().snapshot();
    assert_eq!(1, stats.n_req_successes);

    client.close().await;
}

// A one-shot write against a server that closes the socket mid-request
// fails as a timeout without any internal retry, and the connection is
// discarded rather than pooled.
#[tokio::test]
async fn one_shot_write_failure() {
    let _ = env_logger::try_init();

    let server = MockServer::start(Mode::CloseAfter(4)).await;
    let client = client_for(&server.addr).await;

    let (_, mut wpolicy) = policies_with_timeout(500);
    wpolicy.retry = RetryPolicy::OneShot;
    let key = as_key!("test", "s", "k1");
    let bins = [as_bin!("value", 42)];

    let err = client.put(&wpolicy, &key, &bins).await.unwrap_err();
    assert_eq!(ResultCode::Timeout, err.result_code());

    let stats = client.stats().snapshot();
    assert_eq!(0, stats.n_internal_retries);
    assert_eq!(1, stats.n_req_failures);

    let nodes = client.nodes().await;
    assert_eq!(0, nodes[0].open_connections());

    client.close().await;
}

// A read that dies mid-transaction on one node is transparently retried on
// the next node.
#[tokio::test]
async fn read_retries_on_healthy_node() {
    let _ = env_logger::try_init();

    let bad = MockServer::start(Mode::CloseAfter(0)).await;
    let good = MockServer::start(Mode::Reply(record_response(
        0,
        7,
        0,
        &[("value", 1, &[42])],
    )))
    .await;

    // seed order pins the rotor: the failing node is tried first
    let hosts = format!("{},{}", bad.addr, good.addr);
    let client = client_for(&hosts).await;

    let (rpolicy, _) = policies_with_timeout(2000);
    let key = as_key!("test", "s", "k1");

    let record = client.get(&rpolicy, &key, ["value"]).await.unwrap();
    assert_eq!(Some(&Value::Int(42)), record.bins.get("value"));
    assert_eq!(7, record.generation);

    let stats = client.stats().snapshot();
    assert!(stats.n_internal_retries >= 1);
    assert_eq!(1, stats.n_req_successes);

    client.close().await;
}

// With write throttling enabled, a node whose last window was all failures
// drops new writes at admission, before any server contact.
#[tokio::test]
async fn write_throttled() {
    let _ = env_logger::try_init();

    let mut server = MockServer::start(Mode::CloseAfter(0)).await;

    let mut cpolicy = ClientPolicy::default();
    cpolicy.throttle = ThrottleConfig {
        window: Duration::from_millis(50),
        threshold_failure_pct: 0,
        factor: 100,
    };
    let client = Client::new(&cpolicy, &server.addr.to_string())
        .await
        .unwrap();

    let (_, mut wpolicy) = policies_with_timeout(500);
    wpolicy.retry = RetryPolicy::OneShot;
    let key = as_key!("test", "s", "k1");
    let bins = [as_bin!("value", 42)];

    // charge one failure against the node, then let the window rotate
    client.put(&wpolicy, &key, &bins).await.unwrap_err();
    tokio::time::sleep(Duration::from_millis(80)).await;

    client.update_runtime_options(&RuntimeOptions {
        throttle_reads: false,
        throttle_writes: true,
    });

    match client.put(&wpolicy, &key, &bins).await {
        Err(Error::Throttled) => (),
        other => panic!("expected throttled, got {:?}", other),
    }

    let stats = client.stats().snapshot();
    assert_eq!(1, stats.n_req_throttles);

    // the throttled transaction never reached the server
    let first = server.take_request();
    assert!(first.is_some());
    assert!(server.take_request().is_none());

    client.close().await;
}

// An operate containing a write op is classed as a write for admission
// throttling and gets dropped just like a put.
#[tokio::test]
async fn operate_throttled() {
    let _ = env_logger::try_init();

    let mut server = MockServer::start(Mode::CloseAfter(0)).await;

    let mut cpolicy = ClientPolicy::default();
    cpolicy.throttle = ThrottleConfig {
        window: Duration::from_millis(50),
        threshold_failure_pct: 0,
        factor: 100,
    };
    let client = Client::new(&cpolicy, &server.addr.to_string())
        .await
        .unwrap();

    let (_, mut wpolicy) = policies_with_timeout(500);
    wpolicy.retry = RetryPolicy::OneShot;
    let key = as_key!("test", "s", "counter");

    // charge one failure against the node, then let the window rotate
    client
        .put(&wpolicy, &key, &[as_bin!("count", 0)])
        .await
        .unwrap_err();
    tokio::time::sleep(Duration::from_millis(80)).await;

    client.update_runtime_options(&RuntimeOptions {
        throttle_reads: false,
        throttle_writes: true,
    });

    let step = as_bin!("count", 1);
    let ops = [
        citrusleaf::operations::add(&step),
        citrusleaf::operations::get_bin("count"),
    ];

    match client.operate(&wpolicy, &key, &ops).await {
        Err(Error::Throttled) => (),
        other => panic!("expected throttled, got {:?}", other.map(|r| r.bins)),
    }

    let stats = client.stats().snapshot();
    assert_eq!(1, stats.n_req_throttles);

    // only the priming put ever touched the server
    let first = server.take_request();
    assert!(first.is_some());
    assert!(server.take_request().is_none());

    client.close().await;
}

// A 50 ms transaction against a server that never responds times out close
// to its deadline; the socket is discarded, not pooled.
#[tokio::test]
async fn timeout_against_silent_server() {
    let _ = env_logger::try_init();

    let server = MockServer::start(Mode::Silent).await;
    let client = client_for(&server.addr).await;

    let (rpolicy, _) = policies_with_timeout(50);
    let key = as_key!("test", "s", "k1");

    let start = Instant::now();
    let err = client.get(&rpolicy, &key, ["value"]).await.unwrap_err();
    let elapsed = start.elapsed();

    assert_eq!(ResultCode::Timeout, err.result_code());
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(500), "took {:?}", elapsed);

    let stats = client.stats().snapshot();
    assert_eq!(1, stats.n_req_timeouts);
    assert_eq!(1, stats.n_req_failures);

    let nodes = client.nodes().await;
    assert_eq!(0, nodes[0].open_connections());

    client.close().await;
}

// A request issued while the cluster has no nodes parks, and resumes once
// a seed is registered.
#[tokio::test]
async fn request_parks_until_node_appears() {
    let _ = env_logger::try_init();

    let server = MockServer::start(Mode::Reply(record_response(
        0,
        1,
        0,
        &[("value", 3, b"hello")],
    )))
    .await;

    let client = Client::new(&ClientPolicy::default(), &Vec::<Host>::new())
        .await
        .unwrap();

    let late_seed = {
        let client = client.clone();
        let addr = server.addr.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            client.add_seeds(&addr).await.unwrap();
        })
    };

    let (rpolicy, _) = policies_with_timeout(2000);
    let key = as_key!("test", "s", "k1");

    let record = client.get(&rpolicy, &key, ["value"]).await.unwrap();
    assert_eq!(
        Some(&Value::String("hello".to_string())),
        record.bins.get("value")
    );

    let stats = client.stats().snapshot();
    assert!(stats.n_internal_retries_off_q >= 1);

    late_seed.await.unwrap();
    client.close().await;
}

// A digest-addressed get carries the digest field and works like any other
// read.
#[tokio::test]
async fn get_by_digest() {
    let _ = env_logger::try_init();

    let mut server =
        MockServer::start(Mode::Reply(record_response(0, 1, 0, &[("value", 1, &[7])]))).await;
    let client = client_for(&server.addr).await;

    let (rpolicy, _) = policies_with_timeout(200);
    let source = as_key!("test", "s", "k1");
    let key = citrusleaf::Key::with_digest("test", source.digest);

    let record = client.get(&rpolicy, &key, ["value"]).await.unwrap();
    assert_eq!(Some(&Value::Int(7)), record.bins.get("value"));

    let request = server.take_request().unwrap();
    let digest_pos = request
        .windows(source.digest.len())
        .position(|w| w == &source.digest[..]);
    assert!(digest_pos.is_some(), "digest not found in request frame");

    client.close().await;
}

// Bad arguments surface synchronously, before any server contact.
#[tokio::test]
async fn validation_errors() {
    let _ = env_logger::try_init();

    let mut server = MockServer::start(Mode::Reply(header_response(0, 1, 0))).await;
    let client = client_for(&server.addr).await;

    let (_, wpolicy) = policies_with_timeout(200);

    // empty namespace
    let key = as_key!("", "s", "k1");
    let err = client
        .put(&wpolicy, &key, &[as_bin!("value", 1)])
        .await
        .unwrap_err();
    assert_eq!(ResultCode::ParameterError, err.result_code());

    // add on a non-integer bin
    let key = as_key!("test", "s", "k1");
    let err = client
        .add(&wpolicy, &key, &[as_bin!("value", "not a number")])
        .await
        .unwrap_err();
    assert_eq!(ResultCode::ParameterError, err.result_code());

    assert!(server.take_request().is_none());
    client.close().await;
}

// Multi-op transaction: add then read back in one round trip.
#[tokio::test]
async fn operate_round_trip() {
    let _ = env_logger::try_init();

    let server =
        MockServer::start(Mode::Reply(record_response(0, 2, 0, &[("count", 1, &[5])]))).await;
    let client = client_for(&server.addr).await;

    let (_, wpolicy) = policies_with_timeout(200);
    let key = as_key!("test", "s", "counter");

    let step = as_bin!("count", 1);
    let ops = [
        citrusleaf::operations::add(&step),
        citrusleaf::operations::get_bin("count"),
    ];

    let record = client.operate(&wpolicy, &key, &ops).await.unwrap();
    assert_eq!(Some(&Value::Int(5)), record.bins.get("count"));

    client.close().await;
}
