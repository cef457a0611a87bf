//! End-to-end tests driving the daemon over a real socket.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rstest::{fixture, rstest};

use gangway_config::SocketEndpoint;
use gangway_protocol::{Envelope, EnvelopeKind};

use crate::dispatch::{Dispatcher, HandlerRegistry, Sender};
use crate::handlers::{HandlerContext, builtin_handlers};
use crate::transport::{BusListener, ClientSink, ClientSlot, InboundHandler, ListenerHandle};

const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// A running daemon core plus a connected UI client.
struct BridgeHarness {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    listener: Option<ListenerHandle>,
}

impl BridgeHarness {
    fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).expect("write frame");
        self.writer.write_all(b"\n").expect("write delimiter");
        self.writer.flush().expect("flush");
    }

    /// Next frame from the daemon, or `None` when nothing arrives within
    /// the read timeout; silence is how this protocol signals failure.
    fn next_frame(&mut self) -> Option<Envelope> {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(Envelope::decode(line.as_bytes()).expect("frame decodes")),
            Err(_) => None,
        }
    }

    /// Reads frames until one matches `command`, failing after a deadline.
    fn wait_for_command(&mut self, command: &str) -> Envelope {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if let Some(envelope) = self.next_frame()
                && envelope.command == command
            {
                return envelope;
            }
        }
        panic!("timed out waiting for '{command}' frame");
    }

    /// Collects frames matching `command` until `minimum` have arrived.
    fn collect_frames(&mut self, command: &str, minimum: usize) -> Vec<Envelope> {
        let deadline = Instant::now() + Duration::from_secs(2);
        let mut matching = Vec::new();
        while matching.len() < minimum {
            assert!(
                Instant::now() < deadline,
                "timed out collecting {minimum} '{command}' frames"
            );
            if let Some(envelope) = self.next_frame()
                && envelope.command == command
            {
                matching.push(envelope);
            }
        }
        matching
    }
}

impl Drop for BridgeHarness {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.take() {
            handle.shutdown();
            let _ = handle.join();
        }
    }
}

#[fixture]
fn bridge() -> BridgeHarness {
    let slot = ClientSlot::default();
    let sender = Arc::new(Sender::new(Box::new(ClientSink::new(slot.clone()))));
    let context = HandlerContext::new(sender);
    let registry = HandlerRegistry::build(builtin_handlers(&context)).expect("build registry");
    let dispatcher = Arc::new(Dispatcher::new(registry));

    let endpoint = SocketEndpoint::tcp("127.0.0.1", 0);
    let listener = BusListener::bind(&endpoint).expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let handle = listener
        .start(dispatcher as Arc<dyn InboundHandler>, slot)
        .expect("start listener");

    let writer = TcpStream::connect(addr).expect("connect client");
    writer
        .set_read_timeout(Some(READ_TIMEOUT))
        .expect("set read timeout");
    let reader = BufReader::new(writer.try_clone().expect("clone client stream"));

    BridgeHarness {
        reader,
        writer,
        listener: Some(handle),
    }
}

#[rstest]
fn helo_round_trips_over_the_bus(mut bridge: BridgeHarness) {
    bridge.send(r#"{"command":"helo"}"#);

    let reply = bridge.wait_for_command("helo");
    assert_eq!(reply.kind, EnvelopeKind::Response);
    let data: serde_json::Value =
        serde_json::from_str(reply.data.expect("payload").get()).expect("payload parses");
    assert_eq!(data["name"], "gangwayd");
}

#[rstest]
fn malformed_frame_gets_silence_and_service_continues(mut bridge: BridgeHarness) {
    bridge.send("this is not json");
    assert!(bridge.next_frame().is_none(), "malformed frame draws no reply");

    bridge.send(r#"{"command":"helo"}"#);
    let reply = bridge.wait_for_command("helo");
    assert_eq!(reply.kind, EnvelopeKind::Response);
}

#[rstest]
fn unknown_command_gets_silence_and_service_continues(mut bridge: BridgeHarness) {
    bridge.send(r#"{"command":"definitelyNotRegistered","data":{}}"#);
    assert!(bridge.next_frame().is_none(), "unknown command draws no reply");

    bridge.send(r#"{"command":"helo"}"#);
    bridge.wait_for_command("helo");
}

#[rstest]
fn environments_round_trip_over_the_bus(mut bridge: BridgeHarness) {
    bridge.send(r#"{"command":"createEnvironment","data":{"name":"local"}}"#);
    let created = bridge.wait_for_command("createEnvironment");
    assert_eq!(created.kind, EnvelopeKind::Response);

    bridge.send(r#"{"command":"listEnvironments"}"#);
    let listed = bridge.wait_for_command("listEnvironments");
    let data: serde_json::Value =
        serde_json::from_str(listed.data.expect("payload").get()).expect("payload parses");
    assert_eq!(data["environments"].as_array().expect("array").len(), 1);
    assert_eq!(data["environments"][0]["name"], "local");
}

#[rstest]
fn instance_streams_and_stops_over_the_bus(mut bridge: BridgeHarness) {
    bridge.send(r#"{"command":"runInstance","data":{"name":"probe","intervalMs":20}}"#);
    let started = bridge.wait_for_command("runInstance");
    let record: serde_json::Value =
        serde_json::from_str(started.data.expect("payload").get()).expect("payload parses");
    let id = record["id"].as_str().expect("id string").to_owned();

    let frames = bridge.collect_frames("instanceData", 2);
    for frame in &frames {
        let data: serde_json::Value =
            serde_json::from_str(frame.data.as_ref().expect("payload").get())
                .expect("stream frame parses");
        assert_eq!(data["instanceId"], id.as_str());
    }

    bridge.send(&format!(
        r#"{{"command":"stopInstance","data":{{"id":"{id}"}}}}"#
    ));
    bridge.wait_for_command("stopInstance");
    bridge.wait_for_command("instanceStopped");
}

#[rstest]
fn concurrent_streams_produce_whole_frames(mut bridge: BridgeHarness) {
    bridge.send(r#"{"command":"runInstance","data":{"name":"first","intervalMs":10}}"#);
    bridge.wait_for_command("runInstance");
    bridge.send(r#"{"command":"runInstance","data":{"name":"second","intervalMs":10}}"#);
    bridge.wait_for_command("runInstance");

    // Every collected frame decoded cleanly, so two workers emitting
    // concurrently never tore each other's writes.
    let frames = bridge.collect_frames("instanceData", 6);
    let mut ids: Vec<String> = frames
        .iter()
        .map(|frame| {
            let data: serde_json::Value =
                serde_json::from_str(frame.data.as_ref().expect("payload").get())
                    .expect("stream frame parses");
            data["instanceId"].as_str().expect("id string").to_owned()
        })
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 2, "both workers reached the bus");

    bridge.send(r#"{"command":"stopInstance","data":{"id":"inst-1"}}"#);
    bridge.send(r#"{"command":"stopInstance","data":{"id":"inst-2"}}"#);
}
