use std::io::{BufRead, BufReader, Cursor, Write};
use std::net::TcpStream;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde_json::json;

use super::tcp::forward_lines;
use super::*;
use crate::engine::EngineCmd;
use crate::error::SyncError;
use crate::library::fixtures::track;

#[derive(Clone, Default)]
struct Recorder {
    sent: Arc<Mutex<Vec<SyncMessage>>>,
    broken: bool,
}

impl SyncChannel for Recorder {
    fn publish(&mut self, msg: &SyncMessage) -> Result<(), SyncError> {
        if self.broken {
            return Err(SyncError::NotConnected);
        }
        self.sent.lock().unwrap().push(msg.clone());
        Ok(())
    }
}

#[test]
fn messages_use_type_tagged_shapes() {
    assert_eq!(serde_json::to_value(SyncMessage::Play).unwrap(), json!({"type": "play"}));
    assert_eq!(serde_json::to_value(SyncMessage::Pause).unwrap(), json!({"type": "pause"}));
    assert_eq!(
        serde_json::to_value(SyncMessage::Seek { time: 30.0 }).unwrap(),
        json!({"type": "seek", "time": 30.0})
    );
    assert_eq!(
        serde_json::to_value(SyncMessage::JoinRoom { room: "den".into() }).unwrap(),
        json!({"type": "join_room", "room": "den"})
    );

    let v = serde_json::to_value(SyncMessage::ChangeSong { track: track("a") }).unwrap();
    assert_eq!(v["type"], "change_song");
    assert_eq!(v["track"]["id"], "a");
    assert_eq!(v["track"]["source"], "/music/a.flac");
}

#[test]
fn messages_parse_from_lines() {
    assert_eq!(
        SyncMessage::from_line("{\"type\":\"seek\",\"time\":12}\n").unwrap(),
        SyncMessage::Seek { time: 12.0 }
    );
    let minimal = r#"{"type":"change_song","track":{"id":"z","title":"Z","source":"/z.mp3"}}"#;
    let SyncMessage::ChangeSong { track } = SyncMessage::from_line(minimal).unwrap() else {
        panic!("expected change_song");
    };
    assert_eq!(track.id.as_str(), "z");
    assert!(track.artist.is_none());

    assert!(SyncMessage::from_line(r#"{"type":"rewind"}"#).is_err());
    assert!(SyncMessage::from_line("not json").is_err());
}

#[test]
fn line_encoding_is_newline_terminated() {
    let line = SyncMessage::Play.to_line().unwrap();
    assert_eq!(line, "{\"type\":\"play\"}\n");
}

#[test]
fn client_publishes_local_intents() {
    let rec = Recorder::default();
    let mut client = SyncClient::new(Box::new(rec.clone()));
    client.join("den").unwrap();
    assert_eq!(client.room(), Some("den"));

    assert!(client.publish(SyncMessage::Play));
    let sent = rec.sent.lock().unwrap();
    assert_eq!(
        *sent,
        vec![SyncMessage::JoinRoom { room: "den".into() }, SyncMessage::Play]
    );
}

#[test]
fn client_suppresses_publishing_while_applying_remote() {
    let rec = Recorder::default();
    let mut client = SyncClient::new(Box::new(rec.clone()));

    client.begin_remote();
    assert!(client.is_applying_remote());
    assert!(!client.publish(SyncMessage::Seek { time: 30.0 }));
    client.end_remote();

    assert!(rec.sent.lock().unwrap().is_empty());
    assert!(client.publish(SyncMessage::Pause));
    assert_eq!(rec.sent.lock().unwrap().len(), 1);
}

#[test]
fn disconnected_client_never_publishes() {
    let mut client = SyncClient::disconnected();
    assert!(!client.is_connected());
    assert!(!client.publish(SyncMessage::Play));
    assert!(matches!(client.join("x"), Err(SyncError::NotConnected)));
}

#[test]
fn failed_publish_drops_the_channel() {
    let rec = Recorder {
        broken: true,
        ..Recorder::default()
    };
    let mut client = SyncClient::new(Box::new(rec));
    assert!(!client.publish(SyncMessage::Play));
    assert!(!client.is_connected());
}

#[test]
fn forward_lines_skips_garbage_and_blank_lines() {
    let input = "{\"type\":\"play\"}\n\ngarbage\n{\"type\":\"seek\",\"time\":4.5}\n";
    let mut got = Vec::new();
    forward_lines(Cursor::new(input), |m| {
        got.push(m);
        true
    });
    assert_eq!(got, vec![SyncMessage::Play, SyncMessage::Seek { time: 4.5 }]);
}

#[test]
fn forward_lines_stops_when_delivery_fails() {
    let input = "{\"type\":\"play\"}\n{\"type\":\"pause\"}\n";
    let mut count = 0;
    forward_lines(Cursor::new(input), |_| {
        count += 1;
        false
    });
    assert_eq!(count, 1);
}

fn connect(addr: &str, room: &str) -> (TcpStream, BufReader<TcpStream>) {
    let stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    let reader = BufReader::new(stream.try_clone().unwrap());
    let mut writer = stream;
    writer
        .write_all(
            SyncMessage::JoinRoom {
                room: room.to_string(),
            }
            .to_line()
            .unwrap()
            .as_bytes(),
        )
        .unwrap();
    (writer, reader)
}

#[test]
fn relay_forwards_only_within_a_room() {
    let relay = Relay::bind("127.0.0.1:0").unwrap();
    let addr = relay.local_addr().unwrap().to_string();
    relay.spawn();

    let (mut a, _a_in) = connect(&addr, "den");
    let (_b, mut b_in) = connect(&addr, "den");
    let (_c, mut c_in) = connect(&addr, "attic");

    // Joins are handled on per-client threads; retry until B has joined.
    let mut line = String::new();
    let mut delivered = false;
    for _ in 0..25 {
        a.write_all(b"{\"type\":\"play\"}\n").unwrap();
        line.clear();
        if b_in.read_line(&mut line).is_ok() && !line.is_empty() {
            delivered = true;
            break;
        }
    }
    assert!(delivered, "message never reached the other room member");
    assert_eq!(SyncMessage::from_line(&line).unwrap(), SyncMessage::Play);

    let mut other = String::new();
    assert!(c_in.read_line(&mut other).is_err() || other.is_empty());
}

#[test]
fn tcp_channel_delivers_remote_messages_to_the_engine() {
    let relay = Relay::bind("127.0.0.1:0").unwrap();
    let addr = relay.local_addr().unwrap().to_string();
    relay.spawn();

    let (tx_a, _rx_a) = mpsc::channel::<EngineCmd>();
    let (tx_b, rx_b) = mpsc::channel::<EngineCmd>();
    let mut a = SyncClient::new(Box::new(TcpChannel::connect(&addr, tx_a).unwrap()));
    let mut b = SyncClient::new(Box::new(TcpChannel::connect(&addr, tx_b).unwrap()));
    a.join("den").unwrap();
    b.join("den").unwrap();

    let mut got = None;
    for _ in 0..25 {
        a.publish(SyncMessage::Seek { time: 30.0 });
        if let Ok(cmd) = rx_b.recv_timeout(Duration::from_millis(200)) {
            got = Some(cmd);
            break;
        }
    }
    assert!(matches!(
        got,
        Some(EngineCmd::Remote(SyncMessage::Seek { time })) if time == 30.0
    ));
}

#[test]
fn stalled_client_does_not_hold_up_other_rooms() {
    let relay = Relay::bind("127.0.0.1:0").unwrap();
    let addr = relay.local_addr().unwrap().to_string();
    relay.spawn();

    // `_stalled` never reads, so the relay's writes to it eventually block.
    let (_stalled, _stalled_in) = connect(&addr, "den");
    let (mut flooder, _flooder_in) = connect(&addr, "den");
    let mut big = track("big");
    big.title = "x".repeat(64 * 1024);
    let line = SyncMessage::ChangeSong { track: big }.to_line().unwrap();
    thread::spawn(move || {
        for _ in 0..512 {
            if flooder.write_all(line.as_bytes()).is_err() {
                break;
            }
        }
    });
    thread::sleep(Duration::from_millis(500));

    let (mut a, _a_in) = connect(&addr, "attic");
    let (_b, mut b_in) = connect(&addr, "attic");
    let mut got = String::new();
    let mut delivered = false;
    for _ in 0..25 {
        a.write_all(b"{\"type\":\"pause\"}\n").unwrap();
        got.clear();
        if b_in.read_line(&mut got).is_ok() && !got.is_empty() {
            delivered = true;
            break;
        }
    }
    assert!(delivered, "other room starved by a stalled client");
    assert_eq!(SyncMessage::from_line(&got).unwrap(), SyncMessage::Pause);
}
