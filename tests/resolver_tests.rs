//! Tests that push real messages through real localhost sockets.

use std::collections::HashMap;
use std::net::{Ipv4Addr, TcpListener, TcpStream, UdpSocket};
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use pretty_assertions::assert_eq;

use dns_client::{CacheKey, Nameserver, ResolveError, Resolver, ResponseCache, ServerFailure, Signer, TxidGenerator};
use dns_client::wire::{Flags, Labels, Message, QClass, Record, RecordType, ResourceRecord};
use dns_client::wire::record::{A, SOA, TXT};


fn example_question() -> Labels {
    Labels::encode("example.com").unwrap()
}

fn a_record(name: &Labels, last_octet: u8) -> ResourceRecord {
    ResourceRecord {
        name: name.clone(),
        qclass: QClass::IN,
        ttl: 300,
        record: Record::A(A { address: Ipv4Addr::new(127, 0, 0, last_octet) }),
    }
}

/// Parses a request and builds the matching NOERROR response containing the
/// given answers.
fn respond_to(request_bytes: &[u8], answers: Vec<ResourceRecord>) -> Vec<u8> {
    let mut message = Message::from_bytes(request_bytes).unwrap();
    message.header.flags = Flags::standard_response();
    message.answers = answers;
    message.additionals.clear();
    message.update_counts();
    message.to_bytes().unwrap()
}

/// Spawns a thread that answers `count` UDP requests with an A record, and
/// returns the nameserver address to reach it on.
fn udp_responder(count: usize) -> String {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap().to_string();

    thread::spawn(move || {
        for _ in 0 .. count {
            let mut buf = [0_u8; 1500];
            let (len, peer) = socket.recv_from(&mut buf).unwrap();

            let request = Message::from_bytes(&buf[.. len]).unwrap();
            let response = respond_to(&buf[.. len], vec![ a_record(&request.questions[0].qname, 1) ]);
            socket.send_to(&response, peer).unwrap();
        }
    });

    addr
}

fn read_framed(stream: &mut TcpStream) -> Vec<u8> {
    let mut prefix = [0_u8; 2];
    stream.read_exact(&mut prefix).unwrap();

    let mut buf = vec![ 0_u8; usize::from(u16::from_be_bytes(prefix)) ];
    stream.read_exact(&mut buf).unwrap();
    buf
}

fn write_framed(stream: &mut TcpStream, bytes: &[u8]) {
    let mut framed = (bytes.len() as u16).to_be_bytes().to_vec();
    framed.extend_from_slice(bytes);
    stream.write_all(&framed).unwrap();
}


#[test]
fn plain_udp_query() {
    let addr = udp_responder(1);

    let mut resolver = Resolver::new(vec![ Nameserver::Socket(addr) ]);
    resolver.set_txid_generator(TxidGenerator::Sequence(100));

    let request = Message::query(example_question(), RecordType::A, QClass::IN);
    let response = resolver.send(&request, false).unwrap();

    assert_eq!(response.header.transaction_id, request.header.transaction_id);
    assert_eq!(response.answers, vec![ a_record(&example_question(), 1) ]);
}


#[test]
fn failover_reaches_the_third_nameserver() {
    let addr = udp_responder(1);

    let mut resolver = Resolver::new(vec![
        Nameserver::Socket(String::from("first.unreachable.invalid")),
        Nameserver::Socket(String::from("second.unreachable.invalid")),
        Nameserver::Socket(addr),
    ]);

    let request = Message::query(example_question(), RecordType::A, QClass::IN);
    let response = resolver.send(&request, false).unwrap();

    assert_eq!(response.answers.len(), 1);
}


#[test]
fn all_failures_are_collected() {
    let mut resolver = Resolver::new(vec![
        Nameserver::Socket(String::from("first.unreachable.invalid")),
        Nameserver::Socket(String::from("second.unreachable.invalid")),
    ]);

    let request = Message::query(example_question(), RecordType::A, QClass::IN);

    match resolver.send(&request, false) {
        Err(ResolveError::AllNameserversFailed { history }) => {
            assert_eq!(history.len(), 2);
            assert_eq!(history[0].0, "first.unreachable.invalid");
            assert!(matches!(history[0].1, ServerFailure::Transport(_)));
        }
        other => panic!("expected AllNameserversFailed, got {:?}", other),
    }
}


#[test]
fn mismatched_transaction_id_is_rejected() {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap().to_string();

    thread::spawn(move || {
        let mut buf = [0_u8; 1500];
        let (len, peer) = socket.recv_from(&mut buf).unwrap();

        let mut response = Message::from_bytes(&buf[.. len]).unwrap();
        response.header.transaction_id = response.header.transaction_id.wrapping_add(1);
        response.header.flags = Flags::standard_response();
        response.update_counts();
        socket.send_to(&response.to_bytes().unwrap(), peer).unwrap();
    });

    let mut resolver = Resolver::new(vec![ Nameserver::Socket(addr) ]);
    let request = Message::query(example_question(), RecordType::A, QClass::IN);

    match resolver.send(&request, false) {
        Err(ResolveError::AllNameserversFailed { history }) => {
            assert!(matches!(history[0].1, ServerFailure::WrongTransactionId { .. }));
        }
        other => panic!("expected AllNameserversFailed, got {:?}", other),
    }
}


#[test]
fn error_response_codes_are_failures() {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap().to_string();

    thread::spawn(move || {
        let mut buf = [0_u8; 1500];
        let (len, peer) = socket.recv_from(&mut buf).unwrap();

        let mut response = Message::from_bytes(&buf[.. len]).unwrap();
        response.header.flags = Flags::standard_response();
        response.header.flags.error_code = Some(dns_client::wire::ErrorCode::NXDomain);
        response.update_counts();
        socket.send_to(&response.to_bytes().unwrap(), peer).unwrap();
    });

    let mut resolver = Resolver::new(vec![ Nameserver::Socket(addr) ]);
    let request = Message::query(example_question(), RecordType::A, QClass::IN);

    match resolver.send(&request, false) {
        Err(ResolveError::AllNameserversFailed { history }) => {
            assert!(matches!(history[0].1, ServerFailure::ErrorResponse(_)));
        }
        other => panic!("expected AllNameserversFailed, got {:?}", other),
    }
}


#[test]
fn truncated_udp_response_is_retried_once_over_tcp() {
    // a TCP listener and a UDP socket sharing one port number
    let (listener, udp) = loop {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        match UdpSocket::bind(("127.0.0.1", port)) {
            Ok(udp)  => break (listener, udp),
            Err(_)   => continue,
        }
    };

    let addr = listener.local_addr().unwrap().to_string();
    let (udp_count_tx, udp_count_rx) = mpsc::channel();

    thread::spawn(move || {
        let mut buf = [0_u8; 1500];
        let (len, peer) = udp.recv_from(&mut buf).unwrap();

        let mut response = Message::from_bytes(&buf[.. len]).unwrap();
        response.header.flags = Flags::standard_response();
        response.header.flags.truncated = true;
        response.update_counts();
        udp.send_to(&response.to_bytes().unwrap(), peer).unwrap();

        // report how many datagrams arrived in total, waiting briefly for
        // any extras that should not exist
        udp.set_read_timeout(Some(Duration::from_millis(500))).unwrap();
        let mut datagrams = 1;
        while udp.recv_from(&mut buf).is_ok() {
            datagrams += 1;
        }
        udp_count_tx.send(datagrams).unwrap();
    });

    let tcp_handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request_bytes = read_framed(&mut stream);

        let request = Message::from_bytes(&request_bytes).unwrap();
        let response = respond_to(&request_bytes, vec![ a_record(&request.questions[0].qname, 2) ]);
        write_framed(&mut stream, &response);
    });

    let mut resolver = Resolver::new(vec![ Nameserver::Socket(addr) ]);
    let request = Message::query(example_question(), RecordType::A, QClass::IN);
    let response = resolver.send(&request, false).unwrap();

    // the answer that came back is the TCP one
    assert_eq!(response.answers, vec![ a_record(&example_question(), 2) ]);

    tcp_handle.join().unwrap();
    assert_eq!(udp_count_rx.recv().unwrap(), 1);
}


#[test]
fn silence_is_a_read_timeout() {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap().to_string();

    // keep the socket alive but never answer
    let mut resolver = Resolver::new(vec![ Nameserver::Socket(addr) ]);
    resolver.set_timeout(Duration::from_millis(200));

    let request = Message::query(example_question(), RecordType::A, QClass::IN);

    match resolver.send(&request, false) {
        Err(ResolveError::AllNameserversFailed { history }) => {
            assert!(matches!(history[0].1,
                             ServerFailure::Transport(dns_client::transport::Error::ReadTimeout)));
        }
        other => panic!("expected AllNameserversFailed, got {:?}", other),
    }

    drop(socket);
}


#[test]
fn zone_transfer_accumulates_until_the_second_soa() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let zone = Labels::encode("zone.example").unwrap();

    let soa = |name: &Labels| ResourceRecord {
        name: name.clone(),
        qclass: QClass::IN,
        ttl: 3600,
        record: Record::SOA(SOA {
            mname: Labels::encode("ns1.zone.example").unwrap(),
            rname: Labels::encode("admin.zone.example").unwrap(),
            serial: 1,
            refresh_interval: 3600,
            retry_interval: 900,
            expire_limit: 604800,
            minimum_ttl: 300,
        }),
    };

    let thread_zone = zone.clone();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request_bytes = read_framed(&mut stream);

        // opening message: the first SOA and one record
        let first = respond_to(&request_bytes, vec![ soa(&thread_zone), a_record(&thread_zone, 1) ]);
        write_framed(&mut stream, &first);

        // closing message: another record and the terminating SOA
        let second = respond_to(&request_bytes, vec![ a_record(&thread_zone, 2), soa(&thread_zone) ]);
        write_framed(&mut stream, &second);
    });

    let mut resolver = Resolver::new(vec![ Nameserver::Socket(addr) ]);
    let response = resolver.transfer(zone.clone()).unwrap();

    handle.join().unwrap();

    assert_eq!(response.answers.len(), 4);
    assert_eq!(response.header.ancount, 4);
    assert_eq!(response.answers[0], soa(&zone));
    assert_eq!(response.answers[3], soa(&zone));
}


#[derive(Clone, Default)]
struct SharedCache {
    inner: Arc<Mutex<HashMap<CacheKey, Message>>>,
}

impl ResponseCache for SharedCache {
    fn has(&self, key: CacheKey) -> bool {
        self.inner.lock().unwrap().contains_key(&key)
    }

    fn get(&self, key: CacheKey) -> Option<Message> {
        self.inner.lock().unwrap().get(&key).cloned()
    }

    fn put(&mut self, key: CacheKey, response: Message) {
        self.inner.lock().unwrap().insert(key, response);
    }
}

#[test]
fn queries_populate_and_consult_the_cache() {
    let addr = udp_responder(1);
    let cache = SharedCache::default();

    let mut resolver = Resolver::new(vec![ Nameserver::Socket(addr) ]);
    resolver.set_cache(Box::new(cache.clone()));

    let first = resolver.query(example_question(), RecordType::A).unwrap();
    assert_eq!(cache.inner.lock().unwrap().len(), 1);

    // the responder only answers once, so this can only come from the cache
    let second = resolver.query(example_question(), RecordType::A).unwrap();
    assert_eq!(second, first);
}


struct FixedSigner;

impl Signer for FixedSigner {
    fn sign(&self, message: &Message) -> Result<ResourceRecord, String> {
        Ok(ResourceRecord {
            name: message.questions[0].qname.clone(),
            qclass: QClass::IN,
            ttl: 0,
            record: Record::TXT(TXT { messages: vec![ String::from("signed") ] }),
        })
    }
}

#[test]
fn signer_record_rides_in_the_additional_section() {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    let addr = socket.local_addr().unwrap().to_string();
    let (request_tx, request_rx) = mpsc::channel();

    thread::spawn(move || {
        let mut buf = [0_u8; 1500];
        let (len, peer) = socket.recv_from(&mut buf).unwrap();

        let request = Message::from_bytes(&buf[.. len]).unwrap();
        let response = respond_to(&buf[.. len], vec![]);
        socket.send_to(&response, peer).unwrap();

        request_tx.send(request).unwrap();
    });

    let mut resolver = Resolver::new(vec![ Nameserver::Socket(addr) ]);
    resolver.set_signer(Box::new(FixedSigner));

    resolver.query(example_question(), RecordType::A).unwrap();

    let seen = request_rx.recv().unwrap();
    assert_eq!(seen.header.arcount, 1);
    assert_eq!(seen.additionals[0].record,
               Record::TXT(TXT { messages: vec![ String::from("signed") ] }));
}
