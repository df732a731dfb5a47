//! The resolver, which drives messages through sockets until one
//! nameserver produces a believable answer.

use std::collections::HashMap;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use log::*;
use rand::seq::SliceRandom;

use dns_wire::{ErrorCode, Flags, Labels, Message, QClass, ResourceRecord, Record, RecordType, WireError, HEADER_SIZE};
use dns_wire::record::OPT;
use dns_transport::{DnsSocket, Protocol};

#[cfg(feature = "with_https")]
use dns_transport::HttpsExchange;

use crate::cache::{CacheKey, ResponseCache};
use crate::sign::Signer;
use crate::txid::TxidGenerator;


/// One place a request can be sent to.
#[derive(PartialEq, Debug, Clone)]
pub enum Nameserver {

    /// A plain socket address: an IP address or hostname, with an optional
    /// port. UDP, TCP, and TLS requests all go to this address.
    Socket(String),

    /// A DNS-over-HTTPS endpoint URL.
    #[cfg(feature = "with_https")]
    Https(String),
}

impl fmt::Display for Nameserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Socket(addr) => write!(f, "{}", addr),

            #[cfg(feature = "with_https")]
            Self::Https(url)   => write!(f, "{}", url),
        }
    }
}


/// Why one particular nameserver failed to produce an answer. A send
/// collects one of these per nameserver before giving up entirely.
#[derive(Debug)]
pub enum ServerFailure {

    /// The transport failed to carry the request or the response.
    Transport(dns_transport::Error),

    /// The response arrived but did not parse.
    Wire(WireError),

    /// The response answered a transaction other than ours.
    WrongTransactionId {

        /// The ID the request was sent with.
        expected: u16,

        /// The ID the response carried.
        got: u16,
    },

    /// The message that came back did not have the response flag set.
    NotAResponse,

    /// The server answered with a non-zero response code.
    ErrorResponse(ErrorCode),

    /// The nameserver cannot carry a zone transfer, such as a
    /// DNS-over-HTTPS endpoint.
    TransferUnsupported,
}


/// Something that can go wrong during an entire resolve.
#[derive(Debug)]
pub enum ResolveError {

    /// The request serialized to fewer bytes than a message header, so it
    /// cannot have been a whole message.
    EmptyPacket,

    /// The resolver has no nameservers configured at all.
    NoNameservers,

    /// The request itself failed to serialize.
    Wire(WireError),

    /// The configured signer refused to sign the request.
    Signing(String),

    /// Every nameserver was tried and none produced a valid response. The
    /// history holds one entry per nameserver in the order they were tried,
    /// with the last entry being the most recent failure.
    AllNameserversFailed {

        /// What went wrong at each nameserver.
        history: Vec<(String, ServerFailure)>,
    },
}

impl From<WireError> for ResolveError {
    fn from(inner: WireError) -> Self {
        Self::Wire(inner)
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPacket    => write!(f, "Request serialized to less than a header"),
            Self::NoNameservers  => write!(f, "No nameservers are configured"),
            Self::Wire(we)       => write!(f, "Failed to serialize request: {:?}", we),
            Self::Signing(msg)   => write!(f, "Failed to sign request: {}", msg),

            Self::AllNameserversFailed { history } => {
                match history.last() {
                    Some((ns, failure)) => write!(f, "All {} nameservers failed, most recently {} ({:?})", history.len(), ns, failure),
                    None                => write!(f, "All nameservers failed"),
                }
            }
        }
    }
}


/// The payload size advertised when DNSSEC responses are requested,
/// and the largest UDP datagram we are prepared to receive.
const DEFAULT_PAYLOAD_SIZE: u16 = 4096;

/// The classic maximum size of a UDP response (RFC 1035 §2.3.4), used
/// whenever no larger size has been advertised.
const UNEXTENDED_UDP_SIZE: usize = 512;


/// A **resolver** holds an ordered list of nameservers and the machinery to
/// push one request through them: transport selection, the truncation
/// retry, nameserver failover, and response correlation. Sockets are cached
/// between sends, so repeated requests over a stream transport reuse the
/// connection; a socket that errors is dropped from the cache rather than
/// reused.
pub struct Resolver {
    nameservers: Vec<Nameserver>,
    timeout: Duration,
    shuffle: bool,
    dnssec: bool,
    udp_payload_size: u16,
    local_address: Option<IpAddr>,
    txids: TxidGenerator,
    sockets: HashMap<(Protocol, String), DnsSocket>,
    cache: Option<Box<dyn ResponseCache>>,
    signer: Option<Box<dyn Signer>>,
}

impl Resolver {

    /// Creates a resolver that will try the given nameservers in order,
    /// with random transaction IDs, a 5-second timeout, and no shuffling,
    /// DNSSEC, cache, or signer.
    pub fn new(nameservers: Vec<Nameserver>) -> Self {
        Self {
            nameservers,
            timeout: Duration::from_secs(5),
            shuffle: false,
            dnssec: false,
            udp_payload_size: DEFAULT_PAYLOAD_SIZE,
            local_address: None,
            txids: TxidGenerator::Random,
            sockets: HashMap::new(),
            cache: None,
            signer: None,
        }
    }

    /// Changes the per-operation socket timeout. Cached sockets keep the
    /// timeout they were opened with.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Makes each send shuffle the nameserver list before its pass, to
    /// spread load rather than hammering the first entry.
    pub fn set_shuffle(&mut self, shuffle: bool) {
        self.shuffle = shuffle;
    }

    /// Makes `query` request DNSSEC records, advertising the given payload
    /// size (or the 4096-byte default) in the OPT record it attaches.
    pub fn set_dnssec(&mut self, dnssec: bool, payload_size: Option<u16>) {
        self.dnssec = dnssec;

        if let Some(size) = payload_size {
            self.udp_payload_size = size;
        }
    }

    /// Binds the local end of new sockets to the given address.
    pub fn set_local_address(&mut self, local_address: IpAddr) {
        self.local_address = Some(local_address);
    }

    /// Swaps out the transaction ID generator. Tests use a `Sequence` here
    /// so that IDs are predictable.
    pub fn set_txid_generator(&mut self, txids: TxidGenerator) {
        self.txids = txids;
    }

    /// Attaches a response cache for `query` to consult before the network.
    pub fn set_cache(&mut self, cache: Box<dyn ResponseCache>) {
        self.cache = Some(cache);
    }

    /// Attaches a signer whose record gets appended to every request built
    /// by `query`.
    pub fn set_signer(&mut self, signer: Box<dyn Signer>) {
        self.signer = Some(signer);
    }

    /// Builds a question for the given name and type, applies the OPT
    /// record, signer, and cache collaborators, and sends it.
    ///
    /// # Errors
    ///
    /// Everything `send` can return, plus `Signing` if the configured
    /// signer refuses the message.
    pub fn query(&mut self, qname: Labels, qtype: RecordType) -> Result<Message, ResolveError> {
        let key = CacheKey::for_question(&qname, qtype);

        if let Some(cache) = &self.cache {
            if cache.has(key) {
                if let Some(hit) = cache.get(key) {
                    info!("Answering {} from the cache", qname);
                    return Ok(hit);
                }
            }
        }

        let mut request = Message::query(qname, qtype, QClass::IN);
        request.header.transaction_id = self.txids.generate();

        if self.dnssec {
            debug!("Requesting DNSSEC records, payload size {}", self.udp_payload_size);
            request.additionals.push(ResourceRecord::opt(OPT::request(self.udp_payload_size, true)));
        }

        if let Some(signer) = &self.signer {
            let record = signer.sign(&request).map_err(ResolveError::Signing)?;
            request.additionals.push(record);
        }

        request.update_counts();
        let response = self.send(&request, false)?;

        if let Some(cache) = &mut self.cache {
            cache.put(key, response.clone());
        }

        Ok(response)
    }

    /// Sends one request, trying each nameserver in turn until one of them
    /// produces a response that parses, correlates with the request, and
    /// carries no error code.
    ///
    /// UDP is the default transport; TCP is used when `force_tcp` is set or
    /// the request is too large for a datagram, and a truncated UDP
    /// response is retried once over TCP to the same nameserver.
    ///
    /// # Errors
    ///
    /// Returns `EmptyPacket` or `NoNameservers` for requests that cannot be
    /// sent at all, and `AllNameserversFailed` with the per-server history
    /// when the pass completes without a valid response.
    pub fn send(&mut self, request: &Message, force_tcp: bool) -> Result<Message, ResolveError> {
        let bytes = request.to_bytes()?;
        if bytes.len() < HEADER_SIZE {
            return Err(ResolveError::EmptyPacket);
        }

        if self.nameservers.is_empty() {
            return Err(ResolveError::NoNameservers);
        }

        let mut order = self.nameservers.clone();
        if self.shuffle {
            order.shuffle(&mut rand::thread_rng());
            debug!("Shuffled nameserver order -> {:?}", order);
        }

        let max_udp_size = if self.dnssec { usize::from(self.udp_payload_size) }
                           else           { UNEXTENDED_UDP_SIZE };

        let mut history = Vec::new();

        for nameserver in order {
            info!("Trying nameserver {}", nameserver);

            match self.attempt(&nameserver, request, &bytes, force_tcp, max_udp_size) {
                Ok(response) => {
                    return Ok(response);
                }
                Err(failure) => {
                    warn!("Nameserver {} failed: {:?}", nameserver, failure);
                    history.push((nameserver.to_string(), failure));
                }
            }
        }

        Err(ResolveError::AllNameserversFailed { history })
    }

    /// Requests a full zone transfer (AXFR) over TCP, accumulating
    /// consecutive messages into one until the terminating SOA arrives.
    ///
    /// Transfers use a fresh connection rather than a cached one, since the
    /// stream is left in whatever state the server finished in.
    ///
    /// # Errors
    ///
    /// As for `send`. DNS-over-HTTPS nameservers cannot stream, so they
    /// fail with `TransferUnsupported` and the pass moves on.
    pub fn transfer(&mut self, zone: Labels) -> Result<Message, ResolveError> {
        let mut request = Message::query(zone, RecordType::from(252), QClass::IN);  // AXFR
        request.header.flags.recursion_desired = false;
        request.header.transaction_id = self.txids.generate();

        let bytes = request.to_bytes()?;

        if self.nameservers.is_empty() {
            return Err(ResolveError::NoNameservers);
        }

        let mut history = Vec::new();

        for nameserver in self.nameservers.clone() {
            info!("Trying zone transfer from {}", nameserver);

            let addr = match &nameserver {
                Nameserver::Socket(addr) => addr.clone(),

                #[cfg(feature = "with_https")]
                Nameserver::Https(_) => {
                    history.push((nameserver.to_string(), ServerFailure::TransferUnsupported));
                    continue;
                }
            };

            match self.transfer_attempt(&addr, &request, &bytes) {
                Ok(response) => {
                    return Ok(response);
                }
                Err(failure) => {
                    warn!("Nameserver {} failed: {:?}", nameserver, failure);
                    history.push((nameserver.to_string(), failure));
                }
            }
        }

        Err(ResolveError::AllNameserversFailed { history })
    }

    /// One nameserver’s worth of the send algorithm: transport selection,
    /// the truncation retry, parsing, and validation.
    fn attempt(&mut self, nameserver: &Nameserver, request: &Message, bytes: &[u8], force_tcp: bool, max_udp_size: usize) -> Result<Message, ServerFailure> {
        let response_bytes = match nameserver {
            #[cfg(feature = "with_https")]
            Nameserver::Https(url) => {
                let mut exchange = HttpsExchange::new(url.clone());
                exchange.set_timeout(self.timeout);
                exchange.exchange(bytes).map_err(ServerFailure::Transport)?
            }

            Nameserver::Socket(addr) => {
                if force_tcp || bytes.len() > max_udp_size {
                    self.exchange(Protocol::Tcp, addr, bytes, max_udp_size)?
                }
                else {
                    let udp_response = self.exchange(Protocol::Udp, addr, bytes, max_udp_size)?;

                    if is_truncated(&udp_response) {
                        info!("Response from {} was truncated, retrying over TCP", addr);
                        self.exchange(Protocol::Tcp, addr, bytes, max_udp_size)?
                    }
                    else {
                        udp_response
                    }
                }
            }
        };

        let response = Message::from_bytes(&response_bytes).map_err(ServerFailure::Wire)?;
        validate(request, &response)?;
        Ok(response)
    }

    /// Writes the request and reads one response over a cached socket,
    /// opening a new one if the cache has none for this protocol and
    /// address. A socket that fails is evicted, never reused.
    fn exchange(&mut self, protocol: Protocol, addr: &str, bytes: &[u8], max_udp_size: usize) -> Result<Vec<u8>, ServerFailure> {
        let timeout = self.timeout;
        let local_address = self.local_address;

        let socket = self.sockets
            .entry((protocol, addr.to_string()))
            .or_insert_with(|| {
                let mut socket = DnsSocket::new(protocol, addr);
                socket.set_timeout(timeout);
                if let Some(ip) = local_address {
                    socket.set_local_address(ip);
                }
                socket
            });

        let result = socket.write(bytes).and_then(|()| socket.read(max_udp_size));

        if result.is_err() {
            debug!("Evicting {:?} socket to {}", protocol, addr);
            self.sockets.remove(&(protocol, addr.to_string()));
        }

        result.map_err(ServerFailure::Transport)
    }

    /// One nameserver’s worth of the transfer algorithm: send over a fresh
    /// TCP connection, then keep reading messages until two SOA records
    /// have gone past.
    fn transfer_attempt(&mut self, addr: &str, request: &Message, bytes: &[u8]) -> Result<Message, ServerFailure> {
        let mut socket = DnsSocket::new(Protocol::Tcp, addr);
        socket.set_timeout(self.timeout);
        if let Some(ip) = self.local_address {
            socket.set_local_address(ip);
        }

        socket.write(bytes).map_err(ServerFailure::Transport)?;

        let mut combined: Option<Message> = None;
        let mut soa_count = 0_usize;

        while soa_count < 2 {
            let response_bytes = socket.read(UNEXTENDED_UDP_SIZE).map_err(ServerFailure::Transport)?;
            let message = Message::from_bytes(&response_bytes).map_err(ServerFailure::Wire)?;

            soa_count += message.answers.iter()
                .filter(|rr| matches!(rr.record, Record::SOA(_)))
                .count();

            match &mut combined {
                None => {
                    // the first message carries the rcode for the whole transfer
                    validate(request, &message)?;
                    combined = Some(message);
                }
                Some(whole) => {
                    whole.answers.extend(message.answers);
                }
            }

            debug!("Transfer has seen {} SOA record(s) so far", soa_count);
        }

        // always Some once the loop has run
        let mut whole = combined.ok_or(ServerFailure::NotAResponse)?;
        whole.update_counts();
        Ok(whole)
    }
}


/// Checks the response answers the request: same transaction ID, the
/// response flag set, and a response code of NOERROR.
fn validate(request: &Message, response: &Message) -> Result<(), ServerFailure> {
    if response.header.transaction_id != request.header.transaction_id {
        return Err(ServerFailure::WrongTransactionId {
            expected: request.header.transaction_id,
            got: response.header.transaction_id,
        });
    }

    if ! response.header.flags.response {
        return Err(ServerFailure::NotAResponse);
    }

    if let Some(code) = response.header.flags.error_code {
        return Err(ServerFailure::ErrorResponse(code));
    }

    Ok(())
}

/// A quick look at the TC flag, done on the raw bytes so an oversized or
/// mangled body does not stop the TCP retry from happening.
fn is_truncated(bytes: &[u8]) -> bool {
    if bytes.len() < HEADER_SIZE {
        return false;
    }

    Flags::from_u16(u16::from_be_bytes([ bytes[2], bytes[3] ])).truncated
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn truncation_flag_is_spotted_in_raw_bytes() {
        let mut bytes = vec![ 0_u8; HEADER_SIZE ];
        bytes[2] = 0b_0000_0010;

        assert!(is_truncated(&bytes));

        bytes[2] = 0;
        assert!(! is_truncated(&bytes));
    }

    #[test]
    fn short_buffers_are_not_truncated() {
        assert!(! is_truncated(&[ 0x00, 0x01 ]));
    }

    #[test]
    fn empty_nameserver_list() {
        let mut resolver = Resolver::new(Vec::new());
        let request = Message::query(Labels::encode("example.com").unwrap(), RecordType::A, QClass::IN);

        assert!(matches!(resolver.send(&request, false), Err(ResolveError::NoNameservers)));
    }

    #[test]
    fn mismatched_ids_are_rejected() {
        let request = Message::query(Labels::encode("example.com").unwrap(), RecordType::A, QClass::IN);

        let mut response = request.clone();
        response.header.transaction_id = request.header.transaction_id.wrapping_add(1);
        response.header.flags = Flags::standard_response();

        assert!(matches!(validate(&request, &response),
                         Err(ServerFailure::WrongTransactionId { .. })));
    }

    #[test]
    fn queries_are_not_responses() {
        let request = Message::query(Labels::encode("example.com").unwrap(), RecordType::A, QClass::IN);

        assert!(matches!(validate(&request, &request),
                         Err(ServerFailure::NotAResponse)));
    }
}
