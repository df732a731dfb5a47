//! The blocking socket that all non-HTTPS requests travel over.

use std::convert::TryFrom;
use std::io::{ErrorKind, Read, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use log::*;

use dns_wire::HEADER_SIZE;

use crate::Error;


/// The protocol a [`DnsSocket`] speaks.
#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub enum Protocol {

    /// Plain DNS datagrams.
    ///
    /// # Reference
    ///
    /// - [RFC 1035 §4.2.1](https://tools.ietf.org/html/rfc1035) — Domain
    ///   Names, Implementation and Specification (November 1987)
    Udp,

    /// DNS over a TCP stream, with each message prefixed by its length.
    ///
    /// # Reference
    ///
    /// - [RFC 1035 §4.2.2](https://tools.ietf.org/html/rfc1035) — Domain
    ///   Names, Implementation and Specification (November 1987)
    /// - [RFC 7766](https://tools.ietf.org/html/rfc7766) — DNS Transport
    ///   over TCP, Implementation Requirements (March 2016)
    Tcp,

    /// DNS over TLS, framed the same way as TCP.
    ///
    /// # Reference
    ///
    /// - [RFC 7858](https://tools.ietf.org/html/rfc7858) — Specification
    ///   for DNS over Transport Layer Security (May 2016)
    #[cfg(feature = "with_tls")]
    Tls,
}

impl Protocol {

    /// The port used when the nameserver address does not name one.
    pub fn default_port(self) -> u16 {
        match self {
            Self::Udp | Self::Tcp  => 53,

            #[cfg(feature = "with_tls")]
            Self::Tls              => 853,
        }
    }

    /// Whether messages on this protocol get a 2-byte length prefix.
    fn is_stream(self) -> bool {
        ! matches!(self, Self::Udp)
    }
}


/// The connection state a socket is in. A socket that hits an error goes
/// back to `Closed` so a later write starts from a clean connection.
enum Inner {
    Closed,
    Udp(UdpSocket),
    Tcp(TcpStream),

    #[cfg(feature = "with_tls")]
    Tls(Box<native_tls::TlsStream<TcpStream>>),
}


/// A blocking socket that carries whole DNS messages to one nameserver.
///
/// The socket is created closed, connects on the first write (or an explicit
/// [`open`](Self::open)), and can be held open across messages so that
/// stream transports are not re-established for every request. All reads
/// and writes are bounded by the configured timeout.
pub struct DnsSocket {
    protocol: Protocol,
    addr: String,
    timeout: Duration,
    local_address: Option<IpAddr>,
    inner: Inner,
    last_error: Option<String>,
}

/// How long to wait on any one read or write before giving up.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

impl DnsSocket {

    /// Creates a closed socket that will speak the given protocol to the
    /// given nameserver address. The address may carry an explicit port;
    /// otherwise the protocol’s default port is used.
    pub fn new(protocol: Protocol, addr: impl Into<String>) -> Self {
        Self {
            protocol,
            addr: addr.into(),
            timeout: DEFAULT_TIMEOUT,
            local_address: None,
            inner: Inner::Closed,
            last_error: None,
        }
    }

    /// Changes the read and write timeout from the 5-second default. Takes
    /// effect the next time the socket is opened.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Binds the local end of the socket to the given address, rather than
    /// letting the OS pick one.
    pub fn set_local_address(&mut self, local_address: IpAddr) {
        self.local_address = Some(local_address);
    }

    /// The protocol this socket speaks.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// The nameserver address this socket connects to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Whether the socket currently holds an open connection.
    pub fn is_open(&self) -> bool {
        ! matches!(self.inner, Inner::Closed)
    }

    /// A description of the most recent failure on this socket, if any.
    /// A socket that has recorded an error has already dropped its
    /// connection, so the next write starts afresh.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Drops the connection, returning the socket to its closed state.
    pub fn close(&mut self) {
        self.inner = Inner::Closed;
    }

    /// Resolves the nameserver address and establishes the connection.
    ///
    /// # Errors
    ///
    /// Returns `SocketOpenFailed` if the address fails to resolve or the
    /// connection cannot be established within the timeout.
    pub fn open(&mut self) -> Result<(), Error> {
        let result = match self.resolve_address() {
            Ok(target)  => self.connect(target),
            Err(e)      => Err(e),
        };

        if let Err(e) = &result {
            self.record_failure(&e.to_string());
        }

        result
    }

    /// Sends one whole DNS message. Stream protocols get the 2-byte
    /// big-endian length prefix, written together with the message in a
    /// single call so the two can never be split by an interleaved writer.
    ///
    /// # Errors
    ///
    /// Returns `WriteTimeout` if the message is not accepted in time, or a
    /// network error otherwise. Either way the connection is dropped.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if ! self.is_open() {
            self.open()?;
        }

        info!("Sending {} bytes of data to {} over {:?}", bytes.len(), self.addr, self.protocol);

        let result = self.write_inner(bytes);
        if let Err(e) = &result {
            self.record_failure(&e.to_string());
        }

        result
    }

    /// Receives one whole DNS message: a single datagram of at most
    /// `max_size` bytes over UDP, or an exact length-prefixed message over
    /// a stream.
    ///
    /// # Errors
    ///
    /// Returns `ReadTimeout` if nothing arrives in time, `TruncatedStream`
    /// if a stream ends early or declares a length shorter than the fixed
    /// message header, or a network error otherwise.
    pub fn read(&mut self, max_size: usize) -> Result<Vec<u8>, Error> {
        let result = self.read_inner(max_size);
        if let Err(e) = &result {
            self.record_failure(&e.to_string());
        }

        result
    }

    fn resolve_address(&self) -> Result<SocketAddr, Error> {
        // A bare IP literal never carries a port, however many colons it
        // holds, so it gets the default port directly. What remains is
        // either “host:port” (including the bracketed “[v6]:port” form) or
        // a plain hostname.
        if let Ok(ip) = self.addr.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.protocol.default_port()));
        }

        let candidates = if self.addr.contains(':') {
            self.addr.to_socket_addrs()
        }
        else {
            (&*self.addr, self.protocol.default_port()).to_socket_addrs()
        };

        match candidates {
            Ok(mut addrs) => {
                addrs.next().ok_or_else(|| Error::SocketOpenFailed(format!("no addresses for {:?}", self.addr)))
            }
            Err(e) => {
                Err(Error::SocketOpenFailed(format!("resolving {:?}: {}", self.addr, e)))
            }
        }
    }

    fn connect(&mut self, target: SocketAddr) -> Result<(), Error> {
        info!("Opening {:?} socket to {}", self.protocol, target);

        match self.protocol {
            Protocol::Udp => {
                let local = match self.local_address {
                    Some(ip)                   => SocketAddr::new(ip, 0),
                    None if target.is_ipv6()   => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
                    None                       => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
                };

                let socket = UdpSocket::bind(local)
                    .map_err(|e| Error::SocketOpenFailed(format!("binding {}: {}", local, e)))?;
                socket.connect(target)
                    .map_err(|e| Error::SocketOpenFailed(format!("connecting to {}: {}", target, e)))?;
                socket.set_read_timeout(Some(self.timeout))?;
                socket.set_write_timeout(Some(self.timeout))?;

                self.inner = Inner::Udp(socket);
            }

            Protocol::Tcp => {
                let stream = self.connect_stream(target)?;
                self.inner = Inner::Tcp(stream);
            }

            #[cfg(feature = "with_tls")]
            Protocol::Tls => {
                let stream = self.connect_stream(target)?;

                let connector = native_tls::TlsConnector::new()?;
                let domain = self.tls_domain();
                debug!("Starting TLS handshake with {:?}", domain);

                let tls_stream = connector.connect(&domain, stream)?;
                self.inner = Inner::Tls(Box::new(tls_stream));
            }
        }

        debug!("Opened");
        Ok(())
    }

    fn connect_stream(&self, target: SocketAddr) -> Result<TcpStream, Error> {
        let stream = TcpStream::connect_timeout(&target, self.timeout)
            .map_err(|e| Error::SocketOpenFailed(format!("connecting to {}: {}", target, e)))?;

        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;
        Ok(stream)
    }

    /// The server name presented during the TLS handshake: the configured
    /// address without any port suffix.
    #[cfg(feature = "with_tls")]
    fn tls_domain(&self) -> String {
        match self.addr.rfind(':') {
            Some(colon) if ! self.addr[colon + 1 ..].contains(':')
                => self.addr[.. colon].to_string(),
            _   => self.addr.clone(),
        }
    }

    fn write_inner(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if self.protocol.is_stream() {
            let length = u16::try_from(bytes.len()).map_err(|_| Error::BadRequest)?;

            let mut framed = Vec::with_capacity(2 + bytes.len());
            framed.extend_from_slice(&length.to_be_bytes());
            framed.extend_from_slice(bytes);

            self.write_all(&framed)
        }
        else {
            self.write_all(bytes)
        }
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let result = match &mut self.inner {
            Inner::Closed       => return Err(Error::SocketOpenFailed(String::from("socket is closed"))),
            Inner::Udp(socket)  => socket.send(bytes).map(|_| ()),
            Inner::Tcp(stream)  => stream.write_all(bytes),

            #[cfg(feature = "with_tls")]
            Inner::Tls(stream)  => stream.write_all(bytes),
        };

        result.map_err(|e| {
            if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) {
                Error::WriteTimeout
            }
            else {
                Error::NetworkError(e)
            }
        })
    }

    fn read_inner(&mut self, max_size: usize) -> Result<Vec<u8>, Error> {
        match &mut self.inner {
            Inner::Closed => {
                Err(Error::SocketOpenFailed(String::from("socket is closed")))
            }

            Inner::Udp(socket) => {
                let mut buf = vec![ 0_u8; max_size ];
                let len = socket.recv(&mut buf).map_err(read_error)?;

                info!("Received {} bytes of data", len);
                buf.truncate(len);
                Ok(buf)
            }

            Inner::Tcp(stream) => read_framed(stream),

            #[cfg(feature = "with_tls")]
            Inner::Tls(stream) => read_framed(stream.as_mut()),
        }
    }

    fn record_failure(&mut self, description: &str) {
        warn!("Socket to {} failed: {}", self.addr, description);
        self.last_error = Some(description.to_string());
        self.inner = Inner::Closed;
    }
}


/// Reads one length-prefixed message from a stream: the 2-byte big-endian
/// length, then exactly that many bytes.
fn read_framed(stream: &mut dyn Read) -> Result<Vec<u8>, Error> {
    let mut length_buf = [0_u8; 2];
    stream.read_exact(&mut length_buf).map_err(framed_read_error)?;

    let length = usize::from(u16::from_be_bytes(length_buf));
    debug!("Response will be {} bytes", length);

    if length < HEADER_SIZE {
        warn!("Declared length {} is shorter than a message header", length);
        return Err(Error::TruncatedStream);
    }

    let mut buf = vec![ 0_u8; length ];
    stream.read_exact(&mut buf).map_err(framed_read_error)?;

    info!("Received {} bytes of data", length);
    Ok(buf)
}

fn read_error(e: std::io::Error) -> Error {
    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) {
        Error::ReadTimeout
    }
    else {
        Error::NetworkError(e)
    }
}

fn framed_read_error(e: std::io::Error) -> Error {
    if matches!(e.kind(), ErrorKind::UnexpectedEof) {
        Error::TruncatedStream
    }
    else {
        read_error(e)
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn new_sockets_start_closed() {
        let socket = DnsSocket::new(Protocol::Udp, "127.0.0.1");

        assert!(! socket.is_open());
        assert_eq!(socket.last_error(), None);
    }

    #[test]
    fn default_ports() {
        assert_eq!(Protocol::Udp.default_port(), 53);
        assert_eq!(Protocol::Tcp.default_port(), 53);
    }

    #[test]
    fn unresolvable_address() {
        let mut socket = DnsSocket::new(Protocol::Udp, "absolutely.not.a.real.host.invalid");

        assert!(matches!(socket.open(), Err(Error::SocketOpenFailed(_))));
        assert!(socket.last_error().is_some());
    }

    #[test]
    fn bare_ipv6_literal_gets_the_default_port() {
        let socket = DnsSocket::new(Protocol::Tcp, "2001:db8:0:0:0:0:0:1");

        assert_eq!(socket.resolve_address().unwrap(),
                   SocketAddr::new("2001:db8::1".parse().unwrap(), 53));
    }

    #[test]
    fn bracketed_ipv6_keeps_its_port() {
        let socket = DnsSocket::new(Protocol::Tcp, "[::1]:5353");

        assert_eq!(socket.resolve_address().unwrap(),
                   SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), 5353));
    }

    #[test]
    fn tcp_write_is_a_single_framed_message() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            stream.read_to_end(&mut buf).unwrap();
            buf
        });

        let mut socket = DnsSocket::new(Protocol::Tcp, addr.to_string());
        socket.write(&[ 0xAB; 20 ]).unwrap();
        socket.close();

        let received = handle.join().unwrap();
        assert_eq!(received[0 .. 2], [ 0x00, 0x14 ]);  // length prefix, 20
        assert_eq!(received.len(), 22);
    }

    #[test]
    fn short_declared_length_is_truncation() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut prefix = [0_u8; 2];
            stream.read_exact(&mut prefix).unwrap();
            let mut request = vec![ 0_u8; usize::from(u16::from_be_bytes(prefix)) ];
            stream.read_exact(&mut request).unwrap();

            stream.write_all(&[ 0x00, 0x04, 0x01, 0x02, 0x03, 0x04 ]).unwrap();
        });

        let mut socket = DnsSocket::new(Protocol::Tcp, addr.to_string());
        socket.write(&[ 0x00 ]).unwrap();

        assert!(matches!(socket.read(512), Err(Error::TruncatedStream)));
        assert!(socket.last_error().is_some());
        assert!(! socket.is_open());

        handle.join().unwrap();
    }

    #[test]
    fn stream_ending_early_is_truncation() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();

            // consume the whole framed request, so that hanging up does not
            // reset the connection with data still unread
            let mut prefix = [0_u8; 2];
            stream.read_exact(&mut prefix).unwrap();
            let mut request = vec![ 0_u8; usize::from(u16::from_be_bytes(prefix)) ];
            stream.read_exact(&mut request).unwrap();

            // declare 100 bytes but hang up after 3
            stream.write_all(&[ 0x00, 0x64, 0x01, 0x02, 0x03 ]).unwrap();
        });

        let mut socket = DnsSocket::new(Protocol::Tcp, addr.to_string());
        socket.write(&[ 0x00 ]).unwrap();

        assert!(matches!(socket.read(512), Err(Error::TruncatedStream)));
        handle.join().unwrap();
    }
}
