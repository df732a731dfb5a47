use std::fmt;


/// Something that can go wrong carrying a DNS message over the network.
#[derive(Debug)]
pub enum Error {

    /// There was a problem with the network sending data or receiving a
    /// response.
    NetworkError(std::io::Error),

    /// The socket could not be opened in the first place. The string holds
    /// a description of what went wrong, which is all that remains once the
    /// address resolution and connection machinery is done with it.
    SocketOpenFailed(String),

    /// The write side of the socket did not accept the message within the
    /// timeout.
    WriteTimeout,

    /// No response arrived within the timeout.
    ReadTimeout,

    /// A stream transport closed, or declared a message length, that left
    /// fewer bytes than a DNS message can possibly occupy.
    TruncatedStream,

    /// The HTTPS server answered with a status other than 200. The message
    /// body, if any, is not a DNS message in this case.
    #[cfg(feature = "with_https")]
    WrongHttpStatus(u16),

    /// The server specifically indicated that the request we sent it was
    /// malformed.
    BadRequest,

    /// There was a problem making a TLS request.
    #[cfg(any(feature = "with_tls", feature = "with_https"))]
    TlsError(native_tls::Error),

    /// There was a problem _establishing_ a TLS request.
    #[cfg(any(feature = "with_tls", feature = "with_https"))]
    TlsHandshakeError(native_tls::HandshakeError<std::net::TcpStream>),

    /// The data in the response did not parse correctly from the DNS wire
    /// protocol format.
    WireError(dns_wire::WireError),
}


// From impls

impl From<dns_wire::WireError> for Error {
    fn from(inner: dns_wire::WireError) -> Self {
        Self::WireError(inner)
    }
}

impl From<std::io::Error> for Error {
    fn from(inner: std::io::Error) -> Self {
        Self::NetworkError(inner)
    }
}

#[cfg(any(feature = "with_tls", feature = "with_https"))]
impl From<native_tls::Error> for Error {
    fn from(inner: native_tls::Error) -> Self {
        Self::TlsError(inner)
    }
}

#[cfg(any(feature = "with_tls", feature = "with_https"))]
impl From<native_tls::HandshakeError<std::net::TcpStream>> for Error {
    fn from(inner: native_tls::HandshakeError<std::net::TcpStream>) -> Self {
        Self::TlsHandshakeError(inner)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkError(ioe)     => write!(f, "Network error: {}", ioe),
            Self::SocketOpenFailed(msg) => write!(f, "Failed to open socket: {}", msg),
            Self::WriteTimeout          => write!(f, "Timed out sending request"),
            Self::ReadTimeout           => write!(f, "Timed out waiting for response"),
            Self::TruncatedStream       => write!(f, "Stream ended before a whole message arrived"),
            Self::BadRequest            => write!(f, "Malformed request"),
            Self::WireError(we)         => write!(f, "Failed to parse response: {:?}", we),

            #[cfg(feature = "with_https")]
            Self::WrongHttpStatus(code) => write!(f, "Nameserver returned HTTP {}", code),

            #[cfg(any(feature = "with_tls", feature = "with_https"))]
            Self::TlsError(tls)          => write!(f, "TLS error: {}", tls),

            #[cfg(any(feature = "with_tls", feature = "with_https"))]
            Self::TlsHandshakeError(tls) => write!(f, "TLS handshake error: {}", tls),
        }
    }
}
