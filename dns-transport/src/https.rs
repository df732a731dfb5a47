//! DNS over HTTPS, as one blocking POST per message.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use log::*;

use crate::Error;


/// A DNS-over-HTTPS endpoint, which exchanges binary DNS messages with an
/// HTTP server instead of writing them to a socket directly.
///
/// # Reference
///
/// - [RFC 8484](https://tools.ietf.org/html/rfc8484) — DNS Queries over
///   HTTPS (October 2018)
#[derive(Debug, Clone)]
pub struct HttpsExchange {
    url: String,
    timeout: Duration,
}

/// The User-Agent header sent with HTTPS requests.
static USER_AGENT: &str = concat!("dns-client/", env!("CARGO_PKG_VERSION"));

impl HttpsExchange {

    /// Creates an exchange that will POST to the given `https://` URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), timeout: Duration::from_secs(5) }
    }

    /// Changes the socket timeout from the 5-second default.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// The URL this exchange sends requests to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends the given serialized DNS message as an HTTP POST body, and
    /// returns the binary body of the response.
    ///
    /// # Errors
    ///
    /// Returns `SocketOpenFailed` if the URL cannot be picked apart or the
    /// connection fails, `WrongHttpStatus` if the server answers with
    /// anything other than 200, and `BadRequest` if the response is not
    /// HTTP at all.
    pub fn exchange(&self, request_bytes: &[u8]) -> Result<Vec<u8>, Error> {
        let (domain, path) = self.split_domain()
            .ok_or_else(|| Error::SocketOpenFailed(format!("invalid https url {:?}", self.url)))?;

        let connector = native_tls::TlsConnector::new()?;

        info!("Opening TLS socket to {:?}", domain);
        let stream = TcpStream::connect((domain, 443))
            .map_err(|e| Error::SocketOpenFailed(format!("connecting to {:?}: {}", domain, e)))?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let mut stream = connector.connect(domain, stream)?;

        let mut bytes = format!("\
            POST {} HTTP/1.1\r\n\
            Host: {}\r\n\
            Content-Type: application/dns-message\r\n\
            Accept: application/dns-message\r\n\
            User-Agent: {}\r\n\
            Connection: close\r\n\
            Content-Length: {}\r\n\r\n",
            path, domain, USER_AGENT, request_bytes.len()).into_bytes();
        bytes.extend_from_slice(request_bytes);

        info!("Sending {} bytes of data to {}", bytes.len(), self.url);
        stream.write_all(&bytes)?;
        debug!("Sent");

        info!("Waiting to receive...");
        let mut buf = Vec::new();

        // Keep reading until the header block is complete, then until the
        // body reaches the length the server declared for it.
        loop {
            let mut chunk = [0_u8; 4096];
            let read_len = stream.read(&mut chunk)?;

            if read_len == 0 {
                warn!("Stream ended before the response was complete");
                return Err(Error::TruncatedStream);
            }

            buf.extend_from_slice(&chunk[.. read_len]);

            let mut headers = [httparse::EMPTY_HEADER; 32];
            let mut response = httparse::Response::new(&mut headers);

            let header_len = match response.parse(&buf) {
                Ok(httparse::Status::Complete(len))  => len,
                Ok(httparse::Status::Partial)        => continue,
                Err(e) => {
                    warn!("Response is not HTTP: {}", e);
                    return Err(Error::BadRequest);
                }
            };

            match response.code {
                Some(200)   => { }
                Some(code)  => return Err(Error::WrongHttpStatus(code)),
                None        => return Err(Error::BadRequest),
            }

            for header in response.headers.iter().take_while(|h| ! h.name.is_empty()) {
                trace!("Header {:?} -> {:?}", header.name, String::from_utf8_lossy(header.value));
            }

            let content_length = response.headers.iter()
                .find(|h| h.name.eq_ignore_ascii_case("content-length"))
                .and_then(|h| std::str::from_utf8(h.value).ok())
                .and_then(|v| v.trim().parse::<usize>().ok())
                .ok_or(Error::BadRequest)?;

            if buf.len() - header_len < content_length {
                continue;
            }

            let body = buf[header_len .. header_len + content_length].to_vec();
            info!("HTTP body has {} bytes", body.len());
            return Ok(body);
        }
    }

    fn split_domain(&self) -> Option<(&str, &str)> {
        let sp = self.url.strip_prefix("https://")?;
        let slash = sp.find('/')?;
        Some((&sp[.. slash], &sp[slash ..]))
    }
}
