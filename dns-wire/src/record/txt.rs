use log::*;

use crate::wire::*;


/// A **TXT** record, which holds arbitrary descriptive text.
///
/// # Encoding
///
/// The rdata is a sequence of character-strings, each at most 255 bytes,
/// and they are kept separate here rather than being glued together. The
/// text encoding is not specified, but this crate treats it as UTF-8.
/// Invalid bytes are turned into the replacement character.
///
/// # References
///
/// - [RFC 1035 §3.3.14](https://tools.ietf.org/html/rfc1035) — Domain
///   Names, Implementation and Specification (November 1987)
#[derive(PartialEq, Debug, Clone)]
pub struct TXT {

    /// The character-strings contained in the record.
    pub messages: Vec<String>,
}

impl Wire for TXT {
    const NAME: &'static str = "TXT";
    const RR_TYPE: u16 = 16;

    fn read(stated_length: u16, c: &mut Cursor<&[u8]>) -> Result<Self, WireError> {
        let mut messages = Vec::new();
        let mut remaining = usize::from(stated_length);

        while remaining > 0 {
            let next_length = c.read_u8()?;
            remaining -= 1;

            if usize::from(next_length) > remaining {
                warn!("String length {} exceeds the {} remaining rdata bytes", next_length, remaining);
                return Err(WireError::InvalidPacket);
            }

            let mut buf = vec![ 0_u8; usize::from(next_length) ];
            c.read_exact(&mut buf)?;
            remaining -= usize::from(next_length);

            let message = String::from_utf8_lossy(&buf).to_string();
            trace!("Parsed string -> {:?}", message);
            messages.push(message);
        }

        if messages.is_empty() {
            warn!("TXT record has no strings at all");
            return Err(WireError::WrongRecordLength { stated_length, mandated_length: MandatedLength::AtLeast(1) });
        }

        Ok(Self { messages })
    }

    fn write(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        for message in &self.messages {
            let bytes = message.as_bytes();

            if bytes.is_empty() {
                buf.push(0);
                continue;
            }

            // Strings longer than one length byte can describe get split
            // into as many character-strings as it takes.
            for chunk in bytes.chunks(255) {
                buf.push(chunk.len() as u8);
                buf.extend_from_slice(chunk);
            }
        }

        Ok(())
    }

    fn to_text(&self) -> String {
        self.messages.iter()
            .map(|m| format!("{:?}", m))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn from_text(tokens: &[&str]) -> Result<Self, WireError> {
        if tokens.is_empty() {
            return Err(WireError::TextFormat(String::from("TXT records take at least one field")));
        }

        let messages = tokens.iter()
            .map(|t| String::from(t.trim_matches('"')))
            .collect();

        Ok(Self { messages })
    }
}
