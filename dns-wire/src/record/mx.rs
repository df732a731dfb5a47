use log::*;

use crate::strings::{Labels, ReadLabels, WriteLabels};
use crate::wire::*;


/// A **MX** _(mail exchange)_ record, which contains the hostnames for mail
/// servers that handle mail sent to the domain.
///
/// # References
///
/// - [RFC 1035 §3.3.9](https://tools.ietf.org/html/rfc1035) — Domain Names,
///   Implementation and Specification (November 1987)
#[derive(PartialEq, Debug, Clone)]
pub struct MX {

    /// The preference that clients should give to this MX record amongst
    /// all that get returned. Lower values are higher preference.
    pub preference: u16,

    /// The hostname of the mail server.
    pub exchange: Labels,
}

impl Wire for MX {
    const NAME: &'static str = "MX";
    const RR_TYPE: u16 = 15;

    fn read(stated_length: u16, c: &mut Cursor<&[u8]>) -> Result<Self, WireError> {
        let preference = c.read_u16::<BigEndian>()?;
        trace!("Parsed preference -> {:?}", preference);

        let (exchange, exchange_length) = c.read_labels()?;
        trace!("Parsed exchange -> {:?}", exchange);

        let length_after_labels = 2 + exchange_length;
        if stated_length == length_after_labels {
            trace!("Length is correct");
            Ok(Self { preference, exchange })
        }
        else {
            warn!("Length is incorrect (stated length {:?}, preference plus exchange length {:?})", stated_length, length_after_labels);
            Err(WireError::WrongLabelLength { stated_length, length_after_labels })
        }
    }

    fn write(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        buf.write_u16::<BigEndian>(self.preference)?;
        buf.write_labels(&self.exchange)
    }

    fn to_text(&self) -> String {
        format!("{} {}", self.preference, self.exchange)
    }

    fn from_text(tokens: &[&str]) -> Result<Self, WireError> {
        match tokens {
            [preference, exchange] => {
                let preference = preference.parse()
                    .map_err(|_| WireError::TextFormat(format!("invalid preference {:?}", preference)))?;
                Ok(Self { preference, exchange: Labels::encode(exchange)? })
            }
            _ => Err(WireError::TextFormat(String::from("MX records take two fields"))),
        }
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses() {
        let buf = &[
            0x00, 0x0A,  // preference
            0x05, 0x62, 0x73, 0x61, 0x67, 0x6f,  // exchange
            0x02, 0x6d, 0x65,  // exchange
            0x00,  // exchange terminator
        ];

        assert_eq!(MX::read(buf.len() as _, &mut Cursor::new(buf)).unwrap(),
                   MX {
                       preference: 10,
                       exchange: Labels::encode("bsago.me").unwrap(),
                   });
    }

    #[test]
    fn incorrect_record_length() {
        let buf = &[
            0x00, 0x0A,  // preference
            0x03, 0x65, 0x66, 0x67,  // exchange
            0x00,  // exchange terminator
            0x01,  // Unexpected extra byte
        ];

        assert_eq!(MX::read(buf.len() as _, &mut Cursor::new(buf)),
                   Err(WireError::WrongLabelLength { stated_length: 8, length_after_labels: 7 }));
    }

    #[test]
    fn record_empty() {
        assert_eq!(MX::read(0, &mut Cursor::new(&[])),
                   Err(WireError::InvalidPacket));
    }

    #[test]
    fn round_trips_through_bytes() {
        let mx = MX { preference: 5, exchange: Labels::encode("mail.example.com").unwrap() };

        let mut buf = Vec::new();
        mx.write(&mut buf).unwrap();

        assert_eq!(MX::read(buf.len() as _, &mut Cursor::new(&*buf)).unwrap(), mx);
    }

    #[test]
    fn text_round_trip() {
        let mx = MX::from_text(&["10", "mail.example.com."]).unwrap();
        assert_eq!(mx.to_text(), "10 mail.example.com.");
    }
}
