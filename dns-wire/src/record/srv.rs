use log::*;

use crate::strings::{Labels, ReadLabels, WriteLabels};
use crate::wire::*;


/// A **SRV** record, which contains a hostname as well as a port number,
/// for specifying the location of services more precisely.
///
/// # References
///
/// - [RFC 2782](https://tools.ietf.org/html/rfc2782) — A DNS RR for
///   specifying the location of services (February 2000)
#[derive(PartialEq, Debug, Clone)]
pub struct SRV {

    /// The priority of this host among all that get returned. Lower values
    /// are higher priority.
    pub priority: u16,

    /// A weight to choose among results with the same priority. Higher
    /// values are higher priority.
    pub weight: u16,

    /// The port the service is serving on.
    pub port: u16,

    /// The hostname of the machine the service is running on.
    pub target: Labels,
}

impl Wire for SRV {
    const NAME: &'static str = "SRV";
    const RR_TYPE: u16 = 33;

    fn read(stated_length: u16, c: &mut Cursor<&[u8]>) -> Result<Self, WireError> {
        let priority = c.read_u16::<BigEndian>()?;
        trace!("Parsed priority -> {:?}", priority);

        let weight = c.read_u16::<BigEndian>()?;
        trace!("Parsed weight -> {:?}", weight);

        let port = c.read_u16::<BigEndian>()?;
        trace!("Parsed port -> {:?}", port);

        let (target, target_length) = c.read_labels()?;
        trace!("Parsed target -> {:?}", target);

        let length_after_labels = 3 * 2 + target_length;
        if stated_length == length_after_labels {
            trace!("Length is correct");
            Ok(Self { priority, weight, port, target })
        }
        else {
            warn!("Length is incorrect (stated length {:?}, fields plus target length {:?})", stated_length, length_after_labels);
            Err(WireError::WrongLabelLength { stated_length, length_after_labels })
        }
    }

    fn write(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        buf.write_u16::<BigEndian>(self.priority)?;
        buf.write_u16::<BigEndian>(self.weight)?;
        buf.write_u16::<BigEndian>(self.port)?;
        buf.write_labels(&self.target)
    }

    fn to_text(&self) -> String {
        format!("{} {} {} {}", self.priority, self.weight, self.port, self.target)
    }

    fn from_text(tokens: &[&str]) -> Result<Self, WireError> {
        match tokens {
            [priority, weight, port, target] => {
                let priority = priority.parse()
                    .map_err(|_| WireError::TextFormat(format!("invalid priority {:?}", priority)))?;
                let weight = weight.parse()
                    .map_err(|_| WireError::TextFormat(format!("invalid weight {:?}", weight)))?;
                let port = port.parse()
                    .map_err(|_| WireError::TextFormat(format!("invalid port {:?}", port)))?;
                Ok(Self { priority, weight, port, target: Labels::encode(target)? })
            }
            _ => Err(WireError::TextFormat(String::from("SRV records take four fields"))),
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
            0x00, 0x01,  // priority
            0x00, 0x01,  // weight
            0x92, 0x7c,  // port
            0x03, 0x61, 0x74, 0x61, 0x05, 0x6c, 0x6f, 0x63, 0x61, 0x6c, 0x04,
            0x6e, 0x6f, 0x64, 0x65, 0x03, 0x64, 0x63, 0x31, 0x06, 0x63, 0x6f,
            0x6e, 0x73, 0x75, 0x6c,  // target
            0x00,  // target terminator
        ];

        assert_eq!(SRV::read(buf.len() as _, &mut Cursor::new(buf)).unwrap(),
                   SRV {
                       priority: 1,
                       weight: 1,
                       port: 37500,
                       target: Labels::encode("ata.local.node.dc1.consul").unwrap(),
                   });
    }

    #[test]
    fn incorrect_record_length() {
        let buf = &[
            0x00, 0x01,  // priority
            0x00, 0x01,  // weight
            0x92, 0x7c,  // port
            0x03, 0x65, 0x66, 0x67,  // target
            0x00,  // target terminator
            0x01,  // Unexpected extra byte
        ];

        assert_eq!(SRV::read(buf.len() as _, &mut Cursor::new(buf)),
                   Err(WireError::WrongLabelLength { stated_length: 12, length_after_labels: 11 }));
    }

    #[test]
    fn record_empty() {
        assert_eq!(SRV::read(0, &mut Cursor::new(&[])),
                   Err(WireError::InvalidPacket));
    }

    #[test]
    fn round_trips_through_bytes() {
        let srv = SRV {
            priority: 0,
            weight: 5,
            port: 5060,
            target: Labels::encode("sip.example.com").unwrap(),
        };

        let mut buf = Vec::new();
        srv.write(&mut buf).unwrap();

        assert_eq!(SRV::read(buf.len() as _, &mut Cursor::new(&*buf)).unwrap(), srv);
    }

    #[test]
    fn text_round_trip() {
        let srv = SRV::from_text(&["0", "5", "5060", "sip.example.com."]).unwrap();
        assert_eq!(srv.to_text(), "0 5 5060 sip.example.com.");
    }
}
