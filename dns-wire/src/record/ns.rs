use log::*;

use crate::strings::{Labels, ReadLabels, WriteLabels};
use crate::wire::*;


/// A **NS** _(name server)_ record, which is used to point to the name
/// server for a domain.
///
/// # References
///
/// - [RFC 1035 §3.3.11](https://tools.ietf.org/html/rfc1035) — Domain
///   Names, Implementation and Specification (November 1987)
#[derive(PartialEq, Debug, Clone)]
pub struct NS {

    /// The domain name of the name server.
    pub nameserver: Labels,
}

impl Wire for NS {
    const NAME: &'static str = "NS";
    const RR_TYPE: u16 = 2;

    fn read(stated_length: u16, c: &mut Cursor<&[u8]>) -> Result<Self, WireError> {
        let (nameserver, nameserver_length) = c.read_labels()?;
        trace!("Parsed nameserver -> {:?}", nameserver);

        if stated_length == nameserver_length {
            trace!("Length is correct");
            Ok(Self { nameserver })
        }
        else {
            warn!("Length is incorrect (stated length {:?}, nameserver length {:?})", stated_length, nameserver_length);
            Err(WireError::WrongLabelLength { stated_length, length_after_labels: nameserver_length })
        }
    }

    fn write(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        buf.write_labels(&self.nameserver)
    }

    fn to_text(&self) -> String {
        self.nameserver.to_string()
    }

    fn from_text(tokens: &[&str]) -> Result<Self, WireError> {
        match tokens {
            [nameserver] => Ok(Self { nameserver: Labels::encode(nameserver)? }),
            _            => Err(WireError::TextFormat(String::from("NS records take one field"))),
        }
    }
}
