use log::*;

use crate::strings::{Labels, ReadLabels, WriteLabels};
use crate::wire::*;


/// A **PTR** record, which holds a _pointer_ to a canonical name. This is
/// most often used for reverse DNS lookups.
///
/// # Strings
///
/// Unlike CNAME records, which are followed automatically by the resolving
/// server, PTR records are just returned as-is.
///
/// # References
///
/// - [RFC 1035 §3.3.12](https://tools.ietf.org/html/rfc1035) — Domain
///   Names, Implementation and Specification (November 1987)
#[derive(PartialEq, Debug, Clone)]
pub struct PTR {

    /// The CNAME contained in the record.
    pub cname: Labels,
}

impl Wire for PTR {
    const NAME: &'static str = "PTR";
    const RR_TYPE: u16 = 12;

    fn read(stated_length: u16, c: &mut Cursor<&[u8]>) -> Result<Self, WireError> {
        let (cname, cname_length) = c.read_labels()?;
        trace!("Parsed cname -> {:?}", cname);

        if stated_length == cname_length {
            trace!("Length is correct");
            Ok(Self { cname })
        }
        else {
            warn!("Length is incorrect (stated length {:?}, cname length {:?})", stated_length, cname_length);
            Err(WireError::WrongLabelLength { stated_length, length_after_labels: cname_length })
        }
    }

    fn write(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        buf.write_labels(&self.cname)
    }

    fn to_text(&self) -> String {
        self.cname.to_string()
    }

    fn from_text(tokens: &[&str]) -> Result<Self, WireError> {
        match tokens {
            [cname] => Ok(Self { cname: Labels::encode(cname)? }),
            _       => Err(WireError::TextFormat(String::from("PTR records take one field"))),
        }
    }
}
