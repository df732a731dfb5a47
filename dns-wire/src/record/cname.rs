use log::*;

use crate::strings::{Labels, ReadLabels, WriteLabels};
use crate::wire::*;


/// A **CNAME** _(canonical name)_ record, which aliases one domain to
/// another.
///
/// # References
///
/// - [RFC 1035 §3.3.1](https://tools.ietf.org/html/rfc1035) — Domain Names,
///   Implementation and Specification (November 1987)
#[derive(PartialEq, Debug, Clone)]
pub struct CNAME {

    /// The domain name that this CNAME is an alias of.
    pub domain: Labels,
}

impl Wire for CNAME {
    const NAME: &'static str = "CNAME";
    const RR_TYPE: u16 = 5;

    fn read(stated_length: u16, c: &mut Cursor<&[u8]>) -> Result<Self, WireError> {
        let (domain, domain_length) = c.read_labels()?;
        trace!("Parsed domain -> {:?}", domain);

        if stated_length == domain_length {
            trace!("Length is correct");
            Ok(Self { domain })
        }
        else {
            warn!("Length is incorrect (stated length {:?}, domain length {:?})", stated_length, domain_length);
            Err(WireError::WrongLabelLength { stated_length, length_after_labels: domain_length })
        }
    }

    fn write(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        buf.write_labels(&self.domain)
    }

    fn to_text(&self) -> String {
        self.domain.to_string()
    }

    fn from_text(tokens: &[&str]) -> Result<Self, WireError> {
        match tokens {
            [domain] => Ok(Self { domain: Labels::encode(domain)? }),
            _        => Err(WireError::TextFormat(String::from("CNAME records take one field"))),
        }
    }
}
