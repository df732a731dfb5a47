use std::net::Ipv6Addr;

use log::*;

use crate::wire::*;


/// An **AAAA** record type, which contains an `Ipv6Addr`.
///
/// # References
///
/// - [RFC 3596](https://tools.ietf.org/html/rfc3596) — DNS Extensions to
///   Support IP Version 6 (October 2003)
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct AAAA {

    /// The IPv6 address contained in the packet.
    pub address: Ipv6Addr,
}

impl Wire for AAAA {
    const NAME: &'static str = "AAAA";
    const RR_TYPE: u16 = 28;

    fn read(stated_length: u16, c: &mut Cursor<&[u8]>) -> Result<Self, WireError> {
        if stated_length != 16 {
            warn!("Length is incorrect (record length {:?}, but should be sixteen)", stated_length);
            let mandated_length = MandatedLength::Exactly(16);
            return Err(WireError::WrongRecordLength { stated_length, mandated_length });
        }

        let mut buf = [0_u8; 16];
        c.read_exact(&mut buf)?;

        let address = Ipv6Addr::from(buf);
        trace!("Parsed IPv6 address -> {:?}", address);

        Ok(Self { address })
    }

    fn write(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        buf.extend_from_slice(&self.address.octets());
        Ok(())
    }

    fn to_text(&self) -> String {
        self.address.to_string()
    }

    fn from_text(tokens: &[&str]) -> Result<Self, WireError> {
        match tokens {
            [address] => {
                let address = address.parse()
                    .map_err(|_| WireError::TextFormat(format!("invalid IPv6 address {:?}", address)))?;
                Ok(Self { address })
            }
            _ => Err(WireError::TextFormat(String::from("AAAA records take one field"))),
        }
    }
}
