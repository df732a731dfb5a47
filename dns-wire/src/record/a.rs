use std::net::Ipv4Addr;

use log::*;

use crate::wire::*;


/// An **A** record type, which contains an `Ipv4Addr`.
///
/// # References
///
/// - [RFC 1035 §3.4.1](https://tools.ietf.org/html/rfc1035) — Domain Names,
///   Implementation and Specification (November 1987)
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct A {

    /// The IPv4 address contained in the packet.
    pub address: Ipv4Addr,
}

impl Wire for A {
    const NAME: &'static str = "A";
    const RR_TYPE: u16 = 1;

    fn read(stated_length: u16, c: &mut Cursor<&[u8]>) -> Result<Self, WireError> {
        if stated_length != 4 {
            warn!("Length is incorrect (record length {:?}, but should be four)", stated_length);
            let mandated_length = MandatedLength::Exactly(4);
            return Err(WireError::WrongRecordLength { stated_length, mandated_length });
        }

        let mut buf = [0_u8; 4];
        c.read_exact(&mut buf)?;

        let address = Ipv4Addr::from(buf);
        trace!("Parsed IPv4 address -> {:?}", address);

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
                    .map_err(|_| WireError::TextFormat(format!("invalid IPv4 address {:?}", address)))?;
                Ok(Self { address })
            }
            _ => Err(WireError::TextFormat(String::from("A records take one field"))),
        }
    }
}
