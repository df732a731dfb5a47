use log::*;

use crate::strings::{Labels, ReadLabels, WriteLabels};
use crate::wire::*;


/// A **SOA** _(start of authority)_ record, which contains administrative
/// information about the zone the domain is in. These are given when a
/// server does not have a result for a query.
///
/// # References
///
/// - [RFC 1035 §3.3.13](https://tools.ietf.org/html/rfc1035) — Domain
///   Names, Implementation and Specification (November 1987)
#[derive(PartialEq, Debug, Clone)]
pub struct SOA {

    /// The primary master name for this server.
    pub mname: Labels,

    /// The e-mail address of the administrator responsible for this zone,
    /// encoded as a domain name.
    pub rname: Labels,

    /// A serial number for this zone.
    pub serial: u32,

    /// Duration, in seconds, after which secondary nameservers should query
    /// the master for _its_ SOA record.
    pub refresh_interval: u32,

    /// Duration, in seconds, after which secondary nameservers should retry
    /// requesting the serial number from the master if it does not respond.
    pub retry_interval: u32,

    /// Duration, in seconds, after which secondary nameservers should stop
    /// answering requests for this zone if the master does not respond.
    pub expire_limit: u32,

    /// Duration, in seconds, of the minimum time-to-live.
    pub minimum_ttl: u32,
}

impl Wire for SOA {
    const NAME: &'static str = "SOA";
    const RR_TYPE: u16 = 6;

    fn read(stated_length: u16, c: &mut Cursor<&[u8]>) -> Result<Self, WireError> {
        let (mname, mname_length) = c.read_labels()?;
        trace!("Parsed mname -> {:?}", mname);

        let (rname, rname_length) = c.read_labels()?;
        trace!("Parsed rname -> {:?}", rname);

        let serial = c.read_u32::<BigEndian>()?;
        trace!("Parsed serial -> {:?}", serial);

        let refresh_interval = c.read_u32::<BigEndian>()?;
        trace!("Parsed refresh interval -> {:?}", refresh_interval);

        let retry_interval = c.read_u32::<BigEndian>()?;
        trace!("Parsed retry interval -> {:?}", retry_interval);

        let expire_limit = c.read_u32::<BigEndian>()?;
        trace!("Parsed expire limit -> {:?}", expire_limit);

        let minimum_ttl = c.read_u32::<BigEndian>()?;
        trace!("Parsed minimum TTL -> {:?}", minimum_ttl);

        let length_after_labels = mname_length + rname_length + 5 * 4;
        if stated_length == length_after_labels {
            trace!("Length is correct");
            Ok(Self {
                mname, rname, serial, refresh_interval,
                retry_interval, expire_limit, minimum_ttl,
            })
        }
        else {
            warn!("Length is incorrect (stated length {:?}, names plus fields length {:?})", stated_length, length_after_labels);
            Err(WireError::WrongLabelLength { stated_length, length_after_labels })
        }
    }

    fn write(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        buf.write_labels(&self.mname)?;
        buf.write_labels(&self.rname)?;
        buf.write_u32::<BigEndian>(self.serial)?;
        buf.write_u32::<BigEndian>(self.refresh_interval)?;
        buf.write_u32::<BigEndian>(self.retry_interval)?;
        buf.write_u32::<BigEndian>(self.expire_limit)?;
        buf.write_u32::<BigEndian>(self.minimum_ttl)?;
        Ok(())
    }

    fn to_text(&self) -> String {
        format!("{} {} {} {} {} {} {}",
                self.mname, self.rname, self.serial, self.refresh_interval,
                self.retry_interval, self.expire_limit, self.minimum_ttl)
    }

    fn from_text(tokens: &[&str]) -> Result<Self, WireError> {
        match tokens {
            [mname, rname, numbers @ ..] if numbers.len() == 5 => {
                let fields = numbers.iter()
                    .map(|n| n.parse::<u32>()
                        .map_err(|_| WireError::TextFormat(format!("invalid number {:?}", n))))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(Self {
                    mname: Labels::encode(mname)?,
                    rname: Labels::encode(rname)?,
                    serial: fields[0],
                    refresh_interval: fields[1],
                    retry_interval: fields[2],
                    expire_limit: fields[3],
                    minimum_ttl: fields[4],
                })
            }
            _ => Err(WireError::TextFormat(String::from("SOA records take seven fields"))),
        }
    }
}
