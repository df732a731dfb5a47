use log::*;

use crate::wire::*;


/// A **HINFO** _(host information)_ record, which contains the CPU and OS
/// of the host it refers to. It also gets used as the response for `ANY`
/// queries by some servers, where it instead holds a reference to RFC 8482.
///
/// # References
///
/// - [RFC 1035 §3.3.2](https://tools.ietf.org/html/rfc1035) — Domain Names,
///   Implementation and Specification (November 1987)
/// - [RFC 8482 §6](https://tools.ietf.org/html/rfc8482#section-6) —
///   Providing Minimal-Sized Responses to DNS Queries That Have QTYPE=ANY
///   (January 2019)
#[derive(PartialEq, Debug, Clone)]
pub struct HINFO {

    /// The CPU field of the record.
    pub cpu: String,

    /// The OS field of the record.
    pub os: String,
}

impl Wire for HINFO {
    const NAME: &'static str = "HINFO";
    const RR_TYPE: u16 = 13;

    fn read(stated_length: u16, c: &mut Cursor<&[u8]>) -> Result<Self, WireError> {
        let cpu_length = c.read_u8()?;
        let mut cpu_buf = vec![ 0_u8; usize::from(cpu_length) ];
        c.read_exact(&mut cpu_buf)?;

        let cpu = String::from_utf8_lossy(&cpu_buf).to_string();
        trace!("Parsed CPU -> {:?}", cpu);

        let os_length = c.read_u8()?;
        let mut os_buf = vec![ 0_u8; usize::from(os_length) ];
        c.read_exact(&mut os_buf)?;

        let os = String::from_utf8_lossy(&os_buf).to_string();
        trace!("Parsed OS -> {:?}", os);

        let length_after_strings = 1 + u16::from(cpu_length) + 1 + u16::from(os_length);
        if stated_length == length_after_strings {
            trace!("Length is correct");
            Ok(Self { cpu, os })
        }
        else {
            warn!("Length is incorrect (stated length {:?}, strings length {:?})", stated_length, length_after_strings);
            Err(WireError::WrongLabelLength { stated_length, length_after_labels: length_after_strings })
        }
    }

    fn write(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        for field in [ &self.cpu, &self.os ] {
            if field.len() > 255 {
                return Err(WireError::TextFormat(format!("string of {} bytes is too long for one character-string", field.len())));
            }

            buf.push(field.len() as u8);
            buf.extend_from_slice(field.as_bytes());
        }

        Ok(())
    }

    fn to_text(&self) -> String {
        format!("{:?} {:?}", self.cpu, self.os)
    }

    fn from_text(tokens: &[&str]) -> Result<Self, WireError> {
        match tokens {
            [cpu, os] => {
                Ok(Self {
                    cpu: String::from(cpu.trim_matches('"')),
                    os: String::from(os.trim_matches('"')),
                })
            }
            _ => Err(WireError::TextFormat(String::from("HINFO records take two fields"))),
        }
    }
}
