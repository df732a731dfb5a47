use log::*;

use crate::wire::*;


/// An **OPT** _(options)_ pseudo-record, which is used to extend the DNS
/// protocol with additional flags such as DNSSEC stuff.
///
/// # Pseudo-record?
///
/// Unlike all the other record types, which are used to return data about a
/// domain name, the OPT record type is used to add more options to the
/// request, including data about the client or the server. Its purpose is
/// to add more room to the DNS wire format, as backwards compatibility
/// makes it impossible to simply add more flags to the header.
///
/// The fact that this isn’t a standard record type is annoying for a DNS
/// implementation. It re-purposes the ‘class’ and ‘TTL’ fields of the
/// record envelope, as they only have meaning when associated with a domain
/// name. This means the envelope has to treat the OPT type specially on
/// both the read and write sides.
///
/// # References
///
/// - [RFC 6891](https://tools.ietf.org/html/rfc6891) — Extension Mechanisms
///   for DNS (April 2013)
#[derive(PartialEq, Debug, Clone)]
pub struct OPT {

    /// The maximum size of a UDP packet that the client supports.
    pub udp_payload_size: u16,

    /// The bits that form an extended rcode when non-zero.
    pub higher_bits: u8,

    /// The version number of the DNS extension mechanism.
    pub edns0_version: u8,

    /// Sixteen bits worth of flags, of which only the topmost (`DO`, the
    /// DNSSEC OK bit) currently means anything.
    pub flags: u16,

    /// The options carried in the record’s payload, as generic
    /// code-and-data envelopes.
    pub options: Vec<EdnsOption>,
}


/// One EDNS(0) option: a code, and as many bytes of payload as its length
/// field declared. Option-specific payload layouts are not interpreted.
#[derive(PartialEq, Debug, Clone)]
pub struct EdnsOption {

    /// The assigned option code.
    pub code: u16,

    /// The option’s payload.
    pub data: Vec<u8>,
}


impl OPT {

    /// The record type number associated with OPT.
    pub const RR_TYPE: u16 = 41;

    /// The type name, used in logs and summaries.
    pub const NAME: &'static str = "OPT";

    /// The `DO` bit in the flags field.
    pub const DNSSEC_OK: u16 = 0b_1000_0000_0000_0000;

    /// Returns the OPT record to be sent as part of requests: the given
    /// advertised payload size, and the `DO` bit when DNSSEC records are
    /// wanted back.
    pub fn request(udp_payload_size: u16, dnssec_ok: bool) -> Self {
        Self {
            udp_payload_size,
            higher_bits: 0,
            edns0_version: 0,
            flags: if dnssec_ok { Self::DNSSEC_OK } else { 0 },
            options: Vec::new(),
        }
    }

    /// Whether the `DO` bit is set.
    pub fn is_dnssec_ok(&self) -> bool {
        self.flags & Self::DNSSEC_OK != 0
    }

    /// Folds the extended-rcode, version, and flags fields into the 32-bit
    /// number written to the envelope’s TTL field.
    pub fn ttl_fields(&self) -> u32 {
        (u32::from(self.higher_bits) << 24)
            | (u32::from(self.edns0_version) << 16)
            | u32::from(self.flags)
    }

    /// Builds an OPT record from the already-read envelope fields — the
    /// class field (really the payload size) and the TTL field (really the
    /// packed extension fields) — then walks the `stated_length` bytes of
    /// rdata as a sequence of (code, length, data) option triples.
    pub(crate) fn read_fields(class_field: u16, ttl_field: u32, stated_length: u16, c: &mut Cursor<&[u8]>) -> Result<Self, WireError> {
        let higher_bits = (ttl_field >> 24) as u8;
        trace!("Parsed higher bits -> {:#08b}", higher_bits);

        let edns0_version = (ttl_field >> 16) as u8;
        trace!("Parsed EDNS(0) version -> {:?}", edns0_version);

        let flags = (ttl_field & 0xFFFF) as u16;
        trace!("Parsed flags -> {:#08b}", flags);

        let mut options = Vec::new();
        let mut remaining = usize::from(stated_length);

        while remaining > 0 {
            if remaining < 4 {
                warn!("Option triple needs 4 bytes but only {} remain", remaining);
                return Err(WireError::InvalidPacket);
            }

            let code = c.read_u16::<BigEndian>()?;
            let length = c.read_u16::<BigEndian>()?;
            remaining -= 4;

            if usize::from(length) > remaining {
                warn!("Option length {} exceeds the {} remaining rdata bytes", length, remaining);
                return Err(WireError::InvalidPacket);
            }

            let mut data = vec![ 0_u8; usize::from(length) ];
            c.read_exact(&mut data)?;
            remaining -= usize::from(length);

            trace!("Parsed option -> code {}, {} bytes", code, data.len());
            options.push(EdnsOption { code, data });
        }

        Ok(Self { udp_payload_size: class_field, higher_bits, edns0_version, flags, options })
    }

    /// Serialises the option triples into the given buffer. The envelope
    /// fields (payload size and packed TTL) are written by the envelope
    /// itself.
    pub(crate) fn write_options(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        for option in &self.options {
            if option.data.len() > usize::from(u16::MAX) {
                return Err(WireError::InvalidPacket);
            }

            buf.write_u16::<BigEndian>(option.code)?;
            buf.write_u16::<BigEndian>(option.data.len() as u16)?;
            buf.extend_from_slice(&option.data);
        }

        Ok(())
    }

    /// A comment-style summary of this record. OPT has no presentation
    /// format of its own.
    pub fn summary(&self) -> String {
        format!("; EDNS version {}, udp {}, flags {:#06x}, {} option(s)",
                self.edns0_version, self.udp_payload_size, self.flags, self.options.len())
    }
}
