//! All the DNS record types, and the registry that maps 16-bit type codes
//! onto their codecs.


mod a;
pub use self::a::A;

mod aaaa;
pub use self::aaaa::AAAA;

mod cname;
pub use self::cname::CNAME;

mod hinfo;
pub use self::hinfo::HINFO;

mod mx;
pub use self::mx::MX;

mod ns;
pub use self::ns::NS;

mod opt;
pub use self::opt::{OPT, EdnsOption};

mod ptr;
pub use self::ptr::PTR;

mod soa;
pub use self::soa::SOA;

mod srv;
pub use self::srv::SRV;

mod txt;
pub use self::txt::TXT;


mod others;
pub use self::others::UnknownQtype;


use crate::wire::{Cursor, Read, Wire, WireError};


/// A record that’s been parsed from a byte buffer, as a tagged variant per
/// codec. Type codes with no codec in the registry are carried opaquely in
/// the `Other` variant rather than failing, so undefined record types pass
/// through unharmed.
#[derive(PartialEq, Debug, Clone)]
pub enum Record {

    /// An **A** record.
    A(A),

    /// An **AAAA** record.
    AAAA(AAAA),

    /// A **CNAME** record.
    CNAME(CNAME),

    /// A **HINFO** record.
    HINFO(HINFO),

    /// A **MX** record.
    MX(MX),

    /// A **NS** record.
    NS(NS),

    /// An **OPT** pseudo-record. The envelope treats this one specially, as
    /// its class and TTL fields carry extension data instead.
    OPT(OPT),

    /// A **PTR** record.
    PTR(PTR),

    /// A **SOA** record.
    SOA(SOA),

    /// A **SRV** record.
    SRV(SRV),

    /// A **TXT** record.
    TXT(TXT),

    /// A record with a type that we don’t recognise.
    Other {

        /// The number that’s meant to represent the record type.
        type_number: UnknownQtype,

        /// The raw rdata bytes of this record, kept as-is.
        bytes: Vec<u8>,
    },
}


/// A type code that a question or record envelope can carry: one of the
/// registered concrete codecs, or any other number.
#[derive(PartialEq, Debug, Copy, Clone)]
pub enum RecordType {

    /// The **A** record type.
    A,

    /// The **AAAA** record type.
    AAAA,

    /// The **CNAME** record type.
    CNAME,

    /// The **HINFO** record type.
    HINFO,

    /// The **MX** record type.
    MX,

    /// The **NS** record type.
    NS,

    /// The **PTR** record type.
    PTR,

    /// The **SOA** record type.
    SOA,

    /// The **SRV** record type.
    SRV,

    /// The **TXT** record type.
    TXT,

    /// A type number with no codec in the registry.
    Other(UnknownQtype),
}


impl From<u16> for RecordType {
    fn from(type_number: u16) -> Self {
        match type_number {
            A::RR_TYPE      => Self::A,
            AAAA::RR_TYPE   => Self::AAAA,
            CNAME::RR_TYPE  => Self::CNAME,
            HINFO::RR_TYPE  => Self::HINFO,
            MX::RR_TYPE     => Self::MX,
            NS::RR_TYPE     => Self::NS,
            PTR::RR_TYPE    => Self::PTR,
            SOA::RR_TYPE    => Self::SOA,
            SRV::RR_TYPE    => Self::SRV,
            TXT::RR_TYPE    => Self::TXT,
            n               => Self::Other(UnknownQtype::from(n)),
        }
    }
}

impl RecordType {

    /// The number signifying this type on the wire.
    pub fn type_number(self) -> u16 {
        match self {
            Self::A          => A::RR_TYPE,
            Self::AAAA       => AAAA::RR_TYPE,
            Self::CNAME      => CNAME::RR_TYPE,
            Self::HINFO      => HINFO::RR_TYPE,
            Self::MX         => MX::RR_TYPE,
            Self::NS         => NS::RR_TYPE,
            Self::PTR        => PTR::RR_TYPE,
            Self::SOA        => SOA::RR_TYPE,
            Self::SRV        => SRV::RR_TYPE,
            Self::TXT        => TXT::RR_TYPE,
            Self::Other(uq)  => uq.type_number(),
        }
    }

    /// Searches the registry and the known-name table for a type with the
    /// given name, returning `None` if there is no type with that name.
    pub fn from_type_name(name: &str) -> Option<Self> {
        let concrete = [
            (A::NAME, A::RR_TYPE),          (AAAA::NAME, AAAA::RR_TYPE),
            (CNAME::NAME, CNAME::RR_TYPE),  (HINFO::NAME, HINFO::RR_TYPE),
            (MX::NAME, MX::RR_TYPE),        (NS::NAME, NS::RR_TYPE),
            (PTR::NAME, PTR::RR_TYPE),      (SOA::NAME, SOA::RR_TYPE),
            (SRV::NAME, SRV::RR_TYPE),      (TXT::NAME, TXT::RR_TYPE),
        ];

        if let Some(&(_, number)) = concrete.iter().find(|t| t.0.eq_ignore_ascii_case(name)) {
            return Some(Self::from(number));
        }

        UnknownQtype::from_type_name(name).map(Self::Other)
    }
}


impl Record {

    /// Reads at most `stated_length` bytes from the given cursor, parsing
    /// them into a record structure depending on the type, which has
    /// already been read. (OPT records never reach here; the envelope
    /// intercepts their type number first.)
    pub(crate) fn read(record_type: RecordType, stated_length: u16, c: &mut Cursor<&[u8]>) -> Result<Self, WireError> {
        macro_rules! read_record {
            ($record:tt) => { {
                log::info!("Parsing {} record (len {})", $record::NAME, stated_length);
                Wire::read(stated_length, c).map(Self::$record)
            } }
        }

        match record_type {
            RecordType::A      => read_record!(A),
            RecordType::AAAA   => read_record!(AAAA),
            RecordType::CNAME  => read_record!(CNAME),
            RecordType::HINFO  => read_record!(HINFO),
            RecordType::MX     => read_record!(MX),
            RecordType::NS     => read_record!(NS),
            RecordType::PTR    => read_record!(PTR),
            RecordType::SOA    => read_record!(SOA),
            RecordType::SRV    => read_record!(SRV),
            RecordType::TXT    => read_record!(TXT),

            RecordType::Other(type_number) => {
                let mut bytes = vec![ 0_u8; usize::from(stated_length) ];
                c.read_exact(&mut bytes)?;
                Ok(Self::Other { type_number, bytes })
            }
        }
    }

    /// Appends this record’s rdata to the given buffer. The length field is
    /// not written here: the envelope derives it from the bytes produced.
    pub(crate) fn write(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        match self {
            Self::A(rec)      => rec.write(buf),
            Self::AAAA(rec)   => rec.write(buf),
            Self::CNAME(rec)  => rec.write(buf),
            Self::HINFO(rec)  => rec.write(buf),
            Self::MX(rec)     => rec.write(buf),
            Self::NS(rec)     => rec.write(buf),
            Self::OPT(rec)    => rec.write_options(buf),
            Self::PTR(rec)    => rec.write(buf),
            Self::SOA(rec)    => rec.write(buf),
            Self::SRV(rec)    => rec.write(buf),
            Self::TXT(rec)    => rec.write(buf),

            Self::Other { bytes, .. } => {
                buf.extend_from_slice(bytes);
                Ok(())
            }
        }
    }

    /// The number signifying this record’s type on the wire.
    pub fn type_number(&self) -> u16 {
        match self {
            Self::A(_)      => A::RR_TYPE,
            Self::AAAA(_)   => AAAA::RR_TYPE,
            Self::CNAME(_)  => CNAME::RR_TYPE,
            Self::HINFO(_)  => HINFO::RR_TYPE,
            Self::MX(_)     => MX::RR_TYPE,
            Self::NS(_)     => NS::RR_TYPE,
            Self::OPT(_)    => OPT::RR_TYPE,
            Self::PTR(_)    => PTR::RR_TYPE,
            Self::SOA(_)    => SOA::RR_TYPE,
            Self::SRV(_)    => SRV::RR_TYPE,
            Self::TXT(_)    => TXT::RR_TYPE,

            Self::Other { type_number, .. } => type_number.type_number(),
        }
    }

    /// This record’s rdata in presentation format. Unknown types use the
    /// RFC 3597 generic encoding (`\# length hex-data`); OPT records have
    /// no presentation format, so a comment-style summary is produced.
    pub fn to_text(&self) -> String {
        match self {
            Self::A(rec)      => rec.to_text(),
            Self::AAAA(rec)   => rec.to_text(),
            Self::CNAME(rec)  => rec.to_text(),
            Self::HINFO(rec)  => rec.to_text(),
            Self::MX(rec)     => rec.to_text(),
            Self::NS(rec)     => rec.to_text(),
            Self::OPT(rec)    => rec.summary(),
            Self::PTR(rec)    => rec.to_text(),
            Self::SOA(rec)    => rec.to_text(),
            Self::SRV(rec)    => rec.to_text(),
            Self::TXT(rec)    => rec.to_text(),

            Self::Other { bytes, .. } => {
                let mut text = format!("\\# {}", bytes.len());
                if ! bytes.is_empty() {
                    text.push(' ');
                    for b in bytes {
                        text.push_str(&format!("{:02x}", b));
                    }
                }
                text
            }
        }
    }

    /// Parses a record of the given type from whitespace-split
    /// presentation-format tokens.
    pub fn from_text(record_type: RecordType, tokens: &[&str]) -> Result<Self, WireError> {
        macro_rules! parse_record {
            ($record:tt) => {
                $record::from_text(tokens).map(Self::$record)
            }
        }

        match record_type {
            RecordType::A      => parse_record!(A),
            RecordType::AAAA   => parse_record!(AAAA),
            RecordType::CNAME  => parse_record!(CNAME),
            RecordType::HINFO  => parse_record!(HINFO),
            RecordType::MX     => parse_record!(MX),
            RecordType::NS     => parse_record!(NS),
            RecordType::PTR    => parse_record!(PTR),
            RecordType::SOA    => parse_record!(SOA),
            RecordType::SRV    => parse_record!(SRV),
            RecordType::TXT    => parse_record!(TXT),

            RecordType::Other(type_number) => {
                let bytes = parse_generic_rdata(tokens)?;
                Ok(Self::Other { type_number, bytes })
            }
        }
    }
}


/// Parses the RFC 3597 generic rdata encoding: `\#`, a length, and that
/// many bytes of hex data.
fn parse_generic_rdata(tokens: &[&str]) -> Result<Vec<u8>, WireError> {
    match tokens {
        [r"\#", length, hex @ ..] => {
            let expected = length.parse::<usize>()
                .map_err(|e| WireError::TextFormat(e.to_string()))?;

            let digits = hex.concat();
            if digits.len() % 2 != 0 {
                return Err(WireError::TextFormat(String::from("odd number of hex digits")));
            }

            let bytes = (0 .. digits.len() / 2)
                .map(|i| u8::from_str_radix(&digits[i * 2 .. i * 2 + 2], 16)
                    .map_err(|e| WireError::TextFormat(e.to_string())))
                .collect::<Result<Vec<_>, _>>()?;

            if bytes.len() != expected {
                return Err(WireError::TextFormat(format!("expected {} bytes of rdata, got {}", expected, bytes.len())));
            }

            Ok(bytes)
        }

        _ => Err(WireError::TextFormat(String::from("expected \\# generic rdata"))),
    }
}


#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn registry_maps_both_ways() {
        for number in [ 1, 2, 5, 6, 12, 13, 15, 16, 28, 33 ] {
            assert_eq!(RecordType::from(number).type_number(), number);
        }
    }

    #[test]
    fn unknown_types_survive_the_registry() {
        assert_eq!(RecordType::from(0x2222).type_number(), 0x2222);
    }

    #[test]
    fn type_names() {
        assert_eq!(RecordType::from_type_name("soa"), Some(RecordType::SOA));
        assert_eq!(RecordType::from_type_name("AXFR").map(RecordType::type_number), Some(252));
        assert_eq!(RecordType::from_type_name("NOPE"), None);
    }

    #[test]
    fn generic_rdata_round_trip() {
        let record = Record::Other {
            type_number: UnknownQtype::UnheardOf(4444),
            bytes: vec![ 0x0A, 0x00, 0x00, 0x01 ],
        };

        let text = record.to_text();
        assert_eq!(text, r"\# 4 0a000001");

        let tokens = text.split_whitespace().collect::<Vec<_>>();
        let reparsed = Record::from_text(RecordType::from(4444), &tokens).unwrap();
        assert_eq!(reparsed, record);
    }
}
