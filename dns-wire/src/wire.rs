//! Serializing and parsing the DNS wire protocol.

pub(crate) use std::io::{Cursor, Read};
pub(crate) use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use std::io;
use log::*;

use crate::record::{Record, RecordType, UnknownQtype, OPT};
use crate::strings::{NameEncoding, NameWriter, ReadLabels};
use crate::types::*;


/// The size of the fixed message header, and therefore the fewest bytes a
/// DNS message can possibly occupy.
pub const HEADER_SIZE: usize = 12;

/// The fewest bytes a resource record can occupy after its name: type,
/// class, TTL, and the rdata length, with zero bytes of rdata.
const MIN_ENVELOPE_SIZE: usize = 10;


impl Message {

    /// Converts this message to a vector of bytes.
    ///
    /// A fresh compression table is constructed for each call, so pointers
    /// can never refer into a previously-encoded message. The header counts
    /// are written exactly as stored; keeping them in sync with the section
    /// lengths is the caller’s lookout (see `update_counts`).
    pub fn to_bytes(&self) -> Result<Vec<u8>, WireError> {
        let mut bytes = Vec::with_capacity(32);
        let mut names = NameWriter::new();

        self.header.encode(&mut bytes)?;

        for question in &self.questions {
            question.encode(&mut bytes, &mut names)?;
        }

        for record in self.answers.iter().chain(&self.authorities).chain(&self.additionals) {
            record.encode(&mut bytes, &mut names)?;
        }

        Ok(bytes)
    }

    /// Reads bytes off of the given slice, parsing them into a message.
    ///
    /// The four counts declared in the header bound the four section loops;
    /// each individual read still validates the remaining buffer length, so
    /// a count the buffer cannot satisfy fails with `InvalidPacket` rather
    /// than over-reading.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, WireError> {
        info!("Parsing message ({} bytes)", bytes.len());
        trace!("Bytes -> {:?}", bytes);
        let mut c = Cursor::new(bytes);

        let header = Header::decode(&mut c)?;
        trace!("Read header -> {:#?}", header);

        // We can pre-allocate these vectors by giving them an initial
        // capacity based on the count fields. But because the count fields
        // are user-controlled (with a maximum of 2^16 - 1) we cannot trust
        // them _entirely_, so cap the pre-allocation if the count looks
        // arbitrarily large (9 seems about right).

        let mut questions = Vec::with_capacity(usize::from(header.qdcount.min(9)));
        debug!("Reading {}x question", header.qdcount);
        for _ in 0 .. header.qdcount {
            questions.push(Question::decode(&mut c)?);
        }

        debug!("Reading {}x answer", header.ancount);
        let answers = read_section(&mut c, header.ancount)?;

        debug!("Reading {}x authority", header.nscount);
        let authorities = read_section(&mut c, header.nscount)?;

        debug!("Reading {}x additional", header.arcount);
        let additionals = read_section(&mut c, header.arcount)?;

        Ok(Self { header, questions, answers, authorities, additionals })
    }
}


/// Reads one record section, using the count declared in the header as the
/// loop bound. Running out of buffer mid-section fails with `InvalidPacket`.
fn read_section(c: &mut Cursor<&[u8]>, count: u16) -> Result<Vec<ResourceRecord>, WireError> {
    let mut section = Vec::with_capacity(usize::from(count.min(9)));

    for _ in 0 .. count {
        match ResourceRecord::decode(c)? {
            Some(record)  => section.push(record),
            None          => return Err(WireError::InvalidPacket),
        }
    }

    Ok(section)
}


impl Header {

    /// Packs the header into the RFC 1035 §4.1.1 twelve-byte layout,
    /// advancing the buffer by exactly that much.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<(), WireError> {
        buf.write_u16::<BigEndian>(self.transaction_id)?;
        buf.write_u16::<BigEndian>(self.flags.to_u16())?;
        buf.write_u16::<BigEndian>(self.qdcount)?;
        buf.write_u16::<BigEndian>(self.ancount)?;
        buf.write_u16::<BigEndian>(self.nscount)?;
        buf.write_u16::<BigEndian>(self.arcount)?;
        Ok(())
    }

    /// Bit-unpacks a header from the next twelve bytes, failing with
    /// `InvalidPacket` if fewer are available.
    pub fn decode(c: &mut Cursor<&[u8]>) -> Result<Self, WireError> {
        let transaction_id = c.read_u16::<BigEndian>()?;
        trace!("Read txid -> {:?}", transaction_id);

        let flags = Flags::from_u16(c.read_u16::<BigEndian>()?);
        trace!("Read flags -> {:#?}", flags);

        let qdcount = c.read_u16::<BigEndian>()?;
        let ancount = c.read_u16::<BigEndian>()?;
        let nscount = c.read_u16::<BigEndian>()?;
        let arcount = c.read_u16::<BigEndian>()?;

        Ok(Self { transaction_id, flags, qdcount, ancount, nscount, arcount })
    }
}


impl Question {

    /// Writes the (possibly compressed) name followed by the type and class.
    pub fn encode(&self, buf: &mut Vec<u8>, names: &mut NameWriter) -> Result<(), WireError> {
        names.write_name(buf, &self.qname, NameEncoding::Compressed)?;
        buf.write_u16::<BigEndian>(self.qtype.type_number())?;
        buf.write_u16::<BigEndian>(self.qclass.to_u16())?;
        Ok(())
    }

    /// Reads a question entry from the cursor.
    ///
    /// Unlike the record envelope, the question section is strict: a type
    /// code that is neither a concrete record type nor a known query-only
    /// type fails with `UnsupportedType`, and an unknown class fails with
    /// `UnsupportedClass`.
    pub fn decode(c: &mut Cursor<&[u8]>) -> Result<Self, WireError> {
        let (qname, _) = c.read_labels()?;
        trace!("Read qname -> {:?}", qname);

        let qtype_number = c.read_u16::<BigEndian>()?;
        let qtype = RecordType::from(qtype_number);
        trace!("Read qtype -> {:?}", qtype);

        if matches!(qtype, RecordType::Other(UnknownQtype::UnheardOf(_))) {
            return Err(WireError::UnsupportedType(qtype_number));
        }

        let qclass_number = c.read_u16::<BigEndian>()?;
        let qclass = QClass::from_u16(qclass_number);
        trace!("Read qclass -> {:?}", qclass);

        if matches!(qclass, QClass::Other(_)) {
            return Err(WireError::UnsupportedClass(qclass_number));
        }

        Ok(Self { qname, qtype, qclass })
    }
}


impl ResourceRecord {

    /// Writes the record envelope — name, type, class, TTL, rdata length —
    /// followed by the type-specific payload.
    ///
    /// The payload is written into a temporary buffer first so that the
    /// length field is always re-derived from the bytes actually produced,
    /// never trusted from an earlier parse. For OPT records the class field
    /// carries the UDP payload size and the TTL carries the packed
    /// extended-rcode, version, and flags fields.
    pub fn encode(&self, buf: &mut Vec<u8>, names: &mut NameWriter) -> Result<(), WireError> {
        names.write_name(buf, &self.name, NameEncoding::Compressed)?;
        buf.write_u16::<BigEndian>(self.record.type_number())?;

        if let Record::OPT(opt) = &self.record {
            buf.write_u16::<BigEndian>(opt.udp_payload_size)?;
            buf.write_u32::<BigEndian>(opt.ttl_fields())?;
        }
        else {
            buf.write_u16::<BigEndian>(self.qclass.to_u16())?;
            buf.write_u32::<BigEndian>(self.ttl)?;
        }

        let mut rdata = Vec::new();
        self.record.write(&mut rdata)?;

        if rdata.len() > usize::from(u16::MAX) {
            return Err(WireError::InvalidPacket);
        }

        buf.write_u16::<BigEndian>(rdata.len() as u16)?;
        buf.extend_from_slice(&rdata);
        Ok(())
    }

    /// Reads one record from the cursor, returning `None` exactly when the
    /// cursor has already reached the end of the buffer (the section loop
    /// uses the header count as its bound, so mid-section exhaustion is an
    /// `InvalidPacket` instead).
    pub fn decode(c: &mut Cursor<&[u8]>) -> Result<Option<Self>, WireError> {
        if c.position() >= c.get_ref().len() as u64 {
            return Ok(None);
        }

        let (name, _) = c.read_labels()?;
        trace!("Read record name -> {:?}", name);

        if remaining(c) < MIN_ENVELOPE_SIZE {
            warn!("Buffer cannot hold a record envelope ({} bytes left)", remaining(c));
            return Err(WireError::InvalidPacket);
        }

        let type_number = c.read_u16::<BigEndian>()?;
        trace!("Read type number -> {:?}", type_number);

        let class_number = c.read_u16::<BigEndian>()?;
        let ttl = c.read_u32::<BigEndian>()?;
        let stated_length = c.read_u16::<BigEndian>()?;
        trace!("Read class/ttl/length -> {:?}/{:?}/{:?}", class_number, ttl, stated_length);

        if usize::from(stated_length) > remaining(c) {
            warn!("Record length {} exceeds the {} remaining bytes", stated_length, remaining(c));
            return Err(WireError::InvalidPacket);
        }

        let start = c.position();

        let record = if type_number == OPT::RR_TYPE {
            Record::OPT(OPT::read_fields(class_number, ttl, stated_length, c)?)
        }
        else {
            Record::read(RecordType::from(type_number), stated_length, c)?
        };

        let length_after_read = (c.position() - start) as u16;
        if length_after_read != stated_length {
            warn!("Record read {} bytes but declared {}", length_after_read, stated_length);
            return Err(WireError::WrongLabelLength { stated_length, length_after_labels: length_after_read });
        }

        Ok(Some(Self {
            name,
            qclass: QClass::from_u16(class_number),
            ttl,
            record,
        }))
    }
}

fn remaining(c: &Cursor<&[u8]>) -> usize {
    c.get_ref().len().saturating_sub(c.position() as usize)
}


impl QClass {
    pub(crate) fn from_u16(uu: u16) -> Self {
        match uu {
            0x0001 => Self::IN,
            0x0003 => Self::CH,
            0x0004 => Self::HS,
                 _ => Self::Other(uu),
        }
    }

    pub(crate) fn to_u16(self) -> u16 {
        match self {
            Self::IN        => 0x0001,
            Self::CH        => 0x0003,
            Self::HS        => 0x0004,
            Self::Other(uu) => uu,
        }
    }
}


impl Flags {

    /// Converts the flags into a two-byte number.
    pub fn to_u16(self) -> u16 {                 // 0123 4567 89AB CDEF
        let mut                          bits  = 0b_0000_0000_0000_0000;
        if self.response               { bits |= 0b_1000_0000_0000_0000; }
        bits |= u16::from(self.opcode.to_bits()) << 11;
        if self.authoritative          { bits |= 0b_0000_0100_0000_0000; }
        if self.truncated              { bits |= 0b_0000_0010_0000_0000; }
        if self.recursion_desired      { bits |= 0b_0000_0001_0000_0000; }
        if self.recursion_available    { bits |= 0b_0000_0000_1000_0000; }
        // (the Z bit is reserved)               0b_0000_0000_0100_0000
        if self.authentic_data         { bits |= 0b_0000_0000_0010_0000; }
        if self.checking_disabled      { bits |= 0b_0000_0000_0001_0000; }
        if let Some(code) = self.error_code {
            bits |= code.to_bits() & 0b_1111;
        }

        bits
    }

    /// Extracts the flags from the given two-byte number.
    pub fn from_u16(bits: u16) -> Self {
        let has_bit = |bit| { bits & bit == bit };

        Self {
            response:               has_bit(0b_1000_0000_0000_0000),
            opcode:                 Opcode::from_bits((bits.to_be_bytes()[0] & 0b_0111_1000) >> 3),
            authoritative:          has_bit(0b_0000_0100_0000_0000),
            truncated:              has_bit(0b_0000_0010_0000_0000),
            recursion_desired:      has_bit(0b_0000_0001_0000_0000),
            recursion_available:    has_bit(0b_0000_0000_1000_0000),
            authentic_data:         has_bit(0b_0000_0000_0010_0000),
            checking_disabled:      has_bit(0b_0000_0000_0001_0000),
            error_code:             ErrorCode::from_bits(bits & 0b_1111),
        }
    }
}


impl Opcode {

    /// Extracts the opcode from this four-bit number, which should have been
    /// extracted from the packet and shifted to be in the range 0–15.
    fn from_bits(bits: u8) -> Self {
        match bits {
            0 => Self::Query,
            1 => Self::IQuery,
            2 => Self::Status,
            4 => Self::Notify,
            5 => Self::Update,
            n => {
                assert!(n <= 15, "bits {:#08b} out of range", n);
                Self::Other(n)
            }
        }
    }

    /// The four-bit number representing this opcode.
    pub fn to_bits(self) -> u8 {
        match self {
            Self::Query     => 0,
            Self::IQuery    => 1,
            Self::Status    => 2,
            Self::Notify    => 4,
            Self::Update    => 5,
            Self::Other(n)  => n & 0b_1111,
        }
    }
}


impl ErrorCode {

    /// Extracts the rcode from the last four bits of the flags field.
    fn from_bits(bits: u16) -> Option<Self> {
        match bits {
            0 => None,
            1 => Some(Self::FormatError),
            2 => Some(Self::ServerFailure),
            3 => Some(Self::NXDomain),
            4 => Some(Self::NotImplemented),
            5 => Some(Self::QueryRefused),
            n => Some(Self::Other(n)),
        }
    }

    /// The four-bit number representing this rcode.
    pub fn to_bits(self) -> u16 {
        match self {
            Self::FormatError     => 1,
            Self::ServerFailure   => 2,
            Self::NXDomain        => 3,
            Self::NotImplemented  => 4,
            Self::QueryRefused    => 5,
            Self::Other(n)        => n,
        }
    }
}


/// The contract for a type-specific record codec: a name, an assigned type
/// number, and the four transcoding operations.
pub trait Wire: Sized {

    /// This record’s type as a string, such as `"A"` or `"CNAME"`.
    const NAME: &'static str;

    /// The number signifying that a record is of this type.
    /// See <https://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-4>
    const RR_TYPE: u16;

    /// Read at most `stated_length` bytes from the given `Cursor`. The
    /// cursor travels throughout the complete message, so compression
    /// pointers inside the rdata can be followed.
    fn read(stated_length: u16, c: &mut Cursor<&[u8]>) -> Result<Self, WireError>;

    /// Append this record’s rdata to the given buffer. Names inside rdata
    /// are written uncompressed.
    fn write(&self, buf: &mut Vec<u8>) -> Result<(), WireError>;

    /// This record’s rdata in presentation format, as it would appear in a
    /// master file.
    fn to_text(&self) -> String;

    /// Parses this record’s rdata from whitespace-split presentation-format
    /// tokens.
    fn from_text(tokens: &[&str]) -> Result<Self, WireError>;
}


/// Something that can go wrong transcoding a message.
#[derive(PartialEq, Debug, Clone)]
pub enum WireError {

    /// The buffer was too short for the structure it declared, or a
    /// structure was truncated mid-way. Almost all I/O errors reading from
    /// an in-memory cursor mean exactly this.
    InvalidPacket,

    /// A name contained a compression pointer that had already been
    /// followed while expanding that same name. Contains the offsets that
    /// had been followed up to that point.
    PointerCycle(Box<[u16]>),

    /// A name contained a pointer to an offset outside of the message.
    /// Contains the invalid offset.
    OutOfBounds(u16),

    /// A name length byte had one of the two reserved top-bit patterns
    /// (`01` or `10`). Contains the offending byte.
    BadLabelByte(u8),

    /// A label was longer than the 63 octets the length byte can express.
    /// Contains the actual length.
    LabelTooLong(usize),

    /// A name expanded to more than the 255 octets the protocol allows.
    /// Contains the running wire length at the point the bound was crossed.
    NameTooLong(usize),

    /// When the DNS standard requires records of this type to have a
    /// certain fixed length, but the message specified a different length.
    WrongRecordLength {

        /// The length of the record’s data, as specified in the message.
        stated_length: u16,

        /// The length that the DNS specification mandates.
        mandated_length: MandatedLength,
    },

    /// When the length of a record as specified in the message differs from
    /// the number of bytes actually consumed reading it. Records contain
    /// sentinel-terminated names as well as the length declared up front,
    /// and the two can disagree in a corrupt message.
    WrongLabelLength {

        /// The length of the record’s data, as specified in the message.
        stated_length: u16,

        /// The number of bytes the record actually occupied.
        length_after_labels: u16,
    },

    /// A question entry carried a type code outside the closed set of legal
    /// question types. Contains the code.
    UnsupportedType(u16),

    /// A question entry carried an unknown class code. Contains the code.
    UnsupportedClass(u16),

    /// A record’s presentation-format text could not be parsed. Contains a
    /// description of the problem.
    TextFormat(String),
}

/// The rule for how long a record in a message should be.
#[derive(PartialEq, Debug, Copy, Clone)]
pub enum MandatedLength {

    /// The record should be exactly this many bytes in length.
    Exactly(u16),

    /// The record should be _at least_ this many bytes in length.
    AtLeast(u16),
}

impl From<io::Error> for WireError {
    fn from(ioe: io::Error) -> Self {
        error!("IO error -> {:?}", ioe);
        Self::InvalidPacket
    }
}
