//! The DNS data model: one `Message` type covers both requests and
//! responses. A request is simply a message with empty answer sections, and
//! a response is one with at least one record filled in somewhere.

use crate::record::{Record, RecordType, OPT};
use crate::strings::Labels;


/// A complete DNS message: the fixed header, the question section, and the
/// three resource record sections.
#[derive(PartialEq, Debug, Clone)]
pub struct Message {

    /// The fixed twelve-byte header.
    pub header: Header,

    /// The question section.
    pub questions: Vec<Question>,

    /// The answers section.
    pub answers: Vec<ResourceRecord>,

    /// The authoritative nameservers section.
    pub authorities: Vec<ResourceRecord>,

    /// The additional records section.
    pub additionals: Vec<ResourceRecord>,
}


/// The fixed-format header at the start of every DNS message.
///
/// The four counts are written to the wire exactly as stored here; keeping
/// them in sync with the lengths of the four sections is the caller’s
/// responsibility (see `Message::update_counts`).
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct Header {

    /// The transaction ID of this message, used to pair up requests with
    /// the responses that answer them.
    pub transaction_id: u16,

    /// The flags that accompany every DNS message.
    pub flags: Flags,

    /// The number of entries in the question section.
    pub qdcount: u16,

    /// The number of entries in the answers section.
    pub ancount: u16,

    /// The number of entries in the authorities section.
    pub nscount: u16,

    /// The number of entries in the additional section.
    pub arcount: u16,
}


/// A DNS question section entry.
#[derive(PartialEq, Debug, Clone)]
pub struct Question {

    /// The domain name being queried.
    pub qname: Labels,

    /// The type number.
    pub qtype: RecordType,

    /// The class number.
    pub qclass: QClass,
}


/// One entry of an answer, authority, or additional section: the common
/// envelope fields plus the type-specific record payload.
///
/// For the OPT pseudo-record the class and TTL fields are re-purposed by the
/// protocol, so the values stored here are derived from the `OPT` payload on
/// both the read and write sides.
#[derive(PartialEq, Debug, Clone)]
pub struct ResourceRecord {

    /// The domain name this record concerns.
    pub name: Labels,

    /// This record’s class — or, for an OPT record, the advertised maximum
    /// UDP payload size.
    pub qclass: QClass,

    /// The time-to-live duration, in seconds.
    pub ttl: u32,

    /// The record contained in this entry.
    pub record: Record,
}


/// A DNS record class. Of these, the only one that’s in regular use anymore
/// is the Internet class.
#[derive(PartialEq, Debug, Copy, Clone)]
pub enum QClass {

    /// The **Internet** class.
    IN,

    /// The **Chaosnet** class.
    CH,

    /// The **Hesiod** class.
    HS,

    /// A class number that does not map to any known class.
    Other(u16),
}


/// The flags that accompany every DNS message.
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct Flags {

    /// Whether this message is a response.
    pub response: bool,

    /// The operation being performed.
    pub opcode: Opcode,

    /// In a response, whether the server is providing authoritative DNS
    /// responses.
    pub authoritative: bool,

    /// In a response, whether this message has been truncated by the
    /// transport.
    pub truncated: bool,

    /// In a query, whether the server may query other nameservers
    /// recursively. It is up to the server whether it will actually do this.
    pub recursion_desired: bool,

    /// In a response, whether the server allows recursive query support.
    pub recursion_available: bool,

    /// In a response, whether the server is marking this data as authentic.
    pub authentic_data: bool,

    /// In a request, whether the server should disable its authenticity
    /// checking for the request’s queries.
    pub checking_disabled: bool,

    /// In a response, a code indicating an error if one occurred.
    pub error_code: Option<ErrorCode>,
}


/// A number representing the operation being performed.
#[derive(PartialEq, Debug, Copy, Clone)]
pub enum Opcode {

    /// A standard query.
    Query,

    /// An inverse query (long obsolete, but still assigned).
    IQuery,

    /// A server status request.
    Status,

    /// A zone change notification (RFC 1996).
    Notify,

    /// A dynamic update (RFC 2136).
    Update,

    /// Any other opcode. The field is four bits wide, so this can be from
    /// 0 to 15, though the named values above are produced instead where
    /// they apply.
    Other(u8),
}


/// A code indicating an error.
///
/// # References
///
/// - [RFC 6895 §2.3](https://tools.ietf.org/html/rfc6895#section-2.3) —
///   Domain Name System (DNS) IANA Considerations (April 2013)
#[derive(PartialEq, Debug, Copy, Clone)]
pub enum ErrorCode {

    /// `FormErr` — The server was unable to interpret the query.
    FormatError,

    /// `ServFail` — There was a problem with the server.
    ServerFailure,

    /// `NXDomain` — The domain name referenced in the query does not exist.
    NXDomain,

    /// `NotImp` — The server does not support one of the requested features.
    NotImplemented,

    /// `Refused` — The server was able to interpret the query, but refused
    /// to fulfil it.
    QueryRefused,

    /// An error code with no currently-defined meaning.
    Other(u16),
}


impl Message {

    /// Creates a standard query message for the given name, type, and class,
    /// with a random transaction ID and the recursion-desired flag set.
    pub fn query(qname: Labels, qtype: RecordType, qclass: QClass) -> Self {
        Self::with_question(Flags::query(), Question { qname, qtype, qclass })
    }

    /// Creates a NOTIFY message (RFC 1996) for the given zone: opcode
    /// `Notify`, the authoritative flag set, and a SOA question naming the
    /// zone that changed.
    pub fn notify(zone: Labels) -> Self {
        let mut flags = Flags::query();
        flags.opcode = Opcode::Notify;
        flags.authoritative = true;
        flags.recursion_desired = false;

        Self::with_question(flags, Question {
            qname: zone,
            qtype: RecordType::SOA,
            qclass: QClass::IN,
        })
    }

    /// Creates an empty dynamic update message (RFC 2136) for the given
    /// zone. The zone section of an update re-uses the question section of
    /// the wire format, with a SOA-type entry naming the zone; prerequisite
    /// and update records go into the answers and authorities sections.
    pub fn update(zone: Labels) -> Self {
        let mut flags = Flags::query();
        flags.opcode = Opcode::Update;
        flags.recursion_desired = false;

        Self::with_question(flags, Question {
            qname: zone,
            qtype: RecordType::SOA,
            qclass: QClass::IN,
        })
    }

    fn with_question(flags: Flags, question: Question) -> Self {
        Self {
            header: Header {
                transaction_id: rand::random(),
                flags,
                qdcount: 1,
                ancount: 0,
                nscount: 0,
                arcount: 0,
            },
            questions: vec![ question ],
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
        }
    }

    /// Sets the four header counts to the actual lengths of the four
    /// sections. `to_bytes` writes the counts exactly as stored, so this
    /// needs calling after any section has been modified by hand.
    pub fn update_counts(&mut self) {
        self.header.qdcount = self.questions.len() as u16;
        self.header.ancount = self.answers.len() as u16;
        self.header.nscount = self.authorities.len() as u16;
        self.header.arcount = self.additionals.len() as u16;
    }

    /// Prepares this message to be sent again: assigns a fresh random
    /// transaction ID and clears the three record sections, keeping the
    /// question. Used between sequential sends of one long-lived message.
    pub fn reset(&mut self) {
        self.header.transaction_id = rand::random();
        self.answers.clear();
        self.authorities.clear();
        self.additionals.clear();
        self.update_counts();
    }
}


impl ResourceRecord {

    /// Wraps an OPT payload in an envelope whose class and TTL fields hold
    /// the values that will actually be written to the wire.
    pub fn opt(opt: OPT) -> Self {
        Self {
            name: Labels::root(),
            qclass: QClass::Other(opt.udp_payload_size),
            ttl: opt.ttl_fields(),
            record: Record::OPT(opt),
        }
    }
}


impl Flags {

    /// The set of flags that represents a query message, with recursion
    /// desired.
    pub fn query() -> Self {
        Self::from_u16(0b_0000_0001_0000_0000)
    }

    /// The set of flags that represents a successful response.
    pub fn standard_response() -> Self {
        Self::from_u16(0b_1000_0001_1000_0000)
    }
}
