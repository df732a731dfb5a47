use dns_wire::{Message, Labels, QClass, ResourceRecord};
use dns_wire::record::{RecordType, OPT};

use pretty_assertions::assert_eq;


#[test]
fn build_query() {
    let mut message = Message::query(Labels::encode("rfcs.io").unwrap(),
                                     RecordType::from(0x1234),
                                     QClass::Other(0x42));
    message.header.transaction_id = 0xceac;
    message.additionals.push(ResourceRecord::opt(OPT::request(512, false)));
    message.update_counts();

    let result = vec![
        0xce, 0xac,  // transaction ID
        0x01, 0x00,  // flags (standard query)
        0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,  // counts (1, 0, 0, 1)

        // question:
        0x04, 0x72, 0x66, 0x63, 0x73, 0x02, 0x69, 0x6f, 0x00,  // qname
        0x12, 0x34,  // type
        0x00, 0x42,  // class

        // OPT record:
        0x00,  // name
        0x00, 0x29,  // type OPT
        0x02, 0x00,  // UDP payload size
        0x00,  // higher bits
        0x00,  // EDNS(0) version
        0x00, 0x00,  // more flags
        0x00, 0x00,  // no data
    ];

    assert_eq!(message.to_bytes().unwrap(), result);
}


#[test]
fn query_flags_byte() {
    let mut message = Message::query(Labels::encode("example.com").unwrap(),
                                     RecordType::A,
                                     QClass::IN);
    message.header.transaction_id = 0x0001;

    let bytes = message.to_bytes().unwrap();

    assert_eq!(&bytes[0 .. 2], &[ 0x00, 0x01 ]);  // the chosen ID survives
    assert_eq!(bytes[2], 0x01);                   // QR clear, RD set
    assert_eq!(bytes[3], 0x00);
    assert_eq!(&bytes[4 .. 6], &[ 0x00, 0x01 ]);  // one question
}


#[test]
fn repeated_name_compresses_to_a_pointer() {
    let mut message = Message::query(Labels::encode("dns.lookup.dog").unwrap(),
                                     RecordType::CNAME,
                                     QClass::IN);
    message.answers.push(ResourceRecord {
        name: Labels::encode("dns.lookup.dog").unwrap(),
        qclass: QClass::IN,
        ttl: 300,
        record: dns_wire::Record::CNAME(dns_wire::record::CNAME {
            domain: Labels::encode("elsewhere.dog").unwrap(),
        }),
    });
    message.update_counts();

    let bytes = message.to_bytes().unwrap();

    // The answer name starts right after the question ends, and it points
    // back at offset 12 where the qname was first written.
    let answer_start = 12 + 16 + 4;
    assert_eq!(&bytes[answer_start .. answer_start + 2], &[ 0xC0, 0x0C ]);
}


#[test]
fn built_messages_reparse() {
    let mut message = Message::query(Labels::encode("dns.lookup.dog").unwrap(),
                                     RecordType::MX,
                                     QClass::IN);
    message.header.transaction_id = 0x1234;
    message.answers.push(ResourceRecord {
        name: Labels::encode("dns.lookup.dog").unwrap(),
        qclass: QClass::IN,
        ttl: 3600,
        record: dns_wire::Record::MX(dns_wire::record::MX {
            preference: 10,
            exchange: Labels::encode("mail.lookup.dog").unwrap(),
        }),
    });
    message.additionals.push(ResourceRecord::opt(OPT::request(4096, true)));
    message.update_counts();

    let bytes = message.to_bytes().unwrap();
    let reparsed = Message::from_bytes(&bytes).unwrap();

    assert_eq!(reparsed, message);
}
