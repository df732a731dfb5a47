//! Reading and writing domain names in the DNS wire protocol, including
//! RFC 1035 §4.1.4 back-reference compression.

use std::collections::HashMap;
use std::fmt;
use std::io::Write;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use log::*;

use crate::wire::*;


/// The longest a single label is allowed to be, as the top two bits of the
/// length byte are reserved for compression pointers.
const MAX_LABEL_LENGTH: usize = 63;

/// The longest a full expanded name is allowed to be on the wire, counting
/// every length byte and the final terminator.
const MAX_NAME_LENGTH: usize = 255;

/// Compression pointers are 14 bits wide, so a name written at this offset
/// or later can never be pointed at.
const MAX_POINTER_TARGET: usize = 0x4000;


/// A domain name, as a validated sequence of labels.
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct Labels {
    segments: Vec<String>,
}

impl Labels {

    /// The root name, which encodes as a single zero byte.
    pub fn root() -> Self {
        Self { segments: Vec::new() }
    }

    /// Splits a dotted name into its labels, validating each one against the
    /// 63-octet label bound and the whole name against the 255-octet wire
    /// bound. A trailing dot is accepted and ignored; an empty label
    /// anywhere else is rejected, as a zero-length label is the wire
    /// terminator and cannot appear inside a name.
    pub fn encode(input: &str) -> Result<Self, WireError> {
        let trimmed = input.strip_suffix('.').unwrap_or(input);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        let mut wire_length = 1;  // the terminating zero byte

        for label in trimmed.split('.') {
            if label.is_empty() {
                return Err(WireError::TextFormat(format!("Empty label in name {:?}", input)));
            }

            if label.len() > MAX_LABEL_LENGTH {
                return Err(WireError::LabelTooLong(label.len()));
            }

            wire_length += label.len() + 1;
            if wire_length > MAX_NAME_LENGTH {
                return Err(WireError::NameTooLong(wire_length));
            }

            segments.push(String::from(label));
        }

        Ok(Self { segments })
    }

    pub(crate) fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// The individual labels of this name, in most-specific-first order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The number of labels in this name. The root name has zero.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether this is the root name.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a copy of this name with the other name’s labels appended.
    pub fn extend(&self, suffix: &Self) -> Self {
        let mut segments = self.segments.clone();
        segments.extend_from_slice(&suffix.segments);
        Self { segments }
    }

    /// Returns the ASCII-lowercased version of this name, which is the form
    /// used for canonical encoding and for case-insensitive comparison.
    pub fn lowercase(&self) -> Self {
        let segments = self.segments.iter()
                           .map(|s| s.to_ascii_lowercase())
                           .collect();
        Self { segments }
    }
}

impl fmt::Display for Labels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{}.", segment)?;
        }

        if self.segments.is_empty() {
            write!(f, ".")?;
        }

        Ok(())
    }
}


/// Which of the three name encodings to use when writing a name.
#[derive(PartialEq, Debug, Copy, Clone)]
pub enum NameEncoding {

    /// Full labels, ASCII-lowercased, never compressed and never entered
    /// into the compression table. This is the RFC 4034 canonical form, used
    /// where a signature covers the bytes being written.
    Canonical,

    /// RFC 1035 compression: re-use a previously-written suffix via a
    /// two-byte pointer where one is available, and register the suffixes of
    /// this name for later messages in the same encode pass.
    Compressed,

    /// Full labels in their original case, with the compression table
    /// neither consulted nor populated.
    Uncompressed,
}


/// The compression state for a single message encode pass: a map from each
/// name suffix already written to the offset at which it was written.
///
/// Suffixes are keyed by their label sequence rather than a re-joined
/// string, as labels parsed off the wire can contain literal dots.
///
/// One of these is constructed fresh inside every `Message::to_bytes` call,
/// so state can never leak from one message into the next.
#[derive(Debug, Default)]
pub struct NameWriter {
    table: HashMap<Vec<String>, u16>,
}

impl NameWriter {

    /// Creates a writer with an empty compression table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the given name to the buffer using the given encoding,
    /// updating the compression table when the encoding calls for it.
    pub fn write_name(&mut self, buf: &mut Vec<u8>, name: &Labels, encoding: NameEncoding) -> Result<(), WireError> {
        match encoding {
            NameEncoding::Canonical => {
                write_uncompressed(buf, &name.lowercase())
            }
            NameEncoding::Uncompressed => {
                write_uncompressed(buf, name)
            }
            NameEncoding::Compressed => {
                self.write_compressed(buf, name)
            }
        }
    }

    fn write_compressed(&mut self, buf: &mut Vec<u8>, name: &Labels) -> Result<(), WireError> {
        for (index, label) in name.segments.iter().enumerate() {
            let suffix = &name.segments[index ..];

            if let Some(&offset) = self.table.get(suffix) {
                trace!("Compressing suffix {:?} -> offset {}", suffix, offset);
                buf.write_u16::<BigEndian>(0xC000 | offset)?;
                return Ok(());
            }

            let offset = buf.len();
            if offset < MAX_POINTER_TARGET {
                self.table.insert(suffix.to_vec(), offset as u16);
            }

            write_label(buf, label)?;
        }

        buf.write_u8(0)?;
        Ok(())
    }
}


fn write_uncompressed(buf: &mut Vec<u8>, name: &Labels) -> Result<(), WireError> {
    for label in &name.segments {
        write_label(buf, label)?;
    }

    buf.write_u8(0)?;
    Ok(())
}

fn write_label(buf: &mut Vec<u8>, label: &str) -> Result<(), WireError> {
    if label.len() > MAX_LABEL_LENGTH {
        return Err(WireError::LabelTooLong(label.len()));
    }

    buf.write_u8(label.len() as u8)?;
    buf.write_all(label.as_bytes())?;
    Ok(())
}


/// An extension for byte buffers that enables writing plain uncompressed
/// domain names, used for the names inside rdata.
///
/// The name being written is encoded with one byte slice per label,
/// preceded by each label’s length, with the whole thing ending with a
/// label of zero length. So “dns.lookup.dog” is encoded as
/// “3, dns, 6, lookup, 3, dog, 0”.
pub(crate) trait WriteLabels {

    /// Write a domain name, uncompressed.
    fn write_labels(&mut self, name: &Labels) -> Result<(), WireError>;
}

impl WriteLabels for Vec<u8> {
    fn write_labels(&mut self, name: &Labels) -> Result<(), WireError> {
        write_uncompressed(self, name)
    }
}


/// An extension for `Cursor` that enables reading compressed domain names
/// from DNS messages.
pub(crate) trait ReadLabels {

    /// Read and expand a compressed domain name, returning it along with the
    /// number of bytes consumed at the cursor’s own position (a pointer
    /// counts as its own two bytes, not the bytes behind it).
    fn read_labels(&mut self) -> Result<(Labels, u16), WireError>;
}

impl ReadLabels for Cursor<&[u8]> {
    fn read_labels(&mut self) -> Result<(Labels, u16), WireError> {
        let mut segments = Vec::new();
        let mut wire_length = 1;
        let start = self.position();

        read_segments(&mut segments, &mut wire_length, self, &mut Vec::new())?;

        let consumed = (self.position() - start) as u16;
        Ok((Labels::from_segments(segments), consumed))
    }
}

fn read_segments(segments: &mut Vec<String>, wire_length: &mut usize, c: &mut Cursor<&[u8]>, followed: &mut Vec<u16>) -> Result<(), WireError> {
    loop {
        let byte = c.read_u8()?;

        if byte == 0 {
            break;
        }

        else if byte >= 0b_1100_0000 {
            let offset = u16::from_be_bytes([ byte & 0b_0011_1111, c.read_u8()? ]);

            if followed.contains(&offset) {
                warn!("Pointer cycle at offset {}", offset);
                return Err(WireError::PointerCycle(followed.clone().into_boxed_slice()));
            }

            if u64::from(offset) >= c.get_ref().len() as u64 {
                return Err(WireError::OutOfBounds(offset));
            }

            trace!("Following pointer to offset {}", offset);
            followed.push(offset);

            let here = c.position();
            c.set_position(u64::from(offset));
            read_segments(segments, wire_length, c, followed)?;
            c.set_position(here);

            // A name ends at its first pointer; the rest of it was read
            // at the pointed-to offset.
            break;
        }

        else if byte >= 0b_0100_0000 {
            // The 01 and 10 bit patterns are reserved.
            return Err(WireError::BadLabelByte(byte));
        }

        else {
            *wire_length += usize::from(byte) + 1;
            if *wire_length > MAX_NAME_LENGTH {
                return Err(WireError::NameTooLong(*wire_length));
            }

            let mut label_buf = vec![ 0_u8; usize::from(byte) ];
            c.read_exact(&mut label_buf)?;
            segments.push(String::from_utf8_lossy(&label_buf).to_string());
        }
    }

    Ok(())
}
