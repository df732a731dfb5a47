#![warn(deprecated_in_future)]
#![warn(future_incompatible)]
#![warn(missing_copy_implementations)]
#![warn(nonstandard_style)]
#![warn(rust_2018_compatibility)]
#![warn(rust_2018_idioms)]
#![warn(single_use_lifetimes)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unused)]

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::wildcard_imports)]

#![deny(unsafe_code)]


//! The `dns-wire` crate implements the DNS wire protocol: creating and
//! decoding complete messages from their byte structure, including domain
//! name compression, per the RFC 1035 layout and its extensions.


mod types;
pub use self::types::*;

mod strings;
pub use self::strings::{Labels, NameEncoding, NameWriter};

mod wire;
pub use self::wire::{Wire, WireError, MandatedLength, HEADER_SIZE};

pub mod record;
pub use self::record::{Record, RecordType, OPT, EdnsOption};
