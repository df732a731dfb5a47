//! A DNS protocol toolkit: the RFC 1035 wire codec, blocking transports,
//! and a retrying resolver that drives them.

#![warn(deprecated_in_future)]
#![warn(future_incompatible)]
#![warn(missing_copy_implementations)]
#![warn(missing_docs)]
#![warn(nonstandard_style)]
#![warn(rust_2018_compatibility)]
#![warn(rust_2018_idioms)]
#![warn(single_use_lifetimes)]
#![warn(trivial_casts, trivial_numeric_casts)]
#![warn(unused)]

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::enum_glob_use)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::wildcard_imports)]

#![deny(unsafe_code)]


pub use dns_transport as transport;
pub use dns_wire as wire;

mod cache;
pub use self::cache::{CacheKey, ResponseCache};

mod resolver;
pub use self::resolver::{Nameserver, ResolveError, Resolver, ServerFailure};

mod sign;
pub use self::sign::Signer;

mod txid;
pub use self::txid::TxidGenerator;
