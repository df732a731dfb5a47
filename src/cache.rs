//! The interface to a response cache, consumed but never implemented here.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use dns_wire::{Labels, Message, RecordType};


/// The key a response is cached under: a hash of the question’s lowercased
/// name and its type number, so that lookups are case-insensitive the way
/// name matching is.
#[derive(PartialEq, Eq, Hash, Debug, Copy, Clone)]
pub struct CacheKey(u64);

impl CacheKey {

    /// Computes the key for the given question name and type.
    pub fn for_question(qname: &Labels, qtype: RecordType) -> Self {
        let mut hasher = DefaultHasher::new();
        qname.lowercase().hash(&mut hasher);
        qtype.type_number().hash(&mut hasher);
        Self(hasher.finish())
    }
}


/// A store of previously-received responses, consulted before the network
/// and fed afterwards. TTL bookkeeping and eviction are the implementor’s
/// business; this crate only asks and tells.
pub trait ResponseCache {

    /// Whether a response is held under the given key.
    fn has(&self, key: CacheKey) -> bool;

    /// Returns the response held under the given key, if one is.
    fn get(&self, key: CacheKey) -> Option<Message>;

    /// Stores a response under the given key.
    fn put(&mut self, key: CacheKey, response: Message);
}
