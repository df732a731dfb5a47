//! The interface to a message signer, consumed but never implemented here.

use dns_wire::{Message, ResourceRecord};


/// Something that can authenticate an outgoing message, such as a TSIG or
/// SIG(0) implementation. The resolver hands over the assembled message and
/// appends whatever record comes back to the additional section before
/// serializing, as authentication records must cover (and therefore come
/// after) everything else in the message.
pub trait Signer {

    /// Produces the authentication record for the given message.
    ///
    /// # Errors
    ///
    /// Returns a description of the failure if the message cannot be
    /// signed, which aborts the send before anything touches the network.
    fn sign(&self, message: &Message) -> Result<ResourceRecord, String>;
}
