//! Transaction ID generation.


/// A **transaction ID generator** is used to create unique ID numbers to
/// identify each packet, as part of the DNS protocol.
#[derive(PartialEq, Debug, Copy, Clone)]
pub enum TxidGenerator {

    /// Generate random transaction IDs each time.
    Random,

    /// Generate transaction IDs in a sequence, wrapping around, with the
    /// next value held inline. This makes test failures reproducible.
    Sequence(u16),
}

impl TxidGenerator {

    /// Produces the next transaction ID.
    pub fn generate(&mut self) -> u16 {
        match self {
            Self::Random => {
                rand::random()
            }
            Self::Sequence(next) => {
                let id = *next;
                *next = next.wrapping_add(1);
                id
            }
        }
    }
}
