//! Header control flags.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Flags carried in every message header.
    ///
    /// `FINAL_PART` alone marks the only or last message of a logical
    /// response. `MULTI_PART` marks every earlier fragment. `NO_DATA` is a
    /// standalone answer to a request whose result set is empty and never
    /// travels with either part flag.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct MessageFlags: u8 {
        /// More fragments of this logical response follow.
        const MULTI_PART  = 0b0000_0001;
        /// Last (or only) message of a logical response.
        const FINAL_PART  = 0b0000_0010;
        /// The request produced an empty result set.
        const NO_DATA     = 0b0000_0100;
        /// Body is compressed.
        const COMPRESSED  = 0b0000_1000;
        /// Sender asks for an Acknowledge once the message is processed.
        const ACKNOWLEDGE = 0b0001_0000;

        const PART_MASK = Self::MULTI_PART.bits() | Self::FINAL_PART.bits();
    }
}

impl MessageFlags {
    /// Flags of fragment `index` in a response of `total` fragments.
    pub fn for_fragment(index: usize, total: usize) -> Self {
        if index + 1 < total {
            Self::MULTI_PART
        } else {
            Self::FINAL_PART
        }
    }
}

impl Default for MessageFlags {
    fn default() -> Self {
        Self::FINAL_PART
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_flags() {
        assert_eq!(MessageFlags::for_fragment(0, 1), MessageFlags::FINAL_PART);
        assert_eq!(MessageFlags::for_fragment(0, 3), MessageFlags::MULTI_PART);
        assert_eq!(MessageFlags::for_fragment(1, 3), MessageFlags::MULTI_PART);
        assert_eq!(MessageFlags::for_fragment(2, 3), MessageFlags::FINAL_PART);
    }

    #[test]
    fn no_data_is_disjoint_from_part_flags() {
        assert!(!MessageFlags::NO_DATA.intersects(MessageFlags::PART_MASK));
    }
}
