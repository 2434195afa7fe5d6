/// Maximum encoded message size (16MB)
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Correlation id of a message that answers nothing
pub const NO_CORRELATION: u64 = 0;

/// Protocol family ids
pub mod protocols {
    pub const CORE: u16 = 0;
    pub const DISCOVERY: u16 = 3;
    pub const STORE: u16 = 4;

    pub fn name(protocol: u16) -> &'static str {
        match protocol {
            CORE => "core",
            DISCOVERY => "discovery",
            STORE => "store",
            _ => "unknown",
        }
    }
}

/// Message types every protocol understands
pub mod core_messages {
    crate::define_message_types!((PROTOCOL_EXCEPTION, 1000), (ACKNOWLEDGE, 1001));
}

pub mod discovery_messages {
    crate::define_message_types!((GET_RESOURCES, 1), (GET_RESOURCES_RESPONSE, 2));
}

pub mod store_messages {
    crate::define_message_types!(
        (GET_OBJECT, 1),
        (PUT_OBJECT, 2),
        (DELETE_OBJECT, 3),
        (OBJECT, 4),
    );
}

/// Name of a message type within a protocol, for logging
pub fn message_name(protocol: u16, message_type: u16) -> &'static str {
    let specific = match protocol {
        protocols::DISCOVERY => discovery_messages::name(message_type),
        protocols::STORE => store_messages::name(message_type),
        _ => None,
    };

    specific
        .or_else(|| core_messages::name(message_type))
        .unwrap_or("UNKNOWN")
}
