#[macro_export]
macro_rules! define_message_types {
    ($(($name:ident, $id:literal)),* $(,)?) => {
        $(pub const $name: u16 = $id;)*

        /// Whether `message_type` belongs to this protocol
        pub fn is_valid(message_type: u16) -> bool {
            matches!(message_type, $($id)|*)
        }

        pub fn all() -> &'static [u16] {
            &[$($id),*]
        }

        /// Constant name of a message type, for logging
        pub fn name(message_type: u16) -> Option<&'static str> {
            match message_type {
                $($id => Some(stringify!($name)),)*
                _ => None,
            }
        }
    };
}
