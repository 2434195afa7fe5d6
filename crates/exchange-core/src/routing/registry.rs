use crate::error::{ExchangeError, ExchangeResult};
use crate::routing::handler::ErasedRoutine;
use std::collections::HashMap;
use std::sync::Arc;

/// Routines of one protocol, keyed by message type
#[derive(Clone)]
pub struct DispatchTable {
    protocol: u16,
    routines: HashMap<u16, Arc<dyn ErasedRoutine>>,
}

impl DispatchTable {
    pub fn new(protocol: u16) -> Self {
        Self {
            protocol,
            routines: HashMap::new(),
        }
    }

    pub fn protocol(&self) -> u16 {
        self.protocol
    }

    /// Register a routine for a message type. A message type maps to
    /// exactly one routine, so registering it twice is an error.
    pub fn register<R: ErasedRoutine>(&mut self, message_type: u16, routine: R) -> ExchangeResult<()> {
        if self.routines.contains_key(&message_type) {
            return Err(ExchangeError::duplicate_registration(
                self.protocol,
                message_type,
            ));
        }
        self.routines.insert(message_type, Arc::new(routine));
        Ok(())
    }

    /// Get the routine for a message type
    pub fn get(&self, message_type: u16) -> Option<Arc<dyn ErasedRoutine>> {
        self.routines.get(&message_type).cloned()
    }

    /// Registered message types, ascending
    pub fn registered_types(&self) -> Vec<u16> {
        let mut types: Vec<u16> = self.routines.keys().copied().collect();
        types.sort_unstable();
        types
    }

    pub fn has_message_type(&self, message_type: u16) -> bool {
        self.routines.contains_key(&message_type)
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}

impl std::fmt::Debug for DispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchTable")
            .field("protocol", &self.protocol)
            .field("message_types", &self.registered_types())
            .finish()
    }
}

/// Builder for a dispatch table; the first duplicate fails `build`
pub struct DispatchTableBuilder {
    table: DispatchTable,
    error: Option<ExchangeError>,
}

impl DispatchTableBuilder {
    pub fn new(protocol: u16) -> Self {
        Self {
            table: DispatchTable::new(protocol),
            error: None,
        }
    }

    /// Register a routine with builder pattern
    pub fn with_routine<R: ErasedRoutine>(mut self, message_type: u16, routine: R) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.table.register(message_type, routine) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Build the final table
    pub fn build(self) -> ExchangeResult<DispatchTable> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.table),
        }
    }
}

/// Macro to make registration easier
#[macro_export]
macro_rules! register_routines {
    ($table:expr, { $($message_type:expr => $routine:expr),* $(,)? }) => {
        (|| -> $crate::error::ExchangeResult<()> {
            $(
                $table.register($message_type, $routine)?;
            )*
            Ok(())
        })()
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::routing::handler::{FnRoutine, RoutineWrapper};
    use crate::routing::HandlerResult;
    use crate::protocol::MessageHeader;

    fn noop(name: &'static str) -> RoutineWrapper<impl crate::routing::MessageRoutine> {
        RoutineWrapper::new(FnRoutine::new(name, |_header: MessageHeader, _body: ()| async {
            HandlerResult::<()>::Ok(())
        }))
    }

    #[test]
    fn duplicate_registration_fails_the_build() {
        let err = DispatchTableBuilder::new(3)
            .with_routine(1, noop("one"))
            .with_routine(1, noop("again"))
            .build()
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::DuplicateRegistration);
    }

    #[test]
    fn registered_types_are_sorted() {
        let mut table = DispatchTable::new(4);
        register_routines!(table, { 3 => noop("three"), 1 => noop("one") }).unwrap();

        assert_eq!(table.registered_types(), vec![1, 3]);
        assert!(table.has_message_type(3));
        assert_eq!(table.get(1).unwrap().message_name(), "one");
        assert!(table.get(2).is_none());
    }
}
