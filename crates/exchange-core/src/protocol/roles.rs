use serde::{Deserialize, Serialize};
use std::fmt;

/// Named participant of a protocol.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Customer,
    Store,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Store => "store",
        }
    }

    pub fn counterpart(&self) -> Role {
        match self {
            Role::Customer => Role::Store,
            Role::Store => Role::Customer,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The role a handler sends as and the role it expects messages from.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RolePair {
    pub local: Role,
    pub remote: Role,
}

impl RolePair {
    pub fn new(local: Role, remote: Role) -> Self {
        RolePair { local, remote }
    }

    /// `role` talking to its usual counterpart
    pub fn playing(role: Role) -> Self {
        Self::new(role, role.counterpart())
    }
}

impl fmt::Display for RolePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.local, self.remote)
    }
}
