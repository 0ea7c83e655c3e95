use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Manager,
    Staff,
    Shipper,
    Customer,
}

impl Role {
    /// Back-office roles allowed to run staff workflow steps.
    pub fn is_back_office(self) -> bool {
        matches!(self, Role::Admin | Role::Manager | Role::Staff)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Admin => "Admin",
            Role::Manager => "Manager",
            Role::Staff => "Staff",
            Role::Shipper => "Shipper",
            Role::Customer => "Customer",
        };
        f.write_str(name)
    }
}

/// Account-level chat ban applied after repeated spam.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatBlock {
    pub reason: String,
    pub blocked_at: DateTime<Utc>,
}

/// Represents a registered user in the system.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub loyalty_points: u64,
    pub chat_block: Option<ChatBlock>,
}

/// Payload for creating a new user.
#[derive(Debug, Clone)]
pub struct UserCreate {
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Payload for updating an existing user.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl User {
    pub fn is_chat_blocked(&self) -> bool {
        self.chat_block.is_some()
    }
}

/// Identity and role of whoever invokes a workflow operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self { user_id: user_id.into(), role }
    }
}
