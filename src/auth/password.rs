use bcrypt::{hash, verify, DEFAULT_COST};

use crate::models::UserError;

/// One-way password hashing used by the user aggregate.
pub trait PasswordEncoder: Send + Sync {
    fn encode(&self, raw: &str) -> Result<String, UserError>;

    fn matches(&self, raw: &str, encoded: &str) -> Result<bool, UserError>;
}

#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordEncoder {
    cost: u32,
}

impl BcryptPasswordEncoder {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for BcryptPasswordEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl PasswordEncoder for BcryptPasswordEncoder {
    fn encode(&self, raw: &str) -> Result<String, UserError> {
        hash(raw, self.cost)
            .map_err(|e| UserError::PasswordEncoding(format!("Failed to hash password: {}", e)))
    }

    fn matches(&self, raw: &str, encoded: &str) -> Result<bool, UserError> {
        verify(raw, encoded)
            .map_err(|e| UserError::PasswordEncoding(format!("Failed to verify password: {}", e)))
    }
}
