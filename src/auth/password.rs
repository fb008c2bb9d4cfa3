use crate::error::AppError;

/// bcrypt-based password hashing with a configured work factor.
///
/// Registered once as application data; handlers only ever see `hash` and `verify`.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        if password.is_empty() {
            return Err(AppError::BadRequest("Password cannot be empty".into()));
        }
        bcrypt::hash(password, self.cost)
            .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
    }

    /// A malformed stored hash counts as a mismatch, so login failures look the same
    /// regardless of what is in the database.
    pub fn verify(&self, password: &str, hashed_password: &str) -> bool {
        match bcrypt::verify(password, hashed_password) {
            Ok(matches) => matches,
            Err(e) => {
                log::warn!("stored password hash could not be checked: {}", e);
                false
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
