use serde::{Deserialize, Serialize};

pub const MAX_USERNAME_LEN: usize = 50;
pub const MAX_SCHOOL_LEN: usize = 100;

/// Public identity a client supplies once, at join time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub school: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityError {
    InvalidUsername,
    InvalidSchool,
}

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityError::InvalidUsername => write!(f, "Invalid username"),
            IdentityError::InvalidSchool => write!(f, "Invalid school"),
        }
    }
}

impl std::error::Error for IdentityError {}

impl Identity {
    /// Validates the raw join fields and returns the trimmed identity.
    /// Length bounds apply to the input as received, before trimming.
    pub fn parse(username: &str, school: &str) -> Result<Self, IdentityError> {
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(IdentityError::InvalidUsername);
        }
        if school.chars().count() > MAX_SCHOOL_LEN {
            return Err(IdentityError::InvalidSchool);
        }
        Ok(Self {
            username: username.trim().to_string(),
            school: school.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_fields_within_bounds() {
        let ident = Identity::parse("alice", "north high").unwrap();
        assert_eq!(ident.username, "alice");
        assert_eq!(ident.school, "north high");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        let ident = Identity::parse("  bob ", " south high  ").unwrap();
        assert_eq!(ident.username, "bob");
        assert_eq!(ident.school, "south high");
    }

    #[test]
    fn rejects_oversized_username() {
        let long = "x".repeat(MAX_USERNAME_LEN + 1);
        assert_eq!(
            Identity::parse(&long, "ok"),
            Err(IdentityError::InvalidUsername)
        );
        assert!(Identity::parse(&"x".repeat(MAX_USERNAME_LEN), "ok").is_ok());
    }

    #[test]
    fn rejects_oversized_school() {
        let long = "x".repeat(MAX_SCHOOL_LEN + 1);
        assert_eq!(Identity::parse("ok", &long), Err(IdentityError::InvalidSchool));
    }
}
