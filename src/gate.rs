// src/gate.rs - Plaintext password gate for the admin screen

/// Static string comparison, nothing more. This is a placeholder so the
/// log screen is not linked from the public form; it is NOT a security
/// boundary. A real deployment should put a genuine credential/session
/// mechanism in front of the admin routes instead.
pub struct AccessGate {
    password: String,
}

impl AccessGate {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    /// Grants access for the current request only; nothing is remembered
    /// between renders, so the password rides along on every admin URL.
    pub fn permits(&self, supplied: &str) -> bool {
        !self.password.is_empty() && supplied == self.password
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_only() {
        let gate = AccessGate::new("admin123");
        assert!(gate.permits("admin123"));
        assert!(!gate.permits("admin12"));
        assert!(!gate.permits("ADMIN123"));
        assert!(!gate.permits(""));
    }

    #[test]
    fn test_empty_password_never_permits() {
        let gate = AccessGate::new("");
        assert!(!gate.permits(""));
        assert!(!gate.permits("anything"));
    }
}
