//! Session credentials for the authenticated user

use serde::{Deserialize, Serialize};

/// Identity and bearer token of the single active user
///
/// Created on login, cleared on logout or when the backend rejects the
/// token. The email and username are decoded from the token payload by
/// the client; the backend remains the authority on both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub email: String,
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_round_trip() {
        let creds = Credentials {
            token: "abc.def.ghi".to_string(),
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
        };
        let json = serde_json::to_string(&creds).unwrap();
        let back: Credentials = serde_json::from_str(&json).unwrap();
        assert_eq!(back, creds);
    }
}
