use serde::{Deserialize, Serialize};

use crate::db::models::User;

/// JWT claims: the user id and the expiry (Unix seconds).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

/// The caller of an authenticated request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Hex ObjectId of the account.
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for AuthUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id_hex(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_user_uses_hex_id() {
        let user = User::new("dev@example.com", "Dev", "Eloper");
        let auth = AuthUser::from(&user);
        assert_eq!(auth.id.len(), 24);
        assert_eq!(auth.id, user.id.to_hex());
        assert_eq!(auth.first_name, "Dev");
    }

    #[test]
    fn serializes_public_fields_only() {
        let auth = AuthUser::from(&User::new("a@b.c", "A", "B"));
        let json = serde_json::to_value(&auth).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 4);
        assert_eq!(json["email"], "a@b.c");
    }
}
