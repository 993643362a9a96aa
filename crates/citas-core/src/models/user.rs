use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The user record returned by the auth endpoints and persisted as-is.
///
/// The backend's payload is kept whole; only the fields the client itself
/// reads get accessors.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserRecord(pub Map<String, Value>);

impl UserRecord {
    pub fn token(&self) -> Option<&str> {
        self.0.get("token").and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.0.get("nombre").and_then(Value::as_str)
    }

    pub fn email(&self) -> Option<&str> {
        self.0.get("email").and_then(Value::as_str)
    }

    pub fn phone(&self) -> Option<&str> {
        self.0.get("telefono").and_then(Value::as_str)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.0.get("usuarioId").and_then(Value::as_i64)
    }

    pub fn roles(&self) -> Vec<&str> {
        self.0
            .get("roles")
            .and_then(Value::as_array)
            .map(|roles| roles.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Registration payload for `/auth/registro`.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub nombre: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
}
