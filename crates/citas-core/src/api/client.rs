//! API client for the booking backend.
//!
//! `ApiClient` owns the session, so one client corresponds to one page.
//! Every call goes through [`ApiClient::request`]. Listings use the
//! tolerant path (failures become an empty list). Auth and booking use the
//! strict path (failures reach the caller unchanged).

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::auth::{Session, Storage};
use crate::models::{Appointment, Professional, Service, UserRecord};
use crate::page::Navigator;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL of the booking backend
pub const API_URL: &str = "http://localhost:8088/api";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where logout sends the page
const HOME_PATH: &str = "/";

/// Options for a single call through [`ApiClient::request`].
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    /// Merged over the default headers; a caller value wins for its name
    pub headers: Option<header::HeaderMap>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: None,
        }
    }
}

impl RequestOptions {
    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            headers: None,
        }
    }

    pub fn with_headers(mut self, headers: header::HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Session,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    /// Create a client, restoring any token already in `storage`
    pub fn new(storage: Box<dyn Storage>, navigator: Arc<dyn Navigator>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let mut session = Session::new(storage);
        if session.load().map_err(ApiError::storage)? {
            debug!("Restored stored session token");
        }

        Ok(Self {
            client,
            base_url: API_URL.to_string(),
            session,
            navigator,
        })
    }

    /// Point the client at another backend origin
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn default_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(token) = self.session.token() {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    /// Send one request and return the parsed JSON body.
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let text = self.send(endpoint, options).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Send one request, failing on a non-2xx status. The body is left unread.
    async fn send(&self, endpoint: &str, options: RequestOptions) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut headers = self.default_headers()?;
        if let Some(extra) = options.headers {
            headers.extend(extra);
        }

        debug!(method = %options.method, url = %url, "Sending request");
        let mut builder = self.client.request(options.method, &url).headers(headers);
        if let Some(body) = options.body {
            builder = builder.body(serde_json::to_vec(&body)?);
        }

        Self::check_response(builder.send().await?).await
    }

    /// Strict fetch: failures are logged and handed back to the caller.
    async fn strict_fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
        context: &str,
    ) -> Result<T, ApiError> {
        let result = match self.request(endpoint, options).await {
            Ok(value) => serde_json::from_value(value).map_err(ApiError::from),
            Err(e) => Err(e),
        };
        if let Err(ref e) = result {
            error!(endpoint, error = %e, "{}", context);
        }
        result
    }

    /// Tolerant fetch: failures are logged and replaced by an empty list.
    async fn tolerant_fetch<T: DeserializeOwned>(&self, endpoint: &str, context: &str) -> Vec<T> {
        match self.strict_fetch(endpoint, RequestOptions::default(), context).await {
            Ok(items) => items,
            Err(_) => Vec::new(),
        }
    }

    // ===== Authentication =====

    /// Log in and persist the returned session
    pub async fn login(&mut self, email: &str, password: &str) -> Result<UserRecord, ApiError> {
        let body = json!({ "email": email, "password": password });
        self.authenticate("/auth/login", body, "Error en login").await
    }

    /// Register a new account and persist the returned session
    pub async fn register<B: Serialize>(&mut self, data: &B) -> Result<UserRecord, ApiError> {
        let body = match serde_json::to_value(data) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Error en registro");
                return Err(e.into());
            }
        };
        self.authenticate("/auth/registro", body, "Error en registro").await
    }

    async fn authenticate(
        &mut self,
        endpoint: &str,
        body: Value,
        context: &str,
    ) -> Result<UserRecord, ApiError> {
        let result = self.open_session(endpoint, body).await;
        if let Err(ref e) = result {
            error!(endpoint, error = %e, "{}", context);
        }
        result
    }

    async fn open_session(&mut self, endpoint: &str, body: Value) -> Result<UserRecord, ApiError> {
        let user: UserRecord = serde_json::from_value(
            self.request(endpoint, RequestOptions::post(body)).await?,
        )?;
        let token = user
            .token()
            .ok_or_else(|| ApiError::InvalidResponse("auth response has no token".to_string()))?
            .to_string();

        self.session.save(&token, &user).map_err(ApiError::storage)?;
        debug!(user = ?user.name(), "Session opened");
        Ok(user)
    }

    /// Drop the session and send the page home
    pub fn logout(&mut self) {
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
        self.navigator.navigate(HOME_PATH);
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_valid()
    }

    /// The stored user record. The token is not re-validated.
    pub fn current_user(&self) -> Result<Option<UserRecord>, ApiError> {
        self.session.current_user().map_err(ApiError::storage)
    }

    // ===== Listings =====

    pub async fn list_services(&self) -> Vec<Service> {
        self.tolerant_fetch("/servicios/activos", "Error cargando servicios").await
    }

    pub async fn list_professionals(&self) -> Vec<Professional> {
        self.tolerant_fetch("/profesionales/activos", "Error cargando profesionales")
            .await
    }

    pub async fn services_by_professional(&self, professional_id: i64) -> Vec<Service> {
        let endpoint = format!("/servicios/profesional/{}", professional_id);
        self.tolerant_fetch(&endpoint, "Error cargando servicios del profesional")
            .await
    }

    pub async fn upcoming_appointments(&self, user_id: i64) -> Vec<Appointment> {
        let endpoint = format!("/citas/usuario/{}/proximas", user_id);
        self.tolerant_fetch(&endpoint, "Error cargando próximas citas").await
    }

    pub async fn appointment_history(&self, user_id: i64) -> Vec<Appointment> {
        let endpoint = format!("/citas/usuario/{}/historial", user_id);
        self.tolerant_fetch(&endpoint, "Error cargando historial de citas")
            .await
    }

    // ===== Booking =====

    pub async fn create_appointment<B: Serialize>(&self, data: &B) -> Result<Appointment, ApiError> {
        let body = match serde_json::to_value(data) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Error creando cita");
                return Err(e.into());
            }
        };
        self.strict_fetch("/citas", RequestOptions::post(body), "Error creando cita")
            .await
    }

    /// Cancel a booked appointment. The backend answers with an empty body.
    pub async fn cancel_appointment(&self, appointment_id: i64) -> Result<(), ApiError> {
        let endpoint = format!("/citas/{}/cancelar", appointment_id);
        let options = RequestOptions {
            method: Method::PUT,
            ..RequestOptions::default()
        };
        match self.send(&endpoint, options).await {
            Ok(_) => Ok(()),
            Err(e) => {
                error!(endpoint = %endpoint, error = %e, "Error cancelando cita");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use axum::extract::State;
    use axum::http::{HeaderMap, Method as HttpMethod, StatusCode, Uri};
    use axum::Router;

    use super::*;
    use crate::auth::{MemoryStorage, TOKEN_KEY, USER_KEY};
    use crate::page::Page;

    #[derive(Debug, Clone)]
    struct Recorded {
        method: String,
        path: String,
        headers: HeaderMap,
        body: String,
    }

    #[derive(Clone, Default)]
    struct Stub {
        routes: Arc<HashMap<String, (u16, String)>>,
        requests: Arc<Mutex<Vec<Recorded>>>,
    }

    impl Stub {
        fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn handle(
        State(stub): State<Stub>,
        method: HttpMethod,
        uri: Uri,
        headers: HeaderMap,
        body: String,
    ) -> (StatusCode, String) {
        let path = uri.path().to_string();
        stub.requests.lock().unwrap().push(Recorded {
            method: method.to_string(),
            path: path.clone(),
            headers,
            body,
        });
        match stub.routes.get(&path) {
            Some((status, body)) => (StatusCode::from_u16(*status).unwrap(), body.clone()),
            None => (
                StatusCode::NOT_FOUND,
                r#"{"message":"Recurso no encontrado"}"#.to_string(),
            ),
        }
    }

    /// Serve canned responses under `/api` on an ephemeral port
    async fn spawn_stub(routes: &[(&str, u16, &str)]) -> (String, Stub) {
        let stub = Stub {
            routes: Arc::new(
                routes
                    .iter()
                    .map(|(path, status, body)| (format!("/api{}", path), (*status, body.to_string())))
                    .collect(),
            ),
            requests: Arc::default(),
        };
        let app = Router::new().fallback(handle).with_state(stub.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/api", addr), stub)
    }

    fn client_with(storage: Arc<MemoryStorage>, page: Arc<Page>, base_url: &str) -> ApiClient {
        ApiClient::new(Box::new(storage), page)
            .unwrap()
            .with_base_url(base_url)
    }

    const AUTH_BODY: &str = r#"{"token":"jwt-123","tipo":"Bearer","usuarioId":7,"nombre":"Ana Ruiz","email":"ana@example.com","roles":["ROLE_CLIENTE"]}"#;

    #[tokio::test]
    async fn test_login_persists_token_and_user() {
        let (base, stub) = spawn_stub(&[("/auth/login", 200, AUTH_BODY)]).await;
        let storage = Arc::new(MemoryStorage::new());
        let mut client = client_with(storage.clone(), Arc::new(Page::default()), &base);

        let user = client.login("ana@example.com", "Secreta#1").await.unwrap();

        assert_eq!(user.token(), Some("jwt-123"));
        assert!(client.is_authenticated());
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some("jwt-123"));
        let stored: Value = serde_json::from_str(&storage.get_item(USER_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored, serde_json::from_str::<Value>(AUTH_BODY).unwrap());

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/api/auth/login");
        assert_eq!(requests[0].headers["content-type"], "application/json");
        assert!(requests[0].headers.get("authorization").is_none());
        let sent: Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(sent, json!({"email": "ana@example.com", "password": "Secreta#1"}));
    }

    #[tokio::test]
    async fn test_register_persists_session() {
        let (base, stub) = spawn_stub(&[("/auth/registro", 201, AUTH_BODY)]).await;
        let storage = Arc::new(MemoryStorage::new());
        let mut client = client_with(storage.clone(), Arc::new(Page::default()), &base);

        let data = json!({"nombre": "Ana Ruiz", "email": "ana@example.com", "password": "Secreta#1"});
        let user = client.register(&data).await.unwrap();

        assert_eq!(user.name(), Some("Ana Ruiz"));
        assert!(client.is_authenticated());
        assert_eq!(client.current_user().unwrap(), Some(user));
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some("jwt-123"));
        assert_eq!(stub.requests()[0].path, "/api/auth/registro");
    }

    #[tokio::test]
    async fn test_login_failure_propagates_server_message() {
        let (base, _stub) =
            spawn_stub(&[("/auth/login", 401, r#"{"message":"Credenciales inválidas"}"#)]).await;
        let storage = Arc::new(MemoryStorage::new());
        let mut client = client_with(storage.clone(), Arc::new(Page::default()), &base);

        let err = client.login("ana@example.com", "mala").await.unwrap_err();

        assert!(matches!(err, ApiError::Request(ref m) if m == "Credenciales inválidas"));
        assert!(!client.is_authenticated());
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get_item(USER_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_without_token_is_rejected() {
        let (base, _stub) = spawn_stub(&[("/auth/login", 200, r#"{"nombre":"Ana"}"#)]).await;
        let storage = Arc::new(MemoryStorage::new());
        let mut client = client_with(storage.clone(), Arc::new(Page::default()), &base);

        let err = client.login("ana@example.com", "x").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
        assert!(!client.is_authenticated());
        assert_eq!(storage.get_item(USER_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_requests_carry_bearer_after_login() {
        let (base, stub) = spawn_stub(&[
            ("/auth/login", 200, AUTH_BODY),
            ("/servicios/activos", 200, r#"[{"id":1,"nombre":"Corte"}]"#),
        ])
        .await;
        let mut client = client_with(Arc::new(MemoryStorage::new()), Arc::new(Page::default()), &base);

        client.list_services().await;
        client.login("ana@example.com", "Secreta#1").await.unwrap();
        client.list_services().await;

        let requests = stub.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests[0].headers.get("authorization").is_none());
        assert_eq!(requests[2].headers["authorization"], "Bearer jwt-123");
    }

    #[tokio::test]
    async fn test_restored_token_is_sent() {
        let (base, stub) = spawn_stub(&[("/profesionales/activos", 200, "[]")]).await;
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(TOKEN_KEY, "stored-token").unwrap();
        let client = client_with(storage, Arc::new(Page::default()), &base);

        assert!(client.is_authenticated());
        client.list_professionals().await;
        assert_eq!(stub.requests()[0].headers["authorization"], "Bearer stored-token");
    }

    #[tokio::test]
    async fn test_caller_headers_merge_over_defaults() {
        let (base, stub) = spawn_stub(&[("/servicios/activos", 200, "[]")]).await;
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(TOKEN_KEY, "tok").unwrap();
        let client = client_with(storage, Arc::new(Page::default()), &base);

        let mut extra = header::HeaderMap::new();
        extra.insert(header::CONTENT_TYPE, header::HeaderValue::from_static("text/plain"));
        extra.insert("x-request-id", header::HeaderValue::from_static("42"));
        client
            .request("/servicios/activos", RequestOptions::default().with_headers(extra))
            .await
            .unwrap();

        let sent = &stub.requests()[0].headers;
        assert_eq!(sent["content-type"], "text/plain");
        assert_eq!(sent["x-request-id"], "42");
        assert_eq!(sent["authorization"], "Bearer tok");
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_navigates_home() {
        let (base, _stub) = spawn_stub(&[("/auth/login", 200, AUTH_BODY)]).await;
        let storage = Arc::new(MemoryStorage::new());
        let page = Arc::new(Page::default());
        let mut client = client_with(storage.clone(), page.clone(), &base);
        client.login("ana@example.com", "Secreta#1").await.unwrap();
        page.navigate("/reservar");

        client.logout();

        assert!(!client.is_authenticated());
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
        assert_eq!(storage.get_item(USER_KEY).unwrap(), None);
        assert_eq!(client.current_user().unwrap(), None);
        assert_eq!(page.location(), "/");
    }

    #[tokio::test]
    async fn test_list_services_swallows_failure() {
        let (base, _stub) =
            spawn_stub(&[("/servicios/activos", 500, r#"{"message":"Error interno"}"#)]).await;
        let client = client_with(Arc::new(MemoryStorage::new()), Arc::new(Page::default()), &base);

        assert!(client.list_services().await.is_empty());
    }

    #[tokio::test]
    async fn test_list_swallows_unreachable_backend() {
        let client = ApiClient::new(Box::new(MemoryStorage::new()), Arc::new(Page::default()))
            .unwrap()
            .with_base_url("http://127.0.0.1:9/api");

        assert!(client.list_professionals().await.is_empty());
        assert!(client.upcoming_appointments(7).await.is_empty());
    }

    #[tokio::test]
    async fn test_list_professionals_returns_records() {
        let body = r#"[{"id":3,"nombreUsuario":"Carlos","especialidad":"Barba","calificacionPromedio":4.5}]"#;
        let (base, stub) = spawn_stub(&[("/profesionales/activos", 200, body)]).await;
        let client = client_with(Arc::new(MemoryStorage::new()), Arc::new(Page::default()), &base);

        let professionals = client.list_professionals().await;
        assert_eq!(professionals.len(), 1);
        assert_eq!(professionals[0].name(), Some("Carlos"));
        assert_eq!(stub.requests()[0].method, "GET");
    }

    #[tokio::test]
    async fn test_appointment_listings_hit_user_endpoints() {
        let (base, stub) = spawn_stub(&[
            ("/citas/usuario/7/proximas", 200, r#"[{"id":1,"estado":"CONFIRMADA"}]"#),
            ("/citas/usuario/7/historial", 200, r#"[{"id":2},{"id":3}]"#),
            ("/servicios/profesional/3", 200, r#"[{"id":5,"nombre":"Afeitado"}]"#),
        ])
        .await;
        let client = client_with(Arc::new(MemoryStorage::new()), Arc::new(Page::default()), &base);

        assert_eq!(client.upcoming_appointments(7).await[0].status(), Some("CONFIRMADA"));
        assert_eq!(client.appointment_history(7).await.len(), 2);
        assert_eq!(client.services_by_professional(3).await[0].name(), Some("Afeitado"));
        assert_eq!(stub.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_create_appointment_returns_created_record() {
        let (base, stub) =
            spawn_stub(&[("/citas", 201, r#"{"id":10,"estado":"PENDIENTE","precioFinal":25000.0}"#)]).await;
        let client = client_with(Arc::new(MemoryStorage::new()), Arc::new(Page::default()), &base);

        let payload = json!({"fechaHora": "2030-03-15T14:30:00", "usuarioId": 7, "servicioId": 2, "profesionalId": 3});
        let cita = client.create_appointment(&payload).await.unwrap();

        assert_eq!(cita.id(), Some(10));
        let sent: Value = serde_json::from_str(&stub.requests()[0].body).unwrap();
        assert_eq!(sent, payload);
    }

    #[tokio::test]
    async fn test_create_appointment_propagates_failure() {
        let (base, _stub) =
            spawn_stub(&[("/citas", 400, r#"{"message":"La fecha debe ser futura"}"#)]).await;
        let client = client_with(Arc::new(MemoryStorage::new()), Arc::new(Page::default()), &base);

        let err = client.create_appointment(&json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "La fecha debe ser futura");
    }

    #[tokio::test]
    async fn test_error_without_message_uses_fallback() {
        let (base, _stub) = spawn_stub(&[("/citas", 500, r#"{"status":500}"#)]).await;
        let client = client_with(Arc::new(MemoryStorage::new()), Arc::new(Page::default()), &base);

        let err = client.create_appointment(&json!({})).await.unwrap_err();
        assert!(matches!(err, ApiError::Request(ref m) if m == crate::api::FALLBACK_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn test_cancel_appointment_puts_to_cancel_endpoint() {
        let (base, stub) = spawn_stub(&[("/citas/10/cancelar", 200, "")]).await;
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(TOKEN_KEY, "tok").unwrap();
        let client = client_with(storage, Arc::new(Page::default()), &base);

        client.cancel_appointment(10).await.unwrap();

        let requests = stub.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "PUT");
        assert_eq!(requests[0].path, "/api/citas/10/cancelar");
        assert_eq!(requests[0].headers["authorization"], "Bearer tok");
    }

    #[tokio::test]
    async fn test_cancel_appointment_propagates_failure() {
        let (base, _stub) = spawn_stub(&[(
            "/citas/10/cancelar",
            400,
            r#"{"message":"La cita no puede ser cancelada en su estado actual"}"#,
        )])
        .await;
        let client = client_with(Arc::new(MemoryStorage::new()), Arc::new(Page::default()), &base);

        let err = client.cancel_appointment(10).await.unwrap_err();
        assert_eq!(err.to_string(), "La cita no puede ser cancelada en su estado actual");
    }

    #[test]
    fn test_current_user_absent_by_default() {
        let client = ApiClient::new(Box::new(MemoryStorage::new()), Arc::new(Page::default())).unwrap();
        assert_eq!(client.current_user().unwrap(), None);
        assert!(!client.is_authenticated());
        assert_eq!(client.base_url(), API_URL);
    }
}
