use std::fmt;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, COOKIE, SET_COOKIE};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use velo_core::credentials::{LoginForm, SignupForm};
use velo_core::form::{Completion, GoalPayload, GoalUpdate, NewTask, TaskUpdate};
use velo_core::{Goal, GoalId, Task, TaskId, User};

use crate::transport::{LoginOutcome, SignupOutcome, VeloTransport};
use crate::ClientError;

/// Name of the cookie the server uses to carry the session.
pub const SESSION_COOKIE: &str = "auth_token";

const USER_AGENT: &str = concat!("velo/", env!("CARGO_PKG_VERSION"));

/// `VeloTransport` over JSON/HTTP.
///
/// The session cookie is tracked explicitly rather than through a cookie jar
/// so it can be persisted between runs and cleared on logout.
pub struct HttpVeloClient {
    base_url: String,
    session_cookie: RwLock<Option<String>>,
    client: reqwest::Client,
}

impl fmt::Debug for HttpVeloClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let session = self.session_cookie().map(|_| "<redacted>");
        f.debug_struct("HttpVeloClient")
            .field("base_url", &self.base_url)
            .field("session_cookie", &session)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

// Older servers wrap the user in `{message, user}`; newer ones return it bare.
#[derive(Deserialize)]
#[serde(untagged)]
enum LoginData {
    Wrapped { user: User },
    Bare(User),
}

impl LoginData {
    fn into_user(self) -> User {
        match self {
            LoginData::Wrapped { user } => user,
            LoginData::Bare(user) => user,
        }
    }
}

impl HttpVeloClient {
    pub fn new(base_url: String, session_cookie: Option<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session_cookie: RwLock::new(session_cookie),
            client,
        })
    }

    pub fn session_cookie(&self) -> Option<String> {
        self.session_cookie
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_session_cookie(&self, value: Option<String>) {
        *self
            .session_cookie
            .write()
            .unwrap_or_else(PoisonError::into_inner) = value;
    }

    fn endpoint(&self, suffix: &str) -> String {
        format!("{}/api{}", self.base_url, suffix)
    }

    fn request(&self, method: reqwest::Method, url: String) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(cookie) = self.session_cookie() {
            builder = builder.header(COOKIE, format!("{SESSION_COOKIE}={cookie}"));
        }
        builder
    }

    async fn send_data<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let (status, _, body) = self.send(builder).await?;
        decode_envelope(status, &body)
    }

    async fn send_no_content(&self, builder: reqwest::RequestBuilder) -> Result<(), ClientError> {
        let (status, _, body) = self.send(builder).await?;
        if is_success(status) {
            Ok(())
        } else {
            Err(api_error(status, &body))
        }
    }

    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<(u16, HeaderMap, Vec<u8>), ClientError> {
        let request = builder.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let resp = self.client.execute(request).await?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();
        tracing::debug!(%method, %path, status, bytes = body.len(), "velo api response");
        Ok((status, headers, body))
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

pub(crate) fn decode_envelope<T: DeserializeOwned>(
    status: u16,
    body: &[u8],
) -> Result<T, ClientError> {
    if !is_success(status) {
        return Err(api_error(status, body));
    }
    let envelope: Envelope<T> = serde_json::from_slice(body)?;
    Ok(envelope.data)
}

pub(crate) fn api_error(status: u16, body: &[u8]) -> ClientError {
    let message = match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            if text.is_empty() {
                reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                text
            }
        }
    };
    ClientError::Api { status, message }
}

/// Pull the session cookie value out of `Set-Cookie` response headers.
pub fn extract_session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|raw| raw.split(';').next())
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl VeloTransport for HttpVeloClient {
    async fn me(&self) -> Result<User, ClientError> {
        let url = self.endpoint("/me");
        self.send_data(self.request(reqwest::Method::GET, url)).await
    }

    async fn login(&self, form: &LoginForm) -> Result<LoginOutcome, ClientError> {
        let url = self.endpoint("/login");
        let (status, headers, body) = self
            .send(self.request(reqwest::Method::POST, url).json(form))
            .await?;
        let data: LoginData = decode_envelope(status, &body)?;

        let session_cookie = extract_session_cookie(&headers);
        if session_cookie.is_some() {
            self.set_session_cookie(session_cookie.clone());
        }

        Ok(LoginOutcome {
            user: data.into_user(),
            session_cookie,
        })
    }

    async fn signup(&self, form: &SignupForm) -> Result<SignupOutcome, ClientError> {
        let url = self.endpoint("/signup");
        self.send_data(self.request(reqwest::Method::POST, url).json(form))
            .await
    }

    async fn list_goals(&self) -> Result<Vec<Goal>, ClientError> {
        let url = self.endpoint("/goals");
        self.send_data(self.request(reqwest::Method::GET, url)).await
    }

    async fn create_goal(&self, payload: &GoalPayload) -> Result<Goal, ClientError> {
        let url = self.endpoint("/goals");
        self.send_data(self.request(reqwest::Method::POST, url).json(payload))
            .await
    }

    async fn update_goal(&self, id: &GoalId, update: &GoalUpdate) -> Result<Goal, ClientError> {
        let url = self.endpoint(&format!("/goals/{}", urlencoding::encode(id.as_str())));
        self.send_data(self.request(reqwest::Method::PUT, url).json(update))
            .await
    }

    async fn delete_goal(&self, id: &GoalId) -> Result<(), ClientError> {
        let url = self.endpoint(&format!("/goals/{}", urlencoding::encode(id.as_str())));
        self.send_no_content(self.request(reqwest::Method::DELETE, url))
            .await
    }

    async fn list_tasks(&self, goal_id: Option<&GoalId>) -> Result<Vec<Task>, ClientError> {
        let url = match goal_id {
            Some(goal_id) => self.endpoint(&format!(
                "/tasks?goal_id={}",
                urlencoding::encode(goal_id.as_str())
            )),
            None => self.endpoint("/tasks"),
        };
        self.send_data(self.request(reqwest::Method::GET, url)).await
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, ClientError> {
        let url = self.endpoint("/tasks");
        self.send_data(self.request(reqwest::Method::POST, url).json(task))
            .await
    }

    async fn update_task(&self, id: &TaskId, update: &TaskUpdate) -> Result<Task, ClientError> {
        let url = self.endpoint(&format!("/tasks/{}", urlencoding::encode(id.as_str())));
        self.send_data(self.request(reqwest::Method::PUT, url).json(update))
            .await
    }

    async fn set_completion(
        &self,
        id: &TaskId,
        completion: Completion,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(&format!(
            "/tasks/{}/complete",
            urlencoding::encode(id.as_str())
        ));
        self.send_no_content(self.request(reqwest::Method::PATCH, url).json(&completion))
            .await
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), ClientError> {
        let url = self.endpoint(&format!("/tasks/{}", urlencoding::encode(id.as_str())));
        self.send_no_content(self.request(reqwest::Method::DELETE, url))
            .await
    }

    fn clear_session(&self) {
        self.set_session_cookie(None);
    }
}
