use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode, Url, header::COOKIE};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    account::{LoginRequest, SignupRequest},
    config::{ClientConfig, ProfileMethod},
    error::{Result, TeaserError, TransportError},
    history::{HistoryEntry, sort_most_recent_first},
    request::{DEFAULT_MAX_UPLOAD_BYTES, GenerationRequest},
    session::Session,
    types::{ErrorBody, GenerationResult, HealthResponse, LoginResponse},
};

/// Client for the teaser generation service.
///
/// Every call is a single attempt: nothing is retried and nothing is cached.
/// Session state is never kept here; callers pass a [`Session`] to the calls that need one.
#[derive(Clone, Debug)]
pub struct TeaserClient {
    http: reqwest::Client,
    base_url: Url,
    max_upload_bytes: u64,
    profile_method: ProfileMethod,
}

/// What a successful login returns.
#[derive(Clone, Debug)]
pub struct LoginOutcome {
    pub message: Option<String>,
    pub session: Session,
}

impl TeaserClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: with_trailing_slash(base_url),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            profile_method: ProfileMethod::default(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::new(config.base_url()?, config.timeout())?
            .with_max_upload_bytes(config.max_upload_bytes)
            .with_profile_method(config.profile_method))
    }

    /// Client with default settings against `base_url`
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Self::from_config(&ClientConfig {
            base_url: base_url.to_string(),
            ..ClientConfig::default()
        })
    }

    pub fn with_max_upload_bytes(mut self, limit: u64) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    pub fn with_profile_method(mut self, method: ProfileMethod) -> Self {
        self.profile_method = method;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Validate `request` and post it to `/generate-teaser`.
    ///
    /// Invalid input fails with [`TeaserError::Validation`] before any network traffic.
    pub async fn submit(
        &self,
        request: GenerationRequest,
        session: Option<&Session>,
    ) -> Result<GenerationResult> {
        let request = request.validate(self.max_upload_bytes)?;
        let url = self.endpoint("generate-teaser")?;
        debug!(
            method = %request.method,
            source = %request.describe_source(),
            max_length = request.max_length,
            min_length = request.min_length,
            "submitting teaser request"
        );

        let form = request.into_form()?;
        let builder = attach_session(self.http.post(url).multipart(form), session);
        read_json(send(builder).await?).await
    }

    /// Past generations for the logged-in user, newest first.
    pub async fn fetch_history(&self, session: &Session) -> Result<Vec<HistoryEntry>> {
        let url = self.endpoint("profile")?;
        let builder = self.http.request(self.profile_method.as_http(), url);
        let mut entries: Vec<HistoryEntry> =
            read_json(send(attach_session(builder, Some(session))).await?).await?;
        sort_most_recent_first(&mut entries);
        debug!(count = entries.len(), "fetched history");
        Ok(entries)
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome> {
        request.validate()?;
        let url = self.endpoint("login")?;
        let response = check_status(send(self.http.post(url).json(request)).await?).await?;

        let session = Session::from_set_cookie(response.headers())
            .ok_or(TransportError::MissingSessionCookie)?;
        let body: LoginResponse = decode(response).await?;
        Ok(LoginOutcome {
            message: body.message,
            session,
        })
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<()> {
        request.validate()?;
        let url = self.endpoint("signup")?;
        check_status(send(self.http.post(url).json(request)).await?).await?;
        Ok(())
    }

    pub async fn health(&self) -> Result<String> {
        let url = self.endpoint("health")?;
        let body: HealthResponse = read_json(send(self.http.get(url)).await?).await?;
        Ok(body.status)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| TeaserError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn attach_session(builder: RequestBuilder, session: Option<&Session>) -> RequestBuilder {
    match session {
        Some(session) => builder.header(COOKIE, session.cookie_header()),
        None => builder,
    }
}

async fn send(builder: RequestBuilder) -> Result<Response> {
    let response = builder.send().await?;
    debug!(url = %response.url(), status = %response.status(), "response received");
    Ok(response)
}

/// Turn any non-2xx answer into [`TeaserError::RequestRejected`].
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    Err(TeaserError::RequestRejected {
        status: status.as_u16(),
        detail: rejection_detail(status, &body),
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    decode(check_status(response).await?).await
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

/// The `detail` field verbatim when it is a string, its JSON text when it is structured
/// (field validation errors), otherwise a generic message naming the status.
pub(crate) fn rejection_detail(status: StatusCode, body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
    {
        Some(serde_json::Value::String(detail)) => detail,
        Some(detail) if !detail.is_null() => detail.to_string(),
        _ => format!("request failed with status {}", status.as_u16()),
    }
}
