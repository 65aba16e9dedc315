use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;

use reqwest::header;
use reqwest::Client;
use reqwest::Method;
use reqwest::RequestBuilder;
use reqwest::Response;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use crate::domain::ApiKey;
use crate::domain::Language;
use crate::domain::SubscriberEmail;
use crate::domain::SubscriberIp;
use crate::utils::error_chain_fmt;

/// MailChimp's Basic auth ignores the username, but the API docs use this one
const USERNAME: &str = "apikey";

/// Whatever MailChimp sent back, decoded. The shape is MailChimp's business,
/// not ours.
pub type MemberRecord = Value;

/// List-specific subscriber attributes, e.g. `{"FNAME": "Jane"}`
pub type MergeFields = Map<String, Value>;

#[derive(thiserror::Error)]
pub enum MailChimpError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),
    #[error("{0}")]
    InvalidEmail(String),
    #[error("No list selected")]
    MissingList,
    #[error("Failed to reach MailChimp")]
    Transport(#[from] reqwest::Error),
    #[error("MailChimp responded with {0}")]
    UnexpectedStatus(StatusCode),
    #[error("MailChimp response was not valid JSON")]
    Decode(#[source] serde_json::Error),
}

impl Debug for MailChimpError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Subscribed,
    Unsubscribed,
}

#[derive(Serialize)]
struct SubscribeRequest<'a> {
    email_address: &'a str,
    status: MemberStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    merge_fields: Option<&'a MergeFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
    // both are always set together
    #[serde(skip_serializing_if = "Option::is_none")]
    ip_signup: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ip_opt: Option<&'a str>,
}

#[derive(Serialize)]
struct UpdateStatusRequest {
    status: MemberStatus,
}

/// Everything `try_subscribe` sends about a new list member.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub email: SubscriberEmail,
    pub merge_fields: MergeFields,
    /// A locale like `en_US` or a bare language like `en`. When `None` (or
    /// empty), the client's default locale is used.
    pub locale: Option<String>,
    pub ip: Option<SubscriberIp>,
}

impl NewMember {
    pub fn new(email: SubscriberEmail) -> Self {
        Self {
            email,
            merge_fields: MergeFields::new(),
            locale: None,
            ip: None,
        }
    }

    pub fn merge_fields(
        mut self,
        merge_fields: MergeFields,
    ) -> Self {
        self.merge_fields = merge_fields;
        self
    }

    pub fn locale(
        mut self,
        locale: impl Into<String>,
    ) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn ip(
        mut self,
        ip: SubscriberIp,
    ) -> Self {
        self.ip = Some(ip);
        self
    }
}

/// Client for MailChimp's v3 list member endpoints.
///
/// There are two ways to use it:
///
/// - `try_status`, `try_subscribe`, `try_unsubscribe` and `try_delete` take
///   the list id explicitly, only need `&self`, and say why they failed.
/// - `status`, `subscribe`, `unsubscribe` and `delete` work on the list picked
///   with `set_list`/`set_list_from_key`, take raw strings, and return `None`
///   on -any- failure (invalid input, network error, non-2xx status). The
///   failure is logged, but callers cannot tell "not subscribed" from "network
///   down".
///
/// Establishing a HTTP connection is expensive, so one `reqwest::Client` is
/// kept for the lifetime of the `MailChimpClient` and reused for every request.
#[derive(Debug)]
pub struct MailChimpClient {
    http_client: Client,
    base_url: String,
    api_key: ApiKey,
    lists: HashMap<String, String>,
    default_locale: Option<String>,
    current_list: Option<String>,
}

impl MailChimpClient {
    /// `base_url` is normally `ApiKey::base_url`; requests that take longer
    /// than `timeout` fail with `MailChimpError::Transport`.
    pub fn new(
        base_url: String,
        api_key: ApiKey,
        lists: HashMap<String, String>,
        default_locale: Option<String>,
        timeout: Duration,
    ) -> Result<Self, MailChimpError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        let http_client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            lists,
            default_locale,
            current_list: None,
        })
    }

    pub fn base_url(&self) -> &str { &self.base_url }

    /// The list used by the selector-based methods, if any
    pub fn list(&self) -> Option<&str> { self.current_list.as_deref() }

    pub fn set_list(
        &mut self,
        list_id: impl Into<String>,
    ) -> &mut Self {
        self.current_list = Some(list_id.into());
        self
    }

    /// Select a list by its configured name (e.g. `newsletter`) rather than its
    /// MailChimp id. The selection is left untouched if the name is unknown.
    pub fn set_list_from_key(
        &mut self,
        key: &str,
    ) -> Result<&mut Self, MailChimpError> {
        let list_id = self
            .lists
            .get(key)
            // `config` lowercases keys
            .or_else(|| self.lists.get(&key.to_lowercase()))
            .cloned()
            .ok_or_else(|| {
                MailChimpError::Configuration(format!("No list configured as {key:?}"))
            })?;
        Ok(self.set_list(list_id))
    }

    /// `GET lists/{list}/members/{member_id}`
    #[tracing::instrument(
        name = "Fetching member status",
        skip(self, email),
        fields(member_id = %email.member_id())
    )]
    pub async fn try_status(
        &self,
        list_id: &str,
        email: &SubscriberEmail,
    ) -> Result<MemberRecord, MailChimpError> {
        let url = self.member_url(list_id, email)?;
        let response = self.request(Method::GET, &url).send().await?;
        process_response(response).await
    }

    /// `POST lists/{list}/members/`
    #[tracing::instrument(
        name = "Subscribing member",
        skip(self, member),
        fields(member_id = %member.email.member_id())
    )]
    pub async fn try_subscribe(
        &self,
        list_id: &str,
        member: &NewMember,
    ) -> Result<MemberRecord, MailChimpError> {
        let url = format!("{}/", self.members_url(list_id)?);

        let locale = member
            .locale
            .as_deref()
            .filter(|l| !l.is_empty())
            .or(self.default_locale.as_deref());
        let language = locale.and_then(Language::from_locale);
        let ip: Option<&str> = member.ip.as_ref().map(|ip| ip.as_ref());

        let request_body = SubscribeRequest {
            email_address: member.email.as_ref(),
            status: MemberStatus::Subscribed,
            merge_fields: Some(&member.merge_fields).filter(|f| !f.is_empty()),
            language: language.as_ref().map(|l| l.as_ref()),
            ip_signup: ip,
            ip_opt: ip,
        };

        let response = self
            .request(Method::POST, &url)
            .json(&request_body)
            .send()
            .await?;
        process_response(response).await
    }

    /// `PATCH lists/{list}/members/{member_id}` with `{"status":
    /// "unsubscribed"}`. The member stays in the list.
    #[tracing::instrument(
        name = "Unsubscribing member",
        skip(self, email),
        fields(member_id = %email.member_id())
    )]
    pub async fn try_unsubscribe(
        &self,
        list_id: &str,
        email: &SubscriberEmail,
    ) -> Result<MemberRecord, MailChimpError> {
        let url = self.member_url(list_id, email)?;
        let response = self
            .request(Method::PATCH, &url)
            .json(&UpdateStatusRequest {
                status: MemberStatus::Unsubscribed,
            })
            .send()
            .await?;
        process_response(response).await
    }

    /// `DELETE lists/{list}/members/{member_id}`
    ///
    /// MailChimp answers a successful delete with an empty `204`, which is not
    /// JSON, so this returns `MailChimpError::Decode` even then.
    #[tracing::instrument(
        name = "Deleting member",
        skip(self, email),
        fields(member_id = %email.member_id())
    )]
    pub async fn try_delete(
        &self,
        list_id: &str,
        email: &SubscriberEmail,
    ) -> Result<MemberRecord, MailChimpError> {
        let url = self.member_url(list_id, email)?;
        let response = self.request(Method::DELETE, &url).send().await?;
        process_response(response).await
    }

    /// Member status in the selected list. `None` if the email is invalid, no
    /// list is selected, or the request fails for any reason.
    pub async fn status(
        &self,
        email: &str,
    ) -> Option<MemberRecord> {
        let result = match self.selected(email) {
            Ok((list_id, email)) => self.try_status(list_id, &email).await,
            Err(e) => Err(e),
        };
        no_result_on_error(result)
    }

    /// Subscribe `email` to the selected list.
    ///
    /// `merge_fields` are only sent if non-empty. `language` may be a locale
    /// (`it_IT` -> `it`); without it, the configured default locale is used.
    /// An `ip` that doesn't parse is silently dropped.
    pub async fn subscribe(
        &self,
        email: &str,
        merge_fields: MergeFields,
        language: Option<&str>,
        ip: Option<&str>,
    ) -> Option<MemberRecord> {
        let result = match self.selected(email) {
            Ok((list_id, email)) => {
                let mut member = NewMember::new(email).merge_fields(merge_fields);
                if let Some(language) = language {
                    member = member.locale(language);
                }
                match ip.map(|ip| SubscriberIp::parse(ip.to_string())) {
                    Some(Ok(ip)) => member = member.ip(ip),
                    Some(Err(e)) => tracing::debug!("dropping signup ip: {e}"),
                    None => {}
                }
                self.try_subscribe(list_id, &member).await
            }
            Err(e) => Err(e),
        };
        no_result_on_error(result)
    }

    pub async fn unsubscribe(
        &self,
        email: &str,
    ) -> Option<MemberRecord> {
        let result = match self.selected(email) {
            Ok((list_id, email)) => self.try_unsubscribe(list_id, &email).await,
            Err(e) => Err(e),
        };
        no_result_on_error(result)
    }

    pub async fn delete(
        &self,
        email: &str,
    ) -> Option<MemberRecord> {
        let result = match self.selected(email) {
            Ok((list_id, email)) => self.try_delete(list_id, &email).await,
            Err(e) => Err(e),
        };
        no_result_on_error(result)
    }

    /// Validate the email, then the selected list; both must pass before
    /// anything is sent
    fn selected(
        &self,
        email: &str,
    ) -> Result<(&str, SubscriberEmail), MailChimpError> {
        let email =
            SubscriberEmail::parse(email.to_string()).map_err(MailChimpError::InvalidEmail)?;
        let list_id = self.current_list.as_deref().ok_or(MailChimpError::MissingList)?;
        Ok((list_id, email))
    }

    fn members_url(
        &self,
        list_id: &str,
    ) -> Result<String, MailChimpError> {
        if list_id.trim().is_empty() {
            return Err(MailChimpError::MissingList);
        }
        Ok(format!("{}/lists/{}/members", self.base_url, list_id))
    }

    fn member_url(
        &self,
        list_id: &str,
        email: &SubscriberEmail,
    ) -> Result<String, MailChimpError> {
        Ok(format!(
            "{}/{}",
            self.members_url(list_id)?,
            email.member_id()
        ))
    }

    fn request(
        &self,
        method: Method,
        url: &str,
    ) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .basic_auth(USERNAME, Some(self.api_key.expose_secret()))
    }
}

/// Any 2xx status yields the decoded body; everything else is an error. 4xx
/// and 5xx are deliberately not told apart.
async fn process_response(response: Response) -> Result<MemberRecord, MailChimpError> {
    let status = response.status();
    if !status.is_success() {
        return Err(MailChimpError::UnexpectedStatus(status));
    }
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(MailChimpError::Decode)
}

fn no_result_on_error(result: Result<MemberRecord, MailChimpError>) -> Option<MemberRecord> {
    match result {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::warn!(
                error.cause_chain = ?e,
                error.message = %e,
                "MailChimp request yielded no result"
            );
            None
        }
    }
}
