use crate::error::{AuditError, Result};
use crate::github::link;
use crate::github::types::RateLimitPayload;
use chrono::{TimeZone, Utc};
use futures::stream::{self, Stream, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK, USER_AGENT};
use reqwest::{Response, StatusCode, Url};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;

const ACCEPT_JSON: &str = "application/vnd.github+json";

/// One page of a listing, the URL it was served from, and the cursor to the
/// next one.
#[derive(Debug)]
pub struct Page {
    pub url: Url,
    pub items: Vec<Value>,
    pub next: Option<Url>,
}

enum Cursor {
    Start,
    Next(Url),
    Done,
}

#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
}

impl GitHubClient {
    pub fn new(
        api_base: &str,
        token: Option<&str>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_JSON));
        headers.insert(USER_AGENT, header_value(user_agent)?);
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            let mut auth = header_value(&format!("Bearer {token}"))?;
            auth.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Appends `segments` to the API base. Each segment is percent-encoded on
    /// its own, so `#`, `%`, `?` and `/` inside owner or branch names stay
    /// part of that segment.
    pub fn endpoint(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&self.api_base).map_err(|e| {
            AuditError::Config(format!("invalid api url {}: {e}", self.api_base))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                AuditError::Config(format!("api url {} cannot take a path", self.api_base))
            })?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    pub async fn fetch_object(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Map<String, Value>> {
        let url = self.endpoint(segments, query)?;
        let path = url.path().to_string();
        let (body, _) = self.get(url).await?;
        match body {
            Value::Object(map) => Ok(map),
            other => Err(AuditError::MalformedResponse(format!(
                "{path}: expected a JSON object, got {}",
                kind(&other)
            ))),
        }
    }

    pub async fn fetch_page(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Page> {
        let url = self.endpoint(segments, query)?;
        self.fetch_page_at(url).await
    }

    /// Fetches the page at a fully qualified URL, either one built by
    /// [`Self::endpoint`] or a cursor taken from a previous page.
    pub async fn fetch_page_at(&self, url: Url) -> Result<Page> {
        let (body, headers) = self.get(url.clone()).await?;
        let items = match body {
            Value::Array(items) => items,
            other => {
                return Err(AuditError::MalformedResponse(format!(
                    "{}: expected a JSON array, got {}",
                    url.path(),
                    kind(&other)
                )))
            }
        };

        let next = match headers.get(LINK).map(|v| v.to_str()) {
            Some(Ok(raw)) => link::next_link(raw)
                .map(|n| {
                    Url::parse(&n).map_err(|e| {
                        AuditError::MalformedResponse(format!("bad next link {n}: {e}"))
                    })
                })
                .transpose()?,
            Some(Err(_)) => {
                return Err(AuditError::MalformedResponse(
                    "link header is not valid ASCII".to_string(),
                ))
            }
            None => None,
        };

        Ok(Page { url, items, next })
    }

    /// Every item of a paginated listing, fetched lazily one page at a time.
    /// The first request carries `query`; later requests follow the `next`
    /// cursor verbatim until none is returned. A cursor pointing at a page
    /// already fetched is a `MalformedResponse`.
    pub fn paginate_all<'a>(
        &'a self,
        segments: &'a [&'a str],
        query: &'a [(&'a str, String)],
    ) -> impl Stream<Item = Result<Value>> + 'a {
        let start = (Cursor::Start, HashSet::new());
        stream::try_unfold(start, move |(cursor, mut visited)| async move {
            let page = match cursor {
                Cursor::Start => self.fetch_page(segments, query).await?,
                Cursor::Next(url) => self.fetch_page_at(url).await?,
                Cursor::Done => return Ok::<_, AuditError>(None),
            };
            visited.insert(page.url);

            let next = match page.next {
                Some(url) if visited.contains(&url) => {
                    return Err(AuditError::MalformedResponse(format!(
                        "pagination cursor revisits {url}"
                    )))
                }
                Some(url) => Cursor::Next(url),
                None => Cursor::Done,
            };
            Ok(Some((page.items, (next, visited))))
        })
        .map_ok(|items| stream::iter(items.into_iter().map(Ok::<Value, AuditError>)))
        .try_flatten()
    }

    pub async fn rate_limit(&self) -> Option<u32> {
        let url = self.endpoint(&["rate_limit"], &[]).ok()?;
        let (body, _) = self.get(url).await.ok()?;
        serde_json::from_value::<RateLimitPayload>(body)
            .ok()
            .map(|r| r.resources.core.remaining)
    }

    async fn get(&self, url: Url) -> Result<(Value, HeaderMap)> {
        debug!(%url, "GET");
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(error_for_status(response).await);
        }

        let headers = response.headers().clone();
        let text = response.text().await?;
        let body = serde_json::from_str(&text)
            .map_err(|e| AuditError::MalformedResponse(format!("invalid JSON body: {e}")))?;
        Ok((body, headers))
    }
}

async fn error_for_status(response: Response) -> AuditError {
    let status = response.status();
    let headers = response.headers();
    let exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim() == "0")
        .unwrap_or(false);

    if exhausted
        && (status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS)
    {
        let reset = headers
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
        return AuditError::RateLimited {
            status: status.as_u16(),
            reset,
        };
    }

    let body = response.text().await.unwrap_or_default();
    AuditError::Api {
        status: status.as_u16(),
        body,
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| AuditError::Config(format!("invalid header value: {e}")))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
