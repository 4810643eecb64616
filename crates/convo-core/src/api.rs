//! HTTP collaborator for the discussion backend.
//!
//! [`ConvoApi`] is the seam the stores and auth layer talk through;
//! [`HttpConvoApi`] is the production implementation over reqwest. This module
//! is also the single serialization boundary: free text (comment text, thread
//! titles) is percent-encoded on write and decoded on read, so the rest of
//! the crate only ever sees decoded text.
//!
//! The backend signals success by the presence of a primary-key field
//! (`_id`) or a `success` field; error responses carry an `error` string.
//! A 2xx body lacking the expected field is still a failure.

use async_trait::async_trait;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::CoreConfig;
use crate::error::{ConvoError, Result};
use crate::models::{Comment, Thread};

/// Characters escaped in free text, matching the original deployment's
/// `encodeURI` wire format (reserved URI characters stay literal).
const TEXT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

pub(crate) fn encode_text(text: &str) -> String {
    utf8_percent_encode(text, TEXT_ENCODE_SET).to_string()
}

pub(crate) fn decode_text(text: &str) -> String {
    percent_decode_str(text).decode_utf8_lossy().into_owned()
}

/// Filter for `GET /comments`.
#[derive(Debug, Clone, Default)]
pub struct CommentQuery {
    pub author: Option<String>,
    pub thread_id: Option<String>,
}

/// Filter for `GET /threads`.
#[derive(Debug, Clone, Default)]
pub struct ThreadQuery {
    pub url: Option<String>,
    pub thread_id: Option<String>,
}

/// Body of `POST /comments`. Text is decoded here; encoding happens on send.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub token: String,
    pub signer_address: String,
    pub text: String,
    pub thread_id: String,
    pub url: String,
}

/// Body of `POST /threads`.
#[derive(Debug, Clone)]
pub struct NewThread {
    pub token: String,
    pub signer_address: String,
    pub title: String,
    pub url: String,
    /// Client-assigned epoch milliseconds, as the original deployment sends.
    pub created_on: String,
}

/// Body of `DELETE /comments` and `DELETE /threads`.
#[derive(Debug, Clone)]
pub struct Deletion {
    pub token: String,
    pub signer_address: String,
    pub id: String,
}

#[async_trait]
pub trait ConvoApi: Send + Sync {
    /// Fetch the message the wallet must sign to prove address control.
    async fn auth_challenge(&self, address: &str) -> Result<String>;
    /// Exchange a signature over the challenge for a bearer token.
    async fn auth_exchange(&self, address: &str, signature: &str) -> Result<String>;

    async fn comments(&self, query: &CommentQuery) -> Result<Vec<Comment>>;
    async fn create_comment(&self, req: &NewComment) -> Result<Comment>;
    async fn delete_comment(&self, req: &Deletion) -> Result<()>;

    async fn threads(&self, query: &ThreadQuery) -> Result<Vec<Thread>>;
    async fn create_thread(&self, req: &NewThread) -> Result<Thread>;
    async fn delete_thread(&self, req: &Deletion) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct CommentWire {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "threadId", default)]
    thread_id: String,
    author: String,
    #[serde(rename = "authorENS", default)]
    author_ens: Option<String>,
    text: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(rename = "createdOn", default)]
    created_on: String,
}

impl From<CommentWire> for Comment {
    fn from(wire: CommentWire) -> Self {
        Comment {
            id: wire.id,
            thread_id: wire.thread_id,
            author: wire.author,
            author_alias: wire.author_ens,
            text: decode_text(&wire.text),
            url: wire.url,
            created_on: wire.created_on,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ThreadWire {
    #[serde(rename = "_id")]
    id: String,
    title: String,
    url: String,
    creator: String,
    #[serde(rename = "createdOn", default)]
    created_on: String,
}

impl From<ThreadWire> for Thread {
    fn from(wire: ThreadWire) -> Self {
        Thread {
            id: wire.id,
            title: decode_text(&wire.title),
            url: wire.url,
            creator: wire.creator,
            created_on: wire.created_on,
        }
    }
}

fn backend_error(body: &Value) -> ConvoError {
    let message = body
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("request failed")
        .to_string();
    ConvoError::Backend(message)
}

/// A created comment must come back with its `_id`; anything else is the
/// backend refusing the write, even on a 200.
fn comment_from_create_body(body: Value) -> Result<Comment> {
    if body.get("_id").is_none() {
        return Err(backend_error(&body));
    }
    let wire: CommentWire =
        serde_json::from_value(body).map_err(|e| ConvoError::Backend(e.to_string()))?;
    Ok(wire.into())
}

/// Thread creation returns the new `_id`; the rest of the entity is composed
/// from what was submitted, matching the original client.
fn thread_from_create_body(body: Value, req: &NewThread) -> Result<Thread> {
    let id = match body.get("_id").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => return Err(backend_error(&body)),
    };
    Ok(Thread {
        id,
        title: req.title.clone(),
        url: req.url.clone(),
        creator: req.signer_address.clone(),
        created_on: req.created_on.clone(),
    })
}

fn deletion_result(body: Value) -> Result<()> {
    if body.get("success").is_some() {
        Ok(())
    } else {
        Err(backend_error(&body))
    }
}

/// Production client for the REST backend.
pub struct HttpConvoApi {
    config: CoreConfig,
    client: reqwest::Client,
}

impl HttpConvoApi {
    pub fn new(config: CoreConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api{}", self.config.api_url, path)
    }

    /// Decode a response body, mapping 401/403 to `AuthRejected` and other
    /// non-success statuses to `Backend` with the body's error message.
    async fn decode_body(&self, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ConvoError::AuthRejected);
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| ConvoError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(backend_error(&body));
        }
        Ok(body)
    }

    async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value> {
        let mut query: Vec<(&str, &str)> = vec![("apikey", &self.config.api_key)];
        query.extend_from_slice(params);
        let response = self
            .client
            .get(self.endpoint(path))
            .query(&query)
            .send()
            .await?;
        self.decode_body(response).await
    }

    async fn send_json(&self, method: reqwest::Method, path: &str, body: Value) -> Result<Value> {
        let response = self
            .client
            .request(method, self.endpoint(path))
            .query(&[("apikey", &self.config.api_key)])
            .json(&body)
            .send()
            .await?;
        self.decode_body(response).await
    }
}

#[async_trait]
impl ConvoApi for HttpConvoApi {
    async fn auth_challenge(&self, address: &str) -> Result<String> {
        let body = self.get("/auth/challenge", &[("address", address)]).await?;
        body.get("challenge")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| backend_error(&body))
    }

    async fn auth_exchange(&self, address: &str, signature: &str) -> Result<String> {
        let body = self
            .send_json(
                reqwest::Method::POST,
                "/auth",
                json!({ "signerAddress": address, "signature": signature }),
            )
            .await?;
        body.get("token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ConvoError::AuthRejected)
    }

    async fn comments(&self, query: &CommentQuery) -> Result<Vec<Comment>> {
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(author) = query.author.as_deref() {
            params.push(("author", author));
        }
        if let Some(thread_id) = query.thread_id.as_deref() {
            params.push(("threadId", thread_id));
        }
        let body = self.get("/comments", &params).await?;
        let wires: Vec<CommentWire> =
            serde_json::from_value(body).map_err(|e| ConvoError::Backend(e.to_string()))?;
        Ok(wires.into_iter().map(Comment::from).collect())
    }

    async fn create_comment(&self, req: &NewComment) -> Result<Comment> {
        let body = self
            .send_json(
                reqwest::Method::POST,
                "/comments",
                json!({
                    "token": req.token,
                    "signerAddress": req.signer_address,
                    "comment": encode_text(&req.text),
                    "threadId": req.thread_id,
                    "url": req.url,
                }),
            )
            .await?;
        comment_from_create_body(body)
    }

    async fn delete_comment(&self, req: &Deletion) -> Result<()> {
        let body = self
            .send_json(
                reqwest::Method::DELETE,
                "/comments",
                json!({
                    "token": req.token,
                    "signerAddress": req.signer_address,
                    "commentId": req.id,
                }),
            )
            .await?;
        deletion_result(body)
    }

    async fn threads(&self, query: &ThreadQuery) -> Result<Vec<Thread>> {
        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(url) = query.url.as_deref() {
            params.push(("url", url));
        }
        if let Some(thread_id) = query.thread_id.as_deref() {
            params.push(("threadId", thread_id));
        }
        let body = self.get("/threads", &params).await?;
        // A threadId lookup returns a single object; url/explore return a list.
        let wires: Vec<ThreadWire> = if body.is_array() {
            serde_json::from_value(body).map_err(|e| ConvoError::Backend(e.to_string()))?
        } else {
            let wire: ThreadWire =
                serde_json::from_value(body).map_err(|e| ConvoError::Backend(e.to_string()))?;
            vec![wire]
        };
        Ok(wires.into_iter().map(Thread::from).collect())
    }

    async fn create_thread(&self, req: &NewThread) -> Result<Thread> {
        let body = self
            .send_json(
                reqwest::Method::POST,
                "/threads",
                json!({
                    "token": req.token,
                    "signerAddress": req.signer_address,
                    "title": encode_text(&req.title),
                    "url": req.url,
                    "creator": req.signer_address,
                    "createdOn": req.created_on,
                }),
            )
            .await?;
        thread_from_create_body(body, req)
    }

    async fn delete_thread(&self, req: &Deletion) -> Result<()> {
        let body = self
            .send_json(
                reqwest::Method::DELETE,
                "/threads",
                json!({
                    "token": req.token,
                    "signerAddress": req.signer_address,
                    "threadId": req.id,
                }),
            )
            .await?;
        deletion_result(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_round_trip() {
        let text = "gm <frens> 100% wagmi {maybe}";
        let encoded = encode_text(text);
        assert!(!encoded.contains(' '));
        assert!(!encoded.contains('<'));
        assert_eq!(decode_text(&encoded), text);
    }

    #[test]
    fn test_encode_leaves_reserved_uri_chars() {
        // encodeURI compatibility: these stay literal on the wire.
        assert_eq!(encode_text("a/b?c=d&e#f"), "a/b?c=d&e#f");
    }

    #[test]
    fn test_comment_wire_decodes_text() {
        let body = json!({
            "_id": "c1",
            "threadId": "t1",
            "author": "0x9fa1c391e1a7fbb1cde3b9ad05afc6c796e5e3b1",
            "authorENS": "alice.eth",
            "text": "hello%20world",
            "url": "https://example.com/",
            "createdOn": "1600000000000",
        });
        let comment = comment_from_create_body(body).unwrap();
        assert_eq!(comment.text, "hello world");
        assert_eq!(comment.author_alias.as_deref(), Some("alice.eth"));
    }

    #[test]
    fn test_create_without_id_is_backend_error() {
        let body = json!({ "error": "Invalid signature" });
        match comment_from_create_body(body) {
            Err(ConvoError::Backend(message)) => assert_eq!(message, "Invalid signature"),
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[test]
    fn test_create_2xx_without_id_or_error_still_fails() {
        let body = json!({ "status": "queued" });
        assert!(matches!(
            comment_from_create_body(body),
            Err(ConvoError::Backend(_))
        ));
    }

    #[test]
    fn test_thread_created_from_submitted_fields() {
        let req = NewThread {
            token: "tok".into(),
            signer_address: "0x9fa1c391e1a7fbb1cde3b9ad05afc6c796e5e3b1".into(),
            title: "Rust discussion".into(),
            url: "https://example.com/".into(),
            created_on: "1600000000000".into(),
        };
        let thread = thread_from_create_body(json!({ "_id": "t9" }), &req).unwrap();
        assert_eq!(thread.id, "t9");
        assert_eq!(thread.title, "Rust discussion");
        assert_eq!(thread.creator, req.signer_address);
    }

    #[test]
    fn test_deletion_requires_success_field() {
        assert!(deletion_result(json!({ "success": true })).is_ok());
        assert!(matches!(
            deletion_result(json!({ "error": "not yours" })),
            Err(ConvoError::Backend(message)) if message == "not yours"
        ));
    }
}
