use kioku_core::{
    CollectionRef, DocumentStore, Page, PageQuery, PropertyPatch, PropertyValue, RemoteDocument, RemoteRef,
    StoreError,
};
use regex::Regex;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.notion.com";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

#[derive(Clone, Debug)]
pub struct NotionConfig {
    pub token: String,
    pub base_url: String,
    pub version: String,
    pub timeout: Duration,
}

impl NotionConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            version: DEFAULT_NOTION_VERSION.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct NotionStore {
    client: Client,
    config: NotionConfig,
}

impl NotionStore {
    pub fn connect(config: NotionConfig) -> Result<Self, StoreError> {
        if config.token.trim().is_empty() {
            return Err(StoreError::Transport("missing Notion integration token".into()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Transport(format!("http client: {e}")))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.config.token)
            .header("Notion-Version", &self.config.version)
    }

    async fn send(&self, req: RequestBuilder) -> Result<String, StoreError> {
        let resp = self.authorized(req).send().await.map_err(transport_error)?;
        let status = resp.status();
        let text = resp.text().await.map_err(transport_error)?;
        if status.is_success() {
            Ok(text)
        } else {
            Err(classify(status, &text))
        }
    }
}

#[derive(Deserialize)]
struct QueryResponse {
    results: Vec<RemoteDocument>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

#[async_trait::async_trait]
impl DocumentStore for NotionStore {
    async fn query(&self, collection: &CollectionRef, query: &PageQuery) -> Result<Page, StoreError> {
        let id = normalize_id(collection.as_str()).unwrap_or_else(|| collection.as_str().to_string());
        let url = self.url(&format!("databases/{id}/query"));
        debug!(%collection, cursor = ?query.start_cursor, "querying database");
        let text = self.send(self.client.post(url).json(&query_body(query))).await?;
        let resp: QueryResponse = serde_json::from_str(&text).map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(Page {
            documents: resp.results,
            next_cursor: resp.next_cursor,
            has_more: resp.has_more,
        })
    }

    async fn update(&self, document: &RemoteRef, patch: &PropertyPatch) -> Result<(), StoreError> {
        let url = self.url(&format!("pages/{document}"));
        let body = patch_body(patch)?;
        debug!(%document, "updating page");
        match self.send(self.client.patch(url).json(&body)).await {
            Err(StoreError::Remote { status: 404, .. }) => Err(StoreError::DocumentNotFound(document.clone())),
            other => other.map(|_| ()),
        }
    }
}

fn transport_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout
    } else {
        StoreError::Transport(e.to_string())
    }
}

pub fn query_body(query: &PageQuery) -> Value {
    let mut body = Map::new();
    if let Some(f) = &query.filter {
        body.insert(
            "filter".into(),
            json!({ "property": f.property, "checkbox": { "equals": f.equals } }),
        );
    }
    if let Some(s) = &query.sort {
        body.insert(
            "sorts".into(),
            json!([{ "property": s.property, "direction": s.direction.as_str() }]),
        );
    }
    if let Some(c) = &query.start_cursor {
        body.insert("start_cursor".into(), Value::String(c.clone()));
    }
    body.insert("page_size".into(), json!(query.page_size));
    Value::Object(body)
}

pub fn patch_body(patch: &PropertyPatch) -> Result<Value, StoreError> {
    let mut props = Map::new();
    for (name, value) in &patch.changes {
        let v = match value {
            PropertyValue::Checkbox { checkbox } => json!({ "checkbox": checkbox }),
            PropertyValue::Number { number } => json!({ "number": number }),
            PropertyValue::Url { url } => json!({ "url": url }),
            PropertyValue::Select { select } => {
                json!({ "select": select.as_ref().map(|s| json!({ "name": s.name })) })
            }
            PropertyValue::RichText { rich_text } => {
                let text: String = rich_text.iter().map(|t| t.plain_text.as_str()).collect();
                json!({ "rich_text": [{ "type": "text", "text": { "content": text } }] })
            }
            other => {
                return Err(StoreError::Transport(format!(
                    "cannot write {} property {name}",
                    other.type_name()
                )))
            }
        };
        props.insert(name.clone(), v);
    }
    Ok(json!({ "properties": props }))
}

/// Maps an error response onto the store taxonomy.
pub fn classify(status: StatusCode, body: &str) -> StoreError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or(ErrorBody {
        code: String::new(),
        message: body.to_string(),
    });
    if status == StatusCode::BAD_REQUEST
        && parsed.code == "validation_error"
        && parsed.message.contains("Could not find")
        && parsed.message.contains("property")
    {
        return StoreError::PropertyNotFound {
            property: missing_property_name(&parsed.message),
        };
    }
    if status == StatusCode::REQUEST_TIMEOUT || status == StatusCode::GATEWAY_TIMEOUT {
        return StoreError::Timeout;
    }
    StoreError::Remote {
        status: status.as_u16(),
        code: parsed.code,
        message: parsed.message,
    }
}

fn missing_property_name(message: &str) -> Option<String> {
    let (_, rest) = message.split_once("name or id:")?;
    let name = rest.trim().trim_end_matches('.').trim_matches('"').trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Extracts the 32-hex-digit id from a page URL or a dashed id.
pub fn normalize_id(input: &str) -> Option<String> {
    static ID: OnceLock<Regex> = OnceLock::new();
    let re = ID.get_or_init(|| Regex::new(r"(?i)([a-f0-9]{32})(?:[?#/]|$)").expect("valid id pattern"));
    let compact: String = input.trim().chars().filter(|c| *c != '-').collect();
    re.captures(&compact)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
}
