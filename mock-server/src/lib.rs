use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};

/// Resource kinds the server knows about.
pub const KINDS: [&str; 4] = ["contacts", "leads", "companies", "notes"];

/// Rows per page; larger `limit_rows` values are capped.
pub const PAGE_LIMIT: usize = 500;

pub const STALE_UPDATE: &str = "Last modified date is older than in database";
pub const ENTITY_NOT_FOUND: &str = "Entity not found";
pub const NAME_REQUIRED: &str = "Name is required";

/// In-memory records per kind, keyed by id.
#[derive(Debug, Default)]
pub struct Store {
    next_id: u64,
    records: HashMap<String, BTreeMap<u64, Value>>,
}

impl Store {
    /// Insert wire-shaped records as-is, assigning ids to those without one.
    pub fn seed(&mut self, kind: &str, records: Vec<Value>) -> Vec<u64> {
        let mut ids = Vec::with_capacity(records.len());
        for mut record in records {
            let id = match record.get("id").and_then(Value::as_u64) {
                Some(id) => id,
                None => self.allocate_id(),
            };
            self.next_id = self.next_id.max(id);
            record["id"] = json!(id);
            self.kind_mut(kind).insert(id, record);
            ids.push(id);
        }
        ids
    }

    pub fn get(&self, kind: &str, id: u64) -> Option<&Value> {
        self.records.get(kind).and_then(|records| records.get(&id))
    }

    pub fn len(&self, kind: &str) -> usize {
        self.records.get(kind).map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, kind: &str) -> bool {
        self.len(kind) == 0
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn kind_mut(&mut self, kind: &str) -> &mut BTreeMap<u64, Value> {
        self.records.entry(kind.to_string()).or_default()
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with(Db::default())
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/api/v2/{kind}", get(list_records).post(mutate_records))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(db)).await
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub limit_rows: Option<usize>,
    pub limit_offset: Option<usize>,
    pub id: Option<u64>,
    pub responsible_user_id: Option<u64>,
    pub query: Option<String>,
}

async fn list_records(
    State(db): State<Db>,
    Path(kind): Path<String>,
    Query(params): Query<ListParams>,
) -> Response {
    if !KINDS.contains(&kind.as_str()) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let store = db.read().await;
    let limit = params.limit_rows.unwrap_or(PAGE_LIMIT).min(PAGE_LIMIT);
    let needle = params.query.as_deref().map(str::to_lowercase);
    let items: Vec<Value> = store
        .records
        .get(&kind)
        .into_iter()
        .flat_map(BTreeMap::values)
        .filter(|record| params.id.is_none_or(|id| record["id"] == json!(id)))
        .filter(|record| {
            params
                .responsible_user_id
                .is_none_or(|user| record["responsible_user_id"] == json!(user))
        })
        .filter(|record| needle.as_deref().is_none_or(|needle| mentions(record, needle)))
        .skip(params.limit_offset.unwrap_or(0))
        .take(limit)
        .map(|record| with_links(&kind, record.clone()))
        .collect();

    if items.is_empty() {
        return StatusCode::NO_CONTENT.into_response();
    }
    Json(envelope(&kind, "get", items, Map::new())).into_response()
}

async fn mutate_records(
    State(db): State<Db>,
    Path(kind): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !KINDS.contains(&kind.as_str()) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let mut store = db.write().await;
    let now = chrono::Utc::now().timestamp();
    let (items, errors) = match (body.get("add"), body.get("update")) {
        (Some(Value::Array(batch)), None) => add_batch(&mut store, &kind, batch, now),
        (None, Some(Value::Array(batch))) => update_batch(&mut store, &kind, batch),
        _ => return StatusCode::BAD_REQUEST.into_response(),
    };
    Json(envelope(&kind, "post", items, errors)).into_response()
}

fn add_batch(store: &mut Store, kind: &str, batch: &[Value], now: i64) -> (Vec<Value>, Map<String, Value>) {
    let mut items = Vec::new();
    let mut failures = Map::new();
    for (index, payload) in batch.iter().enumerate() {
        let named = payload.get("name").and_then(Value::as_str).is_some_and(|name| !name.is_empty());
        if kind != "notes" && !named {
            failures.insert(index.to_string(), json!(NAME_REQUIRED));
            continue;
        }
        let id = store.allocate_id();
        let mut record = to_record(payload);
        record.insert("id".to_string(), json!(id));
        record.insert("created_at".to_string(), json!(now));
        record.insert("updated_at".to_string(), json!(now));
        store.kind_mut(kind).insert(id, Value::Object(record));
        items.push(with_links(kind, json!({"id": id, "request_id": index})));
    }
    (items, operation_errors("add", failures))
}

fn update_batch(store: &mut Store, kind: &str, batch: &[Value]) -> (Vec<Value>, Map<String, Value>) {
    let mut items = Vec::new();
    let mut failures = Map::new();
    for payload in batch {
        let Some(id) = payload.get("id").and_then(Value::as_u64) else {
            failures.insert("0".to_string(), json!(ENTITY_NOT_FOUND));
            continue;
        };
        let Some(Value::Object(stored)) = store.kind_mut(kind).get_mut(&id) else {
            failures.insert(id.to_string(), json!(ENTITY_NOT_FOUND));
            continue;
        };
        let submitted = payload.get("updated_at").and_then(Value::as_i64).unwrap_or(0);
        let current = stored.get("updated_at").and_then(Value::as_i64).unwrap_or(0);
        if submitted < current {
            failures.insert(id.to_string(), json!(STALE_UPDATE));
            continue;
        }
        for (key, value) in to_record(payload) {
            stored.insert(key, value);
        }
        items.push(with_links(kind, json!({"id": id, "updated_at": submitted})));
    }
    (items, operation_errors("update", failures))
}

/// Reshape a mutation payload into the form list responses return.
fn to_record(payload: &Value) -> Map<String, Value> {
    let mut record = Map::new();
    let Some(fields) = payload.as_object() else {
        return record;
    };
    for (key, value) in fields {
        match key.as_str() {
            "tags" => {
                let tags: Vec<Value> = value
                    .as_array()
                    .into_iter()
                    .flatten()
                    .map(|id| json!({"id": id, "name": ""}))
                    .collect();
                record.insert("tags".to_string(), Value::Array(tags));
            }
            "company_id" => {
                record.insert("company".to_string(), json!({"id": value, "name": ""}));
            }
            "contacts_id" => {
                record.insert("contacts".to_string(), json!({"id": value}));
            }
            "leads_id" => {
                record.insert("leads".to_string(), json!({"id": value}));
            }
            _ => {
                record.insert(key.clone(), value.clone());
            }
        }
    }
    record
}

fn operation_errors(operation: &str, failures: Map<String, Value>) -> Map<String, Value> {
    let mut errors = Map::new();
    if !failures.is_empty() {
        errors.insert(operation.to_string(), Value::Object(failures));
    }
    errors
}

fn envelope(kind: &str, method: &str, items: Vec<Value>, errors: Map<String, Value>) -> Value {
    let mut embedded = Map::new();
    embedded.insert("items".to_string(), Value::Array(items));
    if !errors.is_empty() {
        embedded.insert("errors".to_string(), Value::Object(errors));
    }
    json!({
        "_links": {"self": {"href": format!("/api/v2/{kind}"), "method": method}},
        "_embedded": embedded,
    })
}

fn with_links(kind: &str, mut record: Value) -> Value {
    let href = format!("/api/v2/{kind}?id={}", record["id"]);
    record["_links"] = json!({"self": {"href": href, "method": "get"}});
    record
}

/// Case-insensitive substring match against every string in the record.
fn mentions(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(text) => text.to_lowercase().contains(needle),
        Value::Array(items) => items.iter().any(|item| mentions(item, needle)),
        Value::Object(fields) => fields.values().any(|field| mentions(field, needle)),
        _ => false,
    }
}
