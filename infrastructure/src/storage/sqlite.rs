//! SQLite-backed stores.
//!
//! A connection is opened per operation on the blocking pool; SQLite's own
//! locking serializes writers. Timestamps are stored as fixed-width RFC 3339
//! UTC strings so range queries can compare them as text.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use relay_application::ports::store::{ConversationStore, StoreError, ToolCatalogStore, TraceStore};
use relay_domain::{
    AgentId, ContentBlock, Conversation, ConversationId, Message, Role, Severity, Span, SpanId,
    TenantId, ToolDefinition, ToolMode, TraceId,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tool_definitions (
    name          TEXT PRIMARY KEY,
    description   TEXT NOT NULL,
    input_schema  TEXT NOT NULL,
    active        INTEGER NOT NULL DEFAULT 1,
    mode          TEXT NOT NULL DEFAULT 'agent'
);

CREATE TABLE IF NOT EXISTS conversations (
    id          TEXT PRIMARY KEY,
    tenant_id   TEXT NOT NULL,
    agent_id    TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS conversation_messages (
    seq              INTEGER PRIMARY KEY AUTOINCREMENT,
    conversation_id  TEXT NOT NULL,
    role             TEXT NOT NULL,
    content          TEXT NOT NULL,
    tools_used       TEXT NOT NULL,
    token_count      INTEGER NOT NULL,
    created_at       TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_messages_conversation
    ON conversation_messages(conversation_id, seq);

CREATE TABLE IF NOT EXISTS spans (
    seq            INTEGER PRIMARY KEY AUTOINCREMENT,
    id             TEXT NOT NULL UNIQUE,
    trace_id       TEXT NOT NULL,
    parent_id      TEXT,
    tenant_id      TEXT NOT NULL,
    action         TEXT NOT NULL,
    severity       TEXT NOT NULL,
    duration_ms    INTEGER NOT NULL,
    created_at     TEXT NOT NULL,
    details        TEXT NOT NULL,
    error_message  TEXT
);
CREATE INDEX IF NOT EXISTS idx_spans_trace ON spans(trace_id);
CREATE INDEX IF NOT EXISTS idx_spans_tenant_time ON spans(tenant_id, created_at);
"#;

const SPAN_COLUMNS: &str = "id, trace_id, parent_id, tenant_id, action, severity, duration_ms, \
                            created_at, details, error_message";

pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and apply the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Unavailable(format!("{}: {}", parent.display(), e))
            })?;
        }
        let store = Self { db_path };
        store
            .run(|conn| conn.execute_batch(SCHEMA).map_err(query_err))
            .await?;
        info!(path = %store.db_path.display(), "SQLite store ready");
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Insert or replace catalog rows.
    pub async fn upsert_tools(&self, tools: Vec<ToolDefinition>) -> Result<(), StoreError> {
        self.run(move |conn| {
            let tx = conn.unchecked_transaction().map_err(query_err)?;
            for tool in &tools {
                tx.execute(
                    "INSERT INTO tool_definitions (name, description, input_schema, active, mode)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(name) DO UPDATE SET
                        description = excluded.description,
                        input_schema = excluded.input_schema,
                        active = excluded.active,
                        mode = excluded.mode",
                    params![
                        tool.name,
                        tool.description,
                        tool.input_schema.to_string(),
                        tool.active,
                        tool.mode.as_str(),
                    ],
                )
                .map_err(query_err)?;
            }
            tx.commit().map_err(query_err)
        })
        .await
    }

    async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Connection::open(&path)
                .map_err(|e| StoreError::Unavailable(format!("{}: {}", path.display(), e)))?;
            conn.busy_timeout(Duration::from_secs(5)).map_err(query_err)?;
            f(&conn)
        })
        .await
        .map_err(|e| StoreError::Unavailable(format!("storage task failed: {}", e)))?
    }
}

#[async_trait]
impl ToolCatalogStore for SqliteStore {
    async fn active_tools(&self) -> Result<Vec<ToolDefinition>, StoreError> {
        self.run(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT name, description, input_schema, active, mode FROM tool_definitions
                     WHERE active = 1 AND mode != 'code_only' ORDER BY name",
                )
                .map_err(query_err)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, bool>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                })
                .map_err(query_err)?;

            let mut tools = Vec::new();
            for row in rows {
                let (name, description, schema, active, mode) = row.map_err(query_err)?;
                let mode: ToolMode = mode.parse().map_err(corrupt)?;
                tools.push(ToolDefinition {
                    input_schema: from_json(&schema)?,
                    active,
                    mode,
                    ..ToolDefinition::new(name, description)
                });
            }
            Ok(tools)
        })
        .await
    }
}

#[async_trait]
impl TraceStore for SqliteStore {
    async fn append(&self, span: &Span) -> Result<(), StoreError> {
        let span = span.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO spans (id, trace_id, parent_id, tenant_id, action, severity,
                                    duration_ms, created_at, details, error_message)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    span.id.as_str(),
                    span.trace_id.as_str(),
                    span.parent_id.as_ref().map(SpanId::as_str),
                    span.tenant_id.as_str(),
                    span.action,
                    span.severity.as_str(),
                    i64::try_from(span.duration_ms).unwrap_or(i64::MAX),
                    timestamp(&span.created_at),
                    span.details.to_string(),
                    span.error_message,
                ],
            )
            .map_err(query_err)?;
            Ok(())
        })
        .await
    }

    async fn by_trace(&self, trace_id: &TraceId) -> Result<Vec<Span>, StoreError> {
        let trace_id = trace_id.as_str().to_string();
        self.run(move |conn| {
            let sql = format!("SELECT {SPAN_COLUMNS} FROM spans WHERE trace_id = ?1 ORDER BY seq");
            let mut stmt = conn.prepare(&sql).map_err(query_err)?;
            let rows = stmt.query_map(params![trace_id], span_row).map_err(query_err)?;
            let spans: Result<Vec<Span>, StoreError> =
                rows.map(|row| row.map_err(query_err)?).collect();
            spans
        })
        .await
    }

    async fn in_window(
        &self,
        tenant: &TenantId,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Span>, StoreError> {
        let tenant = tenant.as_str().to_string();
        self.run(move |conn| {
            let sql = format!(
                "SELECT {SPAN_COLUMNS} FROM spans
                 WHERE tenant_id = ?1 AND created_at >= ?2 AND created_at <= ?3
                 ORDER BY seq"
            );
            let mut stmt = conn.prepare(&sql).map_err(query_err)?;
            let rows = stmt
                .query_map(
                    params![tenant, timestamp(&since), timestamp(&until)],
                    span_row,
                )
                .map_err(query_err)?;
            let spans: Result<Vec<Span>, StoreError> =
                rows.map(|row| row.map_err(query_err)?).collect();
            spans
        })
        .await
    }
}

#[async_trait]
impl ConversationStore for SqliteStore {
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        let conversation = conversation.clone();
        self.run(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO conversations (id, tenant_id, agent_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    conversation.id.as_str(),
                    conversation.tenant_id.as_str(),
                    conversation.agent_id.as_str(),
                    timestamp(&conversation.created_at),
                ],
            )
            .map_err(query_err)?;
            Ok(())
        })
        .await
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        let id = id.as_str().to_string();
        self.run(move |conn| {
            let row = conn
                .query_row(
                    "SELECT id, tenant_id, agent_id, created_at FROM conversations WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()
                .map_err(query_err)?;

            row.map(|(id, tenant, agent, created_at)| {
                Ok(Conversation {
                    id: ConversationId::new(id),
                    tenant_id: TenantId::new(tenant),
                    agent_id: AgentId::new(agent),
                    created_at: parse_timestamp(&created_at)?,
                })
            })
            .transpose()
        })
        .await
    }

    async fn append_message(
        &self,
        conversation_id: &ConversationId,
        message: &Message,
    ) -> Result<(), StoreError> {
        let conversation_id = conversation_id.as_str().to_string();
        let content = to_json(&message.content)?;
        let tools_used = to_json(&message.tools_used)?;
        let role = message.role.as_str().to_string();
        let token_count = message.token_count;
        let created_at = timestamp(&message.created_at);
        self.run(move |conn| {
            conn.execute(
                "INSERT INTO conversation_messages
                    (conversation_id, role, content, tools_used, token_count, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![conversation_id, role, content, tools_used, token_count, created_at],
            )
            .map_err(query_err)?;
            Ok(())
        })
        .await
    }

    async fn messages(&self, conversation_id: &ConversationId) -> Result<Vec<Message>, StoreError> {
        let conversation_id = conversation_id.as_str().to_string();
        self.run(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT role, content, tools_used, token_count, created_at
                     FROM conversation_messages WHERE conversation_id = ?1 ORDER BY seq",
                )
                .map_err(query_err)?;
            let rows = stmt
                .query_map(params![conversation_id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, u32>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                })
                .map_err(query_err)?;

            let mut messages = Vec::new();
            for row in rows {
                let (role, content, tools_used, token_count, created_at) =
                    row.map_err(query_err)?;
                let role: Role = role.parse().map_err(corrupt)?;
                let content: Vec<ContentBlock> = from_json(&content)?;
                messages.push(Message {
                    role,
                    content,
                    tools_used: from_json(&tools_used)?,
                    token_count,
                    created_at: parse_timestamp(&created_at)?,
                });
            }
            Ok(messages)
        })
        .await
    }
}

// ==================== Row mapping ====================

/// Raw span columns; decoded outside the rusqlite closure so decoding
/// failures surface as [`StoreError::Corrupt`].
struct SpanRow {
    id: String,
    trace_id: String,
    parent_id: Option<String>,
    tenant_id: String,
    action: String,
    severity: String,
    duration_ms: i64,
    created_at: String,
    details: String,
    error_message: Option<String>,
}

fn span_row(row: &Row<'_>) -> rusqlite::Result<Result<Span, StoreError>> {
    let raw = SpanRow {
        id: row.get(0)?,
        trace_id: row.get(1)?,
        parent_id: row.get(2)?,
        tenant_id: row.get(3)?,
        action: row.get(4)?,
        severity: row.get(5)?,
        duration_ms: row.get(6)?,
        created_at: row.get(7)?,
        details: row.get(8)?,
        error_message: row.get(9)?,
    };
    Ok(raw.into_span())
}

impl SpanRow {
    fn into_span(self) -> Result<Span, StoreError> {
        let severity: Severity = self.severity.parse().map_err(corrupt)?;
        Ok(Span {
            id: SpanId::new(self.id),
            trace_id: TraceId::new(self.trace_id),
            parent_id: self.parent_id.map(SpanId::new),
            tenant_id: TenantId::new(self.tenant_id),
            action: self.action,
            severity,
            duration_ms: u64::try_from(self.duration_ms).unwrap_or(0),
            created_at: parse_timestamp(&self.created_at)?,
            details: from_json(&self.details)?,
            error_message: self.error_message,
        })
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("timestamp '{}': {}", raw, e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(corrupt)
}

fn from_json<T: DeserializeOwned>(raw: &str) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(corrupt)
}

fn query_err(e: rusqlite::Error) -> StoreError {
    StoreError::Query(e.to_string())
}

fn corrupt(e: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(e.to_string())
}
