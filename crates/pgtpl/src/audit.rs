//! Best-effort operation auditing.
//!
//! A [`Template`](crate::Template) with a sink attached reports every
//! operation after it completes, with the original (pre-resolution)
//! arguments and the result. The contract is strictly fire-and-forget:
//! panics raised by a sink are caught and discarded at the single call site
//! in the orchestrator, so auditing can never turn a successful data
//! operation into a failure.

use crate::filter::{Filter, Order, Page};
use crate::value::Value;
use serde::Serialize;
use std::collections::HashMap;

/// One completed operation: original arguments plus result.
///
/// Events borrow from the operation's stack frame, so recording is
/// allocation-free unless the sink chooses to serialize.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum AuditEvent<'a> {
    SelectList {
        table: &'a str,
        shard: Option<u32>,
        filters: &'a [Filter],
        orders: &'a [Order],
        page: Option<&'a Page>,
        result: &'a [HashMap<String, Value>],
    },
    SelectOne {
        table: &'a str,
        shard: Option<u32>,
        filters: &'a [Filter],
        orders: &'a [Order],
        result: Option<&'a HashMap<String, Value>>,
    },
    SelectOneByKey {
        table: &'a str,
        shard: Option<u32>,
        key_value: &'a Value,
        key_name: Option<&'a str>,
        result: Option<&'a HashMap<String, Value>>,
    },
    SelectCount {
        table: &'a str,
        shard: Option<u32>,
        filters: &'a [Filter],
        result: i64,
    },
    CheckExist {
        table: &'a str,
        shard: Option<u32>,
        filters: &'a [Filter],
        result: bool,
    },
    Insert {
        table: &'a str,
        shard: Option<u32>,
        values: &'a HashMap<String, Value>,
        affected: u64,
    },
    BatchInsert {
        table: &'a str,
        shard: Option<u32>,
        rows: usize,
        affected: u64,
    },
    Update {
        table: &'a str,
        shard: Option<u32>,
        sets: &'a [String],
        set_values: &'a [(String, Value)],
        filters: &'a [Filter],
        affected: u64,
    },
    UpdateByKey {
        table: &'a str,
        shard: Option<u32>,
        key_value: &'a Value,
        key_name: Option<&'a str>,
        sets: &'a [String],
        set_values: &'a [(String, Value)],
        affected: u64,
    },
    BatchUpdate {
        table: &'a str,
        shard: Option<u32>,
        sets: &'a [String],
        set_names: &'a [String],
        key_name: Option<&'a str>,
        rows: usize,
        affected: &'a [u64],
    },
    Delete {
        table: &'a str,
        shard: Option<u32>,
        filters: &'a [Filter],
        affected: u64,
    },
    DeleteByKey {
        table: &'a str,
        shard: Option<u32>,
        key_value: &'a Value,
        key_name: Option<&'a str>,
        affected: u64,
    },
}

/// Receives operation events after they complete.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent<'_>);
}

/// Default sink: emits events as JSON through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent<'_>) {
        match serde_json::to_string(event) {
            Ok(payload) => tracing::debug!(target: "pgtpl.audit", %payload),
            Err(_) => tracing::debug!(target: "pgtpl.audit", ?event),
        }
    }
}
