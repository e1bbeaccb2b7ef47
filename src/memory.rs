//! # In-Memory Records
//!
//! A process-local row store implementing [`Record`].
//!
//! Every row holds the stored codes of its fields, a modification timestamp
//! and its own lock for the exclusive section. Handles opened on the same row
//! share all of it, so two handles (typically on two threads) race for a
//! transition exactly like two database connections racing for a row lock.
//!
//! All locks are `parking_lot` and never held across a hook that could
//! re-enter the same row's lock.

use crate::core::{Arguments, StateCode};
use crate::host::{Host, Record, TransitionReport};
use crate::runtime::{HookError, MachineError};
use crate::schema::HostInterface;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Row {
    /// Held for the duration of an exclusive section.
    section: Mutex<()>,
    fields: RwLock<HashMap<String, StateCode>>,
    modified: RwLock<Modification>,
}

#[derive(Clone, Copy, Debug, Default)]
struct Modification {
    updated_at: Option<DateTime<Utc>>,
    count: u64,
}

/// Thread-safe, cloneable row store.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    rows: Arc<RwLock<HashMap<Uuid, Arc<Row>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new row with the given field values and return its id.
    pub fn insert<I, S>(&self, fields: I) -> Uuid
    where
        I: IntoIterator<Item = (S, StateCode)>,
        S: Into<String>,
    {
        let id = Uuid::new_v4();
        let row = Row {
            fields: RwLock::new(
                fields
                    .into_iter()
                    .map(|(field, code)| (field.into(), code))
                    .collect(),
            ),
            ..Row::default()
        };
        self.rows.write().insert(id, Arc::new(row));
        id
    }

    /// Open a handle on row `id` for `host`.
    pub fn open<H: Host>(&self, id: Uuid, host: H) -> Option<MemoryRecord<H>> {
        let row = Arc::clone(self.rows.read().get(&id)?);
        Some(MemoryRecord { id, host, row })
    }

    /// Stored code of `field` on row `id`, read outside any section.
    pub fn value(&self, id: Uuid, field: &str) -> Option<StateCode> {
        let rows = self.rows.read();
        let row = rows.get(&id)?;
        let value = row.fields.read().get(field).copied();
        value
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

/// A host value bound to one row of a [`MemoryStore`].
#[derive(Debug)]
pub struct MemoryRecord<H> {
    id: Uuid,
    host: H,
    row: Arc<Row>,
}

impl<H> MemoryRecord<H> {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Store `code` directly, bypassing every machine.
    pub fn set(&self, field: impl Into<String>, code: StateCode) {
        self.row.fields.write().insert(field.into(), code);
    }

    /// When a transition last committed on this row.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.row.modified.read().updated_at
    }

    /// Number of committed modifications on this row.
    pub fn modifications(&self) -> u64 {
        self.row.modified.read().count
    }
}

impl<H: Host> Host for MemoryRecord<H> {
    fn interface() -> HostInterface {
        H::interface()
    }

    fn invoke(&mut self, hook: &str, args: &Arguments) -> Result<(), HookError> {
        self.host.invoke(hook, args)
    }

    fn on_successful_transition(&mut self, report: &TransitionReport<'_>) -> Result<(), HookError> {
        self.host.on_successful_transition(report)
    }

    fn on_failed_transition(&mut self, report: &TransitionReport<'_>) -> Result<(), HookError> {
        self.host.on_failed_transition(report)
    }
}

impl<H: Host> Record for MemoryRecord<H> {
    fn read(&self, field: &str) -> Option<StateCode> {
        self.row.fields.read().get(field).copied()
    }

    fn write(&mut self, field: &str, code: StateCode) -> Result<(), HookError> {
        self.row.fields.write().insert(field.to_string(), code);
        Ok(())
    }

    fn mark_modified(&mut self) -> Result<(), HookError> {
        let mut modified = self.row.modified.write();
        modified.updated_at = Some(Utc::now());
        modified.count += 1;
        Ok(())
    }

    fn with_exclusive_section<T, F>(&mut self, body: F) -> Result<T, MachineError>
    where
        F: FnOnce(&mut Self) -> Result<T, MachineError>,
    {
        let row = Arc::clone(&self.row);
        let _section = row.section.lock();
        body(self)
    }

    fn identity(&self) -> String {
        format!("{}#{}", H::interface().type_name(), self.id)
    }
}
