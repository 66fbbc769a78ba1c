use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::entity::{EntityBase, Note, NoteStatus, Theme};
use crate::error::{NotemateError, Result};
use crate::order::{plan_batch, plan_move, RangeShift};

pub const NOTEMATE_DIR: &str = ".notemate";
const NOTES_DB: &str = "notes.db";

const NOTE_COLUMNS: &str =
    "id, owner, title, content, theme, status, sort_order, created_at, updated_at";

/// Update payload for a note. Rank is deliberately not part of it.
#[derive(Debug, Default, Clone)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub theme: Option<Theme>,
    pub status: Option<NoteStatus>,
}

impl NoteUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.theme.is_none() && self.status.is_none()
    }
}

/// Listing filter. Empty fields match everything.
#[derive(Debug, Default, Clone)]
pub struct NoteFilter {
    pub status: Option<NoteStatus>,
    /// Case-insensitive substring of the title or the content.
    pub query: Option<String>,
}

impl NoteFilter {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.query.as_deref().map_or(true, str::is_empty)
    }

    pub fn matches(&self, note: &Note) -> bool {
        if self.status.is_some_and(|status| note.status != status) {
            return false;
        }
        match self.query.as_deref() {
            None | Some("") => true,
            Some(query) => {
                let needle = query.to_lowercase();
                note.base.title.to_lowercase().contains(&needle)
                    || note.base.content.to_lowercase().contains(&needle)
            }
        }
    }
}

/// Note totals per status for one owner.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub active: usize,
    pub archived: usize,
    pub completed: usize,
    pub total: usize,
}

/// SQLite-backed note store. Ranks are scoped by the `owner` column and every
/// multi-row rank change runs inside a single transaction.
pub struct NoteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl NoteStore {
    /// Initialize a new notemate project
    pub fn init(root: &Path) -> Result<Self> {
        let notemate_dir = root.join(NOTEMATE_DIR);

        if notemate_dir.exists() {
            return Err(NotemateError::AlreadyInitialized);
        }

        fs::create_dir_all(&notemate_dir)?;
        Self::open_at(notemate_dir.join(NOTES_DB))
    }

    /// Open an existing notemate project
    pub fn open(root: &Path) -> Result<Self> {
        let path = root.join(NOTEMATE_DIR).join(NOTES_DB);

        if !path.exists() {
            return Err(NotemateError::NotInitialized);
        }

        Self::open_at(path)
    }

    /// Throwaway store, used by tests and embedding callers.
    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Connection::open_in_memory()?,
            path: None,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn open_at(path: PathBuf) -> Result<Self> {
        let conn = Connection::open(&path)?;
        let store = Self {
            conn,
            path: Some(path),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Directory holding the database, `None` for in-memory stores.
    pub fn notemate_dir(&self) -> Option<&Path> {
        self.path.as_deref().and_then(Path::parent)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                theme TEXT NOT NULL,
                status TEXT NOT NULL,
                sort_order INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )?;

        // Not UNIQUE: a range shift passes through duplicate ranks mid-statement.
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_notes_owner_order ON notes(owner, sort_order)",
            [],
        )?;

        Ok(())
    }

    // ========================================================================
    // Note lifecycle
    // ========================================================================

    /// Insert a note at the end of its owner's list and return it with the
    /// rank it was given. The rank is computed by the insert statement itself.
    pub fn insert_note(&self, note: &Note) -> Result<Note> {
        let theme = serde_json::to_string(&note.theme)?;

        let order: i64 = self.conn.query_row(
            "INSERT INTO notes
             (id, owner, title, content, theme, status, sort_order, created_at, updated_at)
             SELECT ?1, ?2, ?3, ?4, ?5, ?6, COALESCE(MAX(sort_order) + 1, 0), ?7, ?8
             FROM notes WHERE owner = ?2
             RETURNING sort_order",
            params![
                note.base.id.to_string(),
                note.base.owner,
                note.base.title,
                note.base.content,
                theme,
                note.status.to_string(),
                format_timestamp(&note.base.created_at),
                format_timestamp(&note.base.updated_at),
            ],
            |row| row.get(0),
        )?;

        debug!(owner = %note.base.owner, note_id = %note.base.id, order, "Appended note");

        let mut stored = note.clone();
        stored.order = order;
        Ok(stored)
    }

    /// Get a note by id, scoped to its owner
    pub fn get_note(&self, owner: &str, id: &Uuid) -> Result<Option<Note>> {
        get_note_in(&self.conn, owner, id)
    }

    /// Resolve a note by full id or unique id prefix within an owner's notes.
    pub fn find_note_by_prefix(&self, owner: &str, prefix: &str) -> Result<Option<Note>> {
        if let Ok(id) = prefix.parse::<Uuid>() {
            return self.get_note(owner, &id);
        }

        let mut matches: Vec<Note> = self
            .list_by_owner(owner)?
            .into_iter()
            .filter(|n| n.base.id.to_string().starts_with(prefix))
            .collect();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.pop()),
            n => Err(NotemateError::InvalidInput(format!(
                "id prefix '{}' is ambiguous ({} matches)",
                prefix, n
            ))),
        }
    }

    /// Update title/content/theme/status. Never touches the rank.
    pub fn update_note(&self, owner: &str, id: &Uuid, updates: NoteUpdate) -> Result<Note> {
        let mut note = self
            .get_note(owner, id)?
            .ok_or_else(|| NotemateError::NoteNotFound(id.to_string()))?;

        if let Some(title) = updates.title {
            note.base.title = title;
        }
        if let Some(content) = updates.content {
            note.base.content = content;
        }
        if let Some(theme) = updates.theme {
            note.theme = theme;
        }
        if let Some(status) = updates.status {
            note.status = status;
        }
        note.base.updated_at = Utc::now();

        self.conn.execute(
            "UPDATE notes SET title = ?3, content = ?4, theme = ?5, status = ?6, updated_at = ?7
             WHERE owner = ?1 AND id = ?2",
            params![
                owner,
                id.to_string(),
                note.base.title,
                note.base.content,
                serde_json::to_string(&note.theme)?,
                note.status.to_string(),
                format_timestamp(&note.base.updated_at),
            ],
        )?;

        Ok(note)
    }

    /// Delete a note. The remaining ranks keep their gap.
    pub fn delete_note(&self, owner: &str, id: &Uuid) -> Result<Note> {
        let note = self
            .get_note(owner, id)?
            .ok_or_else(|| NotemateError::NoteNotFound(id.to_string()))?;

        self.conn.execute(
            "DELETE FROM notes WHERE owner = ?1 AND id = ?2",
            params![owner, id.to_string()],
        )?;

        Ok(note)
    }

    // ========================================================================
    // Order queries
    // ========================================================================

    /// All of an owner's notes by ascending rank, newest first among ties.
    pub fn list_by_owner(&self, owner: &str) -> Result<Vec<Note>> {
        select_notes(
            &self.conn,
            "WHERE owner = ?1 ORDER BY sort_order ASC, created_at DESC",
            params![owner],
        )
    }

    /// Notes matching `filter`, still in rank order.
    pub fn list_filtered(&self, owner: &str, filter: &NoteFilter) -> Result<Vec<Note>> {
        let notes = self.list_by_owner(owner)?;
        if filter.is_empty() {
            return Ok(notes);
        }
        Ok(notes.into_iter().filter(|n| filter.matches(n)).collect())
    }

    pub fn count_by_status(&self, owner: &str) -> Result<StatusCounts> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM notes WHERE owner = ?1 GROUP BY status")?;
        let rows = stmt
            .query_map([owner], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            let count = count as usize;
            match status.parse::<NoteStatus>() {
                Ok(NoteStatus::Active) => counts.active += count,
                Ok(NoteStatus::Archived) => counts.archived += count,
                Ok(NoteStatus::Completed) => counts.completed += count,
                Err(e) => return Err(NotemateError::Storage(e)),
            }
            counts.total += count;
        }
        Ok(counts)
    }

    pub fn count(&self, owner: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM notes WHERE owner = ?1",
            [owner],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn find_max_order(&self, owner: &str) -> Result<Option<i64>> {
        find_max_order_in(&self.conn, owner)
    }

    /// Notes with `low <= order <= high`, ascending.
    pub fn find_notes_in_range(&self, owner: &str, low: i64, high: i64) -> Result<Vec<Note>> {
        select_notes(
            &self.conn,
            "WHERE owner = ?1 AND sort_order BETWEEN ?2 AND ?3
             ORDER BY sort_order ASC, created_at DESC",
            params![owner, low, high],
        )
    }

    /// Single-field rank write. Does not resolve collisions.
    pub fn set_order(&self, owner: &str, id: &Uuid, order: i64) -> Result<()> {
        write_order(&self.conn, owner, id, order)
    }

    /// Apply a range shift as one statement.
    pub fn range_shift(&self, owner: &str, shift: &RangeShift) -> Result<usize> {
        apply_range_shift(&self.conn, owner, None, shift)
    }

    // ========================================================================
    // Resequencing
    // ========================================================================

    /// Move one note to `requested`, shifting the notes in between by one.
    ///
    /// The target is clamped into `[0, max rank]`. The shift and the moved
    /// note's write commit together or not at all.
    pub fn move_note(&mut self, owner: &str, id: &Uuid, requested: i64) -> Result<Note> {
        let tx = self.conn.transaction()?;

        let mut note = get_note_in(&tx, owner, id)?
            .ok_or_else(|| NotemateError::NoteNotFound(id.to_string()))?;
        let max_order = find_max_order_in(&tx, owner)?.unwrap_or(note.order);

        let plan = plan_move(note.order, requested, max_order);
        if plan.is_noop() {
            return Ok(note);
        }

        let shifted = match &plan.shift {
            Some(shift) => apply_range_shift(&tx, owner, Some(id), shift)?,
            None => 0,
        };
        write_order(&tx, owner, id, plan.new_order)?;
        tx.commit()?;

        info!(
            owner,
            note_id = %id,
            old_order = plan.old_order,
            new_order = plan.new_order,
            shifted,
            "Moved note"
        );

        note.order = plan.new_order;
        Ok(note)
    }

    /// Give the note at position `i` of `ids` rank `i`.
    ///
    /// `ids` must be exactly the owner's current note set. On any mismatch
    /// nothing is written and the prior order stays intact.
    pub fn apply_ordering(&mut self, owner: &str, ids: &[Uuid]) -> Result<Vec<Note>> {
        let tx = self.conn.transaction()?;

        let current = current_ranks_in(&tx, owner)?;
        let assignments = match plan_batch(&current, ids) {
            Ok(assignments) => assignments,
            Err(e) => {
                warn!(owner, requested = ids.len(), existing = current.len(), error = %e, "Rejected reorder");
                return Err(e);
            }
        };

        for assignment in &assignments {
            write_order(&tx, owner, &assignment.id, assignment.order)?;
        }
        tx.commit()?;

        info!(owner, notes = ids.len(), rewritten = assignments.len(), "Reordered notes");

        self.list_by_owner(owner)
    }

    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn get_note_in(conn: &Connection, owner: &str, id: &Uuid) -> Result<Option<Note>> {
    let sql = format!("SELECT {} FROM notes WHERE owner = ?1 AND id = ?2", NOTE_COLUMNS);
    let note = conn
        .query_row(&sql, params![owner, id.to_string()], note_from_row)
        .optional()?;
    Ok(note)
}

fn find_max_order_in(conn: &Connection, owner: &str) -> Result<Option<i64>> {
    let max: Option<i64> = conn.query_row(
        "SELECT MAX(sort_order) FROM notes WHERE owner = ?1",
        [owner],
        |row| row.get(0),
    )?;
    Ok(max)
}

fn current_ranks_in(conn: &Connection, owner: &str) -> Result<Vec<(Uuid, i64)>> {
    let mut stmt = conn.prepare("SELECT id, sort_order FROM notes WHERE owner = ?1")?;
    let ranks: Vec<(Uuid, i64)> = stmt
        .query_map([owner], |row| Ok((parse_uuid(row, 0)?, row.get(1)?)))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(ranks)
}

fn write_order(conn: &Connection, owner: &str, id: &Uuid, order: i64) -> Result<()> {
    let changed = conn.execute(
        "UPDATE notes SET sort_order = ?3 WHERE owner = ?1 AND id = ?2",
        params![owner, id.to_string(), order],
    )?;
    if changed == 0 {
        return Err(NotemateError::NoteNotFound(id.to_string()));
    }
    Ok(())
}

fn apply_range_shift(
    conn: &Connection,
    owner: &str,
    exclude: Option<&Uuid>,
    shift: &RangeShift,
) -> Result<usize> {
    let exclude = exclude.map(|id| id.to_string()).unwrap_or_default();
    let changed = conn.execute(
        "UPDATE notes SET sort_order = sort_order + ?4
         WHERE owner = ?1 AND sort_order > ?2 AND sort_order <= ?3 AND id != ?5",
        params![
            owner,
            shift.low_exclusive,
            shift.high_inclusive,
            shift.delta,
            exclude
        ],
    )?;
    Ok(changed)
}

fn select_notes(
    conn: &Connection,
    clause: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Note>> {
    let sql = format!("SELECT {} FROM notes {}", NOTE_COLUMNS, clause);
    let mut stmt = conn.prepare(&sql)?;
    let notes = stmt
        .query_map(params, note_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(notes)
}

fn note_from_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    let theme: String = row.get(4)?;
    let theme: Theme = serde_json::from_str(&theme)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;
    let status: String = row.get(5)?;
    let status: NoteStatus = status.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(5, Type::Text, e.into())
    })?;

    Ok(Note {
        base: EntityBase {
            id: parse_uuid(row, 0)?,
            owner: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            created_at: parse_timestamp(row, 7)?,
            updated_at: parse_timestamp(row, 8)?,
        },
        theme,
        status,
        order: row.get(6)?,
    })
}

fn parse_uuid(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Fixed-width UTC timestamps so `ORDER BY created_at` sorts chronologically.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}
