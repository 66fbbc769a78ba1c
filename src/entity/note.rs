// src/entity/note.rs
use serde::{Deserialize, Serialize};

use super::{EntityBase, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoteStatus {
    #[default]
    Active,
    Archived,
    Completed,
}

impl std::fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NoteStatus::Active => write!(f, "active"),
            NoteStatus::Archived => write!(f, "archived"),
            NoteStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for NoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(NoteStatus::Active),
            "archived" => Ok(NoteStatus::Archived),
            "completed" => Ok(NoteStatus::Completed),
            _ => Err(format!("Invalid note status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    #[serde(flatten)]
    pub base: EntityBase,
    pub theme: Theme,
    pub status: NoteStatus,
    /// Rank among the owner's notes. Assigned by the store, never by callers.
    pub order: i64,
}

impl Note {
    /// A note that has not been stored yet; `order` is filled in on insert.
    pub fn new(owner: String, title: String, content: String) -> Self {
        Self {
            base: EntityBase::new(owner, title, content),
            theme: Theme::default(),
            status: NoteStatus::default(),
            order: 0,
        }
    }

    pub fn short_id(&self) -> String {
        self.base.id.to_string()[..7].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_strings() {
        assert_eq!("Archived".parse::<NoteStatus>().unwrap(), NoteStatus::Archived);
        assert_eq!(NoteStatus::Completed.to_string(), "completed");
        assert!("deleted".parse::<NoteStatus>().is_err());
    }

    #[test]
    fn test_note_serializes_camel_case_and_flat() {
        let note = Note::new("alice".to_string(), "Groceries".to_string(), "milk".to_string());
        let json = serde_json::to_value(&note).unwrap();

        assert_eq!(json["title"], "Groceries");
        assert_eq!(json["owner"], "alice");
        assert_eq!(json["status"], "active");
        assert_eq!(json["order"], 0);
        assert!(json["createdAt"].is_string());
        assert_eq!(json["theme"]["backgroundColor"], "#ffffff");
    }
}
