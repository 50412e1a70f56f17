use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// AnkiConnect identifies notes and cards by integers (creation epoch ms).
pub type NoteId = u64;
pub type CardId = u64;

/// One named field of a record: the raw HTML value plus its position in the
/// note type's schema. `order` is the "natural field order" the fallback
/// projection rule scans.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteField {
    pub value: String,
    pub order: u32,
}

/// One note as returned by `notesInfo`. Unknown wire members are ignored so
/// newer AnkiConnect releases keep decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub note_id: NoteId,
    #[serde(default)]
    pub model_name: String,
    pub fields: HashMap<String, NoteField>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One card as returned by `cardsInfo`. Cards carry the same field mapping
/// shape as notes, so both go through the same projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub card_id: CardId,
    #[serde(default)]
    pub deck_name: String,
    pub fields: HashMap<String, NoteField>,
    /// Id of the owning note.
    #[serde(default)]
    pub note: NoteId,
}

/// One display row projected from a note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub subtitle: String,
    pub note_id: NoteId,
}

/// One display row projected from a card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardResult {
    pub title: String,
    pub subtitle: String,
    pub card_id: CardId,
}
