//! Script-filter feedback: the JSON document the launcher renders.

use serde::Serialize;
use uuid::Uuid;

use crate::types::{CardResult, SearchResult};

/// Icon attached to message/error items, bundled with the workflow.
const ERROR_ICON: &str = "./error.png";

/// One display row in the launcher list.
#[derive(Debug, Serialize)]
pub struct Item {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    /// Payload handed to the launcher's action when the row is chosen:
    /// `nid:<id>`, `cid:<id>` or `tag:<name>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
}

#[derive(Debug, Serialize)]
pub struct Icon {
    pub path: String,
}

/// The full feedback document. This crate never emits an empty one: zero
/// matches and failures both render a single explanatory item, so an empty
/// list can only ever mean a bug upstream.
#[derive(Debug, Serialize)]
pub struct Feedback {
    pub items: Vec<Item>,
}

impl Feedback {
    pub fn from_notes(results: &[SearchResult]) -> Self {
        let items = results
            .iter()
            .map(|r| Item {
                uid: Uuid::new_v4().to_string(),
                title: r.title.clone(),
                subtitle: r.subtitle.clone(),
                arg: Some(format!("nid:{}", r.note_id)),
                icon: None,
            })
            .collect();
        Self { items }
    }

    pub fn from_cards(results: &[CardResult]) -> Self {
        let items = results
            .iter()
            .map(|r| Item {
                uid: Uuid::new_v4().to_string(),
                title: r.title.clone(),
                subtitle: r.subtitle.clone(),
                arg: Some(format!("cid:{}", r.card_id)),
                icon: None,
            })
            .collect();
        Self { items }
    }

    pub fn from_tags(tags: &[String]) -> Self {
        let items = tags
            .iter()
            .map(|tag| Item {
                uid: Uuid::new_v4().to_string(),
                title: tag.clone(),
                subtitle: String::new(),
                arg: Some(format!("tag:{tag}")),
                icon: None,
            })
            .collect();
        Self { items }
    }

    /// Single-item document used for "nothing matched" and for every error
    /// path.
    pub fn message(title: &str, subtitle: &str) -> Self {
        Self {
            items: vec![Item {
                uid: Uuid::new_v4().to_string(),
                title: title.to_string(),
                subtitle: subtitle.to_string(),
                arg: None,
                icon: Some(Icon {
                    path: ERROR_ICON.to_string(),
                }),
            }],
        }
    }

    pub fn not_found() -> Self {
        Self::message("Not Found", "Please try another query")
    }

    /// Write the document to `out` as one JSON object.
    pub fn write_to(&self, mut out: impl std::io::Write) -> anyhow::Result<()> {
        serde_json::to_writer(&mut out, self)?;
        out.write_all(b"\n")?;
        Ok(())
    }
}
