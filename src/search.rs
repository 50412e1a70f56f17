//! Query pipeline: free text in, ordered display rows out.

use thiserror::Error;

use crate::fields::{project, FieldPreference};
use crate::rpc::{NoteBridge, RpcError};
use crate::types::{CardId, CardResult, SearchResult};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Rpc(#[from] RpcError),
    /// The bridge returned a different number of records than requested.
    /// Never recovered silently: truncating or padding would attach titles
    /// to the wrong ids.
    #[error("requested {requested} records but the bridge returned {returned}")]
    ResultMismatch { requested: usize, returned: usize },
}

/// Drives the two-step fetch against the bridge and projects every record
/// through the configured field preferences. Each call re-executes the full
/// pipeline; nothing is kept between invocations.
pub struct Searcher<B> {
    bridge: B,
    prefs: FieldPreference,
}

impl<B: NoteBridge> Searcher<B> {
    pub fn new(bridge: B, prefs: FieldPreference) -> Self {
        Self { bridge, prefs }
    }

    /// Search notes. The store's result order is authoritative and is
    /// preserved end to end. An empty or whitespace-only query means "no
    /// results", not "match everything": Anki would read the empty search
    /// term as a full-collection scan.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let ids = self.bridge.find_notes(query).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let notes = self.bridge.notes_info(&ids).await?;
        if notes.len() != ids.len() {
            return Err(SearchError::ResultMismatch {
                requested: ids.len(),
                returned: notes.len(),
            });
        }

        Ok(notes
            .iter()
            .map(|note| {
                let row = project(&note.fields, &self.prefs);
                SearchResult {
                    title: row.title,
                    subtitle: row.subtitle,
                    note_id: note.note_id,
                }
            })
            .collect())
    }

    /// Search cards. Same pipeline as `search` over the card operations.
    pub async fn search_cards(&self, query: &str) -> Result<Vec<CardResult>, SearchError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let ids = self.bridge.find_cards(query).await?;
        self.cards_info(&ids).await
    }

    /// Look up explicitly given cards, e.g. ids the launcher passes back
    /// from an earlier result row.
    pub async fn cards_info(&self, ids: &[CardId]) -> Result<Vec<CardResult>, SearchError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let cards = self.bridge.cards_info(ids).await?;
        if cards.len() != ids.len() {
            return Err(SearchError::ResultMismatch {
                requested: ids.len(),
                returned: cards.len(),
            });
        }

        Ok(cards
            .iter()
            .map(|card| {
                let row = project(&card.fields, &self.prefs);
                CardResult {
                    title: row.title,
                    subtitle: row.subtitle,
                    card_id: card.card_id,
                }
            })
            .collect())
    }

    /// All tags in the collection, optionally narrowed to those containing
    /// `filter`. Sorted with plain ordinal comparison and deduplicated so
    /// repeated invocations render identically.
    pub async fn list_tags(&self, filter: Option<&str>) -> Result<Vec<String>, SearchError> {
        let mut tags = self.bridge.tags().await?;
        if let Some(needle) = filter {
            tags.retain(|tag| tag.contains(needle));
        }
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    /// Open the host application's card browser on `query`.
    pub async fn open_browser(&self, query: &str) -> Result<(), SearchError> {
        Ok(self.bridge.open_browser(query).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::types::{Card, Note, NoteField, NoteId};

    /// Canned bridge that records every call it receives.
    #[derive(Default)]
    struct FakeBridge {
        note_ids: Vec<NoteId>,
        notes: Vec<Note>,
        card_ids: Vec<CardId>,
        cards: Vec<Card>,
        tags: Vec<String>,
        /// When set, every operation fails with this application error.
        error: Option<String>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl FakeBridge {
        fn record(&self, call: &'static str) -> Result<(), RpcError> {
            self.calls.lock().unwrap().push(call);
            match &self.error {
                Some(message) => Err(RpcError::Application(message.clone())),
                None => Ok(()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl NoteBridge for FakeBridge {
        async fn find_notes(&self, _query: &str) -> Result<Vec<NoteId>, RpcError> {
            self.record("findNotes")?;
            Ok(self.note_ids.clone())
        }

        async fn notes_info(&self, _ids: &[NoteId]) -> Result<Vec<Note>, RpcError> {
            self.record("notesInfo")?;
            Ok(self.notes.clone())
        }

        async fn find_cards(&self, _query: &str) -> Result<Vec<CardId>, RpcError> {
            self.record("findCards")?;
            Ok(self.card_ids.clone())
        }

        async fn cards_info(&self, _ids: &[CardId]) -> Result<Vec<Card>, RpcError> {
            self.record("cardsInfo")?;
            Ok(self.cards.clone())
        }

        async fn tags(&self) -> Result<Vec<String>, RpcError> {
            self.record("getTags")?;
            Ok(self.tags.clone())
        }

        async fn open_browser(&self, _query: &str) -> Result<(), RpcError> {
            self.record("guiBrowse")
        }
    }

    fn note(id: NoteId, front: &str) -> Note {
        let mut fields = HashMap::new();
        fields.insert(
            "Front".to_string(),
            NoteField {
                value: front.to_string(),
                order: 0,
            },
        );
        Note {
            note_id: id,
            model_name: "Basic".to_string(),
            fields,
            tags: Vec::new(),
        }
    }

    fn card(id: CardId, front: &str) -> Card {
        let mut fields = HashMap::new();
        fields.insert(
            "Front".to_string(),
            NoteField {
                value: front.to_string(),
                order: 0,
            },
        );
        Card {
            card_id: id,
            deck_name: "Default".to_string(),
            fields,
            note: 1,
        }
    }

    fn prefs() -> FieldPreference {
        FieldPreference::new(vec!["Front".to_string()], vec!["Back".to_string()])
    }

    #[tokio::test]
    async fn empty_query_yields_nothing_without_touching_the_bridge() {
        let searcher = Searcher::new(FakeBridge::default(), prefs());
        assert!(searcher.search("").await.unwrap().is_empty());
        assert!(searcher.search("  \t ").await.unwrap().is_empty());
        assert!(searcher.search_cards("").await.unwrap().is_empty());
        assert_eq!(searcher.bridge.call_count(), 0);
    }

    #[tokio::test]
    async fn results_preserve_store_order() {
        let bridge = FakeBridge {
            note_ids: vec![3, 1, 2],
            notes: vec![note(3, "c"), note(1, "a"), note(2, "b")],
            ..Default::default()
        };
        let searcher = Searcher::new(bridge, prefs());

        let results = searcher.search("anything").await.unwrap();
        let ids: Vec<NoteId> = results.iter().map(|r| r.note_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(results[0].title, "c");
    }

    #[tokio::test]
    async fn count_mismatch_fails_with_no_partial_results() {
        let bridge = FakeBridge {
            note_ids: vec![1, 2, 3],
            notes: vec![note(1, "a")],
            ..Default::default()
        };
        let searcher = Searcher::new(bridge, prefs());

        match searcher.search("x").await {
            Err(SearchError::ResultMismatch {
                requested: 3,
                returned: 1,
            }) => {}
            other => panic!("expected a mismatch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn card_count_mismatch_fails_too() {
        let bridge = FakeBridge {
            card_ids: vec![10, 20],
            cards: vec![card(10, "a")],
            ..Default::default()
        };
        let searcher = Searcher::new(bridge, prefs());
        assert!(matches!(
            searcher.search_cards("x").await,
            Err(SearchError::ResultMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn bridge_errors_propagate_unchanged() {
        let bridge = FakeBridge {
            error: Some("query is invalid".to_string()),
            ..Default::default()
        };
        let searcher = Searcher::new(bridge, prefs());

        match searcher.search("deck:missing::").await {
            Err(SearchError::Rpc(RpcError::Application(message))) => {
                assert_eq!(message, "query is invalid")
            }
            other => panic!("expected an application error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn tags_sort_ordinal_and_dedup() {
        let bridge = FakeBridge {
            tags: vec![
                "french".to_string(),
                "Anatomy".to_string(),
                "anatomy".to_string(),
                "french".to_string(),
            ],
            ..Default::default()
        };
        let searcher = Searcher::new(bridge, prefs());

        // uppercase sorts before lowercase under ordinal comparison
        let tags = searcher.list_tags(None).await.unwrap();
        assert_eq!(tags, ["Anatomy", "anatomy", "french"]);
    }

    #[tokio::test]
    async fn tag_listing_is_stable_across_invocations() {
        let bridge = FakeBridge {
            tags: vec!["b".to_string(), "a".to_string()],
            ..Default::default()
        };
        let searcher = Searcher::new(bridge, prefs());

        let first = searcher.list_tags(None).await.unwrap();
        let second = searcher.list_tags(None).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, ["a", "b"]);
    }

    #[tokio::test]
    async fn tag_filter_is_a_substring_match() {
        let bridge = FakeBridge {
            tags: vec!["spanish::verbs".to_string(), "french".to_string()],
            ..Default::default()
        };
        let searcher = Searcher::new(bridge, prefs());

        let tags = searcher.list_tags(Some("verb")).await.unwrap();
        assert_eq!(tags, ["spanish::verbs"]);
    }

    #[tokio::test]
    async fn empty_tag_collection_is_not_an_error() {
        let searcher = Searcher::new(FakeBridge::default(), prefs());
        assert!(searcher.list_tags(None).await.unwrap().is_empty());
    }
}
