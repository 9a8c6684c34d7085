use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::model::{BorrowedItem, ChatItem, ChatMessage, PointTransaction, RentalItem, User};

const EMBEDDED_SEED: &str = include_str!("../data/seed.json");

/// The mock dataset the in-memory store starts from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    pub current_user: User,
    pub items: Vec<RentalItem>,
    #[serde(default)]
    pub borrowed_items: Vec<BorrowedItem>,
    #[serde(default)]
    pub chats: Vec<ChatItem>,
    /// Shown for partners without a thread of their own.
    #[serde(default)]
    pub default_thread: Vec<ChatMessage>,
    #[serde(default)]
    pub chat_threads: BTreeMap<String, Vec<ChatMessage>>,
    #[serde(default)]
    pub point_transactions: Vec<PointTransaction>,
}

#[tracing::instrument]
pub fn embedded() -> anyhow::Result<Seed> {
    let seed: Seed =
        serde_json::from_str(EMBEDDED_SEED).context("failed parsing embedded seed dataset")?;
    check(&seed)?;
    Ok(seed)
}

/// Reads `path` when given, the embedded dataset otherwise.
#[tracing::instrument(skip(path))]
pub fn load(path: Option<&Path>) -> anyhow::Result<Seed> {
    let Some(path) = path else {
        debug!("using embedded seed dataset");
        return embedded();
    };

    info!(file = %path.display(), "loading seed dataset");
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    let seed: Seed = serde_json::from_str(&raw)
        .with_context(|| format!("failed parsing seed file {}", path.display()))?;
    check(&seed)?;
    Ok(seed)
}

fn check(seed: &Seed) -> anyhow::Result<()> {
    let mut ids = BTreeSet::new();
    for item in &seed.items {
        if !ids.insert(item.id.as_str()) {
            return Err(anyhow!("duplicate item id in seed: {}", item.id));
        }
    }

    for borrowed in &seed.borrowed_items {
        if !ids.contains(borrowed.item_id.as_str()) {
            warn!(item_id = %borrowed.item_id, "borrowed entry refers to unknown item");
        }
    }
    for chat in &seed.chats {
        if !ids.contains(chat.related_item_id.as_str()) {
            warn!(
                partner = %chat.partner_name,
                item_id = %chat.related_item_id,
                "chat refers to unknown item"
            );
        }
    }

    debug!(
        items = seed.items.len(),
        borrowed = seed.borrowed_items.len(),
        chats = seed.chats.len(),
        points = seed.point_transactions.len(),
        "seed dataset checked"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn embedded_dataset_parses() {
        let seed = embedded().expect("embedded seed");
        assert_eq!(seed.current_user.id, "jjanggu");
        assert_eq!(seed.items.len(), 6);
        assert_eq!(seed.borrowed_items.len(), 1);
        assert_eq!(seed.default_thread.len(), 5);

        let tent = seed
            .items
            .iter()
            .find(|item| item.id == "3")
            .expect("tent item");
        assert_eq!(tent.available_periods.len(), 2);
        assert_eq!(tent.reserved_times.len(), 1);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut seed = embedded().expect("embedded seed");
        let copy = seed.items[0].clone();
        seed.items.push(copy);

        let mut file = NamedTempFile::new().expect("temp file");
        let json = serde_json::to_string(&seed).expect("serialize seed");
        write!(file, "{json}").expect("write seed");

        let err = load(Some(file.path())).expect_err("duplicate id");
        assert!(err.to_string().contains("duplicate item id"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load(Some(Path::new("/nonexistent/oibillim-seed.json"))).expect_err("missing");
        assert!(format!("{err:#}").contains("oibillim-seed.json"));
    }
}
