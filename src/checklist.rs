//! Per-city application roadmap with persisted progress

use crate::content::keys::checklist_key;
use crate::content::storage::KeyValueStore;
use crate::prelude::Arc;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecklistItem {
    pub id: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChecklistStage {
    pub title: &'static str,
    pub items: &'static [ChecklistItem],
}

const fn item(id: &'static str, text: &'static str) -> ChecklistItem {
    ChecklistItem { id, text }
}

pub const CHECKLIST_STAGES: &[ChecklistStage] = &[
    ChecklistStage {
        title: "1. Research and decision",
        items: &[
            item("select_uni", "University and programme chosen."),
            item("take_exams", "Required exams (IELTS, TOLC, ...) taken and results received."),
            item("research_scholarships", "Scholarships researched and their requirements noted."),
        ],
    },
    ChecklistStage {
        title: "2. Application documents",
        items: &[
            item("prepare_sop", "Statement of purpose written."),
            item("update_cv", "CV updated."),
            item("get_references", "Reference letters requested and received."),
            item("check_passport", "Passport valid for at least one more year."),
        ],
    },
    ChecklistStage {
        title: "3. University application",
        items: &[
            item("universitaly_preapp", "Pre-application submitted on Universitaly."),
            item("uni_portal_app", "Application completed on the university's own portal."),
            item("pay_fee", "Application fee paid."),
            item("get_acceptance", "Letter of acceptance received."),
        ],
    },
    ChecklistStage {
        title: "4. Equivalence and visa",
        items: &[
            item("apply_dov", "Dichiarazione di Valore requested for the diploma."),
            item("book_visa_appointment", "Visa appointment booked."),
            item("gather_visa_docs", "Visa documents gathered (accommodation, proof of funds, ...)."),
            item("apply_visa", "Visa application submitted."),
        ],
    },
    ChecklistStage {
        title: "5. Getting ready for Italy",
        items: &[
            item("buy_ticket", "Flight booked."),
            item("book_accommodation", "Temporary accommodation arranged for the first weeks."),
            item("prepare_permesso_docs", "Documents for the Permesso di Soggiorno prepared."),
            item("get_tax_code", "Codice Fiscale prepared."),
        ],
    },
];

fn is_known_item(id: &str) -> bool {
    CHECKLIST_STAGES
        .iter()
        .flat_map(|stage| stage.items.iter())
        .any(|item| item.id == id)
}

pub fn total_items() -> usize {
    CHECKLIST_STAGES.iter().map(|stage| stage.items.len()).sum()
}

/// Checked items for one city
pub struct Checklist {
    city_id: String,
    checked: BTreeSet<String>,
    store: Arc<dyn KeyValueStore>,
}

impl Checklist {
    /// Loads saved progress; unreadable or unknown entries are ignored
    pub fn load(store: Arc<dyn KeyValueStore>, city_id: impl Into<String>) -> Self {
        let city_id = city_id.into();
        let key = checklist_key(&city_id);

        let checked = match store.get(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(ids) => ids.into_iter().filter(|id| is_known_item(id)).collect(),
                Err(err) => {
                    log::debug!("ignoring unreadable checklist {key}: {err}");
                    BTreeSet::new()
                }
            },
            Ok(None) => BTreeSet::new(),
            Err(err) => {
                log::warn!("failed to read checklist {key}: {err}");
                BTreeSet::new()
            }
        };

        Self {
            city_id,
            checked,
            store,
        }
    }

    pub fn city_id(&self) -> &str {
        &self.city_id
    }

    pub fn is_checked(&self, item_id: &str) -> bool {
        self.checked.contains(item_id)
    }

    pub fn checked_count(&self) -> usize {
        self.checked.len()
    }

    /// Flips an item and saves. Returns the new state; unknown ids stay
    /// unchecked.
    pub fn toggle(&mut self, item_id: &str) -> bool {
        if !is_known_item(item_id) {
            return false;
        }
        let now_checked = if self.checked.remove(item_id) {
            false
        } else {
            self.checked.insert(item_id.to_string());
            true
        };
        self.save();
        now_checked
    }

    /// Share of checked items, 0 to 100
    pub fn progress(&self) -> f64 {
        let total = total_items();
        if total == 0 {
            0.0
        } else {
            self.checked.len() as f64 / total as f64 * 100.0
        }
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress().round() as u8
    }

    fn save(&self) {
        let key = checklist_key(&self.city_id);
        let result = serde_json::to_string(&self.checked)
            .map_err(crate::Error::from)
            .and_then(|raw| self.store.set(&key, &raw));
        if let Err(err) = result {
            log::warn!("failed to save checklist {key}: {err}");
        }
    }
}

impl std::fmt::Debug for Checklist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checklist")
            .field("city_id", &self.city_id)
            .field("checked", &self.checked)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::storage::MemoryStore;

    #[test]
    fn test_stage_layout() {
        assert_eq!(CHECKLIST_STAGES.len(), 5);
        assert_eq!(total_items(), 19);
    }

    #[test]
    fn test_toggle_persists_per_city() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut milan = Checklist::load(store.clone(), "milan");

        assert!(milan.toggle("select_uni"));
        assert!(milan.toggle("apply_visa"));
        assert!(!milan.toggle("select_uni"));
        assert!(!milan.toggle("not_an_item"));

        let reloaded = Checklist::load(store.clone(), "milan");
        assert!(reloaded.is_checked("apply_visa"));
        assert!(!reloaded.is_checked("select_uni"));
        assert_eq!(reloaded.progress_percent(), 5);

        assert_eq!(Checklist::load(store, "rome").checked_count(), 0);
    }

    #[test]
    fn test_corrupt_entry_starts_empty() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        store.set("checklist_pisa", "{oops").unwrap();
        store.set("checklist_siena", r#"["pay_fee","gone"]"#).unwrap();

        assert_eq!(Checklist::load(store.clone(), "pisa").checked_count(), 0);
        assert_eq!(Checklist::load(store, "siena").checked_count(), 1);
    }
}
