use super::model::InstructionDocument;
use std::collections::HashMap;

/// Instruction documents keyed by owning card id.
///
/// Built once per load and replaced wholesale on the next one, so ids that
/// disappeared from the document never linger.
#[derive(Debug, Clone, Default)]
pub struct InstructionIndex {
    docs: HashMap<String, InstructionDocument>,
}

impl InstructionIndex {
    /// Later registrations for the same id overwrite earlier ones.
    pub fn insert(&mut self, card_id: String, doc: InstructionDocument) {
        if self.docs.insert(card_id.clone(), doc).is_some() {
            tracing::debug!("Instruction for card '{}' overwritten by a later card", card_id);
        }
    }

    pub fn get(&self, card_id: &str) -> Option<&InstructionDocument> {
        self.docs.get(card_id)
    }

    #[allow(dead_code)]
    pub fn contains(&self, card_id: &str) -> bool {
        self.docs.contains_key(card_id)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
