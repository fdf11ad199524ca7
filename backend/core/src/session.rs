use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::types::{DocumentType, FieldSet};

/// Extracted fields for every document a user has uploaded, in upload
/// order.
///
/// Accumulates across distinct document types; uploading a type that is
/// already present replaces its whole field set but keeps its slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionRecord {
    documents: Vec<(DocumentType, FieldSet)>,
}

impl SessionRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the fields for a document type. Returns the replaced set.
    pub fn insert(&mut self, doc_type: DocumentType, fields: FieldSet) -> Option<FieldSet> {
        match self.documents.iter_mut().find(|(t, _)| *t == doc_type) {
            Some((_, existing)) => Some(std::mem::replace(existing, fields)),
            None => {
                self.documents.push((doc_type, fields));
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn document_types(&self) -> impl Iterator<Item = &DocumentType> {
        self.documents.iter().map(|(t, _)| t)
    }

    /// Fold every document's fields in upload order; later documents win
    /// on key collisions. Computed fresh on each call.
    pub fn consolidate(&self) -> FieldSet {
        self.documents
            .iter()
            .fold(FieldSet::new(), |mut acc, (_, fields)| {
                acc.merge_from(fields);
                acc
            })
    }
}

impl Serialize for SessionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.documents.len()))?;
        for (doc_type, fields) in &self.documents {
            map.serialize_entry(doc_type.tag(), fields)?;
        }
        map.end()
    }
}
