use serde::{Deserialize, Serialize};

use boxer_core::{BoxId, Entity, SupplierId, ValueObject};

/// One line item inside a box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    pub po_number: String,
    pub isbn: String,
    pub quantity: u32,
}

impl Content {
    pub fn new(po_number: impl Into<String>, isbn: impl Into<String>, quantity: u32) -> Self {
        Self {
            po_number: po_number.into(),
            isbn: isbn.into(),
            quantity,
        }
    }
}

impl ValueObject for Content {}

/// A finalized box: supplier, identifier and its contents in file order.
///
/// A `BoxRecord` always carries both identifiers; a box that is still being
/// assembled lives inside [`crate::BoxAggregator`] and never escapes it
/// until it is complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxRecord {
    id: BoxId,
    supplier_id: SupplierId,
    contents: Vec<Content>,
}

impl BoxRecord {
    /// Start an empty box for the given header.
    pub fn open(id: BoxId, supplier_id: SupplierId) -> Self {
        Self {
            id,
            supplier_id,
            contents: Vec::new(),
        }
    }

    pub fn with_contents(id: BoxId, supplier_id: SupplierId, contents: Vec<Content>) -> Self {
        Self {
            id,
            supplier_id,
            contents,
        }
    }

    pub fn id_typed(&self) -> &BoxId {
        &self.id
    }

    pub fn supplier_id(&self) -> &SupplierId {
        &self.supplier_id
    }

    pub fn contents(&self) -> &[Content] {
        &self.contents
    }

    /// Total number of units across all content lines.
    pub fn total_quantity(&self) -> u64 {
        self.contents.iter().map(|c| u64::from(c.quantity)).sum()
    }

    pub(crate) fn push(&mut self, content: Content) {
        self.contents.push(content);
    }
}

impl Entity for BoxRecord {
    type Id = BoxId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
