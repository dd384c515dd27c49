use crate::values::GuidRepresentation;

pub const DEFAULT_MAX_DOCUMENT_SIZE: usize = 16 * 1024 * 1024;
pub const DEFAULT_MAX_DEPTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderSettings {
    pub guid_representation: GuidRepresentation,
    pub max_document_size: usize,
    pub max_depth: usize,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            guid_representation: GuidRepresentation::default(),
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ReaderSettings {
    pub fn with_guid_representation(mut self, guid_representation: GuidRepresentation) -> Self {
        self.guid_representation = guid_representation;
        self
    }
    pub fn with_max_document_size(mut self, max_document_size: usize) -> Self {
        self.max_document_size = max_document_size;
        self
    }
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterSettings {
    pub guid_representation: GuidRepresentation,
    pub max_document_size: usize,
    pub max_depth: usize,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            guid_representation: GuidRepresentation::default(),
            max_document_size: DEFAULT_MAX_DOCUMENT_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl WriterSettings {
    pub fn with_guid_representation(mut self, guid_representation: GuidRepresentation) -> Self {
        self.guid_representation = guid_representation;
        self
    }
    pub fn with_max_document_size(mut self, max_document_size: usize) -> Self {
        self.max_document_size = max_document_size;
        self
    }
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
