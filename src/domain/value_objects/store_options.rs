//! Per-call options applied to a data store

/// Options in force for a single store operation.
///
/// Computed fresh for every call by the stack's options policy and passed
/// explicitly, so nothing carries over from one call to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Section forced on a sectioned store
    pub section: Option<String>,
    /// Reject value writes
    pub data_readonly: bool,
    /// Reject saving the store to its file
    pub file_readonly: bool,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn data_readonly(mut self, readonly: bool) -> Self {
        self.data_readonly = readonly;
        self
    }

    pub fn file_readonly(mut self, readonly: bool) -> Self {
        self.file_readonly = readonly;
        self
    }
}

/// What a stack call intends to do with a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
    Load,
    Save,
}
