//! Validation policy chosen once, when an archive is opened.

use crate::zip::{Appnote, FieldLayout, Legacy};

/// Which [`FieldLayout`] decodes the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LayoutVersion {
    #[default]
    Appnote,
    Legacy,
}

impl LayoutVersion {
    pub fn layout(self) -> &'static dyn FieldLayout {
        match self {
            LayoutVersion::Appnote => &Appnote,
            LayoutVersion::Legacy => &Legacy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveConfig {
    pub layout: LayoutVersion,
    /// Require the file to begin with a local file header signature.
    pub require_local_header_at_start: bool,
    /// Compare local header name bytes with the catalogued name.
    pub cross_check_local_names: bool,
    /// Check length and CRC-32 once an entry stream is drained.
    pub verify_checksums: bool,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            layout: LayoutVersion::Appnote,
            require_local_header_at_start: true,
            cross_check_local_names: true,
            verify_checksums: true,
        }
    }
}

impl ArchiveConfig {
    pub fn with_layout(mut self, layout: LayoutVersion) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_local_header_at_start(mut self, required: bool) -> Self {
        self.require_local_header_at_start = required;
        self
    }

    pub fn with_local_name_check(mut self, enabled: bool) -> Self {
        self.cross_check_local_names = enabled;
        self
    }

    pub fn with_checksums(mut self, enabled: bool) -> Self {
        self.verify_checksums = enabled;
        self
    }

    pub(crate) fn field_layout(&self) -> &'static dyn FieldLayout {
        self.layout.layout()
    }
}
