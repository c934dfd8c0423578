//! Named views over listing rows
//!
//! Raw rows are positional; these views pin the positions in one place so
//! nothing downstream indexes cells directly. Top-level rows carry the
//! display name in column 0 and the detail link in column 3; detail rows
//! carry the folder prefix, file name and download link in columns 0, 1
//! and 4.

/// One top-level "game" entry in the remote storage listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub display_name: String,
    pub detail_url: String,
}

impl RemoteEntry {
    pub fn from_row(row: &[String]) -> Option<Self> {
        let display_name = row.first()?.clone();
        let detail_url = row.get(3)?.clone();
        if display_name.is_empty() || detail_url.is_empty() {
            return None;
        }

        Some(Self {
            display_name,
            detail_url,
        })
    }

    /// Directory name with characters the filesystem rejects removed.
    pub fn directory_name(&self) -> String {
        self.display_name.replace([':', '!', '?'], "")
    }
}

/// One downloadable file in an entry's detail listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadItem {
    pub prefix: String,
    pub file_name: String,
    pub source_url: String,
}

impl DownloadItem {
    pub fn from_row(row: &[String]) -> Option<Self> {
        let prefix = row.first()?.clone();
        let file_name = row.get(1)?.clone();
        let source_url = row.get(4)?.clone();

        Some(Self {
            prefix,
            file_name,
            source_url,
        })
    }

    /// An empty file name marks a deleted or placeholder row.
    pub fn is_placeholder(&self) -> bool {
        self.file_name.is_empty()
    }

    /// File name on disk: prefix joined with `%`, path separators replaced
    /// so nested remote paths stay inside the entry directory.
    pub fn target_file_name(&self) -> String {
        let name = if self.prefix.is_empty() {
            self.file_name.clone()
        } else {
            format!("{}%{}", self.prefix, self.file_name)
        };

        name.replace(['/', '\\'], "@")
    }
}
