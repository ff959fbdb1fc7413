mod markdown;

pub use markdown::{
    ACCOUNT_HEADERS, GENERATED_NOTICE, USER_HEADERS, escape_cell, merge_documents,
    render_accounts_table, render_document, render_users_table,
};

/// A rendered page ready to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    pub title: String,
    pub body: String,
}

/// Title of the single child page written in aggregate mode.
pub const AGGREGATE_TITLE: &str = "AWS Organizations";

/// Filesystem-safe name for a document title. Anything outside
/// `[A-Za-z0-9_-]` becomes `_`, so distinct titles can share a stem.
pub fn file_stem(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "document".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stems_are_filesystem_safe() {
        assert_eq!(file_stem("prod-org"), "prod-org");
        assert_eq!(file_stem("AWS Organizations"), "AWS_Organizations");
        assert_eq!(file_stem("../etc/passwd"), "___etc_passwd");
        assert_eq!(file_stem("   "), "document");
    }

    #[test]
    fn different_titles_can_share_a_stem() {
        assert_eq!(file_stem("prod org"), file_stem("prod_org"));
    }
}
