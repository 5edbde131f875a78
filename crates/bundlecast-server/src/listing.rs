//! HTML directory listings.

use crate::index::{FileRecord, Listing};

/// Render a directory's entries as a minimal HTML page.
///
/// Directories sort before files, then by name; directory links keep a
/// trailing slash so relative navigation works.
pub fn render(path: &str, version: &str, listing: &Listing) -> String {
    let mut entries: Vec<&FileRecord> = listing.dirs.iter().chain(&listing.files).collect();
    entries.sort_by(|l, r| {
        r.is_dir()
            .cmp(&l.is_dir())
            .then_with(|| l.basename.cmp(&r.basename))
    });

    let mut body = format!("<!DOCTYPE html>\n<body>\n  <h1>{}</h1>\n", escape(path));
    for entry in entries {
        let suffix = if entry.is_dir() { "/" } else { "" };
        body.push_str(&format!(
            "  <p>\n    <a href=\"/{}/{}{}\">{}{}</a>\n  </p>\n",
            escape(version),
            escape(&entry.path),
            suffix,
            escape(&entry.basename),
            suffix,
        ));
    }
    body.push_str("</body>\n");
    body
}

/// Escape everything but alphanumerics and spaces as numeric entities.
pub fn escape(text: &str) -> String {
    text.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == ' ' {
                c.to_string()
            } else {
                format!("&#{};", c as u32)
            }
        })
        .collect()
}
