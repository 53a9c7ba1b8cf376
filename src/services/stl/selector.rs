use std::collections::HashSet;

use super::known_files::MeshAllowList;

/// Entries to extract, in allow-list order.
///
/// A name is kept when it is allow-listed, present in the archive and, if
/// `requested` is non-empty, also requested. Requested names outside the
/// allow-list never get through.
pub fn select_entries(
    allow_list: &MeshAllowList,
    archive_names: &HashSet<String>,
    requested: &[String],
) -> Vec<String> {
    allow_list
        .names()
        .iter()
        .filter(|name| requested.is_empty() || requested.contains(name))
        .filter(|name| archive_names.contains(*name))
        .cloned()
        .collect()
}
