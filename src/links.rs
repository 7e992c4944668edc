use std::sync::OnceLock;

use regex::Regex;

/// Strip the heading (`#`) or block reference (`^`) part of a link target.
pub fn remove_anchors(name: &str) -> &str {
    name.split(['#', '^']).next().unwrap_or(name)
}

/// Targets of the `[[wikilinks]]` in a note, in order of appearance.
/// Aliases (`[[target|alias]]`) are dropped; anchors are kept.
pub fn extract_wikilinks(content: &str) -> Vec<&str> {
    static WIKILINK: OnceLock<Regex> = OnceLock::new();
    let re = WIKILINK.get_or_init(|| {
        Regex::new(r"\[\[([^\]\|\n]+)(?:\|[^\]\n]*)?\]\]").expect("wikilink pattern is valid")
    });
    re.captures_iter(content)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|l| !l.is_empty())
        .collect()
}

/// Links of a note that lead to notes that don't exist.
/// `resolves` tells whether an anchor-free link target points to an existing note.
pub fn non_existing_links<'a, F>(links: &[&'a str], mut resolves: F) -> Vec<&'a str>
where
    F: FnMut(&str) -> bool,
{
    links
        .iter()
        .copied()
        .filter(|link| {
            let target = remove_anchors(link);
            !target.is_empty() && !resolves(target)
        })
        .collect()
}
