//! Keyword classification of free-text activity labels.

/// Substrings marking a label as productive work (checked first).
pub const WORK_KEYWORDS: &[&str] = &["работ", "work", "prod", "dev", "проект"];

/// Substrings marking a label as communication.
///
/// `почт` is the Russian counterpart of `mail`; exports label mail time
/// as "Почта".
pub const COMM_KEYWORDS: &[&str] = &["коммун", "comm", "meet", "vks", "mail", "chat", "почт"];

/// Semantic bucket an activity label resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    Work,
    Communication,
    Other,
}

impl ActivityKind {
    /// Classify `label` by case-insensitive substring search.
    ///
    /// Work keywords win over communication keywords, so `"Work meeting"` is
    /// [`ActivityKind::Work`]. Labels matching neither list are
    /// [`ActivityKind::Other`].
    pub fn classify(label: &str) -> Self {
        let lowered = label.to_lowercase();
        if contains_any(&lowered, WORK_KEYWORDS) {
            ActivityKind::Work
        } else if contains_any(&lowered, COMM_KEYWORDS) {
            ActivityKind::Communication
        } else {
            ActivityKind::Other
        }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
