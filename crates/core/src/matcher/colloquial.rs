/// Everyday emotion words mapped to the mood ids they hint at. A trigger
/// counts when it appears anywhere in the lower-cased query.
///
/// Ids that are not in the loaded catalog are simply never awarded.
pub(crate) const COLLOQUIAL_HINTS: &[(&str, &[&str])] = &[
    ("good", &["happy", "content", "optimistic"]),
    ("bad", &["sad", "angry", "frustrated"]),
    ("tired", &["burnt-out", "exhausted"]),
    ("scared", &["anxious", "worried"]),
    ("alone", &["lonely", "isolated"]),
    ("fine", &["neutral", "okay"]),
    ("okay", &["neutral", "content"]),
    ("great", &["happy", "excited"]),
    ("terrible", &["sad", "angry"]),
    ("awful", &["sad", "angry"]),
    ("worried", &["anxious", "stressed"]),
    ("stressed", &["anxious", "overwhelmed"]),
];

/// Number of triggers found in `query` that point at `mood_id`.
pub(crate) fn hint_count(query_lower: &str, mood_id: &str) -> u32 {
    COLLOQUIAL_HINTS
        .iter()
        .filter(|(trigger, ids)| query_lower.contains(trigger) && ids.contains(&mood_id))
        .count() as u32
}
