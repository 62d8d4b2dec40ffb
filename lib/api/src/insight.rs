use segserve_core::canonical_key;

/// Listening segments and what they say about a user
const SEGMENT_INSIGHTS: &[(&str, &str)] = &[
    (
        "light",
        "This user is a casual listener who uses streaming services occasionally. \
         They might benefit from personalized playlists and discovery features to increase engagement.",
    ),
    (
        "casual",
        "This user enjoys music regularly but in moderate amounts. \
         They might respond well to curated content and artist recommendations.",
    ),
    (
        "regular",
        "This user makes streaming part of their daily routine. \
         They likely value both familiar favorites and new discoveries.",
    ),
    (
        "heavy",
        "This user is deeply engaged with music streaming as a significant part of their day. \
         They likely have specific preferences and might be receptive to premium features.",
    ),
    (
        "poweruser",
        "This user is immersed in streaming content and likely uses it throughout various activities. \
         They're ideal candidates for premium tiers and might be influencers among their peers.",
    ),
];

const FALLBACK: &str = "This user has unique streaming habits.";

/// Human-readable description of a predicted segment
///
/// Labels such as `Heavy (2-4h)` or `Power User (>4h)` are matched on their
/// leading segment name.
pub fn insight_for(label: &str) -> &'static str {
    let key = canonical_key(label);
    SEGMENT_INSIGHTS
        .iter()
        .find(|(segment, _)| key.starts_with(segment))
        .map(|(_, text)| *text)
        .unwrap_or(FALLBACK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_segments() {
        assert!(insight_for("Light (<30m)").contains("casual listener"));
        assert!(insight_for("Power User (>4h)").contains("premium tiers"));
        assert!(insight_for("heavy").contains("deeply engaged"));
    }

    #[test]
    fn test_unknown_segment() {
        assert_eq!(insight_for("Premium"), FALLBACK);
        assert_eq!(insight_for(""), FALLBACK);
    }
}
