use crate::rule::MatchType;

/// Decide whether a rule's URL condition holds for `url`
///
/// Comparison is on the raw strings, so `is` is sensitive to trailing
/// slashes, query strings and case. Unknown match types never match.
pub fn matches(url: &str, match_type: &MatchType, url_value: &str) -> bool {
    match match_type {
        MatchType::Contains => url.contains(url_value),
        MatchType::Is => url == url_value,
        MatchType::StartsWith => url.starts_with(url_value),
        MatchType::EndsWith => url.ends_with(url_value),
        MatchType::Unknown(_) => false,
    }
}
