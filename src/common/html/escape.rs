use aho_corasick::{AhoCorasick, MatchKind};
use once_cell::sync::Lazy;

const ENTITIES: [&str; 6] = ["&lt;", "&gt;", "&amp;", "&quot;", "&#39;", "&apos;"];
const REPLACEMENTS: [&str; 6] = ["<", ">", "&", "\"", "'", "'"];

// Static initialization: automaton is built only once, thread-safe
static HTML_UNESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .match_kind(MatchKind::LeftmostLongest)
        .build(ENTITIES)
        .expect("Failed to build HTML unescaper")
});

/// Unescape the basic HTML entities some producers write into encapsulated HTML.
///
/// Replaces `&lt; &gt; &amp; &quot; &#39; &apos;` in a single left-to-right pass,
/// so replaced text is never rescanned. Unknown or malformed entities are left
/// unchanged.
///
/// # Examples
///
/// ```
/// use compressed_rtf::common::html::unescape_html_entities;
/// assert_eq!(unescape_html_entities("&lt;b&gt;Hi&lt;/b&gt;"), "<b>Hi</b>");
/// assert_eq!(unescape_html_entities("&quot;it&#39;s&apos;"), "\"it's'");
/// assert_eq!(unescape_html_entities("&amp;lt;"), "&lt;"); // single pass
/// assert_eq!(unescape_html_entities("&nbsp;&amp"), "&nbsp;&amp"); // untouched
/// ```
#[inline]
pub fn unescape_html_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_owned();
    }
    HTML_UNESCAPER.replace_all(s, &REPLACEMENTS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities() {
        assert_eq!(unescape_html_entities("plain <b>text</b>"), "plain <b>text</b>");
        assert_eq!(unescape_html_entities(""), "");
    }

    #[test]
    fn test_adjacent_entities() {
        assert_eq!(unescape_html_entities("&lt;&gt;&amp;&amp;"), "<>&&");
        assert_eq!(unescape_html_entities("a&amp;&#39;b"), "a&'b");
    }
}
