use ammonia::Builder;
use std::collections::HashSet;

/// Cleans rich blog content down to a safe HTML subset. Scripts, event
/// handler attributes and `javascript:` links are removed.
pub fn sanitize_post_content(html_input: &str) -> String {
    let tags_to_allow = [
        "h1", "h2", "h3", "h4", "h5", "h6", "b", "strong", "i", "em", "u", "p", "br",
        "a", "ul", "ol", "li", "blockquote", "code", "pre", "hr", "img", "table",
        "thead", "tbody", "tr", "th", "td", "s", "del", "span", "div",
    ];
    let safe_attributes = ["src", "href", "alt", "title", "class", "width", "height", "align"];

    Builder::new()
        .tags(tags_to_allow.iter().copied().collect::<HashSet<_>>())
        .generic_attributes(safe_attributes.iter().copied().collect::<HashSet<_>>())
        .link_rel(Some("nofollow ugc noopener"))
        .clean(html_input)
        .to_string()
}

/// Strips every tag, keeping only the text. Used for titles.
pub fn strip_all_html(input: &str) -> String {
    Builder::new()
        .tags(HashSet::new())
        .clean(input)
        .to_string()
}
