//! Parser for RFC 8288 `Link` response headers, as GitHub uses them for
//! pagination: `<https://...?page=2>; rel="next", <https://...?page=9>; rel="last"`.

use std::collections::HashMap;

/// Maps every relation named in `header` to its target URL. Segments without
/// an angle-bracketed target or a `rel` parameter are skipped. When a relation
/// appears twice the first occurrence wins.
pub fn parse_link_header(header: &str) -> HashMap<String, String> {
    let mut links = HashMap::new();

    for segment in split_segments(header) {
        let segment = segment.trim();
        let Some(rest) = segment.strip_prefix('<') else {
            continue;
        };
        let Some((target, params)) = rest.split_once('>') else {
            continue;
        };

        for param in params.split(';') {
            let Some((key, value)) = param.split_once('=') else {
                continue;
            };
            if !key.trim().eq_ignore_ascii_case("rel") {
                continue;
            }
            let value = value.trim().trim_matches('"');
            for rel in value.split_whitespace() {
                links
                    .entry(rel.to_ascii_lowercase())
                    .or_insert_with(|| target.trim().to_string());
            }
        }
    }

    links
}

/// Target of the `rel="next"` segment, if any.
pub fn next_link(header: &str) -> Option<String> {
    parse_link_header(header).remove("next")
}

// Commas may appear inside the URL, so only split on commas outside `<...>`.
fn split_segments(header: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, ch) in header.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                segments.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&header[start..]);
    segments
}
