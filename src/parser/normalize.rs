/// Mis-decoded UTF-8 punctuation as it comes out of the PDF text layer.
/// Longer sequences come first so a prefix never shadows them.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("Ã¢â‚¬â€œ", "-"),
    ("Ã¢â‚¬â€", "-"),
    ("â€™", "'"),
    ("â€˜", "'"),
    ("â€œ", "\""),
    ("â€”", "-"),
    ("â€“", "-"),
    ("â€", "\""),
    ("—", "-"),
    ("–", "-"),
    ("‒", "-"),
    ("’", "'"),
    ("‘", "'"),
    ("“", "\""),
    ("”", "\""),
    ("Â", ""),
    ("\u{feff}", ""),
    ("\u{00ad}", ""),
    ("\u{a0}", " "),
    ("\u{2009}", " "),
    ("\u{202f}", " "),
];

/// Clean one line of extracted page text. Idempotent; empty for blank input.
pub fn normalize(raw: &str) -> String {
    let mut text: String = raw
        .chars()
        .filter(|c| !c.is_control() || c.is_whitespace())
        .collect();

    // A removal can splice a new sequence together ("âÂ€”"), so run to a fixed point.
    loop {
        let next = REPLACEMENTS
            .iter()
            .fold(text.clone(), |acc, (bad, good)| acc.replace(bad, good));
        if next == text {
            break;
        }
        text = next;
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split raw page text into normalized, non-empty lines.
pub fn page_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(normalize)
        .filter(|l| !l.is_empty())
        .collect()
}
