/// Renders a fully-qualified name in source form, e.g. `a::b::C`.
pub fn fq_name(name: &[String]) -> String {
    name.join("::")
}

/// Wraps text in backticks for error messages.
pub fn quote(text: &str) -> String {
    format!("`{}`", text)
}

/// Strips `/** ... */` delimiters and leading `*` gutters from a doc comment,
/// returning its non-empty-bounded lines.
pub fn doc_lines(doc: &str) -> Vec<String> {
    let body = doc
        .trim()
        .trim_start_matches("/**")
        .trim_end_matches("*/");

    let mut lines: Vec<String> = body
        .lines()
        .map(|line| {
            let line = line.trim();
            let line = line.strip_prefix('*').unwrap_or(line);
            line.strip_prefix(' ').unwrap_or(line).trim_end().to_string()
        })
        .collect();

    while lines.first().map_or(false, |l| l.is_empty()) {
        lines.remove(0);
    }
    while lines.last().map_or(false, |l| l.is_empty()) {
        lines.pop();
    }
    lines
}
