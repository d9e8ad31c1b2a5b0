use std::sync::LazyLock;

use regex::Regex;

static ECHOED_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)read the following.*?content to summarize:").expect("Invalid regex")
});
static STUB_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*\(stub\)\s*").expect("Invalid regex"));
// The echoed instruction may itself contain `':`, so the echo only ends at the
// `':` that closes its line and is followed by a blank line.
static RESPONSE_ECHO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*ai response to '.*?':[ \t]*\r?\n[ \t]*\r?\n\s*").expect("Invalid regex")
});
static PREVIEW_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*summary preview:\s*").expect("Invalid regex"));

fn sanitize_once(raw: &str) -> String {
    let text = ECHOED_PROMPT.replace_all(raw, "");
    let text = STUB_MARKER.replace(&text, "");
    let text = RESPONSE_ECHO.replace(&text, "");
    let text = PREVIEW_LABEL.replace(&text, "");
    text.trim().to_string()
}

/// Strip echoed instructions, stand-in markers and labels from model output.
///
/// Applied until nothing changes, so `sanitize(sanitize(x)) == sanitize(x)`.
pub fn sanitize(raw: &str) -> String {
    let mut current = sanitize_once(raw);
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
