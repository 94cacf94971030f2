//! Tolerant extraction of a JSON object from free-form model output.

/// Return the first balanced `{...}` region of `raw`.
///
/// Model output often wraps the object in prose or code fences, so this scans
/// for brace depth instead of tokenizing. Inside a candidate region,
/// double-quoted strings (with backslash escapes) do not affect the depth. A
/// `}` seen before any `{` is ignored.
pub fn extract_json_segment(raw: &str) -> Option<&str> {
    let mut start = 0;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in raw.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=i]);
                }
            }
            _ => {}
        }
    }

    None
}
