/// Strip the wrapping models put around structured replies
///
/// Removes one leading fence line (three or more backticks or tildes, with
/// an optional info string) and its closing fence line, then one leading
/// type tag line such as `json` or `markdown`. Fences inside the body are
/// left alone.
pub fn normalize_response(text: &str) -> &str {
    let mut body = text.trim();

    let opened = match split_first_line(body) {
        Some((first, rest)) if is_fence(first) => {
            body = rest;
            true
        }
        None if is_fence(body) => return "",
        _ => false,
    };

    // A closing fence only counts when an opening one was removed, so a
    // deck ending in its own code block keeps it
    if opened {
        match split_last_line(body) {
            Some((rest, last)) if is_fence(last) => body = rest,
            None if is_fence(body) => return "",
            _ => {}
        }
    }

    body = body.trim();

    match split_first_line(body) {
        Some((first, rest)) if is_type_tag(first) => body = rest,
        None if is_type_tag(body) => return "",
        _ => {}
    }

    body.trim()
}

fn split_first_line(text: &str) -> Option<(&str, &str)> {
    text.split_once('\n')
}

fn split_last_line(text: &str) -> Option<(&str, &str)> {
    text.rsplit_once('\n')
}

fn is_fence(line: &str) -> bool {
    let line = line.trim();
    let marker = match line.chars().next() {
        Some(c @ ('`' | '~')) => c,
        _ => return false,
    };
    let run = line.chars().take_while(|c| *c == marker).count();
    if run < 3 {
        return false;
    }
    // Info string: a single word such as "json"
    let info = line[run..].trim();
    !info.contains(char::is_whitespace) && !info.contains(marker)
}

fn is_type_tag(line: &str) -> bool {
    matches!(
        line.trim().to_ascii_lowercase().as_str(),
        "json" | "markdown" | "md" | "yaml"
    )
}
