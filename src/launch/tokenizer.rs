/// Split a free-text command line into shell-like tokens.
///
/// Whitespace separates tokens unless it sits inside a `"..."` or `'...'`
/// pair. The quote characters themselves are dropped. A quote preceded by a
/// backslash is kept as a literal character (the backslash is dropped); any
/// other backslash is literal, so Windows paths pass through untouched.
///
/// Never fails: an unterminated quote simply runs to the end of the input.
pub fn tokenize(input: &str) -> Vec<String> {
    let source = input.trim();
    let mut tokens = Vec::new();
    if source.is_empty() {
        return tokens;
    }

    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = source.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.peek() {
                Some(&next) if is_quote(next) => {
                    current.push(next);
                    chars.next();
                }
                _ => current.push(ch),
            }
            continue;
        }

        if is_quote(ch) {
            match quote {
                None => {
                    quote = Some(ch);
                    continue;
                }
                Some(open) if open == ch => {
                    quote = None;
                    continue;
                }
                // The other quote character is literal inside a quoted run
                Some(_) => {}
            }
        }

        if quote.is_none() && ch.is_whitespace() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if !current.is_empty() {
        tokens.push(current);
    }

    tokens
}

fn is_quote(ch: char) -> bool {
    ch == '"' || ch == '\''
}
