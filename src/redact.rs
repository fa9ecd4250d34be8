use std::borrow::Cow;

const REDACTED: &str = "REDACTED";

/// Replaces every occurrence of `ticket` (raw or URL-encoded) with a marker.
///
/// Transport errors echo the request URL, and the redemption URL carries the
/// ticket in its path.
pub fn redact_ticket<'a>(input: &'a str, ticket: &str) -> Cow<'a, str> {
    let ticket = ticket.trim();
    if ticket.is_empty() {
        return Cow::Borrowed(input);
    }

    let mut redacted = Cow::Borrowed(input);
    let encoded = urlencoding::encode(ticket);
    for needle in [ticket, encoded.as_ref()] {
        if redacted.contains(needle) {
            redacted = Cow::Owned(redacted.replace(needle, REDACTED));
        }
    }
    redacted
}

fn is_token_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' || ch == '.' || ch == '%'
}

fn redact_after(text: String, marker: &str) -> String {
    if !text.contains(marker) {
        return text;
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();
    while let Some(idx) = rest.find(marker) {
        out.push_str(&rest[..idx + marker.len()]);
        rest = &rest[idx + marker.len()..];

        let consumed: usize = rest
            .chars()
            .take_while(|ch| is_token_char(*ch))
            .map(char::len_utf8)
            .sum();
        if consumed > 0 {
            out.push_str(REDACTED);
        }
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    out
}

// JWT headers are base64url JSON objects, so they always start with `eyJ`.
fn redact_jwts(text: String) -> String {
    const JWT_PREFIX: &str = "eyJ";
    if !text.contains(JWT_PREFIX) {
        return text;
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();
    while let Some(idx) = rest.find(JWT_PREFIX) {
        let at_boundary = rest[..idx]
            .chars()
            .next_back()
            .map_or(true, |ch| !is_token_char(ch));
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];

        let consumed: usize = rest
            .chars()
            .take_while(|ch| is_token_char(*ch))
            .map(char::len_utf8)
            .sum();
        let candidate = &rest[..consumed];
        if at_boundary && candidate.matches('.').count() >= 2 {
            out.push_str(REDACTED);
        } else {
            out.push_str(candidate);
        }
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    out
}

/// Strips session tokens from text that is about to be logged or shown.
pub fn redact_secrets(input: &str) -> Cow<'_, str> {
    let mut value = input.to_string();

    value = redact_after(value, "access-token=");
    value = redact_after(value, "Authorization: ");
    value = redact_after(value, "authorization: ");
    value = redact_jwts(value);

    if value == input {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(value)
    }
}
