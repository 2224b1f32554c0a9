#[inline]
pub fn is_alphabetic(c: char) -> bool {
    c.is_ascii_alphabetic()
}

#[inline]
pub fn is_numeric(c: char) -> bool {
    c.is_ascii_digit()
}

/// Characters allowed after the first letter of an identifier.
#[inline]
pub fn is_identifier_char(c: char) -> bool {
    is_alphabetic(c) || is_numeric(c) || c == '_'
}

/// Maps the character following a `\` inside a string literal to the character it stands for.
pub fn unescape(c: char) -> Option<char> {
    match c {
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        '0' => Some('\0'),
        'a' => Some('\u{07}'),
        'b' => Some('\u{08}'),
        'f' => Some('\u{0C}'),
        'v' => Some('\u{0B}'),
        '"' => Some('"'),
        '\'' => Some('\''),
        '\\' => Some('\\'),
        _ => None,
    }
}
