// SPDX-FileCopyrightText: 2026 Vezha Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MarkdownV2 escaping for the Telegram Bot API.
//!
//! Telegram's MarkdownV2 parse mode requires escaping 18 special
//! characters outside code spans, while characters inside inline code
//! (`` ` ``) or fenced blocks (`` ``` ``) must stay untouched.

/// Characters that must be escaped in MarkdownV2 outside code spans.
const SPECIAL_CHARS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Escapes text for Telegram MarkdownV2 parse mode.
///
/// Code spans are copied verbatim; everything between them is escaped.
/// A stray opening backtick with no close, and the empty inline span
/// ` `` `, are escaped rather than left to break the parser.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    let mut rest = text;

    while let Some(open) = rest.find('`') {
        let fenced = rest[open..].starts_with("```");
        let fence = if fenced { "```" } else { "`" };
        let body_start = open + fence.len();
        match rest[body_start..].find(fence) {
            // An inline close at offset zero would be the empty span "``".
            Some(close) if fenced || close > 0 => {
                escape_segment(&mut out, &rest[..open]);
                let end = body_start + close + fence.len();
                out.push_str(&rest[open..end]);
                rest = &rest[end..];
            }
            _ => {
                escape_segment(&mut out, &rest[..body_start]);
                rest = &rest[body_start..];
            }
        }
    }
    escape_segment(&mut out, rest);
    out
}

fn escape_segment(out: &mut String, segment: &str) {
    for c in segment.chars() {
        if SPECIAL_CHARS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}
