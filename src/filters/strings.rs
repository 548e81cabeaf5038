//! Scalar string filters.
//!
//! Every filter here renders its input to text first; an absent input
//! stays absent rather than becoming the empty string, so downstream
//! filters can still distinguish the two.

use lazy_static::lazy_static;
use regex::Regex;

use crate::compat::Gate;
use crate::context::RenderContext;
use crate::error::FilterResult;
use crate::value::Value;

lazy_static! {
    /// Script, style and comment blocks are removed whole before the
    /// generic tag pass, so their text content does not leak through.
    static ref HTML_BLOCKS: Regex =
        Regex::new(r"(?is)<script.*?</script>|<!--.*?-->|<style.*?</style>").unwrap();
    static ref HTML_TAGS: Regex = Regex::new(r"(?s)<.*?>").unwrap();
    static ref NEWLINE: Regex = Regex::new(r"\r?\n").unwrap();
    /// A character entity: named or numeric.
    static ref ENTITY: Regex = Regex::new(r"^(?:[a-zA-Z]+|#[0-9]+);").unwrap();
}

pub fn downcase(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    Ok(Value::Str(input.to_string().to_lowercase()))
}

pub fn upcase(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    Ok(Value::Str(input.to_string().to_uppercase()))
}

/// Sentence-style capitalization. Leading whitespace survives and the
/// first letter is upcased at every level; the modern behavior
/// additionally lowercases the remainder.
pub fn capitalize(ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    let s = input.to_string();
    let body = s.trim_start();
    let lead = &s[..s.len() - body.len()];
    let mut out = lead.to_string();
    let mut chars = body.chars();
    if let Some(c) = chars.next() {
        out.extend(c.to_uppercase());
        let rest = chars.as_str();
        if ctx.level.is_modern(Gate::Capitalize) {
            out.push_str(&rest.to_lowercase());
        } else {
            out.push_str(rest);
        }
    }
    Ok(Value::Str(out))
}

pub fn strip(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    Ok(Value::Str(input.to_string().trim().to_string()))
}

pub fn lstrip(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    Ok(Value::Str(input.to_string().trim_start().to_string()))
}

pub fn rstrip(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    Ok(Value::Str(input.to_string().trim_end().to_string()))
}

fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    Ok(Value::Str(escape_str(&input.to_string())))
}

/// Escape markup without double-escaping ampersands that already start an
/// entity.
pub fn escape_once(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    let s = input.to_string();
    let mut out = String::with_capacity(s.len());
    let mut rest = s.as_str();
    while let Some(i) = rest.find(|c: char| matches!(c, '&' | '<' | '>' | '"' | '\'')) {
        out.push_str(&rest[..i]);
        let c = rest[i..].chars().next().unwrap_or_default();
        let after = &rest[i + c.len_utf8()..];
        if c == '&' && ENTITY.is_match(after) {
            out.push('&');
        } else {
            out.push_str(&escape_str(&c.to_string()));
        }
        rest = after;
    }
    out.push_str(rest);
    Ok(Value::Str(out))
}

pub fn strip_html(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    let s = input.to_string();
    let without_blocks = HTML_BLOCKS.replace_all(&s, "");
    Ok(Value::Str(HTML_TAGS.replace_all(&without_blocks, "").into_owned()))
}

pub fn strip_newlines(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    Ok(Value::Str(
        NEWLINE.replace_all(&input.to_string(), "").into_owned(),
    ))
}

/// Insert a break element before each newline; the newline itself stays.
pub fn newline_to_br(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    Ok(Value::Str(
        NEWLINE
            .replace_all(&input.to_string(), "<br />$0")
            .into_owned(),
    ))
}

/// Truncate to a character budget; the suffix counts against the budget.
pub fn truncate(_ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    let s = input.to_string();
    let length = args.first().and_then(Value::to_integer).unwrap_or(50);
    let suffix = args.get(1).map(|v| v.to_string()).unwrap_or_else(|| "...".to_string());
    let chars: Vec<char> = s.chars().collect();
    if (chars.len() as i64) <= length {
        return Ok(Value::Str(s));
    }
    let keep = (length - suffix.chars().count() as i64).max(0) as usize;
    let mut out: String = chars[..keep.min(chars.len())].iter().collect();
    out.push_str(&suffix);
    Ok(Value::Str(out))
}

/// Keep the first N whitespace-separated words. A non-positive word count
/// keeps one word; whitespace runs collapse when truncation happens.
pub fn truncatewords(_ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    let s = input.to_string();
    let words = args
        .first()
        .and_then(Value::to_integer)
        .unwrap_or(15)
        .max(1) as usize;
    let suffix = args.get(1).map(|v| v.to_string()).unwrap_or_else(|| "...".to_string());
    let split: Vec<&str> = s.split_ascii_whitespace().collect();
    if split.len() <= words {
        return Ok(Value::Str(s));
    }
    let mut out = split[..words].join(" ");
    out.push_str(&suffix);
    Ok(Value::Str(out))
}

/// Split on a literal separator, dropping empty pieces. The empty
/// separator splits into individual characters.
pub fn split(ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return if ctx.level.is_modern(Gate::SplitNil) {
            Ok(Value::Array(vec![]))
        } else {
            Ok(Value::Nil)
        };
    }
    let s = input.to_string();
    let pattern = args[0].to_string();
    let pieces: Vec<Value> = if pattern.is_empty() {
        s.chars().map(|c| Value::Str(c.to_string())).collect()
    } else {
        s.split(&pattern)
            .filter(|piece| !piece.is_empty())
            .map(Value::from)
            .collect()
    };
    Ok(Value::Array(pieces))
}

/// Replace every occurrence of a literal search string.
///
/// The search text has no pattern-language meaning at any compatibility
/// level; the old engine's pattern branch could not match anything a
/// literal scan would miss.
pub fn replace(_ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    let s = input.to_string();
    let search = args[0].to_string();
    let replacement = args.get(1).map(|v| v.to_string()).unwrap_or_default();
    if search.is_empty() {
        return Ok(Value::Str(s));
    }
    Ok(Value::Str(s.replace(&search, &replacement)))
}

/// Replace the first occurrence. Under modern behavior an empty search
/// term means "at position zero": the replacement is prepended.
pub fn replace_first(ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    let s = input.to_string();
    let search = args[0].to_string();
    let replacement = args.get(1).map(|v| v.to_string()).unwrap_or_default();
    if search.is_empty() {
        if ctx.level.is_modern(Gate::EmptySearchTerm) {
            return Ok(Value::Str(format!("{}{}", replacement, s)));
        }
        return Ok(Value::Str(s));
    }
    match s.find(&search) {
        Some(pos) => {
            let mut out = String::with_capacity(s.len());
            out.push_str(&s[..pos]);
            out.push_str(&replacement);
            out.push_str(&s[pos + search.len()..]);
            Ok(Value::Str(out))
        }
        None => Ok(Value::Str(s)),
    }
}

/// Replace the last occurrence.
pub fn replace_last(_ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    let s = input.to_string();
    let search = args[0].to_string();
    let replacement = args[1].to_string();
    if search.is_empty() {
        return Ok(Value::Str(s));
    }
    match s.rfind(&search) {
        Some(pos) => {
            let mut out = String::with_capacity(s.len());
            out.push_str(&s[..pos]);
            out.push_str(&replacement);
            out.push_str(&s[pos + search.len()..]);
            Ok(Value::Str(out))
        }
        None => Ok(Value::Str(s)),
    }
}

pub fn remove(ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    replace(ctx, input, &[args[0].clone(), Value::from("")])
}

pub fn remove_first(ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    replace_first(ctx, input, &[args[0].clone(), Value::from("")])
}

pub fn remove_last(ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    replace_last(ctx, input, &[args[0].clone(), Value::from("")])
}

pub fn append(_ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    Ok(Value::Str(format!("{}{}", input, args[0])))
}

pub fn prepend(_ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    Ok(Value::Str(format!("{}{}", args[0], input)))
}

/// Fall back to a default when the input is absent, false or empty.
pub fn default(_ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    let empty = match input {
        Value::Nil | Value::Bool(false) => true,
        Value::Str(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if empty {
        Ok(args[0].clone())
    } else {
        Ok(input.clone())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::compat::SyntaxLevel;

    use super::*;

    fn ctx(level: SyntaxLevel) -> RenderContext {
        RenderContext::new(level)
    }

    #[test]
    fn test_case_filters() {
        let ctx = ctx(SyntaxLevel::V3);
        assert_eq!(
            downcase(&ctx, &Value::from("HeLLo"), &[]),
            Ok(Value::from("hello"))
        );
        assert_eq!(
            upcase(&ctx, &Value::from("hello"), &[]),
            Ok(Value::from("HELLO"))
        );
        assert_eq!(downcase(&ctx, &Value::Nil, &[]), Ok(Value::Nil));
    }

    #[test]
    fn test_capitalize_legacy_vs_modern() {
        let old = ctx(SyntaxLevel::V1);
        let new = ctx(SyntaxLevel::V2);
        assert_eq!(
            capitalize(&old, &Value::from("my Great Title"), &[]),
            Ok(Value::from("My Great Title"))
        );
        assert_eq!(
            capitalize(&new, &Value::from("my Great Title"), &[]),
            Ok(Value::from("My great title"))
        );
        assert_eq!(
            capitalize(&new, &Value::from("  spaced out"), &[]),
            Ok(Value::from("  Spaced out"))
        );
        // Leading whitespace is skipped over at both levels.
        assert_eq!(
            capitalize(&old, &Value::from(" my boss is Mr. Doe."), &[]),
            Ok(Value::from(" My boss is Mr. Doe."))
        );
    }

    #[test]
    fn test_strip_family() {
        let ctx = ctx(SyntaxLevel::V3);
        assert_eq!(
            strip(&ctx, &Value::from("  ab  "), &[]),
            Ok(Value::from("ab"))
        );
        assert_eq!(
            lstrip(&ctx, &Value::from("  ab  "), &[]),
            Ok(Value::from("ab  "))
        );
        assert_eq!(
            rstrip(&ctx, &Value::from("  ab  "), &[]),
            Ok(Value::from("  ab"))
        );
    }

    #[test]
    fn test_escape() {
        let ctx = ctx(SyntaxLevel::V3);
        assert_eq!(
            escape(&ctx, &Value::from(r#"<a href="x">&'"#), &[]),
            Ok(Value::from("&lt;a href=&quot;x&quot;&gt;&amp;&#39;"))
        );
    }

    #[test]
    fn test_escape_once_keeps_entities() {
        let ctx = ctx(SyntaxLevel::V3);
        assert_eq!(
            escape_once(&ctx, &Value::from("1 &lt; 2 & <b>"), &[]),
            Ok(Value::from("1 &lt; 2 &amp; &lt;b&gt;"))
        );
        assert_eq!(
            escape_once(&ctx, &Value::from("&#39; &bogus"), &[]),
            Ok(Value::from("&#39; &amp;bogus"))
        );
    }

    #[test]
    fn test_strip_html() {
        let ctx = ctx(SyntaxLevel::V3);
        let input = Value::from(
            "<p>hi</p><script>var x = 1;</script><!-- note --><style>p{}</style>there",
        );
        assert_eq!(strip_html(&ctx, &input, &[]), Ok(Value::from("hithere")));
    }

    #[test]
    fn test_newline_filters() {
        let ctx = ctx(SyntaxLevel::V3);
        assert_eq!(
            strip_newlines(&ctx, &Value::from("a\r\nb\nc"), &[]),
            Ok(Value::from("abc"))
        );
        assert_eq!(
            newline_to_br(&ctx, &Value::from("a\nb"), &[]),
            Ok(Value::from("a<br />\nb"))
        );
    }

    #[test]
    fn test_truncate() {
        let ctx = ctx(SyntaxLevel::V3);
        assert_eq!(
            truncate(&ctx, &Value::from("1234567890"), &[Value::Int(7)]),
            Ok(Value::from("1234..."))
        );
        assert_eq!(
            truncate(&ctx, &Value::from("short"), &[Value::Int(7)]),
            Ok(Value::from("short"))
        );
        // The suffix survives even when the budget cannot fit any content.
        assert_eq!(
            truncate(&ctx, &Value::from("1234567890"), &[Value::Int(-1)]),
            Ok(Value::from("..."))
        );
    }

    #[test]
    fn test_truncatewords() {
        let ctx = ctx(SyntaxLevel::V3);
        assert_eq!(
            truncatewords(&ctx, &Value::from("one  two  three four"), &[Value::Int(2)]),
            Ok(Value::from("one two..."))
        );
        assert_eq!(
            truncatewords(&ctx, &Value::from("one two"), &[Value::Int(5)]),
            Ok(Value::from("one two"))
        );
        // Word counts below one clamp to one.
        assert_eq!(
            truncatewords(&ctx, &Value::from("one two three"), &[Value::Int(0)]),
            Ok(Value::from("one..."))
        );
    }

    #[test]
    fn test_split() {
        let ctx3 = ctx(SyntaxLevel::V3);
        assert_eq!(
            split(&ctx3, &Value::from("a~b~~c"), &[Value::from("~")]),
            Ok(Value::Array(vec![
                Value::from("a"),
                Value::from("b"),
                Value::from("c")
            ]))
        );
        assert_eq!(
            split(&ctx3, &Value::from("ab"), &[Value::from("")]),
            Ok(Value::Array(vec![Value::from("a"), Value::from("b")]))
        );
    }

    #[test]
    fn test_split_nil_gate() {
        let old = ctx(SyntaxLevel::V2a);
        let new = ctx(SyntaxLevel::V3);
        assert_eq!(
            split(&old, &Value::Nil, &[Value::from(",")]),
            Ok(Value::Nil)
        );
        assert_eq!(
            split(&new, &Value::Nil, &[Value::from(",")]),
            Ok(Value::Array(vec![]))
        );
    }

    #[test]
    fn test_replace_is_literal() {
        let ctx = ctx(SyntaxLevel::Legacy);
        // Pattern metacharacters carry no meaning, so this finds nothing.
        assert_eq!(
            replace(&ctx, &Value::from("aa"), &[Value::from("[Aa]"), Value::from("x")]),
            Ok(Value::from("aa"))
        );
        assert_eq!(
            replace(&ctx, &Value::from("a a a"), &[Value::from("a"), Value::from("b")]),
            Ok(Value::from("b b b"))
        );
    }

    #[test]
    fn test_replace_first_empty_search_gate() {
        let old = ctx(SyntaxLevel::V2a);
        let new = ctx(SyntaxLevel::V3);
        let args = [Value::from(""), Value::from("X")];
        assert_eq!(
            replace_first(&old, &Value::from("ab"), &args),
            Ok(Value::from("ab"))
        );
        assert_eq!(
            replace_first(&new, &Value::from("ab"), &args),
            Ok(Value::from("Xab"))
        );
    }

    #[test]
    fn test_replace_first_and_last() {
        let ctx = ctx(SyntaxLevel::V3);
        assert_eq!(
            replace_first(&ctx, &Value::from("a a"), &[Value::from("a"), Value::from("b")]),
            Ok(Value::from("b a"))
        );
        assert_eq!(
            replace_last(&ctx, &Value::from("a a"), &[Value::from("a"), Value::from("b")]),
            Ok(Value::from("a b"))
        );
    }

    #[test]
    fn test_remove_family() {
        let ctx = ctx(SyntaxLevel::V3);
        assert_eq!(
            remove(&ctx, &Value::from("a b a"), &[Value::from("a ")]),
            Ok(Value::from("b a"))
        );
        assert_eq!(
            remove_first(&ctx, &Value::from("a a"), &[Value::from("a ")]),
            Ok(Value::from("a"))
        );
        assert_eq!(
            remove_last(&ctx, &Value::from("a a a"), &[Value::from(" a")]),
            Ok(Value::from("a a"))
        );
    }

    #[test]
    fn test_append_prepend() {
        let ctx = ctx(SyntaxLevel::V3);
        assert_eq!(
            append(&ctx, &Value::from("a"), &[Value::from("b")]),
            Ok(Value::from("ab"))
        );
        assert_eq!(
            prepend(&ctx, &Value::Int(5), &[Value::from("n=")]),
            Ok(Value::from("n=5"))
        );
        assert_eq!(
            append(&ctx, &Value::Nil, &[Value::from("b")]),
            Ok(Value::from("b"))
        );
    }

    #[test]
    fn test_default() {
        let ctx = ctx(SyntaxLevel::V3);
        let fallback = [Value::from("d")];
        assert_eq!(default(&ctx, &Value::Nil, &fallback), Ok(Value::from("d")));
        assert_eq!(
            default(&ctx, &Value::from(""), &fallback),
            Ok(Value::from("d"))
        );
        assert_eq!(
            default(&ctx, &Value::Bool(false), &fallback),
            Ok(Value::from("d"))
        );
        assert_eq!(
            default(&ctx, &Value::Int(0), &fallback),
            Ok(Value::Int(0))
        );
    }
}
