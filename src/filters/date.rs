//! Date and currency formatting.
//!
//! The date filter accepts two format token languages: strftime tokens
//! when the context's `ruby_date_format` flag is set, and .NET-style
//! tokens otherwise, translated to strftime before formatting. An input
//! that cannot be read as a point in time renders unchanged; a format
//! that cannot be parsed does the same.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::context::RenderContext;
use crate::error::{FilterError, FilterResult};
use crate::value::Value;

enum Stamp {
    Zoned(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl Stamp {
    fn format(&self, fmt: &str) -> String {
        match self {
            Stamp::Zoned(dt) => dt.format(fmt).to_string(),
            Stamp::Naive(dt) => dt.format(fmt).to_string(),
        }
    }
}

pub fn date(ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    let stamp = match read_stamp(input) {
        Some(stamp) => stamp,
        None => return Ok(input.clone()),
    };
    let format = args
        .first()
        .filter(|f| !f.is_nil())
        .map(|f| f.to_string())
        .unwrap_or_default();
    let strftime = if format.is_empty() {
        ctx.provider.date_format.clone()
    } else if ctx.ruby_date_format {
        // An unparseable strftime format leaves the input untouched.
        if StrftimeItems::new(&format).any(|item| matches!(item, Item::Error)) {
            return Ok(Value::Str(input.to_string()));
        }
        format
    } else {
        translate_dotnet(&format)
    };
    Ok(Value::Str(stamp.format(&strftime)))
}

fn read_stamp(input: &Value) -> Option<Stamp> {
    match input {
        Value::DateTime(dt) => Some(Stamp::Zoned(*dt)),
        Value::Date(d) => Some(Stamp::Naive(d.and_time(NaiveTime::MIN))),
        Value::Time(t) => Some(Stamp::Naive(NaiveDate::default().and_time(*t))),
        Value::Int(_) | Value::Long(_) | Value::Float(_) | Value::Decimal(_) => {
            let seconds = input.to_f64()?;
            let whole = seconds.trunc() as i64;
            let nanos = ((seconds - seconds.trunc()) * 1e9) as u32;
            let local = Local.timestamp_opt(whole, nanos).single()?;
            Some(Stamp::Zoned(local.fixed_offset()))
        }
        Value::Str(s) => read_stamp_text(s),
        _ => None,
    }
}

fn read_stamp_text(s: &str) -> Option<Stamp> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("now") || s.eq_ignore_ascii_case("today") {
        return Some(Stamp::Zoned(Local::now().fixed_offset()));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Stamp::Zoned(dt));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Stamp::Naive(dt));
        }
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(Stamp::Naive(d.and_time(NaiveTime::MIN)));
        }
    }
    None
}

/// Translate .NET-style date tokens to strftime. Text between single
/// quotes is literal; unknown characters pass through.
fn translate_dotnet(fmt: &str) -> String {
    const TOKENS: &[(&str, &str)] = &[
        ("yyyy", "%Y"),
        ("MMMM", "%B"),
        ("dddd", "%A"),
        ("yyy", "%Y"),
        ("MMM", "%b"),
        ("ddd", "%a"),
        ("zzz", "%:z"),
        ("fff", "%3f"),
        ("yy", "%y"),
        ("MM", "%m"),
        ("dd", "%d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("tt", "%p"),
        ("zz", "%z"),
        ("y", "%y"),
        ("M", "%-m"),
        ("d", "%-d"),
        ("H", "%-H"),
        ("h", "%-I"),
        ("m", "%-M"),
        ("s", "%-S"),
        ("t", "%p"),
        ("z", "%z"),
    ];
    let mut out = String::with_capacity(fmt.len() * 2);
    let mut rest = fmt;
    let mut literal = false;
    'outer: while !rest.is_empty() {
        let c = rest.chars().next().unwrap_or_default();
        if c == '\'' {
            literal = !literal;
            rest = &rest[c.len_utf8()..];
            continue;
        }
        if !literal {
            for (token, replacement) in TOKENS {
                if rest.starts_with(token) {
                    out.push_str(replacement);
                    rest = &rest[token.len()..];
                    continue 'outer;
                }
            }
        }
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Format a number as money. The input is read with the context's own
/// culture; an optional language tag picks the culture used for output.
pub fn currency(ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    let out_provider = match args.first().filter(|t| !t.is_nil()) {
        Some(tag) => {
            let tag = tag.to_string();
            crate::locale::FormatProvider::for_tag(&tag)
                .ok_or_else(|| FilterError::Argument(format!("unknown language tag: {}", tag)))?
        }
        None => ctx.provider.clone(),
    };
    let amount = match input {
        Value::Str(s) => ctx.provider.parse_number(s),
        other => other.to_decimal(),
    };
    match amount {
        Some(d) => Ok(Value::Str(out_provider.format_currency(d))),
        None => Ok(Value::Str(input.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::compat::SyntaxLevel;
    use crate::context::RenderRequest;

    use super::*;

    fn ctx() -> RenderContext {
        RenderContext::new(SyntaxLevel::V3)
    }

    fn ruby_ctx() -> RenderContext {
        RenderContext::from_request(RenderRequest {
            ruby_date_format: true,
            level: SyntaxLevel::V3,
            ..Default::default()
        })
    }

    fn may_first() -> Value {
        Value::Date(NaiveDate::from_ymd_opt(2006, 5, 1).unwrap())
    }

    #[test]
    fn test_date_value_with_ruby_tokens() {
        let ctx = ruby_ctx();
        assert_eq!(
            date(&ctx, &may_first(), &[Value::from("%B %Y")]),
            Ok(Value::from("May 2006"))
        );
    }

    #[test]
    fn test_date_value_with_dotnet_tokens() {
        let ctx = ctx();
        assert_eq!(
            date(&ctx, &may_first(), &[Value::from("yyyy-MM-dd")]),
            Ok(Value::from("2006-05-01"))
        );
        assert_eq!(
            date(&ctx, &may_first(), &[Value::from("MMMM d, yyyy")]),
            Ok(Value::from("May 1, 2006"))
        );
    }

    #[test]
    fn test_date_string_input() {
        let ctx = ctx();
        assert_eq!(
            date(&ctx, &Value::from("2006-05-01 10:30:00"), &[Value::from("HH:mm")]),
            Ok(Value::from("10:30"))
        );
    }

    #[test]
    fn test_unreadable_input_passes_through() {
        let ctx = ctx();
        assert_eq!(
            date(&ctx, &Value::from("not a date"), &[Value::from("yyyy")]),
            Ok(Value::from("not a date"))
        );
        assert_eq!(date(&ctx, &Value::Nil, &[Value::from("yyyy")]), Ok(Value::Nil));
    }

    #[test]
    fn test_bad_ruby_format_passes_input_through() {
        let ctx = ruby_ctx();
        assert_eq!(
            date(&ctx, &Value::from("2006-05-01"), &[Value::from("%Q")]),
            Ok(Value::from("2006-05-01"))
        );
    }

    #[test]
    fn test_empty_format_uses_provider_default() {
        let ctx = ctx();
        assert_eq!(
            date(&ctx, &may_first(), &[]),
            Ok(Value::from("05/01/2006 00:00:00"))
        );
    }

    #[test]
    fn test_time_only_value() {
        let ctx = ruby_ctx();
        let t = Value::Time(NaiveTime::from_hms_opt(14, 5, 0).unwrap());
        assert_eq!(
            date(&ctx, &t, &[Value::from("%H:%M")]),
            Ok(Value::from("14:05"))
        );
    }

    #[test]
    fn test_quoted_literal_in_dotnet_format() {
        let ctx = ctx();
        assert_eq!(
            date(&ctx, &may_first(), &[Value::from("yyyy 'y' MM")]),
            Ok(Value::from("2006 y 05"))
        );
    }

    #[test]
    fn test_currency() {
        let ctx = ctx();
        assert_eq!(
            currency(&ctx, &Value::Int(1234), &[Value::from("en-US")]),
            Ok(Value::from("$1,234.00"))
        );
        assert_eq!(currency(&ctx, &Value::Nil, &[]), Ok(Value::Nil));
        assert_eq!(
            currency(&ctx, &Value::from("hello"), &[]),
            Ok(Value::from("hello"))
        );
    }

    #[test]
    fn test_currency_unknown_tag() {
        let ctx = ctx();
        let result = currency(&ctx, &Value::Int(1), &[Value::from("xx-ZZ")]);
        assert!(matches!(result, Err(FilterError::Argument(_))));
    }

    #[test]
    fn test_currency_parses_with_context_culture() {
        let mut ctx = ctx();
        ctx.provider = crate::locale::FormatProvider::fr_fr();
        assert_eq!(
            currency(&ctx, &Value::from("1\u{a0}234,50"), &[Value::from("en-US")]),
            Ok(Value::from("$1,234.50"))
        );
    }
}
