//! Collection filters.
//!
//! Sequence-consuming filters flatten exactly one level of nesting before
//! acting, and wrap a scalar input as a one-element sequence, so callers
//! never see a nested-array surprise.

use std::cmp::Ordering;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::context::RenderContext;
use crate::error::{FilterError, FilterResult};
use crate::resolve::resolve;
use crate::value::Value;

/// Element count: character count for text, length for sequences, zero for
/// everything else.
pub fn size(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    let n = match input {
        Value::Str(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        _ => 0,
    };
    Ok(Value::Int(n as i32))
}

/// Extract a window of elements (or characters) by offset and length.
///
/// A negative offset counts back from the end; a window that starts before
/// the beginning is clipped rather than wrapped.
pub fn slice(_ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    let offset = args[0]
        .to_integer()
        .ok_or_else(|| FilterError::Argument("slice offset must be a number".to_string()))?;
    let length = args.get(1).and_then(Value::to_integer).unwrap_or(1);
    match input {
        Value::Nil => Ok(Value::Str(String::new())),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let (skip, take) = window(chars.len(), offset, length);
            Ok(Value::Str(chars[skip..skip + take].iter().collect()))
        }
        Value::Array(items) => {
            let (skip, take) = window(items.len(), offset, length);
            Ok(Value::Array(items[skip..skip + take].to_vec()))
        }
        other => Ok(other.clone()),
    }
}

fn window(len: usize, offset: i64, length: i64) -> (usize, usize) {
    let len = len as i64;
    let (skip, take) = if offset < 0 {
        if -offset < len {
            (len + offset, length)
        } else {
            // The window starts before the first element; whatever part of
            // it overlaps the sequence survives.
            (0, len + offset + length)
        }
    } else {
        (offset, length)
    };
    let skip = skip.clamp(0, len);
    let take = take.max(0).min(len - skip);
    (skip as usize, take as usize)
}

pub fn sort(_ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    sort_by(input, args.first(), false)
}

/// Case-insensitive variant of `sort`.
pub fn sort_natural(_ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    sort_by(input, args.first(), true)
}

fn sort_by(input: &Value, property: Option<&Value>, natural: bool) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    let property = property.map(|p| p.to_string());
    let mut items = input.flatten(1);
    items.sort_by(|a, b| {
        let (ka, kb) = match &property {
            Some(p) => (
                resolve(a, p).unwrap_or(Value::Nil),
                resolve(b, p).unwrap_or(Value::Nil),
            ),
            None => (a.clone(), b.clone()),
        };
        compare(&ka, &kb, natural)
    });
    Ok(Value::Array(items))
}

/// Ordering for sort keys: absent keys first, numbers numerically, text
/// ordinally (or case-folded for the natural variant).
fn compare(a: &Value, b: &Value, natural: bool) -> Ordering {
    match (a.is_nil(), b.is_nil()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }
    if a.is_numeric() && b.is_numeric() {
        if let (Some(x), Some(y)) = (a.to_decimal(), b.to_decimal()) {
            return x.cmp(&y);
        }
        if let (Some(x), Some(y)) = (a.to_f64(), b.to_f64()) {
            return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
        }
    }
    if natural {
        a.to_string().to_lowercase().cmp(&b.to_string().to_lowercase())
    } else {
        a.to_string().cmp(&b.to_string())
    }
}

/// Project a named property off every element; elements without it yield
/// an absent entry.
pub fn map(_ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    let property = args[0].to_string();
    let projected = input
        .flatten(1)
        .iter()
        .map(|item| resolve(item, &property).unwrap_or(Value::Nil))
        .collect();
    Ok(Value::Array(projected))
}

/// Keep elements whose named property matches a target value, or is truthy
/// when no target is given.
pub fn where_(_ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    let property = args[0].to_string();
    if property.is_empty() {
        return Err(FilterError::Argument(
            "where requires a non-empty property name".to_string(),
        ));
    }
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    let target = args.get(1);
    let kept = input
        .flatten(1)
        .into_iter()
        .filter(|item| {
            let value = resolve(item, &property).unwrap_or(Value::Nil);
            match target {
                Some(t) => value.loose_eq(t),
                None => value.is_truthy(),
            }
        })
        .collect();
    Ok(Value::Array(kept))
}

/// Distinct elements, first occurrence wins.
pub fn uniq(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    let mut seen: Vec<Value> = Vec::new();
    for item in input.flatten(1) {
        if !seen.contains(&item) {
            seen.push(item);
        }
    }
    Ok(Value::Array(seen))
}

/// Drop absent elements.
pub fn compact(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    if input.is_nil() {
        return Ok(Value::Nil);
    }
    let kept = input.flatten(1).into_iter().filter(|v| !v.is_nil()).collect();
    Ok(Value::Array(kept))
}

/// Join two sequences end to end; an absent side yields the other side.
pub fn concat(_ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    let right = &args[0];
    if input.is_nil() {
        return Ok(right.clone());
    }
    if right.is_nil() {
        return Ok(input.clone());
    }
    let mut out = input.flatten(1);
    out.extend(right.flatten(1));
    Ok(Value::Array(out))
}

/// Reverse a sequence; text and absent input pass through unchanged.
pub fn reverse(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    match input {
        Value::Array(items) => {
            let mut reversed = items.clone();
            reversed.reverse();
            Ok(Value::Array(reversed))
        }
        other => Ok(other.clone()),
    }
}

/// Sum numeric elements; an optional property is projected first. Nested
/// sequences contribute their own sums; anything non-numeric contributes
/// zero.
pub fn sum(_ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    let property = args.first().map(|p| p.to_string());
    if input.is_nil() {
        return Ok(Value::Int(0));
    }
    let (total, real) = add_up(&input.flatten(1), property.as_deref());
    if real {
        return Ok(Value::Decimal(total));
    }
    match total.to_i64() {
        Some(i) => match i32::try_from(i) {
            Ok(narrow) => Ok(Value::Int(narrow)),
            Err(_) => Ok(Value::Long(i)),
        },
        None => Ok(Value::Decimal(total)),
    }
}

fn add_up(items: &[Value], property: Option<&str>) -> (Decimal, bool) {
    let mut total = Decimal::ZERO;
    let mut real = false;
    for item in items {
        let value = match property {
            Some(p) => resolve(item, p).unwrap_or(Value::Nil),
            None => item.clone(),
        };
        match &value {
            Value::Array(_) => {
                // A projected sequence contributes its own plain sum.
                let (t, r) = add_up(&value.flatten(1), None);
                total += t;
                real |= r;
            }
            Value::Int(_) | Value::Long(_) => {
                total += value.to_decimal().unwrap_or(Decimal::ZERO);
            }
            Value::Float(_) | Value::Decimal(_) => {
                total += value.to_decimal().unwrap_or(Decimal::ZERO);
                real = true;
            }
            Value::Str(s) => match Value::parse_numeric(s) {
                Some(parsed @ (Value::Decimal(_) | Value::Float(_))) => {
                    total += parsed.to_decimal().unwrap_or(Decimal::ZERO);
                    real = true;
                }
                Some(parsed) => {
                    total += parsed.to_decimal().unwrap_or(Decimal::ZERO);
                }
                None => {}
            },
            _ => {}
        }
    }
    (total, real)
}

/// Concatenate element renderings with a glue string, one space by
/// default.
pub fn join(_ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    let glue = args.first().map(|g| g.to_string()).unwrap_or_else(|| " ".to_string());
    match input {
        Value::Array(_) => {
            let parts: Vec<String> = input.flatten(1).iter().map(Value::to_string).collect();
            Ok(Value::Str(parts.join(&glue)))
        }
        other => Ok(other.clone()),
    }
}

pub fn first(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    match input {
        Value::Array(items) => Ok(items.first().cloned().unwrap_or(Value::Nil)),
        Value::Str(s) => Ok(s
            .chars()
            .next()
            .map(|c| Value::Str(c.to_string()))
            .unwrap_or(Value::Nil)),
        _ => Ok(Value::Nil),
    }
}

pub fn last(_ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    match input {
        Value::Array(items) => Ok(items.last().cloned().unwrap_or(Value::Nil)),
        Value::Str(s) => Ok(s
            .chars()
            .last()
            .map(|c| Value::Str(c.to_string()))
            .unwrap_or(Value::Nil)),
        _ => Ok(Value::Nil),
    }
}
