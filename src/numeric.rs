//! Numeric coercion engine.
//!
//! Arithmetic between two dynamic values follows one pipeline:
//!
//! 1. An absent operand propagates: the result is absent, never an error.
//! 2. If either operand is real-like, or is a numeric string at a level
//!    where string coercion is open, the operation runs in fixed-point
//!    decimal. Decimal overflow and decimal division by zero are recovered
//!    by re-running the operation once in double precision, yielding IEEE
//!    infinities or NaN instead of a failure.
//! 3. If both operands are integral the operation runs in the wider of the
//!    two integer widths with checked arithmetic; here overflow and zero
//!    division are fatal.
//! 4. Anything else is a non-numeric operand error.

use rust_decimal::{Decimal, RoundingStrategy};
use strum_macros::Display;

use crate::compat::{Gate, SyntaxLevel};
use crate::error::NumericError;
use crate::value::{Kind, Value};

/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Op {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Mod,
}

/// Run a binary arithmetic operation under the given compatibility level.
pub fn arithmetic(
    level: SyntaxLevel,
    op: Op,
    left: &Value,
    right: &Value,
) -> Result<Value, NumericError> {
    if left.is_nil() || right.is_nil() {
        return Ok(Value::Nil);
    }
    let strings_open = level.is_modern(Gate::StringCoercion);
    let usable = |v: &Value| match v.kind() {
        Kind::RealLike | Kind::IntegerLike => true,
        Kind::NumericString => strings_open,
        _ => false,
    };
    if !usable(left) {
        return Err(NumericError::NonNumeric(left.to_string()));
    }
    if !usable(right) {
        return Err(NumericError::NonNumeric(right.to_string()));
    }

    let integral = |v: &Value| v.kind() == Kind::IntegerLike;
    if integral(left) && integral(right) {
        return integer_op(op, left, right);
    }
    decimal_op(op, left, right)
}

fn integer_op(op: Op, left: &Value, right: &Value) -> Result<Value, NumericError> {
    let wide = matches!(left, Value::Long(_)) || matches!(right, Value::Long(_));
    let l = left.to_integer().ok_or_else(|| non_numeric(left))?;
    let r = right.to_integer().ok_or_else(|| non_numeric(right))?;
    let result = match op {
        Op::Add => l.checked_add(r),
        Op::Sub => l.checked_sub(r),
        Op::Mul => l.checked_mul(r),
        Op::Div => {
            if r == 0 {
                return Err(NumericError::DivisionByZero);
            }
            l.checked_div(r)
        }
        Op::Mod => {
            if r == 0 {
                return Err(NumericError::DivisionByZero);
            }
            l.checked_rem(r)
        }
    }
    .ok_or(NumericError::Overflow)?;
    if wide {
        return Ok(Value::Long(result));
    }
    // Narrow inputs can still overflow the narrow width; widen the result.
    match i32::try_from(result) {
        Ok(narrow) => Ok(Value::Int(narrow)),
        Err(_) => Ok(Value::Long(result)),
    }
}

fn decimal_op(op: Op, left: &Value, right: &Value) -> Result<Value, NumericError> {
    let l = left.to_decimal();
    let r = right.to_decimal();
    if let (Some(l), Some(r)) = (l, r) {
        let exact = match op {
            Op::Add => l.checked_add(r),
            Op::Sub => l.checked_sub(r),
            Op::Mul => l.checked_mul(r),
            Op::Div if !r.is_zero() => l.checked_div(r),
            Op::Mod if !r.is_zero() => l.checked_rem(r),
            // Decimal cannot express the infinities zero division calls
            // for; fall through to the double rerun.
            Op::Div | Op::Mod => None,
        };
        if let Some(d) = exact {
            return Ok(Value::Decimal(d));
        }
    }
    // One-shot double-precision rerun: overflow and zero division become
    // IEEE infinities or NaN.
    let l = left.to_f64().ok_or_else(|| non_numeric(left))?;
    let r = right.to_f64().ok_or_else(|| non_numeric(right))?;
    let result = match op {
        Op::Add => l + r,
        Op::Sub => l - r,
        Op::Mul => l * r,
        Op::Div => l / r,
        Op::Mod => l % r,
    };
    Ok(Value::Float(result))
}

fn non_numeric(v: &Value) -> NumericError {
    NumericError::NonNumeric(v.to_string())
}

/// Round to a number of fractional places using banker's rounding.
///
/// Under modern behavior unparseable input rounds to decimal zero and the
/// place count is clamped into the representable range. Under legacy
/// behavior any bad input or out-of-range place count yields an absent
/// result.
pub fn round(level: SyntaxLevel, input: &Value, places: Option<&Value>) -> Value {
    const MAX_PLACES: u32 = 28;
    if level.is_modern(Gate::Round) {
        let d = input.to_decimal().unwrap_or(Decimal::ZERO);
        let p = places
            .and_then(Value::to_f64)
            .unwrap_or(0.0)
            .clamp(0.0, f64::from(MAX_PLACES))
            .floor() as u32;
        return Value::Decimal(d.round_dp_with_strategy(p, RoundingStrategy::MidpointNearestEven));
    }
    let Some(d) = input.to_decimal() else {
        return Value::Nil;
    };
    let p = match places {
        None => 0i64,
        Some(v) => match v.to_f64() {
            Some(f) if f.is_finite() => round_ties_even_i64(f),
            _ => return Value::Nil,
        },
    };
    if !(0..=i64::from(MAX_PLACES)).contains(&p) {
        return Value::Nil;
    }
    Value::Decimal(d.round_dp_with_strategy(p as u32, RoundingStrategy::MidpointNearestEven))
}

fn round_ties_even_i64(f: f64) -> i64 {
    let rounded = f.round();
    if (f - f.trunc()).abs() == 0.5 && rounded % 2.0 != 0.0 {
        (rounded - f.signum()) as i64
    } else {
        rounded as i64
    }
}

/// Shared coercion for the unary family: numeric strings are parsed into
/// the narrowest numeric type first.
fn coerce_unary(input: &Value) -> Option<Value> {
    match input {
        Value::Str(s) => Value::parse_numeric(s),
        v if v.is_numeric() => Some(v.clone()),
        _ => None,
    }
}

fn unary_fallback(level: SyntaxLevel) -> Value {
    if level.is_modern(Gate::CeilFloorAbs) {
        Value::Int(0)
    } else {
        Value::Nil
    }
}

pub fn ceil(level: SyntaxLevel, input: &Value) -> Value {
    match coerce_unary(input) {
        Some(Value::Decimal(d)) => Value::Decimal(d.ceil()),
        Some(Value::Float(f)) => Value::Float(f.ceil()),
        Some(v @ (Value::Int(_) | Value::Long(_))) => v,
        _ => unary_fallback(level),
    }
}

pub fn floor(level: SyntaxLevel, input: &Value) -> Value {
    match coerce_unary(input) {
        Some(Value::Decimal(d)) => Value::Decimal(d.floor()),
        Some(Value::Float(f)) => Value::Float(f.floor()),
        Some(v @ (Value::Int(_) | Value::Long(_))) => v,
        _ => unary_fallback(level),
    }
}

pub fn abs(level: SyntaxLevel, input: &Value) -> Value {
    match coerce_unary(input) {
        Some(Value::Decimal(d)) => Value::Decimal(d.abs()),
        Some(Value::Float(f)) => Value::Float(f.abs()),
        Some(Value::Int(i)) => match i.checked_abs() {
            Some(a) => Value::Int(a),
            None => Value::Long(i64::from(i).abs()),
        },
        Some(Value::Long(i)) => match i.checked_abs() {
            Some(a) => Value::Long(a),
            None => Value::Float(i as f64),
        },
        _ => unary_fallback(level),
    }
}
