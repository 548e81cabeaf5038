//! Arithmetic filters, thin wrappers over the coercion engine.

use rust_decimal::Decimal;

use crate::context::RenderContext;
use crate::error::FilterResult;
use crate::numeric::{self, Op};
use crate::value::Value;

pub fn plus(ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    Ok(numeric::arithmetic(ctx.level, Op::Add, input, &args[0])?)
}

pub fn minus(ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    Ok(numeric::arithmetic(ctx.level, Op::Sub, input, &args[0])?)
}

pub fn times(ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    Ok(numeric::arithmetic(ctx.level, Op::Mul, input, &args[0])?)
}

pub fn divided_by(ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    Ok(numeric::arithmetic(ctx.level, Op::Div, input, &args[0])?)
}

pub fn modulo(ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    Ok(numeric::arithmetic(ctx.level, Op::Mod, input, &args[0])?)
}

pub fn round(ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    Ok(numeric::round(ctx.level, input, args.first()))
}

pub fn ceil(ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    Ok(numeric::ceil(ctx.level, input))
}

pub fn floor(ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    Ok(numeric::floor(ctx.level, input))
}

pub fn abs(ctx: &RenderContext, input: &Value, _args: &[Value]) -> FilterResult<Value> {
    Ok(numeric::abs(ctx.level, input))
}

/// Clamp from below: the larger of input and bound. Either side that fails
/// to parse counts as zero.
pub fn at_least(ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    let (a, b) = bounds(ctx, input, &args[0]);
    Ok(Value::Decimal(a.max(b)))
}

/// Clamp from above: the smaller of input and bound.
pub fn at_most(ctx: &RenderContext, input: &Value, args: &[Value]) -> FilterResult<Value> {
    let (a, b) = bounds(ctx, input, &args[0]);
    Ok(Value::Decimal(a.min(b)))
}

fn bounds(ctx: &RenderContext, input: &Value, arg: &Value) -> (Decimal, Decimal) {
    let parse = |v: &Value| match v {
        Value::Str(s) => ctx.provider.parse_number(s).unwrap_or(Decimal::ZERO),
        other => other.to_decimal().unwrap_or(Decimal::ZERO),
    };
    (parse(input), parse(arg))
}
