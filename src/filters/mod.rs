//! The standard filter set.
//!
//! Filters are grouped by concern; [`register_standard`] wires the whole
//! set into a registry with each filter's aliases, availability level and
//! argument-count contract.

pub mod collection;
pub mod date;
pub mod encoding;
pub mod math;
pub mod strings;

use crate::compat::SyntaxLevel;
use crate::registry::{FilterFn, FilterRegistry, FilterSpec};

struct Entry {
    name: &'static str,
    aliases: &'static [&'static str],
    min_level: SyntaxLevel,
    args: (usize, usize),
    func: FilterFn,
}

const fn entry(name: &'static str, args: (usize, usize), func: FilterFn) -> Entry {
    Entry {
        name,
        aliases: &[],
        min_level: SyntaxLevel::Legacy,
        args,
        func,
    }
}

/// Register the standard filters.
pub fn register_standard(registry: &mut FilterRegistry) {
    let table: &[Entry] = &[
        // collection
        entry("size", (0, 0), collection::size),
        Entry {
            // Added late; earlier levels never had it.
            min_level: SyntaxLevel::V2a,
            ..entry("slice", (1, 2), collection::slice)
        },
        entry("sort", (0, 1), collection::sort),
        entry("sort_natural", (0, 1), collection::sort_natural),
        entry("map", (1, 1), collection::map),
        entry("where", (1, 2), collection::where_),
        entry("uniq", (0, 0), collection::uniq),
        entry("compact", (0, 0), collection::compact),
        entry("concat", (1, 1), collection::concat),
        entry("reverse", (0, 0), collection::reverse),
        entry("sum", (0, 1), collection::sum),
        entry("join", (0, 1), collection::join),
        entry("first", (0, 0), collection::first),
        entry("last", (0, 0), collection::last),
        // strings
        entry("downcase", (0, 0), strings::downcase),
        entry("upcase", (0, 0), strings::upcase),
        entry("capitalize", (0, 0), strings::capitalize),
        entry("strip", (0, 0), strings::strip),
        entry("lstrip", (0, 0), strings::lstrip),
        entry("rstrip", (0, 0), strings::rstrip),
        Entry {
            aliases: &["h"],
            ..entry("escape", (0, 0), strings::escape)
        },
        entry("escape_once", (0, 0), strings::escape_once),
        entry("strip_html", (0, 0), strings::strip_html),
        entry("strip_newlines", (0, 0), strings::strip_newlines),
        entry("newline_to_br", (0, 0), strings::newline_to_br),
        entry("truncate", (0, 2), strings::truncate),
        Entry {
            aliases: &["truncate_words"],
            ..entry("truncatewords", (0, 2), strings::truncatewords)
        },
        entry("split", (1, 1), strings::split),
        entry("replace", (1, 2), strings::replace),
        entry("replace_first", (1, 2), strings::replace_first),
        entry("replace_last", (2, 2), strings::replace_last),
        entry("remove", (1, 1), strings::remove),
        entry("remove_first", (1, 1), strings::remove_first),
        entry("remove_last", (1, 1), strings::remove_last),
        entry("append", (1, 1), strings::append),
        entry("prepend", (1, 1), strings::prepend),
        entry("default", (1, 1), strings::default),
        // math
        entry("plus", (1, 1), math::plus),
        entry("minus", (1, 1), math::minus),
        entry("times", (1, 1), math::times),
        entry("divided_by", (1, 1), math::divided_by),
        entry("modulo", (1, 1), math::modulo),
        entry("round", (0, 1), math::round),
        entry("ceil", (0, 0), math::ceil),
        entry("floor", (0, 0), math::floor),
        entry("abs", (0, 0), math::abs),
        Entry {
            min_level: SyntaxLevel::V3,
            ..entry("at_least", (1, 1), math::at_least)
        },
        Entry {
            min_level: SyntaxLevel::V3,
            ..entry("at_most", (1, 1), math::at_most)
        },
        // encoding
        entry("url_encode", (0, 0), encoding::url_encode),
        entry("url_decode", (0, 0), encoding::url_decode),
        entry("base64_encode", (0, 0), encoding::base64_encode),
        entry("base64_decode", (0, 0), encoding::base64_decode),
        entry("base64_url_safe_encode", (0, 0), encoding::base64_url_safe_encode),
        entry("base64_url_safe_decode", (0, 0), encoding::base64_url_safe_decode),
        // date & locale
        entry("date", (0, 1), date::date),
        entry("currency", (0, 1), date::currency),
    ];
    for e in table {
        registry.register(FilterSpec {
            name: e.name,
            aliases: e.aliases,
            min_level: e.min_level,
            min_args: e.args.0,
            max_args: e.args.1,
            func: e.func,
        });
    }
}
