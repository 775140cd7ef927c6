//! Address and range parsing for debugger commands. Labels are tried
//! first, then `#` decimal, then `x`/`X` hex, then bare hex. A leading `-`
//! negates, mapping into [0, 0xFFFF] as two's complement.

use crate::symbol::SymbolTable;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DECIMAL: Regex = Regex::new(r"^#(-?[0-9]+)$").unwrap();
    static ref PREFIXED_HEX: Regex = Regex::new(r"^[xX](-?[0-9a-fA-F]+)$").unwrap();
    static ref BARE_HEX: Regex = Regex::new(r"^(-?[0-9a-fA-F]+)$").unwrap();
}

/// Parse one address token. `None` is the bad-address sentinel.
pub fn parse_address(symbols: &SymbolTable, token: &str) -> Option<u16> {
    let (negated, token) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token),
    };

    let mut value = match symbols.find_by_name(token) {
        Some(addr) => i64::from(addr),
        None => {
            let (text, radix) = if let Some(caps) = DECIMAL.captures(token) {
                (caps.get(1).unwrap().as_str().to_string(), 10)
            } else if let Some(caps) = PREFIXED_HEX.captures(token) {
                (caps.get(1).unwrap().as_str().to_string(), 16)
            } else if let Some(caps) = BARE_HEX.captures(token) {
                (caps.get(1).unwrap().as_str().to_string(), 16)
            } else {
                return None;
            };
            let value = i64::from_str_radix(&text, radix).ok()?;
            if value > 0xffff || (negated && value < 0) || (!negated && value < -0xffff) {
                return None;
            }
            value
        }
    };

    if negated {
        value = -value;
    }
    if value < 0 {
        value += 0x10000;
    }
    Some(value as u16)
}

/// How `parse_range` fills in missing endpoints.
pub enum Scale {
    /// List/dump style: a half-width around the PC, doubled forward from a
    /// single starting point, inclusive explicit end.
    Window(u16),
    /// Both endpoints required, passed through untouched (the `memory`
    /// command's address/value pair).
    Exact,
}

pub struct RangeContext<'a> {
    pub symbols: &'a SymbolTable,
    pub pc: u16,
    /// Where a `more` continuation resumes; `None` disables `more`.
    pub last_end: Option<u16>,
}

/// Outcome of range parsing: the range plus whether extra arguments were
/// ignored (the caller owns the warning, which is suppressed in GUI mode).
pub struct ParsedRange {
    pub start: u16,
    pub end: u16,
    pub extra_args: bool,
}

pub fn parse_range(ctx: &RangeContext, args: &str, scale: &Scale) -> Option<ParsedRange> {
    let tokens: Vec<&str> = args.split_whitespace().collect();

    let window = match scale {
        Scale::Window(half) => Some(*half),
        Scale::Exact => None,
    };

    // Without automatic scaling both endpoints must be given.
    if window.is_none() && tokens.len() < 2 {
        return None;
    }

    // No arguments: a window centered on the PC.
    if tokens.is_empty() {
        let half = window.unwrap();
        return Some(ParsedRange {
            start: ctx.pc.wrapping_sub(half),
            end: ctx.pc.wrapping_add(half),
            extra_args: false,
        });
    }

    // "more" continues from the previous stopping point.
    if let Some(last_end) = ctx.last_end {
        if tokens[0].eq_ignore_ascii_case("more") {
            let half = window.unwrap();
            return Some(ParsedRange {
                start: last_end,
                end: last_end.wrapping_add(2 * half),
                extra_args: tokens.len() > 1,
            });
        }
    }

    let start = parse_address(ctx.symbols, tokens[0])?;

    if tokens.len() < 2 {
        let half = window.unwrap();
        return Some(ParsedRange {
            start,
            end: start.wrapping_add(2 * half),
            extra_args: false,
        });
    }

    let mut end = parse_address(ctx.symbols, tokens[1])?;
    // Explicit ranged endpoints are inclusive.
    if window.is_some() {
        end = end.wrapping_add(1);
    }

    Some(ParsedRange {
        start,
        end,
        extra_args: tokens.len() > 2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SymbolTable {
        let mut table = SymbolTable::new();
        table.add("START", 0x3000, true);
        table
    }

    #[test]
    fn numeric_forms_agree_for_every_value() {
        let symbols = SymbolTable::new();
        for v in 0..=0xffffu16 {
            assert_eq!(
                parse_address(&symbols, &format!("#{}", v)),
                Some(v),
                "decimal {}",
                v
            );
            assert_eq!(
                parse_address(&symbols, &format!("x{:04X}", v)),
                Some(v),
                "upper hex {}",
                v
            );
            assert_eq!(
                parse_address(&symbols, &format!("X{:04x}", v)),
                Some(v),
                "lower hex {}",
                v
            );
        }
    }

    #[test]
    fn negation_maps_to_twos_complement() {
        let symbols = SymbolTable::new();
        for v in 1..=0xffffu32 {
            let expected = ((0x10000 - v) & 0xffff) as u16;
            assert_eq!(parse_address(&symbols, &format!("-{:x}", v)), Some(expected));
        }
        assert_eq!(parse_address(&symbols, "-x10"), Some(0xfff0));
        assert_eq!(parse_address(&symbols, "-#16"), Some(0xfff0));
        assert_eq!(parse_address(&symbols, "#-5"), Some(0xfffb));
        assert_eq!(parse_address(&symbols, "-0"), Some(0));
    }

    #[test]
    fn symbols_win_over_hex() {
        let mut symbols = table();
        // "add" is valid hex but the label takes precedence.
        symbols.add("add", 0x1234, true);
        assert_eq!(parse_address(&symbols, "add"), Some(0x1234));
        assert_eq!(parse_address(&symbols, "START"), Some(0x3000));
        assert_eq!(parse_address(&symbols, "-START"), Some(0xd000));
        assert_eq!(parse_address(&symbols, "abc"), Some(0xabc));
    }

    #[test]
    fn rejects_bad_tokens() {
        let symbols = table();
        assert_eq!(parse_address(&symbols, "NOPE"), None);
        assert_eq!(parse_address(&symbols, "x10000"), None);
        assert_eq!(parse_address(&symbols, "#65536"), None);
        assert_eq!(parse_address(&symbols, "#-65535"), Some(1));
        assert_eq!(parse_address(&symbols, "#-65536"), None);
        assert_eq!(parse_address(&symbols, "12x4"), None);
        assert_eq!(parse_address(&symbols, ""), None);
        // Double negation is rejected.
        assert_eq!(parse_address(&symbols, "-#-5"), None);
    }

    #[test]
    fn range_defaults_center_on_pc() {
        let symbols = table();
        let ctx = RangeContext {
            symbols: &symbols,
            pc: 0x3000,
            last_end: Some(0x2000),
        };
        let range = parse_range(&ctx, "", &Scale::Window(10)).unwrap();
        assert_eq!((range.start, range.end), (0x2ff6, 0x300a));
        assert!(!range.extra_args);
    }

    #[test]
    fn range_more_resumes() {
        let symbols = table();
        let ctx = RangeContext {
            symbols: &symbols,
            pc: 0x3000,
            last_end: Some(0x2000),
        };
        let range = parse_range(&ctx, "MORE", &Scale::Window(10)).unwrap();
        assert_eq!((range.start, range.end), (0x2000, 0x2014));
    }

    #[test]
    fn range_single_start_doubles_window() {
        let symbols = table();
        let ctx = RangeContext {
            symbols: &symbols,
            pc: 0x3000,
            last_end: None,
        };
        let range = parse_range(&ctx, "START", &Scale::Window(10)).unwrap();
        assert_eq!((range.start, range.end), (0x3000, 0x3014));
    }

    #[test]
    fn range_explicit_end_is_inclusive() {
        let symbols = table();
        let ctx = RangeContext {
            symbols: &symbols,
            pc: 0x3000,
            last_end: None,
        };
        let range = parse_range(&ctx, "x4000 x4003 junk", &Scale::Window(10)).unwrap();
        assert_eq!((range.start, range.end), (0x4000, 0x4004));
        assert!(range.extra_args);
    }

    #[test]
    fn exact_scale_requires_two_arguments() {
        let symbols = table();
        let ctx = RangeContext {
            symbols: &symbols,
            pc: 0x3000,
            last_end: None,
        };
        assert!(parse_range(&ctx, "x4000", &Scale::Exact).is_none());
        let range = parse_range(&ctx, "x4000 #16", &Scale::Exact).unwrap();
        assert_eq!((range.start, range.end), (0x4000, 16));
        // "more" is not special without a continuation point.
        assert!(parse_range(&ctx, "more x10", &Scale::Exact).is_none());
    }
}
