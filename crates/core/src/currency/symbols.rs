//! Currency glyph lookup.

/// Glyph to ISO code table. Multi-character glyphs come first so prefix
/// matching picks them over any single-character glyph.
const SYMBOLS: &[(&str, &str)] = &[
    ("zł", "PLN"),
    ("$", "USD"),
    ("€", "EUR"),
    ("¥", "JPY"),
    ("₫", "VND"),
    ("£", "GBP"),
    ("₩", "KRW"),
];

/// Code used when a glyph is not recognised.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Resolves the currency code from the glyph an amount starts with.
///
/// `input` may be the glyph alone or a whole amount such as `"€12.50"`.
/// Unknown glyphs resolve to USD.
#[must_use]
pub fn resolve_currency_symbol(input: &str) -> &'static str {
    let input = input.trim_start();
    SYMBOLS
        .iter()
        .find(|(glyph, _)| input.starts_with(glyph))
        .map_or(DEFAULT_CURRENCY, |&(_, code)| code)
}

/// Display glyph for an ISO code, `$` when unknown.
#[must_use]
pub fn currency_symbol(code: &str) -> &'static str {
    SYMBOLS
        .iter()
        .find(|(_, known)| known.eq_ignore_ascii_case(code.trim()))
        .map_or("$", |&(glyph, _)| glyph)
}
