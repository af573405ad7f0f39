//! Operations inside property values.
//!
//! `+`, `-` and `*` combine numbers and hex colours anywhere in a value;
//! `/` divides only inside parentheses, so `font: 12px/1.5 serif` is kept
//! as written. Numbers keep their original spelling unless an operation
//! produced them. Text the evaluator must not touch (escaped strings and
//! multi-part variable values) is swapped for a placeholder beforehand and
//! restored on output.
//!
//! LESS built-in functions (`darken`, `percentage`, `iscolor`...) are
//! rejected rather than passed to the browser.

const PLACEHOLDER: char = '\u{1}';

/// LESS functions with no CSS meaning. CSS functions of the same name
/// (`saturate()`, `contrast()`, `round()`...) are not listed.
const LESS_FUNCTIONS: &[&str] = &[
    "argb",
    "average",
    "blue",
    "boolean",
    "ceil",
    "convert",
    "darken",
    "data-uri",
    "desaturate",
    "difference",
    "e",
    "each",
    "escape",
    "exclusion",
    "extract",
    "fade",
    "fadein",
    "fadeout",
    "floor",
    "get-unit",
    "green",
    "greyscale",
    "hardlight",
    "hsv",
    "hsva",
    "hsvhue",
    "hsvsaturation",
    "hsvvalue",
    "hue",
    "image-height",
    "image-size",
    "image-width",
    "iscolor",
    "isdefined",
    "isem",
    "iskeyword",
    "isnumber",
    "ispercentage",
    "ispixel",
    "isruleset",
    "isstring",
    "isunit",
    "isurl",
    "length",
    "lighten",
    "lightness",
    "luma",
    "luminance",
    "mix",
    "multiply",
    "negation",
    "overlay",
    "percentage",
    "pi",
    "range",
    "red",
    "replace",
    "saturation",
    "screen",
    "shade",
    "softlight",
    "spin",
    "svg-gradient",
    "tint",
    "unit",
];

/// Functions whose arguments are copied verbatim.
const OPAQUE_FUNCTIONS: &[&str] = &["url", "calc", "var", "env", "format", "local", "expression"];

/// Stores `segment` and returns the placeholder standing for it.
pub(crate) fn protect(segment: String, protected: &mut Vec<String>) -> String {
    protected.push(segment);
    format!("{PLACEHOLDER}{}{PLACEHOLDER}", protected.len() - 1)
}

/// Replaces placeholders with the text they stand for.
pub(crate) fn restore(text: &str, protected: &[String]) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(PLACEHOLDER) {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find(PLACEHOLDER) else {
            out.push_str(&rest[start..]);
            return out;
        };
        match after[..end].parse::<usize>().ok().and_then(|i| protected.get(i)) {
            Some(segment) => out.push_str(segment),
            None => out.push_str(&rest[start..start + 1 + end + 1]),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Returns `true` if `value` is a single number or hex colour, which a
/// variable reference may splice into an operation.
pub(crate) fn is_operand(value: &str) -> bool {
    matches!(lex(value, false, &[]).as_deref(), Ok([Tok::Num(_) | Tok::Color(_)]))
}

/// Evaluates the operations in a whitespace-collapsed value.
///
/// The error is a message; the caller attaches the span.
pub(crate) fn evaluate(value: &str, protected: &[String]) -> Result<String, String> {
    let toks = reduce(lex(value, false, protected)?)?;
    Ok(render(&toks))
}

#[derive(Debug, Clone, PartialEq)]
struct Dimension {
    value: f64,
    unit: String,
    text: String,
}

impl Dimension {
    fn computed(value: f64, unit: String) -> Self {
        let text = format!("{}{unit}", format_number(value));
        Self { value, unit, text }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Color {
    channels: [f64; 3],
    text: String,
}

impl Color {
    fn parse(hex: &str) -> Option<Self> {
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(f64::from);
        let channels = match hex.len() {
            3 => {
                let mut c = [0.0; 3];
                for (i, ch) in hex.chars().enumerate() {
                    c[i] = channel(&format!("{ch}{ch}"))?;
                }
                c
            }
            6 => [channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?],
            _ => return None,
        };
        Some(Self {
            channels,
            text: format!("#{hex}"),
        })
    }

    fn computed(channels: [f64; 3]) -> Self {
        let [r, g, b] = channels.map(|c| c.round().clamp(0.0, 255.0) as u8);
        Self {
            channels,
            text: format!("#{r:02x}{g:02x}{b:02x}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Num(Dimension),
    Color(Color),
    Op(char),
    Space,
    Text(String),
}

impl Tok {
    fn is_operand(&self) -> bool {
        matches!(self, Tok::Num(_) | Tok::Color(_))
    }
}

fn lex(text: &str, division: bool, protected: &[String]) -> Result<Vec<Tok>, String> {
    let bytes = text.as_bytes();
    let mut toks: Vec<Tok> = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' => {
                toks.push(Tok::Space);
                i += 1;
            }
            0x01 => {
                let end = text[i + 1..]
                    .find(PLACEHOLDER)
                    .map_or(bytes.len(), |rel| i + 1 + rel + 1);
                toks.push(Tok::Text(restore(&text[i..end], protected)));
                i = end;
            }
            b'"' | b'\'' => {
                let end = string_end(bytes, i);
                toks.push(Tok::Text(text[i..end].to_string()));
                i = end;
            }
            b',' => {
                toks.push(Tok::Text(",".to_string()));
                i += 1;
            }
            b'(' => {
                let close = matching_paren(bytes, i).ok_or("unbalanced '(' in value")?;
                toks.push(group(&text[i + 1..close], protected)?);
                i = close + 1;
            }
            b')' => return Err("unbalanced ')' in value".to_string()),
            b'*' | b'+' => {
                toks.push(Tok::Op(c as char));
                i += 1;
            }
            b'/' => {
                toks.push(if division {
                    Tok::Op('/')
                } else {
                    Tok::Text("/".to_string())
                });
                i += 1;
            }
            b'-' => {
                let next = bytes.get(i + 1).copied().unwrap_or(0);
                let sign_position = !toks.last().is_some_and(Tok::is_operand);
                if sign_position && starts_number(&bytes[i + 1..]) {
                    i = number(text, i, &mut toks);
                } else if next.is_ascii_alphabetic() || matches!(next, b'-' | b'_' | b'\\') {
                    i = word(text, i, division, protected, &mut toks)?;
                } else {
                    toks.push(Tok::Op('-'));
                    i += 1;
                }
            }
            b'#' => {
                let len = bytes[i + 1..]
                    .iter()
                    .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_'))
                    .count();
                let end = i + 1 + len;
                let hex = &text[i + 1..end];
                toks.push(match Color::parse(hex) {
                    Some(color) => Tok::Color(color),
                    None => Tok::Text(text[i..end].to_string()),
                });
                i = end;
            }
            _ if starts_number(&bytes[i..]) => i = number(text, i, &mut toks),
            _ => i = word(text, i, division, protected, &mut toks)?,
        }
    }
    Ok(toks)
}

fn starts_number(bytes: &[u8]) -> bool {
    match bytes {
        [d, ..] if d.is_ascii_digit() => true,
        [b'.', d, ..] => d.is_ascii_digit(),
        _ => false,
    }
}

/// Lexes an optionally signed number with its unit, returning the end.
fn number(text: &str, start: usize, toks: &mut Vec<Tok>) -> usize {
    let bytes = text.as_bytes();
    let mut i = start;
    if bytes[i] == b'-' {
        i += 1;
    }
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    let digits_end = i;
    if bytes.get(i) == Some(&b'%') {
        i += 1;
    } else {
        while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
            i += 1;
        }
    }
    match text[start..digits_end].parse::<f64>() {
        Ok(value) => toks.push(Tok::Num(Dimension {
            value,
            unit: text[digits_end..i].to_string(),
            text: text[start..i].to_string(),
        })),
        Err(_) => toks.push(Tok::Text(text[start..i].to_string())),
    }
    i
}

fn is_word_byte(b: u8) -> bool {
    !matches!(b, b' ' | b',' | b'(' | b')' | b'"' | b'\'' | b'*' | b'+' | b'/' | 0x01)
}

/// Lexes an identifier-like run and, when a `(` follows, the function call
/// it names.
fn word(
    text: &str,
    start: usize,
    division: bool,
    protected: &[String],
    toks: &mut Vec<Tok>,
) -> Result<usize, String> {
    let bytes = text.as_bytes();
    let mut i = start + 1;
    while i < bytes.len() && is_word_byte(bytes[i]) {
        i += 1;
    }
    // unicode-range: U+0025-00FF, U+4??
    if text[start..i].eq_ignore_ascii_case("u") && bytes.get(i) == Some(&b'+') {
        i += 1;
        while i < bytes.len() && (bytes[i].is_ascii_hexdigit() || matches!(bytes[i], b'?' | b'-')) {
            i += 1;
        }
    }
    let name = &text[start..i];
    if bytes.get(i) != Some(&b'(') {
        toks.push(Tok::Text(name.to_string()));
        return Ok(i);
    }
    let close = matching_paren(bytes, i).ok_or_else(|| format!("unbalanced '(' after {name}"))?;
    toks.push(function(name, &text[i + 1..close], division, protected)?);
    Ok(close + 1)
}

fn function(name: &str, args: &str, division: bool, protected: &[String]) -> Result<Tok, String> {
    let lower = name.to_ascii_lowercase();
    if LESS_FUNCTIONS.contains(&lower.as_str()) {
        return Err(format!("function {name}() is not supported"));
    }
    if OPAQUE_FUNCTIONS.contains(&lower.as_str()) || lower.starts_with("progid:") {
        return Ok(Tok::Text(format!("{name}({})", restore(args, protected))));
    }
    let toks = reduce(lex(args, division, protected)?)?;
    if lower == "rgba" {
        if let Some(rgba) = rgba_from_color(&toks) {
            return Ok(Tok::Text(rgba));
        }
    }
    Ok(Tok::Text(format!("{name}({})", render(&toks))))
}

/// `rgba(#333, 0.5)` written with a hex colour becomes plain CSS.
fn rgba_from_color(toks: &[Tok]) -> Option<String> {
    let args: Vec<Vec<&Tok>> = toks
        .split(|t| matches!(t, Tok::Text(s) if s == ","))
        .map(|arg| arg.iter().filter(|t| **t != Tok::Space).collect())
        .collect();
    let [color, alpha] = args.as_slice() else {
        return None;
    };
    let (&[Tok::Color(color)], &[Tok::Num(alpha)]) = (color.as_slice(), alpha.as_slice()) else {
        return None;
    };
    let alpha = match alpha.unit.as_str() {
        "%" => alpha.value / 100.0,
        "" => alpha.value,
        _ => return None,
    };
    let [r, g, b] = color.channels.map(|c| c.round().clamp(0.0, 255.0) as u8);
    Some(format!("rgba({r}, {g}, {b}, {})", format_number(alpha)))
}

/// A bare parenthesized group. Math inside it, division included, is
/// evaluated; a group that reduces to one value loses its parentheses.
fn group(inner: &str, protected: &[String]) -> Result<Tok, String> {
    let toks = lex(inner, true, protected)?;
    let had_op = toks.iter().any(|t| matches!(t, Tok::Op(_)));
    let reduced = reduce(toks)?;
    let mut values = reduced.iter().filter(|t| **t != Tok::Space);
    if let (true, Some(only), None) = (had_op, values.next(), values.next()) {
        if only.is_operand() {
            return Ok(only.clone());
        }
    }
    Ok(Tok::Text(format!("({})", render(&reduced))))
}

fn string_end(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn matching_paren(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = string_end(bytes, i);
                continue;
            }
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Applies operators, `*` and `/` before `+` and `-`, left to right.
fn reduce(toks: Vec<Tok>) -> Result<Vec<Tok>, String> {
    let mut toks: Vec<Tok> = toks
        .iter()
        .enumerate()
        .filter(|(i, t)| {
            **t != Tok::Space
                || !(matches!(toks.get(i + 1), Some(Tok::Op(_)))
                    || (*i > 0 && matches!(toks[i - 1], Tok::Op(_))))
        })
        .map(|(_, t)| t.clone())
        .collect();
    for ops in [['*', '/'], ['+', '-']] {
        let mut i = 0;
        while i < toks.len() {
            let Tok::Op(op) = toks[i] else {
                i += 1;
                continue;
            };
            if !ops.contains(&op) {
                i += 1;
                continue;
            }
            let (Some(left), Some(right)) = (i.checked_sub(1).map(|l| &toks[l]), toks.get(i + 1)) else {
                return Err(format!("missing operand for '{op}'"));
            };
            let result = apply(op, left, right)?;
            toks.splice(i - 1..=i + 1, [result]);
            i -= 1;
        }
    }
    Ok(toks)
}

fn apply(op: char, left: &Tok, right: &Tok) -> Result<Tok, String> {
    match (left, right) {
        (Tok::Num(a), Tok::Num(b)) => {
            let unit = match (a.unit.as_str(), b.unit.as_str()) {
                ("", u) | (u, "") => u.to_string(),
                (u, v) if u == v => u.to_string(),
                (u, v) => return Err(format!("incompatible units {u} and {v} in '{op}'")),
            };
            Ok(Tok::Num(Dimension::computed(arith(op, a.value, b.value)?, unit)))
        }
        (Tok::Color(a), Tok::Color(b)) => {
            let mut channels = [0.0; 3];
            for (i, c) in channels.iter_mut().enumerate() {
                *c = arith(op, a.channels[i], b.channels[i])?;
            }
            Ok(Tok::Color(Color::computed(channels)))
        }
        (Tok::Color(c), Tok::Num(n)) | (Tok::Num(n), Tok::Color(c)) if n.unit.is_empty() => {
            let color_first = matches!(left, Tok::Color(_));
            let mut channels = [0.0; 3];
            for (i, ch) in channels.iter_mut().enumerate() {
                *ch = if color_first {
                    arith(op, c.channels[i], n.value)?
                } else {
                    arith(op, n.value, c.channels[i])?
                };
            }
            Ok(Tok::Color(Color::computed(channels)))
        }
        _ => Err(format!(
            "cannot apply '{op}' to '{}' and '{}'",
            render(std::slice::from_ref(left)),
            render(std::slice::from_ref(right))
        )),
    }
}

fn arith(op: char, a: f64, b: f64) -> Result<f64, String> {
    Ok(match op {
        '+' => a + b,
        '-' => a - b,
        '*' => a * b,
        _ if b == 0.0 => return Err("division by zero".to_string()),
        _ => a / b,
    })
}

/// Up to eight decimals, trailing zeros dropped.
fn format_number(value: f64) -> String {
    let rounded = (value * 1e8).round() / 1e8;
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        format!("{}", rounded as i64)
    } else {
        format!("{rounded}")
    }
}

fn render(toks: &[Tok]) -> String {
    let mut out = String::new();
    for tok in toks {
        match tok {
            Tok::Num(n) => out.push_str(&n.text),
            Tok::Color(c) => out.push_str(&c.text),
            Tok::Op(op) => out.push(*op),
            Tok::Space => out.push(' '),
            Tok::Text(s) => out.push_str(s),
        }
    }
    out
}
