//! The format-spec mini-language: `[[fill]align][sign][#][0][width][.precision][type]`,
//! shared by f-string formatted values (`f"{x:.2f}"`) and the `format()`
//! builtin.
//!
//! Deliberately narrower than CPython's: no thousands separators (`,`/`_`),
//! no locale-aware (`n`), general (`g`/`G`), or exponential (`e`/`E`) float
//! forms, and no `c` integer-to-character form.

use crate::error::{Error, Result};
use crate::value::PyValue;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
    PadSign,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Sign {
    Minus,
    Plus,
    Space,
}

struct Spec {
    fill: char,
    align: Option<Align>,
    sign: Sign,
    alt: bool,
    width: Option<usize>,
    precision: Option<usize>,
    ty: Option<char>,
}

impl Default for Spec {
    fn default() -> Self {
        Spec {
            fill: ' ',
            align: None,
            sign: Sign::Minus,
            alt: false,
            width: None,
            precision: None,
            ty: None,
        }
    }
}

fn is_align_char(c: char) -> bool {
    matches!(c, '<' | '>' | '^' | '=')
}

fn to_align(c: char) -> Align {
    match c {
        '<' => Align::Left,
        '>' => Align::Right,
        '^' => Align::Center,
        '=' => Align::PadSign,
        _ => unreachable!(),
    }
}

fn parse(spec_str: &str) -> Result<Spec> {
    let chars: Vec<char> = spec_str.chars().collect();
    let mut i = 0;
    let mut spec = Spec::default();

    if chars.len() >= 2 && is_align_char(chars[1]) {
        spec.fill = chars[0];
        spec.align = Some(to_align(chars[1]));
        i = 2;
    } else if !chars.is_empty() && is_align_char(chars[0]) {
        spec.align = Some(to_align(chars[0]));
        i = 1;
    }

    if i < chars.len() && matches!(chars[i], '+' | '-' | ' ') {
        spec.sign = match chars[i] {
            '+' => Sign::Plus,
            ' ' => Sign::Space,
            _ => Sign::Minus,
        };
        i += 1;
    }

    if i < chars.len() && chars[i] == '#' {
        spec.alt = true;
        i += 1;
    }

    if i < chars.len() && chars[i] == '0' {
        if spec.align.is_none() {
            spec.align = Some(Align::PadSign);
            spec.fill = '0';
        }
        i += 1;
    }

    let width_start = i;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i > width_start {
        spec.width = Some(chars[width_start..i].iter().collect::<String>().parse().expect("digits"));
    }

    if i < chars.len() && (chars[i] == ',' || chars[i] == '_') {
        return Err(Error::NotImplemented(
            "thousands separators in format specs are not supported".to_string(),
        ));
    }

    if i < chars.len() && chars[i] == '.' {
        i += 1;
        let prec_start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        if i == prec_start {
            return Err(Error::Value(format!("format spec '{spec_str}' is missing a precision digit")));
        }
        spec.precision = Some(chars[prec_start..i].iter().collect::<String>().parse().expect("digits"));
    }

    if i < chars.len() {
        spec.ty = Some(chars[i]);
        i += 1;
    }

    if i != chars.len() {
        return Err(Error::Value(format!("invalid format spec '{spec_str}'")));
    }
    Ok(spec)
}

fn pad(body: &str, spec: &Spec, default_align: Align) -> String {
    let Some(width) = spec.width else {
        return body.to_string();
    };
    let len = body.chars().count();
    if len >= width {
        return body.to_string();
    }
    let total = width - len;
    let fill = spec.fill;
    match spec.align.unwrap_or(default_align) {
        Align::Left => format!("{body}{}", fill.to_string().repeat(total)),
        Align::Right | Align::PadSign => format!("{}{body}", fill.to_string().repeat(total)),
        Align::Center => {
            let left = total / 2;
            let right = total - left;
            format!("{}{body}{}", fill.to_string().repeat(left), fill.to_string().repeat(right))
        }
    }
}

fn sign_prefix(negative: bool, spec: &Spec) -> &'static str {
    if negative {
        "-"
    } else {
        match spec.sign {
            Sign::Plus => "+",
            Sign::Space => " ",
            Sign::Minus => "",
        }
    }
}

fn pad_numeric(sign: &str, magnitude: &str, spec: &Spec) -> String {
    let Some(width) = spec.width else {
        return format!("{sign}{magnitude}");
    };
    let len = sign.chars().count() + magnitude.chars().count();
    if len >= width {
        return format!("{sign}{magnitude}");
    }
    let total = width - len;
    let fill = spec.fill;
    match spec.align.unwrap_or(Align::Right) {
        Align::PadSign => format!("{sign}{}{magnitude}", fill.to_string().repeat(total)),
        Align::Left => format!("{sign}{magnitude}{}", fill.to_string().repeat(total)),
        Align::Right => format!("{}{sign}{magnitude}", fill.to_string().repeat(total)),
        Align::Center => {
            let left = total / 2;
            let right = total - left;
            format!("{}{sign}{magnitude}{}", fill.to_string().repeat(left), fill.to_string().repeat(right))
        }
    }
}

fn render_int(i: i64, spec: &Spec) -> Result<String> {
    let negative = i < 0;
    let magnitude = i.unsigned_abs();
    let (digits, prefix) = match spec.ty {
        None | Some('d') => (magnitude.to_string(), ""),
        Some('x') => (format!("{magnitude:x}"), if spec.alt { "0x" } else { "" }),
        Some('X') => (format!("{magnitude:X}"), if spec.alt { "0X" } else { "" }),
        Some('o') => (format!("{magnitude:o}"), if spec.alt { "0o" } else { "" }),
        Some('b') => (format!("{magnitude:b}"), if spec.alt { "0b" } else { "" }),
        Some(other) => return Err(Error::Value(format!("unknown format code '{other}' for object of type 'int'"))),
    };
    let sign = sign_prefix(negative, spec);
    Ok(pad_numeric(sign, &format!("{prefix}{digits}"), spec))
}

fn render_float(f: f64, spec: &Spec) -> Result<String> {
    let negative = f.is_sign_negative() && f != 0.0;
    let magnitude = f.abs();
    let magnitude_text = match spec.ty {
        Some('f') | Some('F') => format!("{:.*}", spec.precision.unwrap_or(6), magnitude),
        Some('%') => format!("{:.*}%", spec.precision.unwrap_or(6), magnitude * 100.0),
        None => match spec.precision {
            Some(p) => format!("{magnitude:.p$}"),
            None => PyValue::Float(magnitude).py_str(),
        },
        Some(other) => return Err(Error::Value(format!("unknown format code '{other}' for object of type 'float'"))),
    };
    let sign = sign_prefix(negative, spec);
    Ok(pad_numeric(sign, &magnitude_text, spec))
}

/// Renders `value` according to `spec_str`. An empty spec is the common
/// case (plain `f"{x}"`/`str(x)`) and always just delegates to `py_str`.
pub fn format_value(value: &PyValue, spec_str: &str) -> Result<String> {
    if spec_str.is_empty() {
        return Ok(value.py_str());
    }
    let spec = parse(spec_str)?;
    match value {
        PyValue::Str(s) => match spec.ty {
            None | Some('s') => Ok(pad(s, &spec, Align::Left)),
            Some(other) => Err(Error::Value(format!("unknown format code '{other}' for object of type 'str'"))),
        },
        PyValue::Bool(b) if spec.ty.is_none() => {
            Ok(pad(if *b { "True" } else { "False" }, &spec, Align::Left))
        }
        PyValue::Int(i) => render_int(*i, &spec),
        PyValue::Bool(b) => render_int(*b as i64, &spec),
        PyValue::Float(f) => render_float(*f, &spec),
        other => {
            if spec.width.is_none() && spec.precision.is_none() && spec.ty.is_none() {
                Ok(other.py_str())
            } else {
                Err(Error::Type(format!(
                    "unsupported format string passed to {}.__format__",
                    other.type_name()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_spec_is_plain_str() {
        assert_eq!(format_value(&PyValue::Int(42), "").unwrap(), "42");
    }

    #[test]
    fn width_and_precision_on_float() {
        assert_eq!(format_value(&PyValue::Float(3.14159), ".2f").unwrap(), "3.14");
        assert_eq!(format_value(&PyValue::Float(3.0), "8.2f").unwrap(), "    3.00");
    }

    #[test]
    fn zero_pad_forces_pad_after_sign() {
        assert_eq!(format_value(&PyValue::Int(-7), "05d").unwrap(), "-0007");
        assert_eq!(format_value(&PyValue::Int(7), "05d").unwrap(), "00007");
    }

    #[test]
    fn explicit_sign_on_positive_number() {
        assert_eq!(format_value(&PyValue::Int(7), "+d").unwrap(), "+7");
    }

    #[test]
    fn hex_with_alt_form_prefix() {
        assert_eq!(format_value(&PyValue::Int(255), "#x").unwrap(), "0xff");
    }

    #[test]
    fn string_alignment_and_fill() {
        assert_eq!(format_value(&PyValue::Str("hi".to_string()), "*^6").unwrap(), "**hi**");
    }

    #[test]
    fn unknown_type_code_is_a_value_error() {
        let err = format_value(&PyValue::Int(1), "q").unwrap_err();
        assert_eq!(err.kind(), "ValueError");
    }

    #[test]
    fn thousands_separator_is_not_implemented() {
        let err = format_value(&PyValue::Int(1000), ",d").unwrap_err();
        assert_eq!(err.kind(), "NotImplementedError");
    }
}
