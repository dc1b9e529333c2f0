//! Legacy `%`-style message interpolation.
//!
//! Supports the conversions log messages use in practice: `%s`, `%r`,
//! `%d`, `%i`, `%f` and `%%`, with an optional `(key)` mapping lookup,
//! `-`/`0` flags, width and precision.

use serde_json::Value;

use crate::api::MAX_MESSAGE_LEN;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InterpolationError {
    #[error("not enough arguments for format string")]
    NotEnoughArguments,

    #[error("not all arguments converted during string formatting")]
    TooManyArguments,

    #[error("format requires a mapping")]
    MappingRequired,

    #[error("missing mapping key {0:?}")]
    MissingKey(String),

    #[error("%{conversion} format: a number is required, not {found}")]
    NumberRequired { conversion: char, found: &'static str },

    #[error("unsupported format character {0:?}")]
    UnsupportedConversion(char),

    #[error("incomplete format")]
    Incomplete,
}

#[derive(Default)]
struct Directive {
    key: Option<String>,
    left_align: bool,
    zero_pad: bool,
    width: Option<usize>,
    precision: Option<usize>,
}

/// Interpolate `template` against `args`.
///
/// A single JSON object argument serves as the mapping for `%(key)s`
/// conversions, matching how a lone mapping is treated by the classic
/// logging API.
pub fn interpolate(template: &str, args: &[Value]) -> Result<String, InterpolationError> {
    let mapping = match args {
        [Value::Object(map)] => Some(map),
        _ => None,
    };
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut next_arg = 0usize;
    let mut used_mapping = false;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut directive = Directive::default();

        if chars.peek() == Some(&'(') {
            chars.next();
            let mut key = String::new();
            loop {
                match chars.next() {
                    Some(')') => break,
                    Some(ch) => key.push(ch),
                    None => return Err(InterpolationError::Incomplete),
                }
            }
            directive.key = Some(key);
        }

        while let Some(&flag) = chars.peek() {
            match flag {
                '-' => directive.left_align = true,
                '0' => directive.zero_pad = true,
                ' ' | '+' | '#' => {}
                _ => break,
            }
            chars.next();
        }

        directive.width = read_number(&mut chars);
        if chars.peek() == Some(&'.') {
            chars.next();
            directive.precision = Some(read_number(&mut chars).unwrap_or(0));
        }

        let conversion = chars.next().ok_or(InterpolationError::Incomplete)?;
        if conversion == '%' {
            out.push('%');
            continue;
        }

        let value = match &directive.key {
            Some(key) => {
                let map = mapping.ok_or(InterpolationError::MappingRequired)?;
                used_mapping = true;
                map.get(key)
                    .ok_or_else(|| InterpolationError::MissingKey(key.clone()))?
            }
            None => {
                let value = args
                    .get(next_arg)
                    .ok_or(InterpolationError::NotEnoughArguments)?;
                next_arg += 1;
                value
            }
        };

        let converted = convert(conversion, value, &directive)?;
        pad_into(&mut out, &converted, &directive, conversion);
    }

    if !used_mapping && next_arg < args.len() {
        return Err(InterpolationError::TooManyArguments);
    }
    Ok(out)
}

/// Upper bound for widths and precisions.
const MAX_FIELD_WIDTH: usize = MAX_MESSAGE_LEN;

fn read_number(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<usize> {
    let mut number: Option<usize> = None;
    while let Some(&d) = chars.peek() {
        let Some(digit) = d.to_digit(10) else {
            break;
        };
        let acc = number.unwrap_or(0).saturating_mul(10).saturating_add(digit as usize);
        number = Some(acc.min(MAX_FIELD_WIDTH));
        chars.next();
    }
    number
}

fn convert(conversion: char, value: &Value, directive: &Directive) -> Result<String, InterpolationError> {
    match conversion {
        's' => {
            let text = display(value);
            Ok(match directive.precision {
                Some(p) => text.chars().take(p).collect(),
                None => text,
            })
        }
        'r' => Ok(value.to_string()),
        'd' | 'i' => {
            let number = as_number(conversion, value)?;
            Ok(format!("{}", number.trunc() as i64))
        }
        'f' | 'F' => {
            let number = as_number(conversion, value)?;
            Ok(format!("{:.*}", directive.precision.unwrap_or(6), number))
        }
        other => Err(InterpolationError::UnsupportedConversion(other)),
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

fn as_number(conversion: char, value: &Value) -> Result<f64, InterpolationError> {
    match value {
        Value::Number(n) => n.as_f64().ok_or(InterpolationError::NumberRequired {
            conversion,
            found: "number",
        }),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        other => Err(InterpolationError::NumberRequired {
            conversion,
            found: type_name(other),
        }),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn pad_into(out: &mut String, text: &str, directive: &Directive, conversion: char) {
    let width = directive.width.unwrap_or(0);
    let len = text.chars().count();
    if len >= width {
        out.push_str(text);
        return;
    }
    let fill = width - len;
    if directive.left_align {
        out.push_str(text);
        out.extend(std::iter::repeat(' ').take(fill));
    } else if directive.zero_pad && conversion != 's' && conversion != 'r' {
        let (sign, digits) = match text.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", text),
        };
        out.push_str(sign);
        out.extend(std::iter::repeat('0').take(fill));
        out.push_str(digits);
    } else {
        out.extend(std::iter::repeat(' ').take(fill));
        out.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn positional_conversions() {
        let out = interpolate("user %s failed %d times (%.2f%%)", &[json!("bob"), json!(3), json!(37.5)]);
        assert_eq!(out.unwrap(), "user bob failed 3 times (37.50%)");
    }

    #[test]
    fn repr_quotes_strings() {
        assert_eq!(interpolate("%r", &[json!("x")]).unwrap(), "\"x\"");
    }

    #[test]
    fn mapping_conversions() {
        let out = interpolate("%(user)s/%(count)03d", &[json!({"user": "ann", "count": 7})]);
        assert_eq!(out.unwrap(), "ann/007");
    }

    #[test]
    fn width_and_alignment() {
        assert_eq!(interpolate("[%5s]", &[json!("ab")]).unwrap(), "[   ab]");
        assert_eq!(interpolate("[%-5s]", &[json!("ab")]).unwrap(), "[ab   ]");
        assert_eq!(interpolate("[%05d]", &[json!(-42)]).unwrap(), "[-0042]");
    }

    #[test]
    fn oversized_width_and_precision_are_clamped() {
        let out = interpolate("%999999999999999999999s", &[json!("ab")]).unwrap();
        assert_eq!(out.chars().count(), MAX_FIELD_WIDTH);
        assert!(out.ends_with(" ab"));

        let out = interpolate("%.99999999f", &[json!(1.5)]).unwrap();
        assert_eq!(out.len(), 2 + MAX_FIELD_WIDTH);
    }

    #[test]
    fn reports_argument_mismatches() {
        assert_eq!(interpolate("%s %s", &[json!(1)]), Err(InterpolationError::NotEnoughArguments));
        assert_eq!(interpolate("%s", &[json!(1), json!(2)]), Err(InterpolationError::TooManyArguments));
        assert!(matches!(
            interpolate("%d", &[json!("x")]),
            Err(InterpolationError::NumberRequired { conversion: 'd', .. })
        ));
        assert_eq!(interpolate("%q", &[json!(1)]), Err(InterpolationError::UnsupportedConversion('q')));
        assert_eq!(interpolate("%(a)s", &[json!(1)]), Err(InterpolationError::MappingRequired));
    }
}
