//! Utility objects callable from expressions as `#object.method(args)`
//!
//! The registry is closed and resolved through a compile-time perfect hash map keyed by
//! `object.method`. Methods that receive arguments they cannot use return null.

use std::fmt::Write;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use phf::phf_map;

use crate::error::{Error, Result};
use crate::locale::Locale;
use crate::scope::Scope;
use crate::value::Value;

type UtilityFn = fn(&Scope<'_>, &[Value]) -> Result<Value>;

/// Utility method metadata
#[derive(Clone, Copy)]
pub struct UtilityMethod {
    pub object: &'static str,
    pub name: &'static str,
    call: UtilityFn,
}

static UTILITY_METHODS: phf::Map<&'static str, UtilityMethod> = phf_map! {
    "dates.format" => UtilityMethod { object: "dates", name: "format", call: dates_format },

    "numbers.formatDecimal" => UtilityMethod { object: "numbers", name: "formatDecimal", call: numbers_format_decimal },
    "numbers.formatDiskSize" => UtilityMethod { object: "numbers", name: "formatDiskSize", call: numbers_format_disk_size },

    "request.getRequestURI" => UtilityMethod { object: "request", name: "getRequestURI", call: request_uri },
    "request.getRequestURL" => UtilityMethod { object: "request", name: "getRequestURL", call: request_uri },
    "request.getParameter" => UtilityMethod { object: "request", name: "getParameter", call: request_parameter },

    "security.authorized" => UtilityMethod { object: "security", name: "authorized", call: security_authorized },
    "security.username" => UtilityMethod { object: "security", name: "username", call: security_username },
    "security.hasRole" => UtilityMethod { object: "security", name: "hasRole", call: security_has_role },
};

/// Look up a utility method
pub fn lookup(object: &str, method: &str) -> Option<&'static UtilityMethod> {
    UTILITY_METHODS.get(format!("{object}.{method}").as_str())
}

/// Call `#object.method(params)`
pub fn call(scope: &Scope<'_>, object: &str, method: &str, params: &[Value]) -> Result<Value> {
    let utility = lookup(object, method)
        .ok_or_else(|| Error::UndefinedUtilityMethod(format!("#{object}.{method}")))?;
    (utility.call)(scope, params)
}

fn locale(scope: &Scope<'_>) -> Result<Locale> {
    Ok(scope.get_request()?.locale())
}

/// Non-negative integer parameter at `index`, or `default`
fn count_param(params: &[Value], index: usize, default: usize) -> usize {
    params
        .get(index)
        .and_then(Value::as_i64)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(default)
}

// ----------------------------------------------------------------------
// #dates

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    let text = text.strip_suffix('Z').unwrap_or(text);
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn dates_format(scope: &Scope<'_>, params: &[Value]) -> Result<Value> {
    let (Some(timestamp), Some(pattern)) = (
        params.first().and_then(Value::as_str),
        params.get(1).and_then(Value::as_str),
    ) else {
        return Ok(Value::Null);
    };
    if params.len() != 2 {
        return Ok(Value::Null);
    }

    let Some(naive) = parse_timestamp(timestamp) else {
        return Ok(Value::Null);
    };

    let locale = locale(scope)?;
    let datetime = Utc.from_utc_datetime(&naive);

    let mut result = String::new();
    if write!(
        result,
        "{}",
        datetime.format_localized(pattern, locale.chrono_locale())
    )
    .is_err()
    {
        return Err(Error::InvalidAttributeValue(format!(
            "#dates.format pattern '{pattern}'"
        )));
    }

    Ok(Value::String(result))
}

// ----------------------------------------------------------------------
// #numbers

/// Format `value` with at least `int_digits` integer digits and exactly `decimals` fraction
/// digits, using the separators of `locale`
pub fn format_decimal(value: f64, int_digits: usize, decimals: usize, locale: &Locale) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (integral, fraction) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), ""));

    let integral = format!("{integral:0>int_digits$}");

    let separator = locale.grouping_separator();
    let digits: Vec<char> = integral.chars().collect();
    let mut grouped = String::new();
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push_str(separator);
        }
        grouped.push(*digit);
    }

    let mut result = String::new();
    if value.is_sign_negative() && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        result.push('-');
    }
    result.push_str(&grouped);
    if !fraction.is_empty() {
        result.push_str(locale.decimal_separator());
        result.push_str(fraction);
    }
    result
}

fn numbers_format_decimal(scope: &Scope<'_>, params: &[Value]) -> Result<Value> {
    let Some(value) = params.first().filter(|v| v.is_number()).and_then(Value::as_f64) else {
        return Ok(Value::Null);
    };

    let int_digits = count_param(params, 1, 1);
    let decimals = count_param(params, 2, 0);

    Ok(Value::String(format_decimal(
        value,
        int_digits,
        decimals,
        &locale(scope)?,
    )))
}

const DISK_SIZE_UNITS: [char; 7] = ['B', 'K', 'M', 'G', 'T', 'P', 'E'];

fn numbers_format_disk_size(scope: &Scope<'_>, params: &[Value]) -> Result<Value> {
    let Some(mut size) = params.first().filter(|v| v.is_number()).and_then(Value::as_f64) else {
        return Ok(Value::Null);
    };

    let mut unit = 0;
    while size > 1024.0 && unit + 1 < DISK_SIZE_UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }

    let decimals = count_param(params, 1, 0);

    Ok(Value::String(format!(
        "{} {}",
        format_decimal(size, 1, decimals, &locale(scope)?),
        DISK_SIZE_UNITS[unit]
    )))
}

// ----------------------------------------------------------------------
// #request

fn request_uri(scope: &Scope<'_>, _params: &[Value]) -> Result<Value> {
    Ok(Value::from(scope.get_request()?.uri()))
}

fn request_parameter(scope: &Scope<'_>, params: &[Value]) -> Result<Value> {
    let [name] = params else {
        return Ok(Value::Null);
    };
    Ok(scope
        .get_request()?
        .parameter(&name.to_text())
        .map(Value::String)
        .unwrap_or_default())
}

// ----------------------------------------------------------------------
// #security

fn credentials(scope: &Scope<'_>) -> Result<Value> {
    Ok(scope.get_request()?.credentials())
}

fn security_authorized(scope: &Scope<'_>, _params: &[Value]) -> Result<Value> {
    let credentials = credentials(scope)?;
    Ok(Value::Boolean(
        credentials.get("username").and_then(Value::as_str).is_some(),
    ))
}

fn security_username(scope: &Scope<'_>, _params: &[Value]) -> Result<Value> {
    Ok(credentials(scope)?
        .get("username")
        .cloned()
        .unwrap_or_default())
}

fn security_has_role(scope: &Scope<'_>, params: &[Value]) -> Result<Value> {
    let [Value::String(role)] = params else {
        return Ok(Value::Null);
    };
    let credentials = credentials(scope)?;
    let has_role = credentials
        .get("role")
        .filter(|roles| roles.as_array().is_some())
        .is_some_and(|roles| roles.contains(&Value::String(role.clone())));
    Ok(Value::Boolean(has_role))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_grouping_and_padding() {
        let en = Locale::parse("en-GB").unwrap();
        assert_eq!(format_decimal(12345.6789, 1, 2, &en), "12,345.68");
        assert_eq!(format_decimal(-12.34, 1, 2, &en), "-12.34");
        assert_eq!(format_decimal(7.0, 3, 0, &en), "007");
        assert_eq!(format_decimal(1234567.0, 1, 0, &en), "1,234,567");

        let nl = Locale::parse("nl").unwrap();
        assert_eq!(format_decimal(12345.6789, 1, 2, &nl), "12.345,68");
    }

    #[test]
    fn timestamps() {
        assert!(parse_timestamp("2019-08-07 12:14:00").is_some());
        assert!(parse_timestamp("2019-08-07T12:14:00Z").is_some());
        assert!(parse_timestamp("2019-08-07").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn registry_is_closed() {
        assert!(lookup("numbers", "formatDecimal").is_some());
        assert!(lookup("numbers", "formatCurrency").is_none());
        let scope = Scope::new();
        assert!(matches!(
            call(&scope, "strings", "upper", &[]),
            Err(Error::UndefinedUtilityMethod(name)) if name == "#strings.upper"
        ));
    }
}
