//! Date primitives: `parseDate`, `formatDate`.
//!
//! Script formats use the LDML pattern letters mobile platforms expose
//! (`M/d/yyyy h:mm a`), converted here to strftime for chrono. Month and
//! meridiem names are always English, so scripts behave identically on every
//! device. Formats without a date assume today (UTC); formats without a time
//! assume midnight; formats without a year assume the current year.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use tapkit_types::{ScriptValue, Step, StepError};
use tracing::debug;

use crate::context::ExecCtx;

use super::result_key;

/// Formats tried, in order, when a `parseDate` step does not supply its own.
pub const DEFAULT_FORMATS: [&str; 7] = [
    "M/d/yyyy h:mm a",
    "MM/dd h:mm a",
    "h:mm a",
    "yyyy-MM-dd HH:mm:ss",
    "yyyy-MM-dd",
    "MMM dd, yyyy",
    "MMM d",
];

#[derive(Debug, Default, Clone, Copy)]
struct FormatShape {
    has_year: bool,
    has_date: bool,
    has_time: bool,
}

/// Converts an LDML date pattern to a strftime string, noting which
/// components the pattern carries.
fn ldml_to_strftime(pattern: &str) -> (String, FormatShape) {
    let mut output = String::new();
    let mut shape = FormatShape::default();
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let letter = chars[i];
        if !letter.is_ascii_alphabetic() {
            output.push(letter);
            i += 1;
            continue;
        }
        let mut run = 1;
        while i + run < chars.len() && chars[i + run] == letter {
            run += 1;
        }
        match (letter, run) {
            ('y', _) => {
                shape.has_year = true;
                shape.has_date = true;
                output.push_str(if run <= 2 { "%y" } else { "%Y" });
            }
            ('M', r) if r >= 3 => {
                shape.has_date = true;
                output.push_str("%b");
            }
            ('M', 2) => {
                shape.has_date = true;
                output.push_str("%m");
            }
            ('M', _) => {
                shape.has_date = true;
                output.push_str("%-m");
            }
            ('d', 2) => {
                shape.has_date = true;
                output.push_str("%d");
            }
            ('d', _) => {
                shape.has_date = true;
                output.push_str("%-d");
            }
            ('H', 2) => {
                shape.has_time = true;
                output.push_str("%H");
            }
            ('H', _) => {
                shape.has_time = true;
                output.push_str("%-H");
            }
            ('h', 2) => {
                shape.has_time = true;
                output.push_str("%I");
            }
            ('h', _) => {
                shape.has_time = true;
                output.push_str("%-I");
            }
            ('m', 2) => {
                shape.has_time = true;
                output.push_str("%M");
            }
            ('m', _) => {
                shape.has_time = true;
                output.push_str("%-M");
            }
            ('s', 2) => {
                shape.has_time = true;
                output.push_str("%S");
            }
            ('s', _) => {
                shape.has_time = true;
                output.push_str("%-S");
            }
            ('a', _) => {
                shape.has_time = true;
                output.push_str("%p");
            }
            _ => {
                // Unrecognized letters pass through; parsing will fail loudly
                // if they matter.
                for _ in 0..run {
                    output.push(letter);
                }
            }
        }
        i += run;
    }

    (output, shape)
}

/// Tries one LDML format against the input, filling missing components from
/// the current UTC moment.
fn parse_with_format(input: &str, pattern: &str) -> Option<NaiveDateTime> {
    let (strftime, shape) = ldml_to_strftime(pattern);
    let now = Utc::now();

    if shape.has_date && shape.has_time {
        if shape.has_year {
            return NaiveDateTime::parse_from_str(input, &strftime).ok();
        }
        // Year-less patterns parse with the current year stitched in front.
        let padded_input = format!("{} {}", now.year(), input);
        let padded_format = format!("%Y {strftime}");
        return NaiveDateTime::parse_from_str(&padded_input, &padded_format).ok();
    }
    if shape.has_date {
        let date = if shape.has_year {
            NaiveDate::parse_from_str(input, &strftime).ok()?
        } else {
            let padded_input = format!("{} {}", now.year(), input);
            let padded_format = format!("%Y {strftime}");
            NaiveDate::parse_from_str(&padded_input, &padded_format).ok()?
        };
        return date.and_hms_opt(0, 0, 0);
    }
    if shape.has_time {
        let time = NaiveTime::parse_from_str(input, &strftime).ok()?;
        return Some(now.date_naive().and_time(time));
    }
    None
}

pub fn parse_date(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let input = step
        .str_arg_any(&["input", "value"])
        .ok_or_else(|| StepError::InvalidArgument("'parseDate' requires an 'input' argument".into()))?;
    let key = result_key(step)?;

    let custom_formats = step.string_list_arg("formats");
    let formats: Vec<&str> = if custom_formats.is_empty() {
        DEFAULT_FORMATS.to_vec()
    } else {
        custom_formats.iter().map(String::as_str).collect()
    };

    for format in formats {
        let Some(parsed) = parse_with_format(&input, format) else {
            continue;
        };
        let timestamp = parsed.and_utc().timestamp();
        debug!(input = %input, format = %format, timestamp, "date parsed");

        cx.record(&key, ScriptValue::Date(timestamp));
        cx.state.set_variable(&format!("{key}_year"), ScriptValue::Number(parsed.year() as f64));
        cx.state.set_variable(&format!("{key}_month"), ScriptValue::Number(parsed.month() as f64));
        cx.state.set_variable(&format!("{key}_day"), ScriptValue::Number(parsed.day() as f64));
        cx.state.set_variable(&format!("{key}_hour"), ScriptValue::Number(parsed.hour() as f64));
        cx.state.set_variable(&format!("{key}_minute"), ScriptValue::Number(parsed.minute() as f64));
        cx.state
            .set_variable(&format!("{key}_timestamp"), ScriptValue::Number(timestamp as f64));
        return Ok(());
    }

    Err(StepError::InvalidArgument(format!("could not parse date '{input}'")))
}

pub fn format_date(step: &Step, cx: &mut ExecCtx<'_>) -> Result<(), StepError> {
    let pattern = step.require_str("format")?;
    let key = result_key(step)?;

    let timestamp = match step.f64_arg("timestamp") {
        Some(value) => value,
        None => match step.str_arg("timestampVar") {
            Some(name) => cx
                .state
                .numeric(&name)
                .ok_or_else(|| StepError::InvalidArgument(format!("variable '{name}' is not numeric")))?,
            None => Utc::now().timestamp() as f64,
        },
    };

    let moment = DateTime::<Utc>::from_timestamp(timestamp as i64, 0)
        .ok_or_else(|| StepError::InvalidArgument(format!("timestamp {timestamp} is out of range")))?;
    let (strftime, _) = ldml_to_strftime(&pattern);
    let formatted = moment.format(&strftime).to_string();
    cx.record(&key, ScriptValue::Str(formatted));
    Ok(())
}
