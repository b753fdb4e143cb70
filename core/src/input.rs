use std::collections::HashMap;
use anyhow::{anyhow, bail, Result};
use chrono::NaiveDate;

use crate::model::EntryType;
use crate::service::log_service::{EntryDraft, EntryPatch};
use crate::time::{parse_clock_time, parse_log_date};

/// Keys understood by `rtotrack log`. Any unique prefix works (`d:` for `date:`).
pub const LOG_KEYS: &[&str] = &["date", "in", "out", "hours", "edit"];

#[derive(Debug, PartialEq)]
pub struct ParsedInput {
    pub words: Vec<String>,
    pub metadata: HashMap<String, String>,
}

/// Splits arguments into bare words and `key:value` pairs. Only the first colon
/// separates, so `in:9:30` keeps its time intact.
pub fn parse_args(args: &[String]) -> ParsedInput {
    let mut words = Vec::new();
    let mut metadata = HashMap::new();

    for arg in args {
        if let Some((key, value)) = arg.split_once(':') {
            if !key.is_empty() {
                metadata.insert(key.to_string(), value.to_string());
                continue;
            }
        }
        words.push(arg.clone());
    }

    ParsedInput { words, metadata }
}

pub fn expand_key(key: &str, candidates: &[&str]) -> Result<String> {
    if candidates.contains(&key) {
        return Ok(key.to_string());
    }

    let matches: Vec<&str> = candidates
        .iter()
        .filter(|&&c| c.starts_with(key))
        .cloned()
        .collect();

    match matches.len() {
        1 => Ok(matches[0].to_string()),
        0 => Err(anyhow!("Unknown key: '{}'", key)),
        _ => Err(anyhow!("Ambiguous key: '{}' matches {:?}", key, matches)),
    }
}

#[derive(Debug, PartialEq)]
pub enum LogCommand {
    New(EntryDraft),
    /// Rewrite the entry with this id (or id prefix). Only the given keys change.
    Edit { id: String, patch: EntryPatch },
}

/// Turns `office date:yest in:9:00 out:17:30` into a draft for `today`'s frame
/// of reference. With `edit:<id>` the entry type is optional and every key left
/// out keeps the stored value.
pub fn parse_log_command(args: &[String], today: NaiveDate) -> Result<LogCommand> {
    let parsed = parse_args(args);
    let entry_type: Option<EntryType> = match parsed.words.as_slice() {
        [kind] => Some(kind.parse()?),
        [] => None,
        [_, extra @ ..] => bail!("Unexpected arguments: {}", extra.join(" ")),
    };

    let mut patch = EntryPatch { entry_type, ..EntryPatch::default() };
    let mut edit = None;
    for (key, value) in &parsed.metadata {
        match expand_key(key, LOG_KEYS)?.as_str() {
            "date" => patch.date = Some(parse_log_date(value, today)?),
            "in" => patch.in_time = Some(parse_clock_time(value)?),
            "out" => patch.out_time = Some(parse_clock_time(value)?),
            "hours" => {
                let hours: f64 = value.trim().parse()
                    .map_err(|_| anyhow!("Invalid hours: {}", value))?;
                if !hours.is_finite() || hours < 0.0 {
                    bail!("Hours must be a non-negative number: {}", value);
                }
                patch.hours = Some(hours);
            }
            "edit" => edit = Some(value.clone()),
            other => bail!("Unsupported key: {}", other),
        }
    }

    if let Some(id) = edit {
        return Ok(LogCommand::Edit { id, patch });
    }
    let Some(entry_type) = patch.entry_type else {
        bail!("Missing entry type (office, wfh or leave)");
    };
    Ok(LogCommand::New(EntryDraft {
        date: patch.date.unwrap_or(today),
        entry_type,
        in_time: patch.in_time,
        out_time: patch.out_time,
        hours: patch.hours,
    }))
}
