//! Scripted key input: `"<ms>:<code>"` entries separated by commas, e.g.
//! `"0:ArrowUp,420:ArrowLeft"`. Times are relative to the first frame.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptedKey {
    pub at_ms: f64,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
    #[error("script entry {index} ({entry:?}) is not of the form <ms>:<code>")]
    Malformed { index: usize, entry: String },

    #[error("script entry {index} has invalid time {value:?}")]
    BadTime { index: usize, value: String },
}

/// Parse a key script. Entries are returned sorted by time; entries at the
/// same time keep their written order.
pub fn parse_script(script: &str) -> Result<Vec<ScriptedKey>, ScriptError> {
    let mut keys = Vec::new();
    for (index, entry) in script
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .enumerate()
    {
        let Some((time, code)) = entry.split_once(':') else {
            return Err(ScriptError::Malformed {
                index,
                entry: entry.to_string(),
            });
        };
        let code = code.trim();
        if code.is_empty() {
            return Err(ScriptError::Malformed {
                index,
                entry: entry.to_string(),
            });
        }
        let at_ms = time
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite() && *t >= 0.0)
            .ok_or_else(|| ScriptError::BadTime {
                index,
                value: time.to_string(),
            })?;
        keys.push(ScriptedKey {
            at_ms,
            code: code.to_string(),
        });
    }
    keys.sort_by(|a, b| a.at_ms.total_cmp(&b.at_ms));
    Ok(keys)
}
