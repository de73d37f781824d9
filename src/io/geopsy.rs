//! Shared pieces of the engine's plain-text report dumps.
//!
//! Both ground-model and dispersion dumps open every model with
//! `# Layered model <id>: value=<misfit>`.

use crate::error::{AppError, Result};

/// Header line for a model block, without the trailing newline.
pub fn model_header(identifier: u64, misfit: Option<f64>) -> String {
    match misfit {
        Some(m) => format!("# Layered model {identifier}: value={m}"),
        None => format!("# Layered model {identifier}"),
    }
}

/// Parse `Layered model 110: value=0.593` (the text after `#`).
///
/// Returns `Ok(None)` for any other comment.
pub fn parse_model_header(comment: &str) -> Result<Option<(u64, Option<f64>)>> {
    let Some(rest) = comment.trim().strip_prefix("Layered model") else {
        return Ok(None);
    };
    let (id_part, value_part) = match rest.split_once(':') {
        Some((id, value)) => (id, Some(value)),
        None => (rest, None),
    };
    let id_text = id_part.trim();
    let identifier = id_text
        .parse()
        .map_err(|_| AppError::format("layered model header", "an integer identifier", id_text.to_string()))?;
    let misfit = match value_part.and_then(|v| v.trim().strip_prefix("value=")) {
        Some(m) => Some(
            m.trim()
                .parse()
                .map_err(|_| AppError::format("layered model header", "a misfit value", m.to_string()))?,
        ),
        None => None,
    };
    Ok(Some((identifier, misfit)))
}

/// Split a data row on whitespace and commas, parsing every field.
pub fn parse_row(context: impl Fn() -> String, line: &str, expected: usize) -> Result<Vec<f64>> {
    let fields: Vec<&str> = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .collect();
    if fields.len() != expected {
        return Err(AppError::format(context(), format!("{expected} values"), fields.len().to_string()));
    }
    fields
        .iter()
        .map(|f| {
            f.parse()
                .map_err(|_| AppError::format(context(), "a number", f.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let line = model_header(110, Some(0.593));
        assert_eq!(line, "# Layered model 110: value=0.593");
        assert_eq!(parse_model_header(&line[1..]).unwrap(), Some((110, Some(0.593))));
        assert_eq!(parse_model_header(" Layered model 4").unwrap(), Some((4, None)));
        assert_eq!(parse_model_header(" CPU Time = 0 ms").unwrap(), None);
        assert!(parse_model_header(" Layered model x: value=1").is_err());
    }

    #[test]
    fn rows_split_on_commas_and_spaces() {
        let ctx = || "row".to_string();
        assert_eq!(parse_row(ctx, "1.5, 2 3\t4", 4).unwrap(), vec![1.5, 2.0, 3.0, 4.0]);
        assert!(parse_row(ctx, "1 2", 4).is_err());
        assert!(parse_row(ctx, "1 b", 2).is_err());
    }
}
