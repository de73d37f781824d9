//! Dispersion curves of many inverted models, read from the engine's dump.
//!
//! A dump is a sequence of blocks:
//!
//! ```text
//! # Layered model 110: value=0.593
//! # 2 Rayleigh dispersion mode(s)
//! # CPU Time = 3 ms
//! # Mode 0
//! 0.6 0.0052
//! ...
//! # Mode 1
//! ...
//! ```
//!
//! Consecutive blocks with the same model identifier (one Rayleigh, one Love)
//! form one [`DispersionSet`]. Within a mode, rows stop counting at the first
//! frequency decrease.

use std::ops::Deref;
use std::path::Path;

use tracing::debug;

use crate::dispersion::curve::DispersionCurve;
use crate::dispersion::set::{DispersionSet, ModeCurves};
use crate::domain::Polarization;
use crate::error::{AppError, Result};
use crate::io::geopsy::{parse_model_header, parse_row};
use crate::suite::{Ranked, Suite};

/// How much of a dump to keep; `None` keeps everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispersionLimits {
    pub nsets: Option<usize>,
    pub nrayleigh: Option<usize>,
    pub nlove: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DispersionSuite {
    suite: Suite<DispersionSet>,
}

impl Deref for DispersionSuite {
    type Target = Suite<DispersionSet>;

    fn deref(&self) -> &Self::Target {
        &self.suite
    }
}

struct Block {
    identifier: u64,
    misfit: Option<f64>,
    polarization: Polarization,
    modes: Vec<(u32, Vec<(f64, f64)>)>,
}

impl DispersionSuite {
    pub fn new(members: Vec<Ranked<DispersionSet>>) -> Result<Self> {
        if members.is_empty() {
            return Err(AppError::input("a dispersion suite needs at least one set"));
        }
        Ok(Self {
            suite: Suite::new(members),
        })
    }

    pub fn from_geopsy(text: &str, limits: DispersionLimits) -> Result<Self> {
        if limits.nrayleigh == Some(0) && limits.nlove == Some(0) {
            return Err(AppError::input("nrayleigh and nlove cannot both be 0"));
        }
        if limits.nsets == Some(0) {
            return Err(AppError::input("nsets must be at least 1"));
        }

        let mut members: Vec<Ranked<DispersionSet>> = Vec::new();
        let mut current: Option<(u64, Option<f64>, ModeCurves, ModeCurves)> = None;

        for block in parse_blocks(text)? {
            let same_model = current.as_ref().is_some_and(|c| c.0 == block.identifier);
            if !same_model {
                if let Some(done) = current.take() {
                    push_set(&mut members, done)?;
                }
                if limits.nsets.is_some_and(|n| members.len() >= n) {
                    break;
                }
                current = Some((block.identifier, block.misfit, ModeCurves::new(), ModeCurves::new()));
            }
            let Some((_, _, rayleigh, love)) = current.as_mut() else {
                continue;
            };
            let (target, limit) = match block.polarization {
                Polarization::Rayleigh => (rayleigh, limits.nrayleigh),
                Polarization::Love => (love, limits.nlove),
            };
            target.clear();
            for (mode, rows) in block.modes.into_iter().take(limit.unwrap_or(usize::MAX)) {
                target.insert(mode, DispersionCurve::from_slowness(&rows)?);
            }
        }
        if let Some(done) = current.take() {
            if !limits.nsets.is_some_and(|n| members.len() >= n) {
                push_set(&mut members, done)?;
            }
        }
        if members.is_empty() {
            return Err(AppError::format("dispersion dump", "at least 1 dispersion set", "0"));
        }
        debug!(sets = members.len(), "parsed dispersion dump");
        Self::new(members)
    }

    pub fn from_geopsy_file(path: &Path, limits: DispersionLimits) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
        Self::from_geopsy(&text, limits)
    }

    pub fn nbest(&self, nbest: usize) -> Result<Self> {
        Ok(Self {
            suite: self.suite.nbest(nbest)?,
        })
    }

    pub fn to_geopsy_text(&self) -> String {
        let mut out = String::from("# File written by swprepost\n");
        for m in self.members() {
            out.push_str(&m.item.to_geopsy_text(m.identifier, m.misfit));
        }
        out
    }
}

impl DispersionSet {
    /// First set of a dispersion dump.
    pub fn from_geopsy(text: &str, nrayleigh: Option<usize>, nlove: Option<usize>) -> Result<Ranked<DispersionSet>> {
        let limits = DispersionLimits {
            nsets: Some(1),
            nrayleigh,
            nlove,
        };
        let suite = DispersionSuite::from_geopsy(text, limits)?;
        Ok(suite.suite.members()[0].clone())
    }
}

fn push_set(
    members: &mut Vec<Ranked<DispersionSet>>,
    (identifier, misfit, rayleigh, love): (u64, Option<f64>, ModeCurves, ModeCurves),
) -> Result<()> {
    let set = DispersionSet::new(rayleigh, love).map_err(|_| {
        AppError::format(format!("dispersion set {identifier}"), "at least one kept curve", "none")
    })?;
    members.push(Ranked::new(identifier, misfit, set));
    Ok(())
}

fn parse_blocks(text: &str) -> Result<Vec<Block>> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut header: Option<(u64, Option<f64>)> = None;
    // Whether the latest mode still accepts rows.
    let mut open_mode: Option<bool> = None;

    for (lineno, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix('#') {
            let comment = comment.trim();
            if let Some(parsed) = parse_model_header(comment)? {
                header = Some(parsed);
                open_mode = None;
            } else if let Some(polarization) = parse_wave_line(comment) {
                let (identifier, misfit) = header.take().ok_or_else(|| {
                    AppError::format(
                        format!("dispersion dump line {}", lineno + 1),
                        "a '# Layered model' header before the mode count",
                        comment.to_string(),
                    )
                })?;
                blocks.push(Block {
                    identifier,
                    misfit,
                    polarization,
                    modes: Vec::new(),
                });
                open_mode = None;
            } else if let Some(mode) = comment.strip_prefix("Mode") {
                let block = blocks.last_mut().ok_or_else(|| {
                    AppError::format(
                        format!("dispersion dump line {}", lineno + 1),
                        "a mode count line before '# Mode'",
                        comment.to_string(),
                    )
                })?;
                let mode = mode.trim();
                let number = mode.parse().map_err(|_| {
                    AppError::format(format!("dispersion dump line {}", lineno + 1), "a mode number", mode.to_string())
                })?;
                block.modes.push((number, Vec::new()));
                open_mode = Some(true);
            }
            continue;
        }

        let row = parse_row(|| format!("dispersion dump line {}", lineno + 1), line, 2)?;
        let Some(rows) = blocks.last_mut().and_then(|b| b.modes.last_mut()).map(|m| &mut m.1) else {
            return Err(AppError::format(
                format!("dispersion dump line {}", lineno + 1),
                "a '# Mode' line before data",
                line.to_string(),
            ));
        };
        if open_mode != Some(true) {
            continue;
        }
        if rows.last().is_some_and(|last| row[0] < last.0) {
            open_mode = Some(false);
            continue;
        }
        rows.push((row[0], row[1]));
    }
    Ok(blocks)
}

/// `2 Rayleigh dispersion mode(s)`.
fn parse_wave_line(comment: &str) -> Option<Polarization> {
    let mut words = comment.split_whitespace();
    words.next()?.parse::<usize>().ok()?;
    let polarization = words.next()?.parse().ok()?;
    (words.next()? == "dispersion").then_some(polarization)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = "\
# Layered model 110: value=0.593
# 2 Rayleigh dispersion mode(s)
# CPU Time = 3 ms
# Mode 0
1 0.005
2 0.004
4 0.003
# Mode 1
2 0.0045
3 0.0035
# Layered model 110: value=0.593
# 1 Love dispersion mode(s)
# CPU Time = 1 ms
# Mode 0
1 0.0048
2 0.0041
# Layered model 42: value=0.612
# 1 Rayleigh dispersion mode(s)
# CPU Time = 3 ms
# Mode 0
1 0.0051
3 0.0036
2 0.0039
# Layered model 9: value=0.7
# 1 Rayleigh dispersion mode(s)
# CPU Time = 3 ms
# Mode 0
1 0.0052
";

    #[test]
    fn groups_blocks_by_model() {
        let suite = DispersionSuite::from_geopsy(DUMP, DispersionLimits::default()).unwrap();
        assert_eq!(suite.identifiers(), vec![110, 42, 9]);
        assert_eq!(suite.misfits()[1], Some(0.612));
        let first = &suite.members()[0].item;
        assert_eq!(first.rayleigh().len(), 2);
        assert_eq!(first.love().len(), 1);
        assert_eq!(first.curve(Polarization::Rayleigh, 0).unwrap().velocity(), &[200.0, 250.0, 1.0 / 0.003]);
    }

    #[test]
    fn curve_stops_at_frequency_decrease() {
        let suite = DispersionSuite::from_geopsy(DUMP, DispersionLimits::default()).unwrap();
        let curve = suite.members()[1].item.curve(Polarization::Rayleigh, 0).unwrap();
        assert_eq!(curve.frequency(), &[1.0, 3.0]);
    }

    #[test]
    fn limits_trim_sets_and_modes() {
        let limits = DispersionLimits {
            nsets: Some(2),
            nrayleigh: Some(1),
            nlove: Some(0),
        };
        let suite = DispersionSuite::from_geopsy(DUMP, limits).unwrap();
        assert_eq!(suite.len(), 2);
        let first = &suite.members()[0].item;
        assert_eq!(first.rayleigh().len(), 1);
        assert!(first.love().is_empty());

        let both_zero = DispersionLimits {
            nrayleigh: Some(0),
            nlove: Some(0),
            ..Default::default()
        };
        assert!(DispersionSuite::from_geopsy(DUMP, both_zero).is_err());

        let no_sets = DispersionLimits {
            nsets: Some(0),
            ..Default::default()
        };
        assert!(matches!(DispersionSuite::from_geopsy(DUMP, no_sets), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn text_round_trip() {
        let suite = DispersionSuite::from_geopsy(DUMP, DispersionLimits::default()).unwrap();
        let text = suite.to_geopsy_text();
        assert!(text.starts_with("# File written by swprepost\n# Layered model 110: value=0.593\n# 2 Rayleigh"));
        assert_eq!(DispersionSuite::from_geopsy(&text, DispersionLimits::default()).unwrap(), suite);
        assert_eq!(suite.nbest(1).unwrap().len(), 1);
        assert!(matches!(suite.nbest(0), Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn first_set_helper() {
        let set = DispersionSet::from_geopsy(DUMP, None, Some(1)).unwrap();
        assert_eq!(set.identifier, 110);
        assert_eq!(set.item.love().len(), 1);
    }

    #[test]
    fn malformed_dumps_fail() {
        assert!(DispersionSuite::from_geopsy("1 0.005\n", DispersionLimits::default()).is_err());
        assert!(DispersionSuite::from_geopsy("# 1 Rayleigh dispersion mode(s)\n", DispersionLimits::default()).is_err());
        assert!(DispersionSuite::from_geopsy("", DispersionLimits::default()).is_err());
    }
}
