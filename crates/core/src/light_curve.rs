//! Model light curves produced by the engine's task 2.
//!
//! The engine writes a phase-folded model as whitespace-delimited text with
//! `#` comments. Each data line carries exactly two numeric columns: phase
//! and the model magnitude difference.

use serde::{Deserialize, Serialize};

/// Names of the two model columns, in file order.
pub const COLUMN_NAMES: [&str; 2] = ["phase", "delta_mag"];

/// Starts a comment; the rest of the line is ignored.
pub const COMMENT_PREFIX: char = '#';

/// Error type for model table parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LightCurveError {
    #[error("line {line}: expected {expected} numeric columns, found {found}")]
    ColumnCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid number '{value}'")]
    InvalidNumber { line: usize, value: String },
}

/// One row of a model light curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPoint {
    pub phase: f64,
    pub delta_mag: f64,
}

/// A parsed two-column model table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LightCurve {
    points: Vec<ModelPoint>,
}

impl LightCurve {
    /// Parse model lines. Blank and comment lines are skipped; line numbers
    /// in errors are 1-based over all input lines.
    pub fn parse_lines<I, S>(lines: I) -> Result<Self, LightCurveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut points = Vec::new();
        for (index, line) in lines.into_iter().enumerate() {
            if let Some(point) = parse_line(line.as_ref(), index + 1)? {
                points.push(point);
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[ModelPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn phases(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.phase)
    }

    pub fn delta_mags(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.delta_mag)
    }
}

impl FromIterator<ModelPoint> for LightCurve {
    fn from_iter<I: IntoIterator<Item = ModelPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

fn parse_line(line: &str, line_number: usize) -> Result<Option<ModelPoint>, LightCurveError> {
    let data = line
        .split_once(COMMENT_PREFIX)
        .map_or(line, |(data, _comment)| data);

    let fields: Vec<&str> = data.split_whitespace().collect();
    if fields.is_empty() {
        return Ok(None);
    }
    if fields.len() != COLUMN_NAMES.len() {
        return Err(LightCurveError::ColumnCount {
            line: line_number,
            expected: COLUMN_NAMES.len(),
            found: fields.len(),
        });
    }

    let number = |value: &str| {
        value
            .parse::<f64>()
            .map_err(|_| LightCurveError::InvalidNumber {
                line: line_number,
                value: value.to_string(),
            })
    };

    Ok(Some(ModelPoint {
        phase: number(fields[0])?,
        delta_mag: number(fields[1])?,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
