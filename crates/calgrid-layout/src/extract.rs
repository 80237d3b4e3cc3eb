// SPDX-License-Identifier: Apache-2.0
//! Schema-driven extraction of layout parameters from component source text.
//!
//! Each field is declared once in [`SCHEMA`] with its own narrow patterns.
//! Patterns are tried in declaration order and the first match wins, so a
//! field can only ever be read from text anchored on its own property key or
//! section marker. This is targeted scanning, not a parser: the source does
//! not have to be well-formed TSX.
//!
//! Required fields abort the whole extraction when missing. Optional fields
//! fall back to [`ExtractionDefaults`] and record that they did.

use std::collections::BTreeMap;

use regex_lite::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{LayoutError, Result};
use crate::params::{Adjustment, AdjustmentSign, BorderWidths, ParameterSet};

// ── Schema ───────────────────────────────────────────────────────────────

/// A parameter the extractor knows how to locate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    DayNamesHeight,
    AllDayHeight,
    NotesHeight,
    HeaderOffset,
    HourRowHeight,
    GridStartHour,
    GridEndHour,
    DayNamesBorder,
    AllDayBorder,
    NotesBorder,
}

impl Field {
    /// The identifier used for this field in source text and diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::DayNamesHeight => "dayNamesHeight",
            Self::AllDayHeight => "allDayHeight",
            Self::NotesHeight => "notesHeight",
            Self::HeaderOffset => "headerOffset",
            Self::HourRowHeight => "hourRowHeight",
            Self::GridStartHour => "gridStartHour",
            Self::GridEndHour => "gridEndHour",
            Self::DayNamesBorder => "dayNamesBorder",
            Self::AllDayBorder => "allDayBorder",
            Self::NotesBorder => "notesBorder",
        }
    }
}

/// How a pattern's captures turn into a value.
#[derive(Debug, Clone, Copy)]
enum Reader {
    /// A plain numeric capture group.
    Number(usize),
    /// `cond ? base + bonus : min`; the section grows with content.
    Conditional { base: usize, min: usize },
    /// Loop bound with its comparison operator; `<=` means the bound is included.
    UpperBound { op: usize, bound: usize },
    /// Tailwind `border-b` / `border-b-N`; a bare class is one pixel wide.
    TailwindBorder(usize),
    /// The header-offset arithmetic expression.
    Expression(usize),
}

#[derive(Debug, Clone, Copy)]
struct Pattern {
    source: &'static str,
    read: Reader,
}

#[derive(Debug, Clone, Copy)]
struct FieldSpec {
    field: Field,
    required: bool,
    patterns: &'static [Pattern],
}

macro_rules! pattern {
    ($source:expr, $read:expr) => {
        Pattern {
            source: $source,
            read: $read,
        }
    };
}

const SCHEMA: &[FieldSpec] = &[
    FieldSpec {
        field: Field::DayNamesHeight,
        required: true,
        patterns: &[
            pattern!(
                r"\bdayNamesHeight\s*(?::\s*number\s*)?=\s*(\d+(?:\.\d+)?)\s*[;,\n]",
                Reader::Number(1)
            ),
            pattern!(
                r#"(?://|/\*)\s*(?i:day names)\b[^>]{0,400}?\bheight:\s*["'](\d+(?:\.\d+)?)px["']"#,
                Reader::Number(1)
            ),
        ],
    },
    FieldSpec {
        field: Field::AllDayHeight,
        required: true,
        patterns: &[
            pattern!(
                r"\ballDayHeight\s*(?::\s*number\s*)?=[^;?]*\?\s*(\d+(?:\.\d+)?)\s*\+[^:;]*:\s*(\d+(?:\.\d+)?)",
                Reader::Conditional { base: 1, min: 2 }
            ),
            pattern!(
                r"\ballDayHeight\s*(?::\s*number\s*)?=\s*(\d+(?:\.\d+)?)\s*[;,\n]",
                Reader::Number(1)
            ),
            pattern!(
                r#"(?://|/\*)\s*(?i:all-day)\b[^>]{0,400}?\bminHeight:\s*["'](\d+(?:\.\d+)?)px["']"#,
                Reader::Conditional { base: 1, min: 1 }
            ),
        ],
    },
    FieldSpec {
        field: Field::NotesHeight,
        required: true,
        patterns: &[
            pattern!(
                r"\bnotesHeight\s*(?::\s*number\s*)?=\s*(\d+(?:\.\d+)?)\s*[;,\n]",
                Reader::Number(1)
            ),
            pattern!(
                r#"(?://|/\*)\s*(?i:notes)\b[^>]{0,400}?\bminHeight:\s*["'](\d+(?:\.\d+)?)px["']"#,
                Reader::Number(1)
            ),
        ],
    },
    FieldSpec {
        field: Field::HeaderOffset,
        required: true,
        patterns: &[pattern!(
            r"\bheaderOffset\s*(?::\s*number\s*)?=\s*([^;\n/]+)",
            Reader::Expression(1)
        )],
    },
    FieldSpec {
        field: Field::HourRowHeight,
        required: false,
        patterns: &[
            pattern!(
                r"\bhour(?:Row)?Height\s*[:=]\s*(\d+(?:\.\d+)?)\b",
                Reader::Number(1)
            ),
            pattern!(
                r#"\bheight:\s*["'](\d+(?:\.\d+)?)px["'][^\n]*//\s*(?i:hour row)"#,
                Reader::Number(1)
            ),
        ],
    },
    FieldSpec {
        field: Field::GridStartHour,
        required: false,
        patterns: &[
            pattern!(
                r"\b(?:gridStartHour|GRID_START_HOUR)\s*[:=]\s*(\d+)\b",
                Reader::Number(1)
            ),
            pattern!(
                r"\bfor\s*\(\s*let\s+hour\s*=\s*(\d+)\s*;\s*hour\s*<=?\s*\d+",
                Reader::Number(1)
            ),
        ],
    },
    FieldSpec {
        field: Field::GridEndHour,
        required: false,
        patterns: &[
            pattern!(
                r"\b(?:gridEndHour|GRID_END_HOUR)\s*[:=]\s*(\d+)\b",
                Reader::Number(1)
            ),
            pattern!(
                r"\bfor\s*\(\s*let\s+hour\s*=\s*\d+\s*;\s*hour\s*(<=?)\s*(\d+)",
                Reader::UpperBound { op: 1, bound: 2 }
            ),
        ],
    },
    FieldSpec {
        field: Field::DayNamesBorder,
        required: false,
        patterns: &[
            pattern!(
                r"\bdayNamesBorder(?:Width)?\s*[:=]\s*(\d+(?:\.\d+)?)\b",
                Reader::Number(1)
            ),
            pattern!(
                r#"(?://|/\*)\s*(?i:day names)\b[^>]{0,400}?\bborder-b(?:-(\d+))?["'\s`]"#,
                Reader::TailwindBorder(1)
            ),
        ],
    },
    FieldSpec {
        field: Field::AllDayBorder,
        required: false,
        patterns: &[
            pattern!(
                r"\ballDayBorder(?:Width)?\s*[:=]\s*(\d+(?:\.\d+)?)\b",
                Reader::Number(1)
            ),
            pattern!(
                r#"(?://|/\*)\s*(?i:all-day)\b[^>]{0,400}?\bborder-b(?:-(\d+))?["'\s`]"#,
                Reader::TailwindBorder(1)
            ),
        ],
    },
    FieldSpec {
        field: Field::NotesBorder,
        required: false,
        patterns: &[
            pattern!(
                r"\bnotesBorder(?:Width)?\s*[:=]\s*(\d+(?:\.\d+)?)\b",
                Reader::Number(1)
            ),
            pattern!(
                r#"(?://|/\*)\s*(?i:notes)\b[^>]{0,400}?\bborder-b(?:-(\d+))?["'\s`]"#,
                Reader::TailwindBorder(1)
            ),
        ],
    },
];

/// Identifiers the header-offset expression must chain together.
pub const HEADER_SECTIONS: [&str; 3] = ["dayNamesHeight", "allDayHeight", "notesHeight"];

// ── Results ──────────────────────────────────────────────────────────────

/// Fallback values for optional fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractionDefaults {
    pub hour_row_height_px: f64,
    pub grid_start_hour: u8,
    pub grid_end_hour: u8,
    pub border_widths: BorderWidths,
}

impl Default for ExtractionDefaults {
    fn default() -> Self {
        Self {
            hour_row_height_px: 100.0,
            grid_start_hour: 6,
            grid_end_hour: 22,
            border_widths: BorderWidths::default(),
        }
    }
}

/// Where a field's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSource {
    /// Read from the text by the schema pattern at `pattern` (0-based).
    Matched { pattern: usize, line: usize },
    Defaulted,
}

/// The decomposed header-offset expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderExpression {
    pub sections: Vec<String>,
    pub adjustment: Adjustment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedLayout {
    pub params: ParameterSet,
    pub sources: BTreeMap<Field, FieldSource>,
    /// Section identifiers in the order the header-offset expression names them.
    pub header_sections: Vec<String>,
    /// Sections whose height grows with content and were collapsed to their base.
    pub dynamic_sections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Number(f64),
    Range { base: f64, min: f64, dynamic: bool },
    Expression(HeaderExpression),
}

// ── Extraction ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Extractor {
    defaults: ExtractionDefaults,
}

impl Extractor {
    #[must_use]
    pub fn new(defaults: ExtractionDefaults) -> Self {
        Self { defaults }
    }

    pub fn extract(&self, text: &str) -> Result<ExtractedLayout> {
        let mut values = BTreeMap::new();
        let mut sources = BTreeMap::new();

        for spec in SCHEMA {
            match locate(spec, text)? {
                Some((value, source)) => {
                    debug!(field = spec.field.name(), ?source, ?value, "located layout parameter");
                    values.insert(spec.field, value);
                    sources.insert(spec.field, source);
                }
                None if spec.required => {
                    debug!(field = spec.field.name(), "required layout parameter missing");
                    return Err(LayoutError::extraction(spec.field.name()));
                }
                None => {
                    debug!(field = spec.field.name(), "layout parameter defaulted");
                    sources.insert(spec.field, FieldSource::Defaulted);
                }
            }
        }

        let (all_day_base, all_day_min, all_day_dynamic) = match values.get(&Field::AllDayHeight) {
            Some(Value::Range { base, min, dynamic }) => (*base, *min, *dynamic),
            Some(Value::Number(value)) => (*value, *value, false),
            _ => return Err(LayoutError::extraction(Field::AllDayHeight.name())),
        };

        let header = match values.remove(&Field::HeaderOffset) {
            Some(Value::Expression(expression)) => expression,
            _ => return Err(LayoutError::extraction(Field::HeaderOffset.name())),
        };

        let defaults = &self.defaults;
        let params = ParameterSet {
            day_names_height_px: number(&values, Field::DayNamesHeight)?,
            all_day_base_height_px: all_day_base,
            all_day_min_height_px: all_day_min,
            notes_height_px: number(&values, Field::NotesHeight)?,
            border_widths: BorderWidths {
                day_names: number_or(&values, Field::DayNamesBorder, defaults.border_widths.day_names),
                all_day: number_or(&values, Field::AllDayBorder, defaults.border_widths.all_day),
                notes: number_or(&values, Field::NotesBorder, defaults.border_widths.notes),
            },
            adjustment: header.adjustment,
            hour_row_height_px: number_or(&values, Field::HourRowHeight, defaults.hour_row_height_px),
            grid_start_hour: hour_or(&values, Field::GridStartHour, defaults.grid_start_hour)?,
            grid_end_hour: hour_or(&values, Field::GridEndHour, defaults.grid_end_hour)?,
        };
        params.validate()?;

        let mut dynamic_sections = Vec::new();
        if all_day_dynamic {
            dynamic_sections.push(Field::AllDayHeight.name().to_string());
        }

        Ok(ExtractedLayout {
            params,
            sources,
            header_sections: header.sections,
            dynamic_sections,
        })
    }
}

/// Extract a [`ParameterSet`], discarding provenance.
pub fn extract_parameters(text: &str, defaults: &ExtractionDefaults) -> Result<ParameterSet> {
    Extractor::new(*defaults).extract(text).map(|layout| layout.params)
}

fn locate(spec: &FieldSpec, text: &str) -> Result<Option<(Value, FieldSource)>> {
    for (index, pattern) in spec.patterns.iter().enumerate() {
        let regex = Regex::new(pattern.source).map_err(|err| {
            LayoutError::invalid(format!("pattern for {} failed to compile: {err}", spec.field.name()))
        })?;
        let Some(captures) = regex.captures(text) else {
            continue;
        };
        let Some(value) = read_value(pattern.read, &captures, spec.field)? else {
            continue;
        };
        let offset = captures.get(0).map_or(0, |m| m.start());
        let line = text[..offset].matches('\n').count() + 1;
        return Ok(Some((value, FieldSource::Matched { pattern: index, line })));
    }
    Ok(None)
}

fn read_value(read: Reader, captures: &Captures<'_>, field: Field) -> Result<Option<Value>> {
    let group = |index: usize| captures.get(index).map(|m| m.as_str());
    let parse = |raw: &str| {
        raw.parse::<f64>()
            .map_err(|_| LayoutError::extraction(field.name()))
    };

    let value = match read {
        Reader::Number(index) => match group(index) {
            Some(raw) => Value::Number(parse(raw)?),
            None => return Ok(None),
        },
        Reader::Conditional { base, min } => {
            let (Some(base), Some(min)) = (group(base), group(min)) else {
                return Ok(None);
            };
            Value::Range {
                base: parse(base)?,
                min: parse(min)?,
                dynamic: true,
            }
        }
        Reader::UpperBound { op, bound } => {
            let (Some(op), Some(bound)) = (group(op), group(bound)) else {
                return Ok(None);
            };
            let bound = parse(bound)?;
            Value::Number(if op == "<=" { bound + 1.0 } else { bound })
        }
        Reader::TailwindBorder(index) => Value::Number(match group(index) {
            Some(raw) => parse(raw)?,
            None => 1.0,
        }),
        Reader::Expression(index) => match group(index) {
            Some(raw) => Value::Expression(parse_header_expression(raw)?),
            None => return Ok(None),
        },
    };
    Ok(Some(value))
}

fn number(values: &BTreeMap<Field, Value>, field: Field) -> Result<f64> {
    match values.get(&field) {
        Some(Value::Number(value)) => Ok(*value),
        _ => Err(LayoutError::extraction(field.name())),
    }
}

fn number_or(values: &BTreeMap<Field, Value>, field: Field, default: f64) -> f64 {
    match values.get(&field) {
        Some(Value::Number(value)) => *value,
        _ => default,
    }
}

fn hour_or(values: &BTreeMap<Field, Value>, field: Field, default: u8) -> Result<u8> {
    let value = number_or(values, field, f64::from(default));
    if value.fract() != 0.0 || !(0.0..=24.0).contains(&value) {
        return Err(LayoutError::invalid(format!(
            "{} must be a whole hour between 0 and 24 (got {value})",
            field.name()
        )));
    }
    // Range-checked above.
    Ok(value as u8)
}

// ── Header expression ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Ident(&'a str),
    Number(f64),
    Op(char),
}

fn tokenize(expression: &str) -> Option<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut rest = expression.trim_start();
    while let Some(first) = rest.chars().next() {
        let len = if first == '+' || first == '-' {
            tokens.push(Token::Op(first));
            1
        } else if first.is_ascii_digit() {
            let len = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .unwrap_or(rest.len());
            tokens.push(Token::Number(rest[..len].parse().ok()?));
            len
        } else if first.is_ascii_alphabetic() || first == '_' || first == '$' {
            let len = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
                .unwrap_or(rest.len());
            tokens.push(Token::Ident(&rest[..len]));
            len
        } else {
            return None;
        };
        rest = rest[len..].trim_start();
    }
    Some(tokens)
}

/// Decompose `dayNamesHeight + allDayHeight + notesHeight - 67`.
///
/// The three section identifiers must each appear once, joined by `+`. An
/// optional trailing `± literal` becomes the adjustment; the operator in
/// front of it supplies the sign.
pub fn parse_header_expression(expression: &str) -> Result<HeaderExpression> {
    let malformed = || LayoutError::extraction(Field::HeaderOffset.name());
    let tokens = tokenize(expression).ok_or_else(malformed)?;
    let mut tokens = tokens.into_iter().peekable();

    let mut sections = Vec::new();
    match tokens.next() {
        Some(Token::Ident(name)) => sections.push(name.to_string()),
        _ => return Err(malformed()),
    }

    let mut adjustment = Adjustment::NONE;
    while let Some(token) = tokens.next() {
        let Token::Op(op) = token else {
            return Err(malformed());
        };
        match tokens.next() {
            Some(Token::Ident(name)) if op == '+' => sections.push(name.to_string()),
            Some(Token::Number(px)) if tokens.peek().is_none() => {
                let sign = if op == '-' {
                    AdjustmentSign::Minus
                } else {
                    AdjustmentSign::Plus
                };
                adjustment = Adjustment { px, sign };
            }
            _ => return Err(malformed()),
        }
    }

    let mut sorted: Vec<&str> = sections.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    let mut expected = HEADER_SECTIONS;
    expected.sort_unstable();
    if sorted != expected {
        return Err(malformed());
    }

    Ok(HeaderExpression {
        sections,
        adjustment,
    })
}
