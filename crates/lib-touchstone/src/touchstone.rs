//! Touchstone S-parameter file parser.
//!
//! Grammar handled here:
//! - blank lines and lines starting with `!` are skipped
//! - the first `#` line is the option line (unit, parameter type, format,
//!   `R <ohms>`, in any order); later ones are ignored
//! - every other line is one frequency point: the frequency followed by
//!   `2 * N^2` values forming `(re, im)` pairs in row-major port order
//!
//! The port count comes from the first data line. Values are converted to
//! complex numbers by the declared format and frequencies are scaled to Hz.

use crate::error::{header_error_from_nom, FormatError};
use lib_types::{
    sparams::{
        port_count_for_values, DataFormat, FrequencyPoint, FrequencyUnit, ParameterType,
        TouchstoneDataset, TouchstoneHeader,
    },
    units::{Hertz, Ohms},
};
use ndarray::Array2;
use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, space0, space1},
    combinator::{all_consuming, eof, peek, value},
    multi::separated_list0,
    number::complete::double,
    sequence::terminated,
    IResult, Parser,
};
use std::path::Path;

/// Parse Touchstone content into a dataset.
pub fn parse_touchstone(content: &str) -> Result<TouchstoneDataset, FormatError> {
    let mut header: Option<TouchstoneHeader> = None;
    let mut rows: Vec<(usize, Vec<f64>)> = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with('!') {
            continue;
        }

        if line.starts_with('#') {
            if header.is_some() {
                tracing::warn!("Ignoring additional option line at line {}", line_no);
            } else {
                header = Some(parse_option_line(line, line_no)?);
            }
            continue;
        }

        rows.push((line_no, parse_data_line(line, line_no)?));
    }

    let header = header.unwrap_or_default();
    let (first_line, first_values) = rows.first().ok_or(FormatError::NoDataLines)?;

    let value_count = first_values.len() - 1;
    let num_ports =
        port_count_for_values(value_count).ok_or(FormatError::NonSquarePortCount {
            line: *first_line,
            values: value_count,
        })?;

    let points = build_points(&header, &rows, num_ports)?;

    tracing::debug!(
        "Parsed Touchstone content: {} ports, {} frequency points, format {:?}",
        num_ports,
        points.len(),
        header.format
    );

    TouchstoneDataset::from_points(header, num_ports, points).map_err(FormatError::Inconsistent)
}

/// Parse a Touchstone file from a path.
pub fn parse_touchstone_file(path: &Path) -> Result<TouchstoneDataset, FormatError> {
    let content = std::fs::read_to_string(path)?;
    let dataset = parse_touchstone(&content)?;

    if let Some(expected) = ports_from_extension(path) {
        if dataset.num_ports() != expected {
            tracing::warn!(
                "Port count mismatch: extension suggests {} ports, file has {}",
                expected,
                dataset.num_ports()
            );
        }
    }

    Ok(dataset)
}

/// Port count implied by an `.sNp` extension.
pub fn ports_from_extension(path: &Path) -> Option<usize> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    ext.strip_prefix('s')?.strip_suffix('p')?.parse().ok()
}

fn build_points(
    header: &TouchstoneHeader,
    rows: &[(usize, Vec<f64>)],
    num_ports: usize,
) -> Result<Vec<FrequencyPoint>, FormatError> {
    let expected = 2 * num_ports * num_ports;
    let freq_mult = header.unit.multiplier();

    rows.iter()
        .map(|(line, values)| {
            let actual = values.len() - 1;
            if actual != expected {
                return Err(FormatError::RaggedRow {
                    line: *line,
                    expected,
                    actual,
                });
            }

            let params = &values[1..];
            let matrix = Array2::from_shape_fn((num_ports, num_ports), |(i, j)| {
                let idx = 2 * (i * num_ports + j);
                header.format.to_complex(params[idx], params[idx + 1])
            });

            Ok(FrequencyPoint::new(Hertz(values[0] * freq_mult), matrix))
        })
        .collect()
}

// ============================================================================
// Nom Parsers (nom 8 compatible)
// ============================================================================

fn parse_option_line(line: &str, line_no: usize) -> Result<TouchstoneHeader, FormatError> {
    let (rest, tokens) = option_tokens(line).map_err(|e| header_error_from_nom(line_no, e))?;

    let rest = rest.trim();
    if !rest.is_empty() && !rest.starts_with('!') {
        let token = rest.split_whitespace().next().unwrap_or(rest);
        return Err(FormatError::bad_header(
            line_no,
            format!("unrecognized token '{}'", token),
        ));
    }

    let mut header = TouchstoneHeader::default();
    for token in tokens {
        match token {
            OptionToken::FreqUnit(unit) => header.unit = unit,
            OptionToken::ParamType(t) => header.parameter_type = t,
            OptionToken::Format(f) => header.format = f,
            OptionToken::Z0(z) => header.reference_impedance = z,
        }
    }

    Ok(header)
}

fn option_tokens(input: &str) -> IResult<&str, Vec<OptionToken>> {
    let (input, _) = space0(input)?;
    let (input, _) = char('#')(input)?;
    let (input, _) = space0(input)?;
    separated_list0(space1, terminated(parse_option_token, peek(token_end))).parse(input)
}

/// Option tokens end at whitespace, a trailing comment or the end of line.
fn token_end(input: &str) -> IResult<&str, ()> {
    alt((value((), space1), value((), char('!')), value((), eof))).parse(input)
}

#[derive(Clone, Debug)]
enum OptionToken {
    FreqUnit(FrequencyUnit),
    ParamType(ParameterType),
    Format(DataFormat),
    Z0(Ohms),
}

fn parse_option_token(input: &str) -> IResult<&str, OptionToken> {
    alt((parse_freq_unit, parse_param_type, parse_format, parse_z0)).parse(input)
}

fn parse_freq_unit(input: &str) -> IResult<&str, OptionToken> {
    alt((
        value(OptionToken::FreqUnit(FrequencyUnit::Hz), tag_no_case("HZ")),
        value(OptionToken::FreqUnit(FrequencyUnit::KHz), tag_no_case("KHZ")),
        value(OptionToken::FreqUnit(FrequencyUnit::MHz), tag_no_case("MHZ")),
        value(OptionToken::FreqUnit(FrequencyUnit::GHz), tag_no_case("GHZ")),
    ))
    .parse(input)
}

fn parse_param_type(input: &str) -> IResult<&str, OptionToken> {
    alt((
        value(OptionToken::ParamType(ParameterType::S), tag_no_case("S")),
        value(OptionToken::ParamType(ParameterType::Y), tag_no_case("Y")),
        value(OptionToken::ParamType(ParameterType::Z), tag_no_case("Z")),
        value(OptionToken::ParamType(ParameterType::H), tag_no_case("H")),
        value(OptionToken::ParamType(ParameterType::G), tag_no_case("G")),
    ))
    .parse(input)
}

fn parse_format(input: &str) -> IResult<&str, OptionToken> {
    alt((
        value(OptionToken::Format(DataFormat::RI), tag_no_case("RI")),
        value(OptionToken::Format(DataFormat::MA), tag_no_case("MA")),
        value(OptionToken::Format(DataFormat::DB), tag_no_case("DB")),
    ))
    .parse(input)
}

fn parse_z0(input: &str) -> IResult<&str, OptionToken> {
    let (input, _) = tag_no_case("R")(input)?;
    let (input, _) = space1(input)?;
    let (input, z0) = double(input)?;
    Ok((input, OptionToken::Z0(Ohms(z0))))
}

fn data_value(token: &str) -> IResult<&str, f64> {
    all_consuming(double).parse(token)
}

/// Whitespace-separated numbers up to an optional trailing `!` comment.
/// Each token must be a number in full.
fn parse_data_line(line: &str, line_no: usize) -> Result<Vec<f64>, FormatError> {
    let data = line.split_once('!').map_or(line, |(data, _)| data);

    data.split_whitespace()
        .map(|token| {
            data_value(token)
                .map(|(_, v)| v)
                .map_err(|_| FormatError::InvalidNumber {
                    line: line_no,
                    token: token.to_string(),
                })
        })
        .collect()
}
