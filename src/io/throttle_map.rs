use std::f64::consts::PI;
use std::path::Path;

use crate::error::GncError;
use crate::gnc::throttle::{ThrottleSample, ThrottleTable};

// ---------------------------------------------------------------------------
// Throttle calibration grid parser
// ---------------------------------------------------------------------------
//
// The calibration campaign produced a semicolon-delimited grid: row labels
// are surge-force values (N), column labels yaw-torque values (N m), and each
// cell holds the quoted shaft-speed pair "left;right" (RPM) that produced
// that force combination. Cells left blank were infeasible on the water and
// are skipped.

/// Parse the grid text into calibration samples, converting RPM to rad/s.
pub fn parse_grid(text: &str) -> Result<Vec<ThrottleSample>, GncError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    let (header_no, header) = lines.next().ok_or_else(|| GncError::ThrottleMap {
        line: 0,
        reason: "empty calibration grid".into(),
    })?;

    let header_fields = split_quoted(header);
    let torques: Vec<f64> = header_fields
        .iter()
        .skip(1)
        .map(|f| parse_number(f, header_no + 1))
        .collect::<Result<_, _>>()?;

    let mut samples = Vec::new();
    for (line_no, line) in lines {
        let fields = split_quoted(line);
        if fields.len() != torques.len() + 1 {
            return Err(GncError::ThrottleMap {
                line: line_no + 1,
                reason: format!(
                    "expected {} cells, found {}",
                    torques.len() + 1,
                    fields.len()
                ),
            });
        }
        let force_x = parse_number(&fields[0], line_no + 1)?;

        for (cell, &torque_n) in fields[1..].iter().zip(torques.iter()) {
            if cell.trim().is_empty() {
                continue;
            }
            let (left_rpm, right_rpm) = parse_speed_pair(cell, line_no + 1)?;
            samples.push(ThrottleSample {
                speed_left: rpm_to_rads(left_rpm),
                speed_right: rpm_to_rads(right_rpm),
                force_x,
                torque_n,
            });
        }
    }

    Ok(samples)
}

/// Load and parse a calibration grid file into a read-only table.
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<ThrottleTable, GncError> {
    let text = std::fs::read_to_string(path)?;
    Ok(ThrottleTable::new(parse_grid(&text)?))
}

fn rpm_to_rads(rpm: f64) -> f64 {
    rpm * 2.0 * PI / 60.0
}

/// Split a grid line on semicolons, honouring double-quoted cells (the speed
/// pair inside a cell reuses the semicolon separator).
fn split_quoted(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn parse_number(field: &str, line: usize) -> Result<f64, GncError> {
    field.trim().parse().map_err(|_| GncError::ThrottleMap {
        line,
        reason: format!("not a number: {field:?}"),
    })
}

fn parse_speed_pair(cell: &str, line: usize) -> Result<(f64, f64), GncError> {
    let mut parts = cell.split(';');
    let left = parts.next().unwrap_or("");
    let right = parts.next().ok_or_else(|| GncError::ThrottleMap {
        line,
        reason: format!("cell is not a speed pair: {cell:?}"),
    })?;
    Ok((parse_number(left, line)?, parse_number(right, line)?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: &str = "\
;-20.0;0.0;20.0
0.0;\"-150.0;150.0\";\"0.0;0.0\";\"150.0;-150.0\"
50.0;\"300.0;520.0\";\"410.0;410.0\";\"520.0;300.0\"
100.0;;\"585.0;585.0\";\"700.0;440.0\"
";

    #[test]
    fn parses_labels_and_quoted_cells() {
        let samples = parse_grid(GRID).unwrap();
        // 3 + 3 + 2 non-blank cells
        assert_eq!(samples.len(), 8);

        let origin = samples
            .iter()
            .find(|s| s.force_x == 0.0 && s.torque_n == 0.0)
            .unwrap();
        assert_eq!(origin.speed_left, 0.0);
        assert_eq!(origin.speed_right, 0.0);
    }

    #[test]
    fn converts_rpm_to_rads() {
        let samples = parse_grid(GRID).unwrap();
        let s = samples
            .iter()
            .find(|s| s.force_x == 50.0 && s.torque_n == 0.0)
            .unwrap();
        assert!((s.speed_left - 410.0 * 2.0 * PI / 60.0).abs() < 1e-9);
    }

    #[test]
    fn blank_cells_are_skipped() {
        let samples = parse_grid(GRID).unwrap();
        assert!(!samples
            .iter()
            .any(|s| s.force_x == 100.0 && s.torque_n == -20.0));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let bad = ";0.0\n10.0;\"1.0;2.0\";\"3.0;4.0\"\n";
        let err = parse_grid(bad).unwrap_err();
        assert!(matches!(err, GncError::ThrottleMap { line: 2, .. }));
    }

    #[test]
    fn garbage_labels_are_rejected() {
        let bad = ";zero\n1.0;\"1.0;2.0\"\n";
        assert!(parse_grid(bad).is_err());
    }
}
