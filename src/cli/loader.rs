//! Two-column spectrum exports (x, y) as written by spectrometer software.
//!
//! The delimiter is detected from the first line that contains one: `;` and
//! tab-separated files may use a decimal comma. Leading lines that do not
//! parse as numbers (headers) are skipped.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::Path;

use irpeak::dataset::{Dataset, Series};
use irpeak::units::Unit;

fn detect_delimiter(content: &str) -> u8 {
    for line in content.lines().map(str::trim).filter(|l| !l.is_empty() && !l.starts_with('#')) {
        if line.contains(';') {
            return b';';
        }
        if line.contains('\t') {
            return b'\t';
        }
        if line.contains(',') {
            return b',';
        }
    }
    b','
}

fn parse_number(field: &str, decimal_comma: bool) -> Option<f64> {
    let field = field.trim();
    if decimal_comma {
        field.replace(',', ".").parse().ok()
    } else {
        field.parse().ok()
    }
}

/// Parse a spectrum from CSV text
pub fn parse_spectrum(content: &str, x_unit: Unit, y_unit: Unit) -> Result<(Vec<f64>, Vec<f64>)> {
    let delimiter = detect_delimiter(content);
    let decimal_comma = delimiter != b',';
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(content.as_bytes());

    let mut x = Vec::new();
    let mut y = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Malformed CSV at line {}", line + 1))?;
        if record.len() < 2 || record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        match (parse_number(&record[0], decimal_comma), parse_number(&record[1], decimal_comma)) {
            (Some(xi), Some(yi)) => {
                x.push(xi);
                y.push(yi);
            }
            _ if x.is_empty() => continue,
            _ => bail!(
                "Cannot parse line {} as numbers: '{}'",
                line + 1,
                record.iter().collect::<Vec<_>>().join(" | ")
            ),
        }
    }
    if x.is_empty() {
        bail!("No numeric ({} / {}) rows found", x_unit, y_unit);
    }
    Ok((x, y))
}

/// Load a spectrum file, stamped with the file's modification time
pub fn load_spectrum(path: &Path, x_unit: Unit, y_unit: Unit) -> Result<Dataset> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read spectrum: {}", path.display()))?;
    let (x, y) = parse_spectrum(&content, x_unit, y_unit).with_context(|| format!("In {}", path.display()))?;

    let timestamp: DateTime<Utc> = fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::from)
        .unwrap_or_else(|_| Utc::now());
    let dataset = Dataset::with_timestamp(timestamp, Series::new(x, x_unit)?, Series::new(y, y_unit)?)
        .with_context(|| format!("Invalid spectrum: {}", path.display()))?;
    Ok(dataset)
}

/// Measurement name derived from a file path
pub fn measurement_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Write a spectrum as comma-separated `x,y` rows with a header
pub fn write_spectrum(path: &Path, data: &Dataset) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record([
        format!("x [{}]", data.x_axis().unit()),
        format!("y [{}]", data.y_axis().unit()),
    ])?;
    for (x, y) in data.x().iter().zip(data.y()) {
        writer.write_record([x.to_string(), y.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_comma_separated_with_header() {
        let (x, y) = parse_spectrum("wavenumber,absorbance\n1600.5,0.12\n1600.0,0.15\n", Unit::ReciprocalCentimeter, Unit::Arbitrary).unwrap();
        assert_eq!(x, vec![1600.5, 1600.0]);
        assert_eq!(y, vec![0.12, 0.15]);
    }

    #[test]
    fn test_parse_semicolon_with_decimal_comma() {
        let (x, y) = parse_spectrum("1400,25;0,011\n1401,25;0,013\n", Unit::ReciprocalCentimeter, Unit::Arbitrary).unwrap();
        assert_eq!(x, vec![1400.25, 1401.25]);
        assert_eq!(y, vec![0.011, 0.013]);
    }

    #[test]
    fn test_parse_tab_separated_with_comments() {
        let (x, _) = parse_spectrum("# exported\n1400\t0.1\n1401\t0.2\n", Unit::ReciprocalCentimeter, Unit::Arbitrary).unwrap();
        assert_eq!(x, vec![1400.0, 1401.0]);
    }

    #[test]
    fn test_parse_rejects_garbage_after_data() {
        let err = parse_spectrum("1400,0.1\nfoo,bar\n", Unit::ReciprocalCentimeter, Unit::Arbitrary).unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(parse_spectrum("x,y\n", Unit::ReciprocalCentimeter, Unit::Arbitrary).is_err());
    }

    #[test]
    fn test_load_and_write_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.csv");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "1700;0,5\n1699;0,6\n1698;0,4").unwrap();
        drop(file);

        let data = load_spectrum(&path, Unit::ReciprocalCentimeter, Unit::Arbitrary).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.y(), &[0.5, 0.6, 0.4]);
        assert_eq!(measurement_name(&path), "sample");

        let copy = dir.path().join("copy.csv");
        write_spectrum(&copy, &data).unwrap();
        let reloaded = load_spectrum(&copy, Unit::ReciprocalCentimeter, Unit::Arbitrary).unwrap();
        assert_eq!(reloaded.x(), data.x());
        assert_eq!(reloaded.y(), data.y());
    }

    #[test]
    fn test_load_rejects_non_monotonic_axis() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "1,0.1\n3,0.2\n2,0.3\n").unwrap();
        assert!(load_spectrum(&path, Unit::ReciprocalCentimeter, Unit::Arbitrary).is_err());
    }
}
