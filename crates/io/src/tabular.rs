// CSV tabular provider: sampled and full loads.

use std::io::Read;
use std::path::Path;

use chorojoin_engine::{JoinError, Table};

/// Load column names plus the first `n` data rows.
pub fn load_sample(path: &Path, n: usize) -> Result<Table, JoinError> {
    load(path, Some(n))
}

/// Load the whole file.
pub fn load_all(path: &Path) -> Result<Table, JoinError> {
    load(path, None)
}

fn load(path: &Path, limit: Option<usize>) -> Result<Table, JoinError> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    parse(&content, delimiter, limit)
}

fn parse(content: &str, delimiter: u8, limit: Option<usize>) -> Result<Table, JoinError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| JoinError::Io(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        if limit.is_some_and(|n| rows.len() >= n) {
            break;
        }
        let record = record.map_err(|e| JoinError::Io(e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table { columns, rows })
}

/// Read file and convert to UTF-8 if needed. Excel-exported CSVs are
/// frequently Windows-1252.
pub fn read_file_as_utf8(path: &Path) -> Result<String, JoinError> {
    let mut file = std::fs::File::open(path).map_err(|e| JoinError::Io(e.to_string()))?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| JoinError::Io(e.to_string()))?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

/// Pick the delimiter whose field count is most consistent across the first
/// few lines. Quoted fields are respected because each candidate is tried
/// through the csv reader itself.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();
    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        let target = counts[0];
        if target <= 1 {
            continue;
        }
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;
        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}
