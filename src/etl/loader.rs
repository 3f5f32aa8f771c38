use crate::etl::diagnostics::{self, Diagnostics};
use crate::model::LoaderError;
use crate::utils::is_missing_cell;
use csv::{ReaderBuilder, Writer};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DURATION_MS: &str = "duration_ms";
const DURATION_MIN: &str = "duration_min";
const MS_PER_MINUTE: f64 = 60_000.0;

/// A CSV table kept as text, with missing cells as `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Rows shorter than the header are padded with missing cells.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                if row.len() < width {
                    row.resize(width, None);
                }
                row
            })
            .collect();
        RawTable { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Adds `duration_min = duration_ms / 60000`, replacing any existing column.
    /// Returns false when the table has no `duration_ms` column.
    pub fn derive_duration_minutes(&mut self) -> bool {
        let Some(source) = self.column_index(DURATION_MS) else {
            return false;
        };
        let target = match self.column_index(DURATION_MIN) {
            Some(index) => index,
            None => {
                self.headers.push(DURATION_MIN.to_string());
                for row in &mut self.rows {
                    row.push(None);
                }
                self.headers.len() - 1
            }
        };

        for row in &mut self.rows {
            let minutes = row[source]
                .as_deref()
                .and_then(|ms| ms.trim().parse::<f64>().ok())
                .map(|ms| (ms / MS_PER_MINUTE).to_string());
            row[target] = minutes;
        }
        true
    }

    /// Removes every row with at least one missing cell. Returns how many were dropped.
    pub fn drop_incomplete(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| row.iter().all(Option::is_some));
        before - self.rows.len()
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), LoaderError> {
        let mut writer = Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Short rows are accepted and padded. A row with more fields than the header
/// is rejected, since its cells can no longer be matched to columns.
pub fn read_raw_table(path: &Path) -> Result<RawTable, LoaderError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() > headers.len() {
            return Err(LoaderError::MalformedRow {
                line: record.position().map_or(0, |p| p.line()),
                expected: headers.len(),
                found: record.len(),
            });
        }
        let row = record
            .iter()
            .map(|cell| (!is_missing_cell(cell)).then(|| cell.to_string()))
            .collect();
        rows.push(row);
    }

    Ok(RawTable::new(headers, rows))
}

/// Turns the raw tracks CSV into the cleaned table the analyzer reads.
pub struct DataLoader {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

impl DataLoader {
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        DataLoader {
            input_path: input_path.into(),
            output_path: output_path.into(),
        }
    }

    /// Reads, diagnoses, derives `duration_min`, drops incomplete rows and
    /// writes the cleaned table. Returns the cleaned table and the raw diagnostics.
    pub fn process(&self) -> Result<(RawTable, Diagnostics), LoaderError> {
        if !self.input_path.exists() {
            return Err(LoaderError::MissingInput {
                path: self.input_path.clone(),
            });
        }

        info!("Loading raw data from {}", self.input_path.display());
        let mut table = read_raw_table(&self.input_path)?;
        info!("Loaded {} rows, {} columns", table.len(), table.headers().len());

        let diagnostics = diagnostics::analyze_columns(&table);
        diagnostics::log_diagnostics(&diagnostics);

        if table.derive_duration_minutes() {
            debug!("Derived {} from {}", DURATION_MIN, DURATION_MS);
        }

        let dropped = table.drop_incomplete();
        info!("Dropped {} incomplete rows, {} remain", dropped, table.len());

        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        table.write_csv(&self.output_path)?;
        info!("Processed data saved to {}", self.output_path.display());

        Ok((table, diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const RAW: &str = "\
track_id,track_genre,popularity,duration_ms,explicit
a,pop,80,180000,False
b,pop,,200000,True
c,rock,NA,90000,False
d,rock,35,215123,True
e,jazz,50,100000,
";

    fn write_raw(dir: &Path) -> PathBuf {
        let path = dir.join("raw.csv");
        fs::write(&path, RAW).unwrap();
        path
    }

    #[test]
    fn missing_input_names_the_path() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("nope.csv");
        let loader = DataLoader::new(&input, dir.path().join("out.csv"));

        let err = loader.process().unwrap_err();
        assert!(matches!(err, LoaderError::MissingInput { .. }));
        assert!(err.to_string().contains(&input.display().to_string()));
    }

    #[test]
    fn drops_incomplete_rows_and_creates_output_dir() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("processed/nested/clean.csv");
        let loader = DataLoader::new(write_raw(dir.path()), &output);

        let (table, diagnostics) = loader.process().unwrap();
        assert_eq!(diagnostics.row_count, 5);
        assert_eq!(table.len(), 2);
        assert!(table.len() <= diagnostics.row_count);
        assert!(table.rows().iter().all(|row| row.iter().all(Option::is_some)));
        assert!(output.exists());

        let reread = read_raw_table(&output).unwrap();
        assert_eq!(reread, table);
    }

    #[test]
    fn duration_minutes_is_exact_division() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("clean.csv");
        let (table, _) = DataLoader::new(write_raw(dir.path()), &output).process().unwrap();

        let ms = table.column_index("duration_ms").unwrap();
        let min = table.column_index("duration_min").unwrap();
        for row in read_raw_table(&output).unwrap().rows() {
            let ms: f64 = row[ms].as_deref().unwrap().parse().unwrap();
            let min: f64 = row[min].as_deref().unwrap().parse().unwrap();
            assert_eq!(min, ms / 60000.0);
        }
    }

    #[test]
    fn replaces_existing_duration_minutes() {
        let mut table = RawTable::new(
            vec!["duration_ms".into(), "duration_min".into()],
            vec![vec![Some("120000".into()), Some("99".into())]],
        );
        assert!(table.derive_duration_minutes());
        assert_eq!(table.headers().len(), 2);
        assert_eq!(table.rows()[0][1].as_deref(), Some("2"));
    }

    #[test]
    fn rejects_rows_wider_than_the_header() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("raw.csv");
        fs::write(
            &input,
            "track_id,track_genre,popularity,duration_ms,explicit\n\
             a,pop,80,180000,False\n\
             b,rock, roll,35,215123,True\n",
        )
        .unwrap();
        let output = dir.path().join("clean.csv");

        let err = DataLoader::new(&input, &output).process().unwrap_err();
        assert!(matches!(
            err,
            LoaderError::MalformedRow {
                line: 3,
                expected: 5,
                found: 6
            }
        ));
        assert!(!output.exists());
    }

    #[test]
    fn pads_short_rows_with_missing_cells() {
        let table = RawTable::new(vec!["a".into(), "b".into()], vec![vec![Some("1".into())]]);
        assert_eq!(table.rows()[0], vec![Some("1".to_string()), None]);
    }
}
