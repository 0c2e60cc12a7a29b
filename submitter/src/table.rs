use std::path::{Path, PathBuf};

/// The column every parameter table must declare.
pub const SCENARIO_FIELD: &str = "scenario";

/// Delimiters recognised in a parameter table, in order of preference on a tie.
const CANDIDATE_DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// An error raised while loading a parameter table. Any of these aborts the whole batch.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("Parameter table not found at {}, make sure its full path is given", .0.display())]
    FileNotFound(PathBuf),
    #[error("Failed to read parameter table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed parameter table: {0}")]
    Malformed(#[from] csv::Error),
    #[error("Row at line {line} has {found} fields but the header declares {expected}")]
    TooManyFields {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("Parameter table has no 'scenario' column")]
    MissingScenarioColumn,
    #[error("Incomplete rows in parameter table at line(s) {}", format_lines(.lines))]
    IncompleteRow { lines: Vec<u64> },
    #[error("Parameter table has {count} runs but at most {max} are allowed")]
    TooManyRuns { count: usize, max: usize },
}

fn format_lines(lines: &[u64]) -> String {
    lines
        .iter()
        .map(|line| line.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The parameters of a single scenario, keyed by column name in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioRow {
    fields: Vec<(String, String)>,
}

impl ScenarioRow {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Look up a field value by column name.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    /// The scenario name. Loaded rows always have one.
    pub fn scenario(&self) -> &str {
        self.get(SCENARIO_FIELD).unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, value)| value.is_empty())
    }

    fn is_complete(&self) -> bool {
        self.fields.iter().all(|(_, value)| !value.is_empty())
    }
}

/// All scenarios of one invocation, validated and in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunBatch {
    header: Vec<String>,
    rows: Vec<ScenarioRow>,
}

impl RunBatch {
    /// Load a parameter table from disk.
    ///
    /// The batch is rejected as a whole if any row has an empty value or if there are more
    /// than `max_runs` rows. Rows with only empty values are dropped first.
    pub fn from_file(path: &Path, max_runs: usize) -> Result<Self, TableError> {
        if !path.is_file() {
            return Err(TableError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content, max_runs)
    }

    /// Parse parameter table text, see [`RunBatch::from_file`].
    pub fn parse(content: &str, max_runs: usize) -> Result<Self, TableError> {
        let delimiter = detect_delimiter(content);
        debug!("Using delimiter {:?}", delimiter as char);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let header = reader
            .headers()?
            .iter()
            .map(|name| name.to_string())
            .collect::<Vec<String>>();
        if !header.iter().any(|name| name == SCENARIO_FIELD) {
            return Err(TableError::MissingScenarioColumn);
        }

        let mut rows = vec![];
        let mut incomplete_lines = vec![];
        for record in reader.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());
            if record.len() > header.len() {
                return Err(TableError::TooManyFields {
                    line,
                    expected: header.len(),
                    found: record.len(),
                });
            }

            // Missing trailing fields count as empty values.
            let row = ScenarioRow::new(
                header
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        (name.clone(), record.get(i).unwrap_or_default().to_string())
                    })
                    .collect(),
            );

            if row.is_blank() {
                continue;
            }
            if !row.is_complete() {
                incomplete_lines.push(line);
            }
            rows.push(row);
        }

        if !incomplete_lines.is_empty() {
            return Err(TableError::IncompleteRow {
                lines: incomplete_lines,
            });
        }
        if rows.len() > max_runs {
            return Err(TableError::TooManyRuns {
                count: rows.len(),
                max: max_runs,
            });
        }

        debug!("Loaded {} runs with columns {:?}", rows.len(), header);

        Ok(Self { header, rows })
    }

    /// Column names from the header row.
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[ScenarioRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Pick the delimiter that occurs most often in the header line.
///
/// Falls back to a comma when the header holds none of the candidates.
fn detect_delimiter(content: &str) -> u8 {
    let header = content
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default();

    let mut best = (CANDIDATE_DELIMITERS[0], 0);
    for delimiter in CANDIDATE_DELIMITERS {
        let count = header.bytes().filter(|b| *b == delimiter).count();
        if count > best.1 {
            best = (delimiter, count);
        }
    }

    best.0
}
