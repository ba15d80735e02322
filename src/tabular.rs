use calamine::{Data, Reader, open_workbook_auto};
use log::warn;
use serde::{Serialize, Serializer};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single cell value read from a tabular source
///
/// Numbers are kept as `f64` regardless of whether the source stored an
/// integer or a float. Integer-valued numbers serialize as JSON integers so
/// that templates and charts show `120` rather than `120.0`.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Numeric cell
    Number(f64),

    /// Any non-numeric, non-blank cell
    Text(String),

    /// Blank cell
    Empty,
}

impl Scalar {
    /// Classify a raw text cell the way CSV sources are read
    ///
    /// # Examples
    /// ```
    /// use support_site::tabular::Scalar;
    ///
    /// assert_eq!(Scalar::parse(" 42 "), Scalar::Number(42.0));
    /// assert_eq!(Scalar::parse(""), Scalar::Empty);
    /// assert_eq!(Scalar::parse("20대"), Scalar::Text("20대".to_string()));
    /// ```
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Scalar::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Scalar::Number(n),
            _ => Scalar::Text(trimmed.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Scalar::Empty)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<&Data> for Scalar {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Int(i) => Scalar::Number(*i as f64),
            Data::Float(f) => Scalar::Number(*f),
            Data::String(s) if s.trim().is_empty() => Scalar::Empty,
            Data::String(s) => Scalar::Text(s.clone()),
            Data::Empty => Scalar::Empty,
            other => Scalar::Text(other.to_string()),
        }
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::Text(s) => f.write_str(s),
            Scalar::Empty => Ok(()),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Scalar::Number(n) => serializer.serialize_f64(*n),
            Scalar::Text(s) => serializer.serialize_str(s),
            Scalar::Empty => serializer.serialize_none(),
        }
    }
}

/// One named column of a tabular dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = Scalar>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().collect(),
        }
    }
}

/// Column-oriented table loaded from a spreadsheet sheet or a CSV file
///
/// Every column holds the same number of values. The first column
/// conventionally carries the row label (age band, year, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TabularDataset {
    columns: Vec<Column>,
}

impl TabularDataset {
    /// Build a dataset from named columns
    ///
    /// Shorter columns are padded with [`Scalar::Empty`] so that the
    /// equal-length invariant holds.
    pub fn from_columns(columns: Vec<Column>) -> Self {
        let height = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);
        let columns = columns
            .into_iter()
            .map(|mut c| {
                c.values.resize(height, Scalar::Empty);
                c
            })
            .collect();
        Self { columns }
    }

    /// Build a dataset from a header row and data rows
    ///
    /// Rows shorter than the header are padded, extra trailing cells dropped.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Scalar>>) -> Self {
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column::new(name, Vec::new()))
            .collect();

        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.values.push(cells.next().unwrap_or(Scalar::Empty));
            }
        }

        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Row-major copy of the values, used by list pages
    pub fn rows(&self) -> Vec<Vec<Scalar>> {
        (0..self.row_count())
            .map(|r| self.columns.iter().map(|c| c.values[r].clone()).collect())
            .collect()
    }
}

/// Reasons a tabular source could not be loaded
///
/// Call sites never show these to the user; [`load_or`] collapses all of
/// them into the call site's fallback dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("source not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("permission denied reading {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("table '{table}' not found in {}", .path.display())]
    MissingTable { path: PathBuf, table: String },

    #[error("{} is not valid CP949 text", .0.display())]
    Encoding(PathBuf),

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("unsupported source format: {0}")]
    Unsupported(String),

    #[error("{} has no header row", .0.display())]
    Empty(PathBuf),
}

impl LoadError {
    fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => LoadError::PermissionDenied(path.to_path_buf()),
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }
}

/// Load a dataset, picking the reader from the file extension
///
/// `table` names the worksheet for spreadsheet sources and is ignored for
/// CSV sources.
///
/// # Examples
/// ```no_run
/// use support_site::tabular::load;
///
/// match load("data/news_data.xlsx", "뉴스") {
///     Ok(news) => println!("{} news rows", news.row_count()),
///     Err(e) => eprintln!("Error loading news: {}", e),
/// }
/// ```
pub fn load(path: impl AsRef<Path>, table: &str) -> Result<TabularDataset, LoadError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("csv") => from_csv(path),
        Some("xlsx") | Some("xlsm") | Some("xls") => from_excel(path, table),
        Some(ext) => Err(LoadError::Unsupported(ext.to_string())),
        None => Err(LoadError::Unsupported(path.display().to_string())),
    }
}

/// Load a dataset, substituting `fallback` on any failure
///
/// This is the availability-over-correctness policy of every read-only page:
/// the page always renders, with synthetic data if need be.
pub fn load_or<F>(path: impl AsRef<Path>, table: &str, fallback: F) -> TabularDataset
where
    F: FnOnce() -> TabularDataset,
{
    match load(path, table) {
        Ok(dataset) => dataset,
        Err(e) => {
            warn!("{e}; using fallback dataset for '{table}'");
            fallback()
        }
    }
}

/// Read a CP949-encoded CSV file; the first record is the header row
pub fn from_csv(path: &Path) -> Result<TabularDataset, LoadError> {
    let bytes = fs::read(path).map_err(|e| LoadError::from_io(path, e))?;

    let text = encoding_rs::EUC_KR
        .decode_without_bom_handling_and_without_replacement(&bytes)
        .ok_or_else(|| LoadError::Encoding(path.to_path_buf()))?;

    let parse_err = |e: csv::Error| LoadError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(parse_err)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::Empty(path.to_path_buf()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(parse_err)?;
        rows.push(record.iter().map(Scalar::parse).collect());
    }

    Ok(TabularDataset::from_rows(headers, rows))
}

/// Read the named worksheet of a spreadsheet; the first row is the header row
pub fn from_excel(path: &Path, table: &str) -> Result<TabularDataset, LoadError> {
    fs::metadata(path).map_err(|e| LoadError::from_io(path, e))?;

    let parse_err = |e: calamine::Error| LoadError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut workbook = open_workbook_auto(path).map_err(parse_err)?;

    if !workbook.sheet_names().iter().any(|name| name == table) {
        return Err(LoadError::MissingTable {
            path: path.to_path_buf(),
            table: table.to_string(),
        });
    }

    let range = workbook.worksheet_range(table).map_err(parse_err)?;
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .map(|cell| Scalar::from(cell).to_string())
            .collect(),
        None => return Err(LoadError::Empty(path.to_path_buf())),
    };

    let rows = rows
        .map(|row| row.iter().map(Scalar::from).collect::<Vec<_>>())
        .filter(|row| !row.iter().all(Scalar::is_empty))
        .collect();

    Ok(TabularDataset::from_rows(headers, rows))
}
