use crate::tabular::{Scalar, TabularDataset};
use log::warn;
use serde::Serialize;
use thiserror::Error;

/// Which parts of a dataset feed a chart
///
/// Each statistics chart selects its label column and data series
/// differently; the offsets live here instead of as slicing in the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartView {
    /// Column holding the x-axis labels
    pub label_column: usize,

    /// First column used as a data series; every column from here on is a series
    pub first_series_column: usize,

    /// Leading data rows dropped before labels and values are taken
    pub skip_rows: usize,

    /// Coerce every series value to an integer
    pub integer_values: bool,
}

/// Age band breakdown: every column after the label is a damage type.
pub const AGE_BREAKDOWN_VIEW: ChartView = ChartView {
    label_column: 0,
    first_series_column: 1,
    skip_rows: 0,
    integer_values: false,
};

/// Yearly support: column 1 is the aggregate total and the first data row
/// is the aggregate row of the published file, both excluded.
pub const YEARLY_SUPPORT_VIEW: ChartView = ChartView {
    label_column: 0,
    first_series_column: 2,
    skip_rows: 1,
    integer_values: true,
};

/// Chart-ready arrays: one label per row, one value array per series
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<Scalar>,
    pub series_names: Vec<String>,
    pub series_values: Vec<Vec<Scalar>>,
}

#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("dataset has no column {0}")]
    MissingColumn(usize),

    #[error("value '{value}' in column '{column}' is not an integer")]
    NotAnInteger { column: String, value: String },
}

impl ChartView {
    /// Reshape a dataset into chart arrays
    ///
    /// # Examples
    /// ```
    /// use support_site::charts::AGE_BREAKDOWN_VIEW;
    /// use support_site::datasets::age_breakdown_fallback;
    ///
    /// let chart = AGE_BREAKDOWN_VIEW.apply(&age_breakdown_fallback()).unwrap();
    /// assert_eq!(chart.series_names, vec!["촬영형", "유포형"]);
    /// ```
    pub fn apply(&self, dataset: &TabularDataset) -> Result<ChartData, TransformError> {
        let label_column = dataset
            .column(self.label_column)
            .ok_or(TransformError::MissingColumn(self.label_column))?;

        let labels = label_column
            .values
            .iter()
            .skip(self.skip_rows)
            .cloned()
            .collect();

        let series = dataset.columns().iter().skip(self.first_series_column);
        let mut series_names = Vec::new();
        let mut series_values = Vec::new();

        for column in series {
            let values = column.values.iter().skip(self.skip_rows);
            let values = if self.integer_values {
                values
                    .map(|value| to_integer(&column.name, value))
                    .collect::<Result<Vec<_>, _>>()?
            } else {
                values.cloned().collect()
            };

            series_names.push(column.name.clone());
            series_values.push(values);
        }

        Ok(ChartData {
            labels,
            series_names,
            series_values,
        })
    }

    /// Reshape `dataset`, or `fallback()` when the loaded data has the wrong shape
    pub fn apply_or<F>(&self, dataset: &TabularDataset, fallback: F) -> ChartData
    where
        F: FnOnce() -> TabularDataset,
    {
        match self.apply(dataset) {
            Ok(chart) => chart,
            Err(e) => {
                warn!("{e}; charting fallback dataset instead");
                self.apply(&fallback()).unwrap_or_default()
            }
        }
    }
}

fn to_integer(column: &str, value: &Scalar) -> Result<Scalar, TransformError> {
    value
        .as_f64()
        .map(|n| Scalar::Number(n.trunc()))
        .ok_or_else(|| TransformError::NotAnInteger {
            column: column.to_string(),
            value: value.to_string(),
        })
}
