//! Named tabular sources of the site and their built-in fallbacks.

use crate::tabular::{self, Column, Scalar, TabularDataset};
use std::path::{Path, PathBuf};

/// A tabular file under the data directory plus the table to read from it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Source {
    pub file_name: &'static str,
    pub table: &'static str,
}

pub const NEWS: Source = Source {
    file_name: "news_data.xlsx",
    table: "뉴스",
};

pub const CASES: Source = Source {
    file_name: "cases_data.xlsx",
    table: "판례",
};

pub const AGE_BREAKDOWN: Source = Source {
    file_name: "한국여성인권진흥원_디지털성범죄피해자지원센터 연령대별 세부 피해 유형 현황_20231231.csv",
    table: "",
};

pub const YEARLY_SUPPORT: Source = Source {
    file_name: "한국여성인권진흥원_디지털성범죄피해자지원센터 지원현황_20241231.csv",
    table: "",
};

/// Age distribution shown on the home page; embedded, not file-backed
pub const HOME_AGE_LABELS: [&str; 6] = ["10대", "20대", "30대", "40대", "50대", "60대 이상"];
pub const HOME_AGE_VALUES: [u32; 6] = [120, 450, 390, 260, 150, 45];

impl Source {
    pub fn path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.file_name)
    }

    /// Load this source from `data_dir`, or `fallback()` on any failure
    pub fn load_or<F>(&self, data_dir: &Path, fallback: F) -> TabularDataset
    where
        F: FnOnce() -> TabularDataset,
    {
        tabular::load_or(self.path(data_dir), self.table, fallback)
    }
}

fn numbers(values: &[f64]) -> Vec<Scalar> {
    values.iter().map(|n| Scalar::Number(*n)).collect()
}

fn labels(values: &[&str]) -> Vec<Scalar> {
    values.iter().map(|s| Scalar::from(*s)).collect()
}

pub fn age_breakdown_fallback() -> TabularDataset {
    TabularDataset::from_columns(vec![
        Column::new("연령대", labels(&["10대", "20대", "30대"])),
        Column::new("촬영형", numbers(&[10.0, 20.0, 15.0])),
        Column::new("유포형", numbers(&[5.0, 15.0, 10.0])),
    ])
}

/// Laid out like the published file: a `합계` row first, a `전체` column second
pub fn yearly_support_fallback() -> TabularDataset {
    let mut years = labels(&["합계"]);
    years.extend(numbers(&[2022.0, 2023.0, 2024.0]));

    TabularDataset::from_columns(vec![
        Column::new("연도", years),
        Column::new("전체", numbers(&[700.0, 150.0, 230.0, 320.0])),
        Column::new("상담", numbers(&[450.0, 100.0, 150.0, 200.0])),
        Column::new("법률지원", numbers(&[250.0, 50.0, 80.0, 120.0])),
    ])
}

/// News and case lists render empty rather than with synthetic rows
pub fn empty_fallback() -> TabularDataset {
    TabularDataset::default()
}
