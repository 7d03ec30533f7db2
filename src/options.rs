use std::ops::RangeInclusive;
use std::str::FromStr;

use crate::error::ExtractError;

/// How a grid data row is lined up against the header list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignmentPolicy {
    #[default]
    IndexPreserving,
    Positional,
}

impl FromStr for AlignmentPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "index" | "index-preserving" => Ok(Self::IndexPreserving),
            "positional" | "slide" => Ok(Self::Positional),
            other => Err(format!(
                "unknown alignment '{other}', expected 'index' or 'positional'"
            )),
        }
    }
}

/// Tunable thresholds for the reconstruction stages.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    pub row_threshold: f32,
    pub column_threshold: f32,
    pub region_gap_multiplier: f32,
    pub min_column_occurrences: usize,
    // Matched case-insensitively.
    pub key_value_keywords: Vec<String>,
}

impl DetectionConfig {
    #[must_use]
    pub fn region_gap(&self) -> f32 {
        self.row_threshold * self.region_gap_multiplier
    }

    pub(crate) fn validate(&self) -> Result<(), ExtractError> {
        for (name, value) in [
            ("row_threshold", self.row_threshold),
            ("column_threshold", self.column_threshold),
            ("region_gap_multiplier", self.region_gap_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ExtractError::InvalidOption(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            row_threshold: 5.0,
            column_threshold: 5.0,
            region_gap_multiplier: 3.0,
            min_column_occurrences: 2,
            key_value_keywords: ["account", "branch", "ifsc"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    ranges: Vec<RangeInclusive<u32>>,
}

impl PageSelection {
    #[must_use]
    pub fn contains(&self, page: u32) -> bool {
        self.ranges.iter().any(|range| range.contains(&page))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut ranges = Vec::new();
        for token in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if let Some((start, end)) = token.split_once('-') {
                let start: u32 = start
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range start: '{start}'"))?;
                let end: u32 = end
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid page range end: '{end}'"))?;
                if start == 0 || end == 0 {
                    return Err("pages are 1-based".to_string());
                }
                if end < start {
                    return Err(format!(
                        "invalid range '{token}': end is smaller than start"
                    ));
                }
                ranges.push(start..=end);
            } else {
                let page: u32 = token
                    .parse()
                    .map_err(|_| format!("invalid page number: '{token}'"))?;
                if page == 0 {
                    return Err("pages are 1-based".to_string());
                }
                ranges.push(page..=page);
            }
        }

        if ranges.is_empty() {
            return Err("page selection cannot be empty".to_string());
        }

        Ok(Self { ranges })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractOptions {
    pub pages: Option<PageSelection>,
    pub detection: DetectionConfig,
    pub alignment: AlignmentPolicy,
}
