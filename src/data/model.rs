use std::collections::BTreeMap;

use crate::error::{Result, RidgeError};

// ---------------------------------------------------------------------------
// Parameter – one measured channel of an FCS file
// ---------------------------------------------------------------------------

/// Description of one FCS parameter (`$PnN`, `$PnS`, `$PnB`, `$PnR`).
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Short name, e.g. `BL1-A`.
    pub name: String,
    /// Optional stain / long name, e.g. `GFP`.
    pub label: Option<String>,
    /// Bits per value in the DATA segment.
    pub bits: u32,
    /// Declared range, used to mask integer data.
    pub range: Option<f64>,
}

impl Parameter {
    /// Bit mask applied to integer values: `$PnR` rounded up to a power of two.
    pub fn integer_mask(&self) -> Option<u64> {
        let range = self.range?;
        if !range.is_finite() || range <= 1.0 || range >= (1u64 << 63) as f64 {
            return None;
        }
        let mask = (range.ceil() as u64).next_power_of_two() - 1;
        if self.bits < 64 {
            Some(mask & ((1u64 << self.bits) - 1))
        } else {
            Some(mask)
        }
    }
}

// ---------------------------------------------------------------------------
// FcsSample – one loaded .fcs file
// ---------------------------------------------------------------------------

/// The event data and metadata of a single list-mode FCS file.
#[derive(Debug, Clone)]
pub struct FcsSample {
    /// Version string from the HEADER, e.g. `FCS3.1`.
    pub version: String,
    /// TEXT keywords, keys upper-cased.
    pub keywords: BTreeMap<String, String>,
    pub parameters: Vec<Parameter>,
    /// One column of event values per parameter.
    pub columns: Vec<Vec<f64>>,
}

impl FcsSample {
    /// Number of events (rows).
    pub fn event_count(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Look up a TEXT keyword, case-insensitively.
    pub fn keyword(&self, key: &str) -> Option<&str> {
        self.keywords
            .get(&key.to_ascii_uppercase())
            .map(String::as_str)
    }

    /// Index of a channel by `$PnN`, then `$PnS`; exact matches win over
    /// case-insensitive ones.
    pub fn channel_index(&self, channel: &str) -> Option<usize> {
        let by_name = |p: &Parameter| p.name == channel;
        let by_label = |p: &Parameter| p.label.as_deref() == Some(channel);
        let by_name_ci = |p: &Parameter| p.name.eq_ignore_ascii_case(channel);
        let by_label_ci = |p: &Parameter| {
            p.label
                .as_deref()
                .is_some_and(|l| l.eq_ignore_ascii_case(channel))
        };

        self.parameters
            .iter()
            .position(by_name)
            .or_else(|| self.parameters.iter().position(by_label))
            .or_else(|| self.parameters.iter().position(by_name_ci))
            .or_else(|| self.parameters.iter().position(by_label_ci))
    }

    /// Event values of one channel.
    pub fn channel(&self, channel: &str) -> Option<&[f64]> {
        self.channel_index(channel)
            .and_then(|i| self.columns.get(i))
            .map(Vec::as_slice)
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// TimeSeries – insertion-ordered time point → sample mapping
// ---------------------------------------------------------------------------

/// A loaded sample together with the label and file it came from.
#[derive(Debug, Clone)]
pub struct TimePoint {
    pub label: String,
    pub file: String,
    pub sample: FcsSample,
}

/// Values of a single channel at one time point, ready for plotting.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSeries {
    pub label: String,
    pub values: Vec<f64>,
}

/// Samples keyed by time-point label, in the order they were inserted.
///
/// Labels are unique. Inserting an existing label replaces its sample but
/// keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    entries: Vec<TimePoint>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a sample, returning the entry it replaced (if any).
    pub fn insert(
        &mut self,
        label: impl Into<String>,
        file: impl Into<String>,
        sample: FcsSample,
    ) -> Option<TimePoint> {
        let entry = TimePoint {
            label: label.into(),
            file: file.into(),
            sample,
        };
        match self.entries.iter_mut().find(|e| e.label == entry.label) {
            Some(existing) => Some(std::mem::replace(existing, entry)),
            None => {
                self.entries.push(entry);
                None
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&TimePoint> {
        self.entries.iter().find(|e| e.label == label)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimePoint> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Extract one channel from every time point, in insertion order.
    pub fn channel_series(&self, channel: &str) -> Result<Vec<ChannelSeries>> {
        self.entries
            .iter()
            .map(|entry| {
                let values =
                    entry
                        .sample
                        .channel(channel)
                        .ok_or_else(|| RidgeError::ChannelNotFound {
                            channel: channel.to_string(),
                            file: entry.file.clone(),
                        })?;
                Ok(ChannelSeries {
                    label: entry.label.clone(),
                    values: values.to_vec(),
                })
            })
            .collect()
    }
}
