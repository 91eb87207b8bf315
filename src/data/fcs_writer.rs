use std::io::Write;
use std::path::Path;

use super::fcs::{FcsError, Result, HEADER_LEN};

const DELIMITER: char = '/';

/// One channel to be written.
#[derive(Debug, Clone)]
struct ChannelSpec {
    name: String,
    label: Option<String>,
    range: f64,
}

/// Writes FCS 3.1 list-mode files with little-endian float32 data.
///
/// ```no_run
/// # use fcs_ridge::data::fcs_writer::FcsWriter;
/// let columns = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
/// FcsWriter::new()
///     .channel("FSC-A", None, 262_144.0)
///     .channel("BL1-A", Some("GFP"), 1_048_576.0)
///     .write(std::path::Path::new("A01_0.fcs"), &columns)
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct FcsWriter {
    channels: Vec<ChannelSpec>,
    keywords: Vec<(String, String)>,
}

impl FcsWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(mut self, name: &str, label: Option<&str>, range: f64) -> Self {
        self.channels.push(ChannelSpec {
            name: name.to_string(),
            label: label.map(str::to_string),
            range,
        });
        self
    }

    /// Extra TEXT keyword, e.g. `$FIL` or `$DATE`.
    pub fn keyword(mut self, key: &str, value: &str) -> Self {
        self.keywords.push((key.to_ascii_uppercase(), value.to_string()));
        self
    }

    pub fn write(&self, path: &Path, columns: &[Vec<f64>]) -> Result<()> {
        let bytes = self.to_bytes(columns)?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(&bytes)?;
        Ok(())
    }

    /// Encode a complete file; `columns` holds one column per channel.
    pub fn to_bytes(&self, columns: &[Vec<f64>]) -> Result<Vec<u8>> {
        if columns.len() != self.channels.len() {
            return Err(FcsError::Shape(format!(
                "{} columns for {} channels",
                columns.len(),
                self.channels.len()
            )));
        }
        let events = columns.first().map_or(0, Vec::len);
        if columns.iter().any(|c| c.len() != events) {
            return Err(FcsError::Shape("columns differ in length".into()));
        }

        let data_len = events * self.channels.len() * 4;

        // The TEXT segment carries the DATA offsets, whose digits change its
        // own length: iterate until the layout is stable.
        let mut data_begin = 0;
        let text = loop {
            let data_end = if data_len == 0 { 0 } else { data_begin + data_len - 1 };
            let begin = if data_len == 0 { 0 } else { data_begin };
            let text = self.text_segment(begin, data_end, events);
            let next = HEADER_LEN + text.len();
            if next == data_begin {
                break text;
            }
            data_begin = next;
        };

        let text_end = HEADER_LEN + text.len() - 1;
        let (header_begin, header_end) = if data_len == 0 {
            (0, 0)
        } else {
            (data_begin, data_begin + data_len - 1)
        };
        let fits = |offset: usize| if offset > 99_999_999 { 0 } else { offset };

        let mut out = Vec::with_capacity(HEADER_LEN + text.len() + data_len);
        out.extend_from_slice(
            format!(
                "FCS3.1    {:>8}{:>8}{:>8}{:>8}{:>8}{:>8}",
                HEADER_LEN,
                fits(text_end),
                fits(header_begin),
                fits(header_end),
                0,
                0
            )
            .as_bytes(),
        );
        out.extend_from_slice(text.as_bytes());
        for event in 0..events {
            for column in columns {
                out.extend_from_slice(&(column[event] as f32).to_le_bytes());
            }
        }
        Ok(out)
    }

    fn text_segment(&self, data_begin: usize, data_end: usize, events: usize) -> String {
        let mut pairs: Vec<(String, String)> = vec![
            ("$BEGINANALYSIS".into(), "0".into()),
            ("$ENDANALYSIS".into(), "0".into()),
            ("$BEGINSTEXT".into(), "0".into()),
            ("$ENDSTEXT".into(), "0".into()),
            ("$BEGINDATA".into(), data_begin.to_string()),
            ("$ENDDATA".into(), data_end.to_string()),
            ("$BYTEORD".into(), "1,2,3,4".into()),
            ("$DATATYPE".into(), "F".into()),
            ("$MODE".into(), "L".into()),
            ("$NEXTDATA".into(), "0".into()),
            ("$PAR".into(), self.channels.len().to_string()),
            ("$TOT".into(), events.to_string()),
        ];
        for (i, channel) in self.channels.iter().enumerate() {
            let n = i + 1;
            pairs.push((format!("$P{n}N"), channel.name.clone()));
            pairs.push((format!("$P{n}B"), "32".into()));
            pairs.push((format!("$P{n}E"), "0,0".into()));
            pairs.push((format!("$P{n}R"), format!("{}", channel.range)));
            if let Some(label) = &channel.label {
                pairs.push((format!("$P{n}S"), label.clone()));
            }
        }
        pairs.extend(self.keywords.iter().cloned());

        let escape = |s: &str| s.replace(DELIMITER, "//");
        let mut text = String::from(DELIMITER);
        for (key, value) in pairs.iter().filter(|(_, v)| !v.is_empty()) {
            text.push_str(&escape(key));
            text.push(DELIMITER);
            text.push_str(&escape(value));
            text.push(DELIMITER);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fcs::parse_fcs;

    #[test]
    fn test_written_file_reads_back() {
        let columns = vec![vec![100.0, 200.0, 300.0], vec![1.5e6, 2.5e6, 7.0e6]];
        let bytes = FcsWriter::new()
            .channel("FSC-A", None, 262_144.0)
            .channel("BL1-A", Some("GFP"), 1.0e7)
            .keyword("$FIL", "A01_0/raw.fcs")
            .to_bytes(&columns)
            .unwrap();

        let sample = parse_fcs(&bytes).unwrap();
        assert_eq!(sample.version, "FCS3.1");
        assert_eq!(sample.event_count(), 3);
        assert_eq!(sample.channel("GFP").unwrap(), columns[1].as_slice());
        assert_eq!(sample.keyword("$fil"), Some("A01_0/raw.fcs"));
        assert_eq!(sample.keyword("$BEGINDATA").unwrap().parse::<usize>().unwrap(), bytes.len() - 24);
    }

    #[test]
    fn test_empty_event_matrix() {
        let bytes = FcsWriter::new()
            .channel("BL1-A", None, 1024.0)
            .to_bytes(&[Vec::new()])
            .unwrap();
        let sample = parse_fcs(&bytes).unwrap();
        assert_eq!(sample.event_count(), 0);
        assert_eq!(sample.channel_names(), vec!["BL1-A"]);
    }

    #[test]
    fn test_shape_mismatch() {
        let writer = FcsWriter::new().channel("A", None, 1.0).channel("B", None, 1.0);
        assert!(matches!(writer.to_bytes(&[vec![1.0]]), Err(FcsError::Shape(_))));
        assert!(matches!(
            writer.to_bytes(&[vec![1.0], vec![1.0, 2.0]]),
            Err(FcsError::Shape(_))
        ));
    }
}
