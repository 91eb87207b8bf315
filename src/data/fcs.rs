use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

use super::model::{FcsSample, Parameter};

/// Length of the fixed HEADER segment.
pub const HEADER_LEN: usize = 58;

/// Errors raised while decoding an FCS file.
#[derive(Debug, Error)]
pub enum FcsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid HEADER segment: {0}")]
    InvalidHeader(String),

    #[error("invalid TEXT segment: {0}")]
    InvalidText(String),

    #[error("missing required keyword {0}")]
    MissingKeyword(String),

    #[error("keyword {key} has invalid value '{value}'")]
    InvalidKeyword { key: String, value: String },

    #[error("unsupported FCS feature: {0}")]
    Unsupported(String),

    #[error("DATA segment holds {actual} bytes but {expected} are needed")]
    Truncated { expected: usize, actual: usize },

    #[error("event matrix mismatch: {0}")]
    Shape(String),
}

pub type Result<T> = std::result::Result<T, FcsError>;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read and decode a list-mode FCS 2.0 / 3.0 / 3.1 file.
pub fn read_fcs(path: &Path) -> Result<FcsSample> {
    let bytes = std::fs::read(path)?;
    parse_fcs(&bytes)
}

/// Decode an FCS file already held in memory.
pub fn parse_fcs(bytes: &[u8]) -> Result<FcsSample> {
    let header = Header::parse(bytes)?;
    let text = segment(bytes, header.text, "TEXT")?;
    let keywords = parse_text(text)?;
    let layout = DataLayout::from_keywords(&keywords)?;

    let data = match data_range(&header, &keywords)? {
        Some((begin, end)) => {
            if end >= bytes.len() {
                return Err(FcsError::Truncated {
                    expected: end.saturating_add(1).saturating_sub(begin),
                    actual: bytes.len().saturating_sub(begin),
                });
            }
            segment(bytes, (begin, end), "DATA")?
        }
        None => &[],
    };
    let columns = layout.decode(data)?;

    Ok(FcsSample {
        version: header.version,
        keywords,
        parameters: layout.parameters,
        columns,
    })
}

// ---------------------------------------------------------------------------
// HEADER
// ---------------------------------------------------------------------------

/// Fixed-width HEADER: version, 4 spaces, six 8-byte ASCII offsets.
struct Header {
    version: String,
    text: (usize, usize),
    data: (usize, usize),
}

impl Header {
    fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(FcsError::InvalidHeader(format!(
                "file is {} bytes, the header alone needs {HEADER_LEN}",
                bytes.len()
            )));
        }
        let version = std::str::from_utf8(&bytes[0..6])
            .map_err(|_| FcsError::InvalidHeader("version is not ASCII".into()))?;
        if !version.starts_with("FCS") {
            return Err(FcsError::InvalidHeader(format!(
                "'{version}' is not an FCS version tag"
            )));
        }
        if !matches!(version, "FCS2.0" | "FCS3.0" | "FCS3.1") {
            return Err(FcsError::Unsupported(format!("version {version}")));
        }

        let offset = |field: usize| {
            let start = 10 + field * 8;
            parse_offset(&bytes[start..start + 8])
        };

        Ok(Header {
            version: version.to_string(),
            text: (offset(0)?, offset(1)?),
            data: (offset(2)?, offset(3)?),
        })
    }
}

fn parse_offset(field: &[u8]) -> Result<usize> {
    let s = std::str::from_utf8(field)
        .map_err(|_| FcsError::InvalidHeader("offset is not ASCII".into()))?
        .trim();
    if s.is_empty() {
        return Ok(0);
    }
    s.parse()
        .map_err(|_| FcsError::InvalidHeader(format!("offset '{s}' is not a number")))
}

/// Inclusive byte range `begin..=end` of a segment.
fn segment<'a>(bytes: &'a [u8], (begin, end): (usize, usize), name: &str) -> Result<&'a [u8]> {
    if end < begin || end >= bytes.len() {
        return Err(FcsError::InvalidHeader(format!(
            "{name} segment {begin}..={end} lies outside the {}-byte file",
            bytes.len()
        )));
    }
    Ok(&bytes[begin..=end])
}

/// DATA offsets from the header, or from `$BEGINDATA`/`$ENDDATA` when the
/// header holds zeros (files larger than 99,999,999 bytes).
fn data_range(
    header: &Header,
    keywords: &BTreeMap<String, String>,
) -> Result<Option<(usize, usize)>> {
    let (mut begin, mut end) = header.data;
    if begin == 0 && end == 0 {
        begin = keyword_parse::<usize>(keywords, "$BEGINDATA")?.unwrap_or(0);
        end = keyword_parse::<usize>(keywords, "$ENDDATA")?.unwrap_or(0);
    }
    if begin == 0 && end == 0 {
        return Ok(None);
    }
    Ok(Some((begin, end)))
}

// ---------------------------------------------------------------------------
// TEXT
// ---------------------------------------------------------------------------

/// Split the TEXT segment into keyword/value pairs.
///
/// The first byte is the delimiter; a doubled delimiter is a literal one.
fn parse_text(text: &[u8]) -> Result<BTreeMap<String, String>> {
    let (&delimiter, body) = text
        .split_first()
        .ok_or_else(|| FcsError::InvalidText("segment is empty".into()))?;

    let mut fields: Vec<Vec<u8>> = Vec::new();
    let mut current = Vec::new();
    let mut i = 0;
    while i < body.len() {
        let b = body[i];
        if b == delimiter {
            if body.get(i + 1) == Some(&delimiter) {
                current.push(delimiter);
                i += 2;
            } else {
                fields.push(std::mem::take(&mut current));
                i += 1;
            }
            continue;
        }
        current.push(b);
        i += 1;
    }
    // Some writers omit the final delimiter; others pad after it.
    if current.iter().any(|b| !b.is_ascii_whitespace() && *b != 0) {
        fields.push(current);
    }

    if fields.len() % 2 != 0 {
        return Err(FcsError::InvalidText(format!(
            "{} fields cannot form keyword/value pairs",
            fields.len()
        )));
    }

    Ok(fields
        .chunks(2)
        .map(|pair| {
            let key = String::from_utf8_lossy(&pair[0]).trim().to_ascii_uppercase();
            let value = String::from_utf8_lossy(&pair[1]).trim().to_string();
            (key, value)
        })
        .collect())
}

fn keyword_parse<T: std::str::FromStr>(
    keywords: &BTreeMap<String, String>,
    key: &str,
) -> Result<Option<T>> {
    match keywords.get(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| FcsError::InvalidKeyword {
                key: key.to_string(),
                value: value.clone(),
            }),
    }
}

fn required<'a>(keywords: &'a BTreeMap<String, String>, key: &str) -> Result<&'a str> {
    keywords
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| FcsError::MissingKeyword(key.to_string()))
}

// ---------------------------------------------------------------------------
// DATA
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataType {
    Integer,
    Float,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

/// Everything needed to decode the DATA segment.
struct DataLayout {
    datatype: DataType,
    byte_order: ByteOrder,
    parameters: Vec<Parameter>,
    events: Option<usize>,
}

impl DataLayout {
    fn from_keywords(keywords: &BTreeMap<String, String>) -> Result<Self> {
        if let Some(mode) = keywords.get("$MODE") {
            if !mode.eq_ignore_ascii_case("L") {
                return Err(FcsError::Unsupported(format!("$MODE {mode}")));
            }
        }

        let datatype = match required(keywords, "$DATATYPE")?.to_ascii_uppercase().as_str() {
            "I" => DataType::Integer,
            "F" => DataType::Float,
            "D" => DataType::Double,
            "A" => return Err(FcsError::Unsupported("ASCII ($DATATYPE A) data".into())),
            other => {
                return Err(FcsError::InvalidKeyword {
                    key: "$DATATYPE".into(),
                    value: other.to_string(),
                })
            }
        };

        let byteord: String = required(keywords, "$BYTEORD")?
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        let byte_order = match byteord.as_str() {
            "1" | "1,2" | "1,2,3,4" | "1,2,3,4,5,6,7,8" => ByteOrder::Little,
            "2,1" | "4,3,2,1" | "8,7,6,5,4,3,2,1" => ByteOrder::Big,
            other => return Err(FcsError::Unsupported(format!("$BYTEORD {other}"))),
        };

        let count: usize = keyword_parse(keywords, "$PAR")?
            .ok_or_else(|| FcsError::MissingKeyword("$PAR".into()))?;

        let parameters = (1..=count)
            .map(|n| {
                let name = required(keywords, &format!("$P{n}N"))?.to_string();
                let label = keywords
                    .get(&format!("$P{n}S"))
                    .filter(|s| !s.is_empty())
                    .cloned();
                let bits = match datatype {
                    DataType::Float => 32,
                    DataType::Double => 64,
                    DataType::Integer => {
                        let key = format!("$P{n}B");
                        let bits: u32 = keyword_parse(keywords, &key)?
                            .ok_or_else(|| FcsError::MissingKeyword(key.clone()))?;
                        if !matches!(bits, 8 | 16 | 32 | 64) {
                            return Err(FcsError::Unsupported(format!(
                                "{bits}-bit integer parameter {name}"
                            )));
                        }
                        bits
                    }
                };
                let range = keyword_parse::<f64>(keywords, &format!("$P{n}R"))?;
                Ok(Parameter {
                    name,
                    label,
                    bits,
                    range,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(DataLayout {
            datatype,
            byte_order,
            parameters,
            events: keyword_parse(keywords, "$TOT")?,
        })
    }

    fn bytes_per_event(&self) -> usize {
        self.parameters.iter().map(|p| p.bits as usize / 8).sum()
    }

    /// Decode list-mode data into one column per parameter.
    fn decode(&self, data: &[u8]) -> Result<Vec<Vec<f64>>> {
        let width = self.bytes_per_event();
        if width == 0 {
            return Ok(vec![Vec::new(); self.parameters.len()]);
        }
        let events = self.events.unwrap_or(data.len() / width);
        let needed = events
            .checked_mul(width)
            .ok_or_else(|| FcsError::InvalidKeyword {
                key: "$TOT".into(),
                value: events.to_string(),
            })?;
        if data.len() < needed {
            return Err(FcsError::Truncated {
                expected: needed,
                actual: data.len(),
            });
        }

        let mut columns: Vec<Vec<f64>> = self
            .parameters
            .iter()
            .map(|_| Vec::with_capacity(events))
            .collect();

        for event in data[..needed].chunks_exact(width) {
            let mut offset = 0;
            for (parameter, column) in self.parameters.iter().zip(columns.iter_mut()) {
                let size = parameter.bits as usize / 8;
                column.push(self.decode_value(&event[offset..offset + size], parameter));
                offset += size;
            }
        }
        Ok(columns)
    }

    fn decode_value(&self, raw: &[u8], parameter: &Parameter) -> f64 {
        match self.datatype {
            DataType::Float => {
                let bytes = fixed::<4>(raw);
                match self.byte_order {
                    ByteOrder::Little => f32::from_le_bytes(bytes) as f64,
                    ByteOrder::Big => f32::from_be_bytes(bytes) as f64,
                }
            }
            DataType::Double => {
                let bytes = fixed::<8>(raw);
                match self.byte_order {
                    ByteOrder::Little => f64::from_le_bytes(bytes),
                    ByteOrder::Big => f64::from_be_bytes(bytes),
                }
            }
            DataType::Integer => {
                let fold = |acc: u64, b: &u8| (acc << 8) | u64::from(*b);
                let value = match self.byte_order {
                    ByteOrder::Big => raw.iter().fold(0, fold),
                    ByteOrder::Little => raw.iter().rev().fold(0, fold),
                };
                match parameter.integer_mask() {
                    Some(mask) => (value & mask) as f64,
                    None => value as f64,
                }
            }
        }
    }
}

fn fixed<const N: usize>(raw: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&raw[..N]);
    out
}
