//! Convolutional features stored as one `.npy` array per viewpoint.
//!
//! Layout is `<dir>/<scan>/<viewpoint>.npy`, little-endian `f32` in C
//! order with the 36 views on the first axis. Only the requested view is
//! read from disk.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::error::FeatureError;
use super::FeatureVector;

const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Parsed `.npy` header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ArrayHeader {
    shape: Vec<usize>,
    data_offset: u64,
}

impl ArrayHeader {
    fn read<R: Read>(reader: &mut R, path: &Path) -> Result<Self, FeatureError> {
        let bad = |reason: String| FeatureError::MalformedArray {
            path: path.to_path_buf(),
            reason,
        };
        let io_err = |e: io::Error| FeatureError::io(path, &e);

        let mut preamble = [0u8; 8];
        reader.read_exact(&mut preamble).map_err(io_err)?;
        if &preamble[..6] != MAGIC {
            return Err(bad("missing NUMPY magic".into()));
        }
        let major = preamble[6];
        let (header_len, prefix_len) = match major {
            1 => {
                let mut len = [0u8; 2];
                reader.read_exact(&mut len).map_err(io_err)?;
                (u16::from_le_bytes(len) as usize, 10)
            }
            2 | 3 => {
                let mut len = [0u8; 4];
                reader.read_exact(&mut len).map_err(io_err)?;
                (u32::from_le_bytes(len) as usize, 12)
            }
            other => return Err(bad(format!("unsupported format version {other}"))),
        };

        let mut header = vec![0u8; header_len];
        reader.read_exact(&mut header).map_err(io_err)?;
        let header = String::from_utf8_lossy(&header);

        let descr = dict_value(&header, "descr")
            .and_then(quoted)
            .ok_or_else(|| bad("header has no descr".into()))?;
        if descr != "<f4" {
            return Err(bad(format!("expected little-endian f32, found {descr}")));
        }
        if dict_value(&header, "fortran_order").is_some_and(|v| v.starts_with("True")) {
            return Err(bad("fortran order is not supported".into()));
        }
        let shape = dict_value(&header, "shape")
            .and_then(parse_shape)
            .ok_or_else(|| bad("header has no readable shape".into()))?;
        if shape.is_empty() {
            return Err(bad("scalar arrays hold no views".into()));
        }

        Ok(Self {
            shape,
            data_offset: (prefix_len + header_len) as u64,
        })
    }

    /// Number of values in one view.
    fn view_len(&self) -> usize {
        self.shape[1..].iter().product()
    }
}

/// Text following `'key':` in a header dict literal.
fn dict_value<'a>(header: &'a str, key: &str) -> Option<&'a str> {
    let pattern = format!("'{key}':");
    let start = header.find(&pattern)? + pattern.len();
    Some(header[start..].trim_start())
}

fn quoted(value: &str) -> Option<&str> {
    let rest = value.strip_prefix('\'')?;
    rest.find('\'').map(|end| &rest[..end])
}

fn parse_shape(value: &str) -> Option<Vec<usize>> {
    let inner = value.strip_prefix('(')?;
    let inner = &inner[..inner.find(')')?];
    inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().ok())
        .collect()
}

/// Directory of per-viewpoint convolutional feature arrays.
#[derive(Debug, Clone)]
pub struct ConvFeatureStore {
    dir: PathBuf,
}

impl ConvFeatureStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, scan: &str, viewpoint: &str) -> PathBuf {
        self.dir.join(scan).join(format!("{viewpoint}.npy"))
    }

    /// Reads view `view_index` of the viewpoint's array.
    pub fn features(
        &self,
        scan: &str,
        viewpoint: &str,
        view_index: usize,
    ) -> Result<FeatureVector, FeatureError> {
        let path = self.path_of(scan, viewpoint);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(FeatureError::Missing {
                    scan: scan.to_string(),
                    viewpoint: viewpoint.to_string(),
                })
            }
            Err(e) => return Err(FeatureError::io(&path, &e)),
        };
        let mut reader = BufReader::new(file);
        let header = ArrayHeader::read(&mut reader, &path)?;
        if view_index >= header.shape[0] {
            return Err(FeatureError::ViewOutOfRange {
                view_index,
                views: header.shape[0],
            });
        }

        let view_len = header.view_len();
        let offset = header.data_offset + (view_index * view_len * 4) as u64;
        reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| FeatureError::io(&path, &e))?;
        let mut bytes = vec![0u8; view_len * 4];
        reader
            .read_exact(&mut bytes)
            .map_err(|e| FeatureError::io(&path, &e))?;

        let values: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(FeatureVector::new(header.shape[1..].to_vec(), values))
    }
}
