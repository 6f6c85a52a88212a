//! Precomputed record embeddings.
//!
//! Vectors are kept in one flat row-major buffer together with their
//! Euclidean norms, which are computed once at load so ranking only needs a
//! dot product per row.

use crate::error::{CineragError, Result};
use regex::Regex;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, instrument};

const NPY_MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Read-only matrix of embeddings, one row per record.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingIndex {
    dimensions: usize,
    data: Vec<f32>,
    norms: Vec<f32>,
}

impl EmbeddingIndex {
    /// Build an index from row vectors.
    ///
    /// Every row must share the same dimensionality, contain only finite values
    /// and have a non-zero norm.
    pub fn from_vectors(vectors: Vec<Vec<f32>>) -> Result<Self> {
        let dimensions = vectors.first().map(Vec::len).unwrap_or(0);
        if dimensions == 0 && !vectors.is_empty() {
            return Err(CineragError::Integrity(
                "embeddings have zero dimensions".to_string(),
            ));
        }
        let mut data = Vec::with_capacity(dimensions * vectors.len());
        for (i, vector) in vectors.into_iter().enumerate() {
            if vector.len() != dimensions {
                return Err(CineragError::Integrity(format!(
                    "embedding {} has {} dimensions, expected {}",
                    i,
                    vector.len(),
                    dimensions
                )));
            }
            data.extend(vector);
        }
        Self::from_flat(dimensions, data)
    }

    /// Build an index from a flat row-major buffer.
    pub fn from_flat(dimensions: usize, data: Vec<f32>) -> Result<Self> {
        if dimensions == 0 {
            if !data.is_empty() {
                return Err(CineragError::Integrity(
                    "embeddings have zero dimensions".to_string(),
                ));
            }
            return Ok(Self::default());
        }
        if data.len() % dimensions != 0 {
            return Err(CineragError::Integrity(format!(
                "{} values do not divide into rows of {}",
                data.len(),
                dimensions
            )));
        }

        let mut norms = Vec::with_capacity(data.len() / dimensions);
        for (i, row) in data.chunks_exact(dimensions).enumerate() {
            if row.iter().any(|v| !v.is_finite()) {
                return Err(CineragError::Integrity(format!(
                    "embedding {} contains non-finite values",
                    i
                )));
            }
            let norm = l2_norm(row);
            if norm == 0.0 || !norm.is_finite() {
                return Err(CineragError::Integrity(format!(
                    "embedding {} has zero norm",
                    i
                )));
            }
            norms.push(norm);
        }

        Ok(Self {
            dimensions,
            data,
            norms,
        })
    }

    /// Load embeddings from disk. The format follows the file extension:
    /// `.npy` (NumPy array) or `.json` (array of arrays).
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);

        let index = match extension.as_deref() {
            Some("npy") => Self::from_npy(reader)?,
            Some("json") => {
                let vectors: Vec<Vec<f32>> = serde_json::from_reader(reader)?;
                Self::from_vectors(vectors)?
            }
            other => {
                return Err(CineragError::Integrity(format!(
                    "unsupported embeddings format: {}",
                    other.unwrap_or("(no extension)")
                )))
            }
        };

        info!(
            "Loaded {} embeddings ({} dimensions)",
            index.len(),
            index.dimensions()
        );
        Ok(index)
    }

    /// Parse a little-endian, C-ordered, two-dimensional `.npy` array of
    /// `f4` or `f8` values. Double precision is narrowed to `f32`.
    pub fn from_npy<R: Read>(mut reader: R) -> Result<Self> {
        let header = NpyHeader::read(&mut reader)?;
        debug!(?header, "Parsed npy header");
        if header.columns == 0 && header.rows > 0 {
            return Err(CineragError::Integrity(
                "embeddings have zero dimensions".to_string(),
            ));
        }

        // The shape is untrusted until the bytes behind it have been read, so
        // the buffer grows with the data instead of being sized from it.
        let mut remaining = header.data_len().ok_or_else(|| {
            CineragError::Integrity(format!(
                "npy shape ({}, {}) overflows",
                header.rows, header.columns
            ))
        })?;
        let mut data = Vec::new();
        let mut chunk = vec![0u8; READ_CHUNK_VALUES * header.item_size];
        while remaining > 0 {
            let bytes = &mut chunk[..remaining.min(READ_CHUNK_VALUES * header.item_size)];
            reader.read_exact(bytes).map_err(|e| {
                CineragError::Integrity(format!(
                    "npy data ends early after {} of {} values: {}",
                    data.len(),
                    header.rows * header.columns,
                    e
                ))
            })?;
            match header.item_size {
                4 => data.extend(
                    bytes
                        .chunks_exact(4)
                        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
                ),
                _ => data.extend(bytes.chunks_exact(8).map(|b| {
                    f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32
                })),
            }
            remaining -= bytes.len();
        }

        if header.rows == 0 {
            return Ok(Self {
                dimensions: header.columns,
                ..Default::default()
            });
        }
        Self::from_flat(header.columns, data)
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.norms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.norms.is_empty()
    }

    /// Dimensionality shared by every stored vector.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The vector at a position.
    pub fn vector(&self, index: usize) -> Option<&[f32]> {
        if index >= self.len() {
            return None;
        }
        let start = index * self.dimensions;
        self.data.get(start..start + self.dimensions)
    }

    /// Precomputed Euclidean norm of the vector at a position.
    pub fn norm(&self, index: usize) -> Option<f32> {
        self.norms.get(index).copied()
    }

    /// Iterate `(vector, norm)` pairs in storage order.
    pub fn rows(&self) -> impl Iterator<Item = (&[f32], f32)> {
        self.data
            .chunks_exact(self.dimensions.max(1))
            .zip(self.norms.iter().copied())
    }
}

/// Euclidean norm of a vector.
pub fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Values decoded per read while streaming `.npy` data.
const READ_CHUNK_VALUES: usize = 8192;

#[derive(Debug)]
struct NpyHeader {
    rows: usize,
    columns: usize,
    item_size: usize,
}

impl NpyHeader {
    /// Size of the data section in bytes, or `None` if the shape overflows.
    fn data_len(&self) -> Option<usize> {
        self.rows
            .checked_mul(self.columns)?
            .checked_mul(self.item_size)
    }

    fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let malformed = |msg: &str| CineragError::Integrity(format!("malformed npy file: {}", msg));

        let mut preamble = [0u8; 8];
        reader
            .read_exact(&mut preamble)
            .map_err(|_| malformed("truncated preamble"))?;
        if &preamble[..6] != NPY_MAGIC {
            return Err(malformed("bad magic"));
        }

        let header_len = match preamble[6] {
            1 => {
                let mut len = [0u8; 2];
                reader.read_exact(&mut len)?;
                u16::from_le_bytes(len) as usize
            }
            2 | 3 => {
                let mut len = [0u8; 4];
                reader.read_exact(&mut len)?;
                u32::from_le_bytes(len) as usize
            }
            v => return Err(malformed(&format!("unsupported version {}", v))),
        };

        let mut raw = vec![0u8; header_len];
        reader
            .read_exact(&mut raw)
            .map_err(|_| malformed("truncated header"))?;
        let text = String::from_utf8_lossy(&raw);
        Self::parse(&text)
    }

    fn parse(text: &str) -> Result<Self> {
        let malformed = |msg: &str| CineragError::Integrity(format!("malformed npy file: {}", msg));
        let field = |pattern: &str| -> Option<String> {
            Regex::new(pattern)
                .ok()?
                .captures(text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
        };

        let descr = field(r"'descr'\s*:\s*'([^']*)'").ok_or_else(|| malformed("missing descr"))?;
        let item_size = match descr.as_str() {
            "<f4" => 4,
            "<f8" => 8,
            other => return Err(malformed(&format!("unsupported dtype {}", other))),
        };

        let fortran = field(r"'fortran_order'\s*:\s*(True|False)")
            .ok_or_else(|| malformed("missing fortran_order"))?;
        if fortran == "True" {
            return Err(malformed("fortran-ordered arrays are not supported"));
        }

        let shape = field(r"'shape'\s*:\s*\(([^)]*)\)").ok_or_else(|| malformed("missing shape"))?;
        let dims = shape
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<usize>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| malformed("non-numeric shape"))?;

        match dims.as_slice() {
            [rows, columns] => Ok(Self {
                rows: *rows,
                columns: *columns,
                item_size,
            }),
            _ => Err(malformed(&format!(
                "expected a 2-D array, got shape ({})",
                shape
            ))),
        }
    }
}
