//! Compact representation of the dense action table.
//!
//! Only non-error cells are stored, each as a pair of a delta (the distance
//! from the previously stored cell) and its value. Runs of identical values are
//! stored once, behind a `COUNT_MARK` entry whose successor carries the run
//! length in its delta slot.

use crate::action::{create_value, ERROR, SKIP};

/// Marks the start of a run. Never produced as a cell value because skip
/// cells always have a zero operand.
pub const COUNT_MARK: u16 = create_value(SKIP, 1);

/// Maximum number of code units in a chunk.
pub const MAX_CHUNK_LEN: usize = 0xffff / 3;

/// Runs at least this long are stored with a count marker.
const MIN_RUN: usize = 2;

const MAX_UNIT: usize = u16::MAX as usize;

/// Two parallel sequences of code units, split into chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedValues {
    pub deltas: Vec<Vec<u16>>,
    pub values: Vec<Vec<u16>>,
}

impl PackedValues {
    /// Number of stored (delta, value) pairs.
    pub fn len(&self) -> usize {
        self.deltas.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UnpackError {
    #[error("mismatched number of delta and value chunks ({deltas} != {values})")]
    ChunkCount { deltas: usize, values: usize },

    #[error("mismatched chunk length ({deltas} != {values})")]
    ChunkLength { deltas: usize, values: usize },

    #[error("cell index {index} is out of the table bounds ({len})")]
    OutOfBounds { index: usize, len: usize },

    #[error("run of zero length")]
    EmptyRun,

    #[error("count marker at the end of the packed values")]
    DanglingCountMark,

    #[error("table dimensions do not match: {0}")]
    Dimensions(String),
}

/// Encode the dense cells into the packed form.
pub fn compact(cells: &[u16]) -> PackedValues {
    let mut deltas = vec![];
    let mut values = vec![];

    let mut prev = 0;
    let mut i = 0;
    while i < cells.len() {
        let value = cells[i];
        if value == ERROR {
            i += 1;
            continue;
        }

        // bridge gaps that do not fit into a single delta with explicit error cells.
        while i - prev > MAX_UNIT {
            prev += MAX_UNIT;
            deltas.push(u16::MAX);
            values.push(ERROR);
        }
        let delta = (i - prev) as u16;

        let count = same_values(cells, i).min(MAX_UNIT);
        if count >= MIN_RUN {
            deltas.push(delta);
            values.push(COUNT_MARK);
            deltas.push(count as u16);
            values.push(value);
            i += count - 1;
        } else {
            deltas.push(delta);
            values.push(value);
        }
        prev = i;
        i += 1;
    }

    PackedValues {
        deltas: split(&deltas),
        values: split(&values),
    }
}

/// Decode the packed form into `len` dense cells.
pub fn expand(packed: &PackedValues, len: usize) -> Result<Vec<u16>, UnpackError> {
    if packed.deltas.len() != packed.values.len() {
        return Err(UnpackError::ChunkCount {
            deltas: packed.deltas.len(),
            values: packed.values.len(),
        });
    }

    let mut cells = vec![ERROR; len];
    let mut index = 0;
    let mut marked = false;
    for (deltas, values) in packed.deltas.iter().zip(&packed.values) {
        if deltas.len() != values.len() {
            return Err(UnpackError::ChunkLength {
                deltas: deltas.len(),
                values: values.len(),
            });
        }

        for (&delta, &value) in deltas.iter().zip(values) {
            let delta = usize::from(delta);
            if marked {
                if delta == 0 {
                    return Err(UnpackError::EmptyRun);
                }
                let end = index + delta;
                if end > len {
                    return Err(UnpackError::OutOfBounds { index: end - 1, len });
                }
                cells[index..end].fill(value);
                // points to the last assigned cell.
                index = end - 1;
                marked = false;
            } else if value == COUNT_MARK {
                index += delta;
                marked = true;
            } else {
                index += delta;
                let cell = cells
                    .get_mut(index)
                    .ok_or(UnpackError::OutOfBounds { index, len })?;
                *cell = value;
            }
        }
    }

    if marked {
        return Err(UnpackError::DanglingCountMark);
    }

    Ok(cells)
}

fn same_values(cells: &[u16], offset: usize) -> usize {
    let value = cells[offset];
    cells[offset..]
        .iter()
        .position(|&v| v != value)
        .unwrap_or(cells.len() - offset)
}

fn split(units: &[u16]) -> Vec<Vec<u16>> {
    units.chunks(MAX_CHUNK_LEN).map(<[u16]>::to_vec).collect()
}
