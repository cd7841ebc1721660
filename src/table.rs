use std::io::{self, Write};

use crate::domain::PathwayCompoundRow;
use crate::error::KeggError;

/// Column-major export table: row 0 holds the sorted pathway codes, row `i`
/// the `i`-th compound of every pathway (or an empty cell).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RectangularTable {
    rows: Vec<Vec<String>>,
}

impl RectangularTable {
    pub fn from_pathway_rows(rows: Vec<PathwayCompoundRow>) -> Result<Self, KeggError> {
        let cells = rows.into_iter().map(PathwayCompoundRow::into_cells).collect();
        let sorted = sort_rows(cells);
        let padded = pad_rows(sorted)?;
        Ok(Self {
            rows: transpose(padded)?,
        })
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// `(lines, pathways)` of the exported table.
    pub fn dimensions(&self) -> (usize, usize) {
        let columns = self.rows.first().map(Vec::len).unwrap_or(0);
        (self.rows.len(), columns)
    }

    pub fn to_tsv(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            out.push_str(&row.join("\t"));
            out.push('\n');
        }
        out
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for row in &self.rows {
            writer.write_all(row.join("\t").as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }
}

/// Stable ascending sort on the first cell of each row.
pub fn sort_rows(mut rows: Vec<Vec<String>>) -> Vec<Vec<String>> {
    rows.sort_by(|a, b| a.first().cmp(&b.first()));
    rows
}

pub fn pad_rows(rows: Vec<Vec<String>>) -> Result<Vec<Vec<String>>, KeggError> {
    let max_len = rows
        .iter()
        .map(Vec::len)
        .max()
        .ok_or_else(|| KeggError::EmptyResultSet("no rows to pad".to_string()))?;
    Ok(rows
        .into_iter()
        .map(|mut row| {
            row.resize(max_len, String::new());
            row
        })
        .collect())
}

pub fn transpose(rows: Vec<Vec<String>>) -> Result<Vec<Vec<String>>, KeggError> {
    let Some(width) = rows.first().map(Vec::len) else {
        return Ok(Vec::new());
    };
    if let Some((row, found)) = rows
        .iter()
        .map(Vec::len)
        .enumerate()
        .find(|(_, len)| *len != width)
    {
        return Err(KeggError::RaggedTable {
            expected: width,
            row,
            found,
        });
    }

    let mut columns: Vec<Vec<String>> = (0..width)
        .map(|_| Vec::with_capacity(rows.len()))
        .collect();
    for row in rows {
        for (column, cell) in columns.iter_mut().zip(row) {
            column.push(cell);
        }
    }
    Ok(columns)
}
