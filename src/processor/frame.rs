use memchr::memchr_iter;
use memmap2::Mmap;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::{fs::File, path::Path};
use tracing::{debug, warn};

use crate::processor::{column::Column, BinwiseError, Result};

/// Named, equal-length numeric columns: the table charts read from.
///
/// # Examples
///
/// ```rust
/// # use binwise::{Column, DataFrame};
/// let frame = DataFrame::from_columns(vec![
///     ("key".to_string(), Column::from(vec![0.0f64, 1.0, 2.0])),
///     ("val".to_string(), Column::from(vec![10i64, 8, 6])),
/// ])
/// .unwrap();
/// assert_eq!(frame.row_count(), 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DataFrame {
    headers: Vec<String>,
    columns: Vec<Column>,
    row_count: usize,
}

#[derive(Debug)]
pub struct ParseSummary {
    pub rows_processed: usize,
    pub errors: Vec<ParseError>,
}

/// A CSV row that was skipped. `row` is the 1-based line number in the file.
#[derive(Debug)]
pub struct ParseError {
    pub row: usize,
    pub column: String,
    pub value: String,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Int64,
    Float64,
}

#[derive(Debug, Clone, Copy)]
enum Cell {
    Int(i64),
    Float(f64),
}

struct BatchResult {
    int64_batches: Vec<Vec<i64>>,
    float64_batches: Vec<Vec<f64>>,
    row_count: usize,
    line_count: usize,
    // (line index within the chunk, error)
    errors: Vec<(usize, ParseError)>,
}

impl DataFrame {
    /// Create an empty frame
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a frame from `(name, column)` pairs. All columns must have the
    /// same length.
    pub fn from_columns(columns: Vec<(String, Column)>) -> Result<Self> {
        let mut frame = Self::new();
        for (name, column) in columns {
            frame.push_column(&name, column)?;
        }
        Ok(frame)
    }

    /// Appends a column, replacing any column with the same name.
    pub fn push_column(&mut self, name: &str, column: Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.row_count {
            return Err(BinwiseError::ShapeMismatch {
                left: self.row_count,
                right: column.len(),
            });
        }
        self.row_count = column.len();
        match self.headers.iter().position(|h| h == name) {
            Some(idx) => self.columns[idx] = column,
            None => {
                self.headers.push(name.to_string());
                self.columns.push(column);
            }
        }
        Ok(())
    }

    /// Loads a numeric CSV file through a memory map.
    ///
    /// Column types are inferred from the first data row: `Int64` when the
    /// field parses as an integer, `Float64` otherwise. Rows with a wrong
    /// field count or an unparsable field are skipped and reported in the
    /// returned [`ParseSummary`].
    ///
    /// # Errors
    /// Returns a [`BinwiseError`] if:
    /// - the file cannot be opened or mapped
    /// - there is no header or no data row
    /// - a column of the first data row is not numeric
    pub fn load_csv(path: &Path) -> Result<(Self, ParseSummary)> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        let buf: &[u8] = &mmap[..];

        // Parse header
        let header_end = buf
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| BinwiseError::Parse("missing header line".into()))?;
        let headers: Vec<String> = trim_cr(&buf[..header_end])
            .split(|&b| b == b',')
            .map(|s| String::from_utf8_lossy(s).trim().to_string())
            .collect();

        let data = &buf[header_end + 1..];

        // Infer schema from first line
        let first_line_end = data.iter().position(|&b| b == b'\n').unwrap_or(data.len());
        let first_line = trim_cr(&data[..first_line_end]);
        if first_line.is_empty() {
            return Err(BinwiseError::Parse("no data rows".into()));
        }
        let schema = Self::infer_schema(first_line, &headers)?;

        // Split on newlines, one chunk per thread
        let num_threads = rayon::current_num_threads();
        let chunks = Self::find_chunk_boundaries(data, num_threads);
        let estimated_rows_per_chunk = {
            let avg_line_len = first_line.len() + 1;
            data.len() / num_threads.max(1) / avg_line_len + 16
        };

        let batch_results: Vec<BatchResult> = chunks
            .par_iter()
            .map(|(start, end)| {
                Self::parse_chunk(&data[*start..*end], &schema, &headers, estimated_rows_per_chunk)
            })
            .collect();

        let mut int_cols: Vec<Vec<i64>> = vec![Vec::new(); schema.len()];
        let mut float_cols: Vec<Vec<f64>> = vec![Vec::new(); schema.len()];
        let mut total_rows = 0;
        let mut lines_before = 0;
        let mut all_errors = Vec::new();

        for mut batch in batch_results {
            total_rows += batch.row_count;
            for (line, mut error) in batch.errors {
                // header is line 1
                error.row = lines_before + line + 2;
                all_errors.push(error);
            }
            lines_before += batch.line_count;

            for col_idx in 0..schema.len() {
                match schema[col_idx] {
                    ColumnType::Int64 => {
                        int_cols[col_idx].append(&mut batch.int64_batches[col_idx])
                    }
                    ColumnType::Float64 => {
                        float_cols[col_idx].append(&mut batch.float64_batches[col_idx])
                    }
                }
            }
        }

        let columns: Vec<Column> = schema
            .iter()
            .enumerate()
            .map(|(i, col_type)| match col_type {
                ColumnType::Int64 => Column::Int64(std::mem::take(&mut int_cols[i])),
                ColumnType::Float64 => Column::Float64(std::mem::take(&mut float_cols[i])),
            })
            .collect();

        if !all_errors.is_empty() {
            warn!(skipped = all_errors.len(), path = %path.display(), "skipped malformed CSV rows");
        }
        debug!(rows = total_rows, columns = headers.len(), "loaded CSV");

        let frame = DataFrame {
            headers,
            columns,
            row_count: total_rows,
        };
        Ok((
            frame,
            ParseSummary {
                rows_processed: total_rows,
                errors: all_errors,
            },
        ))
    }

    fn infer_schema(first_line: &[u8], headers: &[String]) -> Result<Vec<ColumnType>> {
        let fields: Vec<&[u8]> = first_line.split(|&b| b == b',').collect();

        if fields.len() != headers.len() {
            return Err(BinwiseError::Parse(format!(
                "Header/data mismatch: {} vs {}",
                headers.len(),
                fields.len()
            )));
        }

        fields
            .iter()
            .zip(headers)
            .map(|(field, name)| {
                if atoi_simd::parse::<i64>(field).is_ok() {
                    Ok(ColumnType::Int64)
                } else if fast_float::parse::<f64, _>(field).is_ok() {
                    Ok(ColumnType::Float64)
                } else {
                    Err(BinwiseError::Parse(format!(
                        "column {name} is not numeric: {:?}",
                        String::from_utf8_lossy(field)
                    )))
                }
            })
            .collect()
    }

    fn find_chunk_boundaries(data: &[u8], num_chunks: usize) -> Vec<(usize, usize)> {
        if data.is_empty() {
            return vec![];
        }

        let num_chunks = num_chunks.max(1);
        let chunk_size = data.len() / num_chunks;
        let mut boundaries = Vec::with_capacity(num_chunks);
        let mut start = 0;

        for i in 0..num_chunks - 1 {
            let mut end = ((i + 1) * chunk_size).max(start);

            // Find next newline
            while end < data.len() && data[end] != b'\n' {
                end += 1;
            }

            if end < data.len() {
                end += 1; // Include the newline
            }

            if start < end {
                boundaries.push((start, end));
            }
            start = end;
        }

        // Last chunk gets everything remaining
        if start < data.len() {
            boundaries.push((start, data.len()));
        }

        boundaries
    }

    fn parse_chunk(
        chunk: &[u8],
        schema: &[ColumnType],
        headers: &[String],
        estimated_rows: usize,
    ) -> BatchResult {
        let num_cols = schema.len();

        let mut int64_cols: Vec<Vec<i64>> = schema
            .iter()
            .map(|t| match t {
                ColumnType::Int64 => Vec::with_capacity(estimated_rows),
                ColumnType::Float64 => Vec::new(),
            })
            .collect();
        let mut float64_cols: Vec<Vec<f64>> = schema
            .iter()
            .map(|t| match t {
                ColumnType::Float64 => Vec::with_capacity(estimated_rows),
                ColumnType::Int64 => Vec::new(),
            })
            .collect();

        let mut errors = Vec::new();
        let mut row_count = 0;
        let mut fields = Vec::with_capacity(num_cols);
        let mut cells = Vec::with_capacity(num_cols);

        let mut lines: Vec<&[u8]> = Vec::new();
        let mut start = 0;
        for newline_pos in memchr_iter(b'\n', chunk) {
            lines.push(&chunk[start..newline_pos]);
            start = newline_pos + 1;
        }
        if start < chunk.len() {
            lines.push(&chunk[start..]);
        }
        let line_count = lines.len();

        'lines: for (line_idx, line) in lines.into_iter().enumerate() {
            let line = trim_cr(line);
            if line.is_empty() {
                continue;
            }

            // Split line into fields
            fields.clear();
            let mut field_start = 0;
            for comma_pos in memchr_iter(b',', line) {
                fields.push(&line[field_start..comma_pos]);
                field_start = comma_pos + 1;
            }
            fields.push(&line[field_start..]);

            if fields.len() != num_cols {
                errors.push((
                    line_idx,
                    ParseError {
                        row: 0,
                        column: String::new(),
                        value: String::from_utf8_lossy(line).to_string(),
                        error: format!("expected {} fields, got {}", num_cols, fields.len()),
                    },
                ));
                continue;
            }

            // Parse the whole row before committing any of it
            cells.clear();
            for col_idx in 0..num_cols {
                let field = fields[col_idx];
                let parsed = match schema[col_idx] {
                    ColumnType::Int64 => atoi_simd::parse::<i64>(field)
                        .map(Cell::Int)
                        .map_err(|e| e.to_string()),
                    ColumnType::Float64 => fast_float::parse::<f64, _>(field)
                        .map(Cell::Float)
                        .map_err(|e| e.to_string()),
                };
                match parsed {
                    Ok(cell) => cells.push(cell),
                    Err(error) => {
                        errors.push((
                            line_idx,
                            ParseError {
                                row: 0,
                                column: headers[col_idx].clone(),
                                value: String::from_utf8_lossy(field).to_string(),
                                error,
                            },
                        ));
                        continue 'lines;
                    }
                }
            }

            for (col_idx, cell) in cells.iter().enumerate() {
                match *cell {
                    Cell::Int(v) => int64_cols[col_idx].push(v),
                    Cell::Float(v) => float64_cols[col_idx].push(v),
                }
            }
            row_count += 1;
        }

        BatchResult {
            int64_batches: int64_cols,
            float64_batches: float64_cols,
            row_count,
            line_count,
            errors,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_at(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        let col_pos = self
            .headers
            .iter()
            .position(|cn| cn == name)
            .ok_or_else(|| BinwiseError::MissingColumn(name.to_string()))?;

        self.columns
            .get(col_pos)
            .ok_or_else(|| BinwiseError::MissingColumn(name.to_string()))
    }
}

fn trim_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}
