use std::fs::File;
use std::io::{BufRead, BufReader, Read};

use camino::Utf8Path;
use csv::{ReaderBuilder, StringRecordsIntoIter};
use tracing::info;

use crate::dialect::{DialectSniffer, SAMPLE_SIZE};
use crate::domain::{Dialect, Identifier};
use crate::error::ManifestError;
use crate::header::HeaderResolver;

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Opens a CSV file, sniffs its dialect and locates the identifier column.
pub fn open_identifiers(path: &Utf8Path) -> Result<IdentifierReader<File>, ManifestError> {
    let sample = read_sample(path)?;
    let dialect = DialectSniffer::sniff(&sample);
    info!(path = %path, %dialect, "sniffed CSV dialect");

    let file = File::open(path.as_std_path()).map_err(|err| ManifestError::CsvOpen {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    IdentifierReader::new(file, dialect)
}

fn read_sample(path: &Utf8Path) -> Result<Vec<u8>, ManifestError> {
    let file = File::open(path.as_std_path()).map_err(|err| ManifestError::CsvOpen {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    let mut sample = Vec::with_capacity(SAMPLE_SIZE);
    file.take(SAMPLE_SIZE as u64)
        .read_to_end(&mut sample)
        .map_err(|err| ManifestError::CsvRead(err.to_string()))?;
    Ok(sample)
}

/// Single-pass stream of trimmed identifiers, one per non-blank row.
pub struct IdentifierReader<R: Read> {
    records: StringRecordsIntoIter<BufReader<R>>,
    header: String,
    column: usize,
}

impl<R: Read> IdentifierReader<R> {
    pub fn new(source: R, dialect: Dialect) -> Result<Self, ManifestError> {
        let mut buffered = BufReader::new(source);
        let has_bom = buffered
            .fill_buf()
            .map_err(|err| ManifestError::CsvRead(err.to_string()))?
            .starts_with(&UTF8_BOM);
        if has_bom {
            buffered.consume(UTF8_BOM.len());
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(dialect.delimiter)
            .quote(dialect.quote)
            .from_reader(buffered);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|err| ManifestError::CsvRead(err.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();
        let header = HeaderResolver::resolve(&headers)?;
        // Rows behave like maps keyed by header text: a repeated header
        // name resolves to its last column.
        let column = headers
            .iter()
            .rposition(|candidate| *candidate == header)
            .ok_or_else(|| ManifestError::MissingIdentifierColumn {
                seen: headers.clone(),
            })?;
        info!(column = %header, index = column, "located identifier column");

        Ok(Self {
            records: reader.into_records(),
            header,
            column,
        })
    }

    /// The identifier column exactly as written in the CSV.
    pub fn header(&self) -> &str {
        &self.header
    }
}

impl<R: Read> Iterator for IdentifierReader<R> {
    type Item = Result<Identifier, ManifestError>;

    fn next(&mut self) -> Option<Self::Item> {
        for record in self.records.by_ref() {
            let record = match record {
                Ok(record) => record,
                Err(err) => return Some(Err(ManifestError::CsvRead(err.to_string()))),
            };
            if let Some(identifier) = Identifier::from_cell(record.get(self.column).unwrap_or(""))
            {
                return Some(Ok(identifier));
            }
        }
        None
    }
}
