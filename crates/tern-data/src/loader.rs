//! Reads columnar files into datasets.

use std::path::Path;

use datafusion::common::Result;
use datafusion::dataframe::DataFrame;
use datafusion::prelude::{CsvReadOptions, NdJsonReadOptions, ParquetReadOptions};
use log::info;
use tern_common::config::{DataConfig, DataFormat};

use crate::dataset::Dataset;
use crate::error::{DataError, DataResult};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub format: DataFormat,
    pub csv_has_header: bool,
    pub csv_delimiter: char,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            format: DataFormat::Parquet,
            csv_has_header: true,
            csv_delimiter: ',',
        }
    }
}

impl LoadOptions {
    pub fn with_format(mut self, format: DataFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_csv_header(mut self, has_header: bool) -> Self {
        self.csv_has_header = has_header;
        self
    }

    pub fn with_csv_delimiter(mut self, delimiter: char) -> Self {
        self.csv_delimiter = delimiter;
        self
    }
}

impl From<&DataConfig> for LoadOptions {
    fn from(config: &DataConfig) -> Self {
        Self {
            format: config.format,
            csv_has_header: config.csv_has_header,
            csv_delimiter: config.csv_delimiter,
        }
    }
}

/// Scans the file (or directory of files) at `path` into a dataset.
///
/// The schema is taken from the file metadata for Parquet and inferred
/// from the content for CSV and JSON.
pub async fn load_dataset(
    session: &Session,
    path: &str,
    options: &LoadOptions,
) -> DataResult<Dataset> {
    let location = Path::new(path);
    if !location.exists() {
        return Err(DataError::io(format!("path does not exist: {path}")));
    }
    // A single file is read regardless of its extension.
    let extension = if location.is_file() {
        location
            .extension()
            .map(|x| format!(".{}", x.to_string_lossy()))
            .unwrap_or_default()
    } else {
        default_extension(options.format).to_string()
    };
    if !options.csv_delimiter.is_ascii() {
        return Err(DataError::invalid(format!(
            "CSV delimiter must be an ASCII character: {}",
            options.csv_delimiter
        )));
    }
    let delimiter = options.csv_delimiter as u8;
    let frame = read_frame(session, path, &extension, delimiter, options)
        .await
        .map_err(|e| DataError::io(format!("failed to read {path}: {e}")))?;
    let schema = frame.schema().inner().clone();
    let batches = frame
        .collect()
        .await
        .map_err(|e| DataError::io(format!("failed to read {path}: {e}")))?;
    let dataset = Dataset::try_from_batches(schema, &batches)?;
    info!(
        "loaded {} rows with columns {:?} from {path}",
        dataset.num_rows(),
        dataset.column_names()
    );
    Ok(dataset)
}

fn default_extension(format: DataFormat) -> &'static str {
    match format {
        DataFormat::Parquet => ".parquet",
        DataFormat::Csv => ".csv",
        DataFormat::Json => ".json",
    }
}

async fn read_frame(
    session: &Session,
    path: &str,
    extension: &str,
    delimiter: u8,
    options: &LoadOptions,
) -> Result<DataFrame> {
    let context = session.context();
    let frame = match options.format {
        DataFormat::Parquet => {
            let options = ParquetReadOptions {
                file_extension: extension,
                ..Default::default()
            };
            context.read_parquet(path, options).await?
        }
        DataFormat::Csv => {
            let options = CsvReadOptions::new()
                .has_header(options.csv_has_header)
                .delimiter(delimiter)
                .file_extension(extension);
            context.read_csv(path, options).await?
        }
        DataFormat::Json => {
            let options = NdJsonReadOptions::default().file_extension(extension);
            context.read_json(path, options).await?
        }
    };
    Ok(frame)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use datafusion::arrow::datatypes::DataType;

    use super::*;

    #[tokio::test]
    async fn test_load_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.csv");
        fs::write(&path, "bedrooms,price\n1.0,100\n2.0,150\n3.0,250\n").unwrap();

        let session = Session::default();
        let options = LoadOptions::default().with_format(DataFormat::Csv);
        let data = load_dataset(&session, path.to_str().unwrap(), &options)
            .await
            .unwrap();
        assert_eq!(data.num_rows(), 3);
        assert_eq!(data.column_names(), vec!["bedrooms", "price"]);
        assert_eq!(data.field("bedrooms").unwrap().data_type(), &DataType::Float64);
        assert_eq!(data.field("price").unwrap().data_type(), &DataType::Int64);
    }

    #[tokio::test]
    async fn test_load_csv_with_delimiter_and_other_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.tsv");
        fs::write(&path, "bedrooms\tprice\n1\t100\n2\t150\n").unwrap();

        let session = Session::default();
        let options = LoadOptions::default()
            .with_format(DataFormat::Csv)
            .with_csv_delimiter('\t');
        let data = load_dataset(&session, path.to_str().unwrap(), &options)
            .await
            .unwrap();
        assert_eq!(data.num_rows(), 2);
        assert_eq!(data.column_names(), vec!["bedrooms", "price"]);
    }

    #[tokio::test]
    async fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.json");
        fs::write(
            &path,
            "{\"bedrooms\": 1, \"price\": 100.0}\n{\"bedrooms\": 2, \"price\": 150.0}\n",
        )
        .unwrap();

        let session = Session::default();
        let options = LoadOptions::default().with_format(DataFormat::Json);
        let data = load_dataset(&session, path.to_str().unwrap(), &options)
            .await
            .unwrap();
        assert_eq!(data.num_rows(), 2);
        assert!(data.column("price").is_some());
    }

    #[tokio::test]
    async fn test_missing_path() {
        let session = Session::default();
        let result =
            load_dataset(&session, "/nonexistent/listings.parquet", &LoadOptions::default()).await;
        assert!(matches!(result, Err(DataError::IoError(_))));
    }

    #[tokio::test]
    async fn test_malformed_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.parquet");
        fs::write(&path, "this is not a parquet file").unwrap();

        let session = Session::default();
        let result = load_dataset(&session, path.to_str().unwrap(), &LoadOptions::default()).await;
        assert!(matches!(result, Err(DataError::IoError(_))));
    }

    #[tokio::test]
    async fn test_non_ascii_delimiter() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listings.csv");
        fs::write(&path, "bedrooms\u{e9}price\n1\u{e9}100\n").unwrap();

        let session = Session::default();
        // U+00E9 fits in a byte as a code point but is two bytes in UTF-8.
        for delimiter in ['\u{e9}', '→'] {
            let options = LoadOptions::default()
                .with_format(DataFormat::Csv)
                .with_csv_delimiter(delimiter);
            let result = load_dataset(&session, path.to_str().unwrap(), &options).await;
            assert!(matches!(result, Err(DataError::InvalidArgument(_))));
        }
    }
}
