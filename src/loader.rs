//! Loader
//!
//! Reads headered CSV files into typed rows, driven by a [`DataConfig`] that
//! names the columns to keep, their kind and their position in the row.
use crate::constants::{TARGET_COLUMN, TEST_FILE, TRAIN_FILE};
use crate::data::Row;
use crate::errors::ArborError;
use crate::param::JsonIO;
use crate::value::{Value, ValueKind};
use csv::{ReaderBuilder, Trim};
use hashbrown::HashSet;
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A column kept from the CSV file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Header of the column in the CSV file.
    pub name: String,
    /// `value` columns are read as measurements, `class` columns as category ids.
    pub kind: ValueKind,
    /// Position of the column in the loaded row, `0` is the target.
    pub position: usize,
}

impl ColumnSpec {
    pub fn new(name: &str, kind: ValueKind, position: usize) -> Self {
        ColumnSpec {
            name: name.to_string(),
            kind,
            position,
        }
    }
}

/// Columns to load from a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataConfig {
    pub columns: Vec<ColumnSpec>,
}

impl DataConfig {
    pub fn new(columns: Vec<ColumnSpec>) -> Result<Self, ArborError> {
        let config = DataConfig { columns };
        config.validate()?;
        Ok(config)
    }

    /// Columns of the house price dataset, with the sale price as target.
    pub fn house_price() -> Self {
        DataConfig {
            columns: vec![
                ColumnSpec::new("SalePrice", ValueKind::Measurement, 0),
                ColumnSpec::new("YearBuilt", ValueKind::Measurement, 1),
                ColumnSpec::new("YearRemodAdd", ValueKind::Measurement, 2),
                ColumnSpec::new("Neighborhood", ValueKind::Measurement, 3),
                ColumnSpec::new("LotArea", ValueKind::Measurement, 4),
                ColumnSpec::new("LotShape", ValueKind::Category, 5),
                ColumnSpec::new("LotConfig", ValueKind::Category, 6),
                ColumnSpec::new("HouseStyle", ValueKind::Category, 7),
                ColumnSpec::new("GarageArea", ValueKind::Measurement, 8),
            ],
        }
    }

    /// Names must be unique and positions must cover `0..n` exactly once.
    pub fn validate(&self) -> Result<(), ArborError> {
        if self.columns.is_empty() {
            return Err(ArborError::InvalidParameter(
                "columns".to_string(),
                "at least the target column".to_string(),
                "no columns".to_string(),
            ));
        }
        let mut names = HashSet::with_capacity(self.columns.len());
        let mut seen = vec![false; self.columns.len()];
        for spec in &self.columns {
            if !names.insert(spec.name.as_str()) {
                return Err(ArborError::InvalidParameter(
                    "columns".to_string(),
                    "unique column names".to_string(),
                    format!("{} more than once", spec.name),
                ));
            }
            match seen.get_mut(spec.position) {
                Some(s) if !*s => *s = true,
                _ => {
                    return Err(ArborError::InvalidParameter(
                        "position".to_string(),
                        format!("distinct positions below {}", self.columns.len()),
                        format!("{} for column {}", spec.position, spec.name),
                    ))
                }
            }
        }
        Ok(())
    }

    /// Kind of the target column.
    pub fn target_kind(&self) -> Result<ValueKind, ArborError> {
        self.columns
            .iter()
            .find(|c| c.position == TARGET_COLUMN)
            .map(|c| c.kind)
            .ok_or_else(|| {
                ArborError::InvalidParameter(
                    "position".to_string(),
                    "a target column at position 0".to_string(),
                    "none".to_string(),
                )
            })
    }
}

impl JsonIO for DataConfig {
    fn from_json(json_str: &str) -> Result<Self, ArborError> {
        let config = serde_json::from_str::<Self>(json_str).map_err(|e| ArborError::UnableToRead(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

fn parse_cell(cell: &str, spec: &ColumnSpec, record: usize) -> Result<Value, ArborError> {
    let parsed = match spec.kind {
        ValueKind::Measurement => cell.parse::<f64>().map(Value::from).ok(),
        ValueKind::Category => cell.parse::<i64>().map(Value::from).ok(),
    };
    parsed.ok_or_else(|| {
        ArborError::Csv(format!(
            "unable to parse {:?} in column {} of record {} as a {}",
            cell, spec.name, record, spec.kind
        ))
    })
}

/// Read rows from CSV data with a header line.
///
/// Columns the configuration does not name are ignored.
///
/// * `reader` - Source of the CSV data.
/// * `config` - Columns to keep.
pub fn load_rows<R: Read>(reader: R, config: &DataConfig) -> Result<Vec<Row>, ArborError> {
    config.validate()?;
    let mut rdr = ReaderBuilder::new().has_headers(true).trim(Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    // (csv column, spec) in row order.
    let mut layout = config
        .columns
        .iter()
        .map(|spec| {
            headers
                .iter()
                .position(|h| h == spec.name)
                .map(|col| (col, spec))
                .ok_or_else(|| ArborError::Csv(format!("column {} is missing from the header", spec.name)))
        })
        .collect::<Result<Vec<(usize, &ColumnSpec)>, ArborError>>()?;
    layout.sort_by_key(|(_, spec)| spec.position);

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let row = layout
            .iter()
            .map(|(col, spec)| {
                let cell = record.get(*col).ok_or_else(|| {
                    ArborError::Csv(format!("record {} has no value for column {}", i + 1, spec.name))
                })?;
                parse_cell(cell, spec, i + 1)
            })
            .collect::<Result<Row, ArborError>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Read rows from a CSV file.
pub fn load_csv<P: AsRef<Path>>(path: P, config: &DataConfig) -> Result<Vec<Row>, ArborError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ArborError::UnableToRead(format!("{}: {}", path.display(), e)))?;
    let rows = load_rows(file, config)?;
    info!("Read {} rows from {}.", rows.len(), path.display());
    Ok(rows)
}

/// Read the training and test sets, `train.csv` and `test.csv`, from a directory.
pub fn load_train_test<P: AsRef<Path>>(dir: P, config: &DataConfig) -> Result<(Vec<Row>, Vec<Row>), ArborError> {
    let dir = dir.as_ref();
    let train = load_csv(dir.join(TRAIN_FILE), config)?;
    let test = load_csv(dir.join(TEST_FILE), config)?;
    info!("Loaded train {}, test {}.", train.len(), test.len());
    Ok((train, test))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn small_config() -> DataConfig {
        DataConfig::new(vec![
            ColumnSpec::new("price", ValueKind::Measurement, 0),
            ColumnSpec::new("style", ValueKind::Category, 2),
            ColumnSpec::new("area", ValueKind::Measurement, 1),
        ])
        .unwrap()
    }

    #[test]
    fn test_load_rows() {
        let data = "id, area ,style,price\n1, 80.5, 2, 100000\n2,120,1 ,150000.5\n";
        let rows = load_rows(data.as_bytes(), &small_config()).unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Value::Measurement(100000.0), Value::Measurement(80.5), Value::Category(2)],
                vec![Value::Measurement(150000.5), Value::Measurement(120.0), Value::Category(1)],
            ]
        );
    }

    #[test]
    fn test_load_rows_errors() {
        let missing = "id,area,price\n1,80.5,100000\n";
        assert!(matches!(load_rows(missing.as_bytes(), &small_config()), Err(ArborError::Csv(_))));
        let unparsable = "area,style,price\n80.5,2.5,100000\n";
        assert!(matches!(
            load_rows(unparsable.as_bytes(), &small_config()),
            Err(ArborError::Csv(_))
        ));
        let ragged = "area,style,price\n80.5,2\n";
        assert!(matches!(load_rows(ragged.as_bytes(), &small_config()), Err(ArborError::Csv(_))));
    }

    #[test]
    fn test_data_config_validate() {
        assert!(DataConfig::house_price().validate().is_ok());
        assert_eq!(DataConfig::house_price().target_kind().unwrap(), ValueKind::Measurement);
        assert!(DataConfig::new(vec![]).is_err());
        assert!(DataConfig::new(vec![
            ColumnSpec::new("a", ValueKind::Measurement, 0),
            ColumnSpec::new("b", ValueKind::Measurement, 2),
        ])
        .is_err());
        assert!(DataConfig::new(vec![
            ColumnSpec::new("a", ValueKind::Measurement, 0),
            ColumnSpec::new("a", ValueKind::Category, 1),
        ])
        .is_err());
    }

    #[test]
    fn test_data_config_json() {
        let json = r#"{"columns": [
            {"name": "label", "kind": "class", "position": 0},
            {"name": "x", "kind": "value", "position": 1}
        ]}"#;
        let config = DataConfig::from_json(json).unwrap();
        assert_eq!(config.columns[0].kind, ValueKind::Category);
        assert_eq!(config.columns[1].kind, ValueKind::Measurement);
        assert_eq!(DataConfig::from_json(&config.json_dump().unwrap()).unwrap(), config);

        let bad = r#"{"columns": [{"name": "x", "kind": "value", "position": 3}]}"#;
        assert!(DataConfig::from_json(bad).is_err());
    }

    #[test]
    fn test_load_train_test() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("train.csv"), "price,area,style\n1.0,2.0,3\n4.0,5.0,6\n").unwrap();
        fs::write(dir.path().join("test.csv"), "price,area,style\n7.0,8.0,9\n").unwrap();
        let (train, test) = load_train_test(dir.path(), &small_config()).unwrap();
        assert_eq!(train.len(), 2);
        assert_eq!(test, vec![vec![Value::Measurement(7.0), Value::Measurement(8.0), Value::Category(9)]]);

        let empty = tempdir().unwrap();
        assert!(matches!(
            load_train_test(empty.path(), &small_config()),
            Err(ArborError::UnableToRead(_))
        ));
    }
}
