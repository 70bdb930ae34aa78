use crate::config::{AppConfig, ColumnConfig};
use crate::types::{Business, BusStop, Datasets, MeiStatus, Neighborhood, RawTable, Registry};
use anyhow::{Context, Result, anyhow};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::info;

pub fn load_datasets(config: &AppConfig) -> Result<Datasets> {
    info!("Loading datasets...");
    let input = &config.input;
    let columns = &input.columns;

    let neighborhoods = load_table(&input.neighborhoods_csv, input.neighborhoods_delimiter)
        .and_then(|table| extract_neighborhoods(table, columns))
        .with_context(|| format!("Failed to load neighborhoods from {:?}", input.neighborhoods_csv))?;
    info!("Loaded {} neighborhoods", neighborhoods.len());

    let businesses = load_table(&input.businesses_csv, input.businesses_delimiter)
        .and_then(|table| extract_businesses(table, columns))
        .with_context(|| format!("Failed to load businesses from {:?}", input.businesses_csv))?;
    info!("Loaded {} businesses", businesses.len());

    let bus_stops = load_table(&input.bus_stops_csv, input.bus_stops_delimiter)
        .and_then(|table| extract_bus_stops(table, columns))
        .with_context(|| format!("Failed to load bus stops from {:?}", input.bus_stops_csv))?;
    info!("Loaded {} bus stops", bus_stops.len());

    Ok(Datasets {
        neighborhoods,
        businesses,
        bus_stops,
    })
}

pub fn load_table(path: &Path, delimiter: char) -> Result<RawTable> {
    let delimiter = u8::try_from(delimiter)
        .map_err(|_| anyhow!("Delimiter {:?} is not a single-byte character", delimiter))?;
    let file = File::open(path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path))?;
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(file);

    let mut headers: Vec<String> = rdr.byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).into_owned())
        .collect();
    if let Some(first) = headers.first_mut() {
        if let Some(stripped) = first.strip_prefix('\u{feff}') {
            *first = stripped.to_string();
        }
    }
    if headers.is_empty() {
        return Err(anyhow!("CSV file {:?} has no header row", path));
    }

    let mut rows = Vec::new();
    for result in rdr.byte_records() {
        let record = result?;
        let mut row: Vec<String> = record.iter()
            .take(headers.len())
            .map(|cell| String::from_utf8_lossy(cell).into_owned())
            .collect();
        row.resize(headers.len(), String::new());
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers.iter().position(|h| h == name)
            .ok_or_else(|| anyhow!("Column '{}' not found", name))
    }

    pub fn head(&self, n: usize) -> &[Vec<String>] {
        &self.rows[..n.min(self.rows.len())]
    }
}

fn extract_neighborhoods(table: RawTable, columns: &ColumnConfig) -> Result<Registry<Neighborhood>> {
    let name = table.column_index(&columns.neighborhood_name)?;
    let code = table.column_index(&columns.neighborhood_code)?;

    let records = table.rows.iter()
        .map(|row| Neighborhood {
            name: row[name].clone(),
            code: row[code].clone(),
        })
        .collect();

    Ok(Registry { table, records })
}

fn extract_businesses(table: RawTable, columns: &ColumnConfig) -> Result<Registry<Business>> {
    let trade_name = table.column_index(&columns.business_trade_name)?;
    let neighborhood = table.column_index(&columns.business_neighborhood)?;
    let description = table.column_index(&columns.business_cnae_description)?;
    let mei = table.column_index(&columns.business_mei)?;
    // Some exports only carry the description.
    let code = table.column_index(&columns.business_cnae_code).ok();

    let records = table.rows.iter()
        .map(|row| Business {
            trade_name: row[trade_name].clone(),
            neighborhood: row[neighborhood].clone(),
            cnae_code: code.map(|idx| row[idx].clone()).unwrap_or_default(),
            cnae_description: row[description].clone(),
            mei: MeiStatus::from_flag(&row[mei]),
        })
        .collect();

    Ok(Registry { table, records })
}

fn extract_bus_stops(table: RawTable, columns: &ColumnConfig) -> Result<Registry<BusStop>> {
    let line_code = table.column_index(&columns.stop_line_code)?;
    let line_name = table.column_index(&columns.stop_line_name)?;
    let origin = table.column_index(&columns.stop_origin)?;

    let records = table.rows.iter()
        .map(|row| BusStop {
            line_code: row[line_code].clone(),
            line_name: row[line_name].clone(),
            origin: row[origin].clone(),
        })
        .collect();

    Ok(Registry { table, records })
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use std::fs;

    #[test]
    fn loads_all_three_registries() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_fixture_config(dir.path());

        let data = load_datasets(&config).unwrap();
        assert_eq!(data.neighborhoods.len(), 3);
        assert_eq!(data.neighborhoods.records[0].name, "Centro");
        assert_eq!(data.neighborhoods.table.headers[0], "ID");
        assert_eq!(data.businesses.len(), 6);
        assert_eq!(data.businesses.records[0].mei, MeiStatus::Mei);
        assert_eq!(data.businesses.records[5].mei, MeiStatus::Unknown);
        assert_eq!(data.businesses.records[3].cnae_code, "1091102");
        assert_eq!(data.bus_stops.len(), 4);
        assert_eq!(data.bus_stops.records[3].origin, "SUPLEMENTAR");
    }

    #[test]
    fn short_rows_are_padded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.csv");
        fs::write(&path, "A;B;C\n1;2\n4;5;6;7\n").unwrap();

        let table = load_table(&path, ';').unwrap();
        assert_eq!(table.rows[0], vec!["1", "2", ""]);
        assert_eq!(table.rows[1], vec!["4", "5", "6"]);
        assert_eq!(table.head(1).len(), 1);
        assert_eq!(table.head(10).len(), 2);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_fixture_config(dir.path());
        config.input.bus_stops_csv = dir.path().join("nope.csv");

        let err = load_datasets(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("bus stops"));
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_fixture_config(dir.path());
        config.input.columns.business_mei = "MEI_FLAG".to_string();

        let err = load_datasets(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("MEI_FLAG"));
    }

    #[test]
    fn optional_cnae_code_column() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_fixture_config(dir.path());
        config.input.columns.business_cnae_code = "ABSENT".to_string();

        let data = load_datasets(&config).unwrap();
        assert!(data.businesses.records.iter().all(|b| b.cnae_code.is_empty()));
    }
}
