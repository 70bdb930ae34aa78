use serde::Serialize;

/// A CSV file as read from disk: header names plus string cells.
/// Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct Neighborhood {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MeiStatus {
    Mei,
    NonMei,
    Unknown,
}

impl MeiStatus {
    pub fn from_flag(flag: &str) -> Self {
        match flag {
            "S" => MeiStatus::Mei,
            "N" => MeiStatus::NonMei,
            _ => MeiStatus::Unknown,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Business {
    pub trade_name: String,
    pub neighborhood: String,
    pub cnae_code: String,
    pub cnae_description: String,
    pub mei: MeiStatus,
}

#[derive(Debug, Clone)]
pub struct BusStop {
    pub line_code: String,
    pub line_name: String,
    pub origin: String,
}

/// Typed records kept alongside the table they were read from.
/// `records[i]` is extracted from `table.rows[i]`.
#[derive(Debug, Clone)]
pub struct Registry<T> {
    pub table: RawTable,
    pub records: Vec<T>,
}

impl<T> Registry<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Datasets {
    pub neighborhoods: Registry<Neighborhood>,
    pub businesses: Registry<Business>,
    pub bus_stops: Registry<BusStop>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mei_flag_parsing() {
        assert_eq!(MeiStatus::from_flag("S"), MeiStatus::Mei);
        assert_eq!(MeiStatus::from_flag("N"), MeiStatus::NonMei);
        assert_eq!(MeiStatus::from_flag(" N "), MeiStatus::Unknown);
        assert_eq!(MeiStatus::from_flag(""), MeiStatus::Unknown);
        assert_eq!(MeiStatus::from_flag("s"), MeiStatus::Unknown);
    }
}
