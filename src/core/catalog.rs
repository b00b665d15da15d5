use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use super::error::PlannerError;
use super::types::{Asset, AssetCategory, HistoricalReturns};

pub const CUSTOM_ASSET_DESCRIPTION: &str = "Custom asset";

/// Ordered set of investable assets keyed by unique id.
///
/// The catalog is a plain value: growing it with a custom asset produces a new
/// catalog and leaves the receiver untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetCatalog {
    assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CsvAssetRow {
    id: String,
    name: String,
    #[serde(alias = "type")]
    category: AssetCategory,
    #[serde(default)]
    description: String,
    one_year: f64,
    five_year: f64,
    ten_year: f64,
    twenty_year: f64,
    thirty_year: f64,
}

impl From<CsvAssetRow> for Asset {
    fn from(row: CsvAssetRow) -> Self {
        Asset {
            id: row.id,
            name: row.name,
            category: row.category,
            description: row.description,
            historical_return: HistoricalReturns {
                one_year: row.one_year,
                five_year: row.five_year,
                ten_year: row.ten_year,
                twenty_year: row.twenty_year,
                thirty_year: row.thirty_year,
            },
        }
    }
}

impl AssetCatalog {
    pub fn new(assets: Vec<Asset>) -> Result<Self, PlannerError> {
        for (idx, asset) in assets.iter().enumerate() {
            if assets[..idx].iter().any(|a| a.id == asset.id) {
                return Err(PlannerError::DuplicateAssetId(asset.id.clone()));
            }
        }
        Ok(Self { assets })
    }

    pub fn builtin() -> Self {
        let asset = |id: &str,
                     name: &str,
                     category: AssetCategory,
                     description: &str,
                     returns: [f64; 5]| Asset {
            id: id.to_string(),
            name: name.to_string(),
            category,
            description: description.to_string(),
            historical_return: HistoricalReturns {
                one_year: returns[0],
                five_year: returns[1],
                ten_year: returns[2],
                twenty_year: returns[3],
                thirty_year: returns[4],
            },
        };

        Self {
            assets: vec![
                asset(
                    "sp500",
                    "S&P 500",
                    AssetCategory::International,
                    "Index of 500 leading U.S. publicly traded companies",
                    [0.23, 0.136, 0.113, 0.084, 0.09],
                ),
                asset(
                    "nasdaq",
                    "NASDAQ Composite",
                    AssetCategory::International,
                    "Index of all stocks listed on the Nasdaq stock market",
                    [0.1211, 0.154, 0.1689, 0.165, 0.12],
                ),
                asset(
                    "msci-world",
                    "MSCI World",
                    AssetCategory::International,
                    "Index of global developed market companies",
                    [0.1919, 0.1444, 0.137, 0.09, 0.095],
                ),
                asset(
                    "msci-em",
                    "MSCI Emerging Markets",
                    AssetCategory::International,
                    "Index of emerging market countries",
                    [0.05, 0.065, 0.08, 0.07, 0.09],
                ),
                asset(
                    "ta-35",
                    "TA-35",
                    AssetCategory::Israeli,
                    "Index of 35 largest companies on the Tel Aviv Stock Exchange",
                    [0.22, 0.085, 0.075, 0.065, 0.08],
                ),
                asset(
                    "ta-90",
                    "TA-90",
                    AssetCategory::Israeli,
                    "Index of mid-cap companies on the Tel Aviv Stock Exchange",
                    [0.24, 0.095, 0.085, 0.07, 0.08],
                ),
                asset(
                    "tel-bond-20",
                    "Tel-Bond 20",
                    AssetCategory::Israeli,
                    "Index of 20 corporate bonds on the Tel Aviv Stock Exchange",
                    [0.04, 0.03, 0.035, 0.04, 0.05],
                ),
                asset(
                    "global-bonds",
                    "Global Bonds",
                    AssetCategory::International,
                    "Index of global government and corporate bonds",
                    [0.02, 0.03, 0.035, 0.04, 0.05],
                ),
            ],
        }
    }

    /// Loads a catalog from a `.csv` or `.json` file.
    pub fn from_path(path: &Path) -> Result<Self, PlannerError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        let catalog = match extension.as_deref() {
            Some("csv") => Self::from_csv_reader(File::open(path)?)?,
            Some("json") => Self::from_json_reader(File::open(path)?)?,
            _ => return Err(PlannerError::UnsupportedCatalogFormat(path.to_path_buf())),
        };

        tracing::info!(
            path = %path.display(),
            assets = catalog.len(),
            "loaded asset catalog"
        );
        Ok(catalog)
    }

    pub fn from_csv_reader<R: std::io::Read>(reader: R) -> Result<Self, PlannerError> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut assets = Vec::new();
        for row in reader.deserialize::<CsvAssetRow>() {
            assets.push(Asset::from(row?));
        }
        Self::new(assets)
    }

    pub fn from_json_reader<R: std::io::Read>(reader: R) -> Result<Self, PlannerError> {
        let assets: Vec<Asset> = serde_json::from_reader(reader)?;
        Self::new(assets)
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn by_category(&self, category: AssetCategory) -> impl Iterator<Item = &Asset> {
        self.assets.iter().filter(move |a| a.category == category)
    }

    /// Returns a new catalog with a custom asset appended, plus the new id.
    ///
    /// `return_percent` is an annual percentage (7 means 7%) applied to every
    /// time frame.
    pub fn add_custom_asset(
        &self,
        name: &str,
        return_percent: f64,
    ) -> Result<(AssetCatalog, String), PlannerError> {
        self.add_custom_asset_at(name, return_percent, chrono::Utc::now().timestamp_millis())
    }

    pub(crate) fn add_custom_asset_at(
        &self,
        name: &str,
        return_percent: f64,
        timestamp_millis: i64,
    ) -> Result<(AssetCatalog, String), PlannerError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlannerError::InvalidCustomAsset(
                "name must not be empty".to_string(),
            ));
        }
        if !return_percent.is_finite() || return_percent == 0.0 {
            return Err(PlannerError::InvalidCustomAsset(
                "historical return must be a non-zero number".to_string(),
            ));
        }

        let id = self.unique_custom_id(timestamp_millis);
        let mut assets = self.assets.clone();
        assets.push(Asset {
            id: id.clone(),
            name: name.to_string(),
            category: AssetCategory::Custom,
            description: CUSTOM_ASSET_DESCRIPTION.to_string(),
            historical_return: HistoricalReturns::flat(return_percent / 100.0),
        });

        tracing::debug!(%id, name, return_percent, "added custom asset");
        Ok((AssetCatalog { assets }, id))
    }

    fn unique_custom_id(&self, timestamp_millis: i64) -> String {
        let base = format!("custom-{timestamp_millis}");
        if !self.contains(&base) {
            return base;
        }
        let mut suffix = 2_u32;
        loop {
            let candidate = format!("{base}-{suffix}");
            if !self.contains(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

impl Default for AssetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TimeFrame;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn builtin_catalog_has_unique_ids_and_both_markets() {
        let catalog = AssetCatalog::builtin();
        assert_eq!(catalog.len(), 8);
        assert!(AssetCatalog::new(catalog.assets().to_vec()).is_ok());
        assert_eq!(catalog.by_category(AssetCategory::Israeli).count(), 3);
        assert_eq!(catalog.by_category(AssetCategory::International).count(), 5);
        assert_eq!(catalog.by_category(AssetCategory::Custom).count(), 0);
    }

    #[test]
    fn new_rejects_duplicate_ids() {
        let catalog = AssetCatalog::builtin();
        let mut assets = catalog.assets().to_vec();
        assets.push(assets[0].clone());

        let err = AssetCatalog::new(assets).expect_err("must reject duplicate id");
        assert!(matches!(err, PlannerError::DuplicateAssetId(id) if id == "sp500"));
    }

    #[test]
    fn add_custom_asset_returns_new_catalog_and_leaves_original_untouched() {
        let catalog = AssetCatalog::builtin();
        let (next, id) = catalog
            .add_custom_asset_at("Rental property", 6.5, 1_700_000_000_000)
            .expect("valid custom asset");

        assert_eq!(id, "custom-1700000000000");
        assert_eq!(catalog.len(), 8);
        assert!(!catalog.contains(&id));
        assert_eq!(next.len(), 9);

        let asset = next.get(&id).expect("new asset is present");
        assert_eq!(asset.category, AssetCategory::Custom);
        assert_eq!(asset.description, CUSTOM_ASSET_DESCRIPTION);
        for time_frame in TimeFrame::ALL {
            assert_approx(asset.historical_return.get(time_frame), 0.065);
        }
    }

    #[test]
    fn add_custom_asset_suffixes_colliding_timestamp_ids() {
        let catalog = AssetCatalog::builtin();
        let (first, first_id) = catalog.add_custom_asset_at("A", 5.0, 42).expect("valid");
        let (second, second_id) = first.add_custom_asset_at("B", 5.0, 42).expect("valid");
        let (third, third_id) = second.add_custom_asset_at("C", 5.0, 42).expect("valid");

        assert_eq!(first_id, "custom-42");
        assert_eq!(second_id, "custom-42-2");
        assert_eq!(third_id, "custom-42-3");
        assert!(AssetCatalog::new(third.assets().to_vec()).is_ok());
    }

    #[test]
    fn add_custom_asset_rejects_empty_name_and_zero_return() {
        let catalog = AssetCatalog::builtin();
        assert!(matches!(
            catalog.add_custom_asset("  ", 5.0),
            Err(PlannerError::InvalidCustomAsset(_))
        ));
        assert!(matches!(
            catalog.add_custom_asset("Gold", 0.0),
            Err(PlannerError::InvalidCustomAsset(_))
        ));
    }

    #[test]
    fn from_csv_reader_parses_rows() {
        let csv = "\
id,name,category,description,oneYear,fiveYear,tenYear,twentyYear,thirtyYear
sp500,S&P 500,international,Large caps,0.15,0.11,0.12,0.09,0.10
bonds,Global Bonds,international,,0.03,0.03,0.04,0.04,0.05
";
        let catalog = AssetCatalog::from_csv_reader(csv.as_bytes()).expect("csv should parse");
        assert_eq!(catalog.len(), 2);

        let bonds = catalog.get("bonds").expect("bonds present");
        assert_eq!(bonds.name, "Global Bonds");
        assert_eq!(bonds.description, "");
        assert_approx(bonds.historical_return.get(TimeFrame::ThirtyYear), 0.05);
        assert_approx(
            catalog.get("sp500").expect("sp500").historical_return.get(TimeFrame::FiveYear),
            0.11,
        );
    }

    #[test]
    fn from_json_reader_accepts_type_alias() {
        let json = r#"[
          {
            "id": "ta-35",
            "name": "TA-35",
            "type": "israeli",
            "description": "Tel Aviv large caps",
            "historicalReturn": {
              "oneYear": 0.22, "fiveYear": 0.085, "tenYear": 0.075,
              "twentyYear": 0.065, "thirtyYear": 0.08
            }
          }
        ]"#;
        let catalog = AssetCatalog::from_json_reader(json.as_bytes()).expect("json should parse");
        let asset = catalog.get("ta-35").expect("asset present");
        assert_eq!(asset.category, AssetCategory::Israeli);
        assert_approx(asset.historical_return.get(TimeFrame::TenYear), 0.075);
    }

    #[test]
    fn from_path_rejects_unknown_extension() {
        let err = AssetCatalog::from_path(Path::new("assets.yaml"))
            .expect_err("yaml is not supported");
        assert!(matches!(err, PlannerError::UnsupportedCatalogFormat(_)));
    }
}
