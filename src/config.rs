use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{CompoundQuery, Delimiter, SortDirection};
use crate::error::ReportError;

/// Batch config for running several compounds with shared report settings,
/// read from `chembl-report.json` when no compound argument is given.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub compounds: Vec<CompoundEntry>,
    #[serde(default)]
    pub activity_filter: Vec<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub order: Option<SortDirection>,
    #[serde(default)]
    pub delimiter: Option<Delimiter>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CompoundEntry {
    Shorthand(String),
    Detailed(CompoundEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CompoundEntryObject {
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub compounds: Vec<CompoundQuery>,
    pub activity_filter: Vec<String>,
    pub sort_by: String,
    pub order: SortDirection,
    pub delimiter: Delimiter,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, ReportError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("chembl-report.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Err(ReportError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ReportError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| ReportError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, ReportError> {
        let compounds = config
            .compounds
            .into_iter()
            .map(|entry| match entry {
                CompoundEntry::Shorthand(name) => name.parse(),
                CompoundEntry::Detailed(obj) => obj.name.parse(),
            })
            .collect::<Result<Vec<_>, ReportError>>()?;

        Ok(ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            compounds,
            activity_filter: config.activity_filter,
            sort_by: config.sort_by.unwrap_or_else(|| "Target".to_string()),
            order: config.order.unwrap_or(SortDirection::Asc),
            delimiter: config.delimiter.unwrap_or(Delimiter::Comma),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_config_shorthand() {
        let config = Config {
            schema_version: None,
            compounds: vec![
                CompoundEntry::Shorthand("scopolamine".to_string()),
                CompoundEntry::Detailed(CompoundEntryObject {
                    name: "caffeine".to_string(),
                }),
            ],
            activity_filter: vec!["IC50".to_string()],
            sort_by: None,
            order: None,
            delimiter: None,
        };

        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.compounds.len(), 2);
        assert_eq!(resolved.compounds[1].as_str(), "caffeine");
        assert_eq!(resolved.sort_by, "Target");
        assert_eq!(resolved.delimiter, Delimiter::Comma);
    }

    #[test]
    fn resolve_config_rejects_blank_compound() {
        let config = Config {
            schema_version: None,
            compounds: vec![CompoundEntry::Shorthand("  ".to_string())],
            activity_filter: Vec::new(),
            sort_by: None,
            order: None,
            delimiter: None,
        };

        assert!(ConfigLoader::resolve_config(config).is_err());
    }
}
