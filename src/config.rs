use crate::api::RecordType;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// Custom title for the header (defaults to the service host if not set)
  pub title: Option<String>,
  #[serde(default)]
  pub categories: CategoriesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the finance service, e.g. http://localhost:5000
  pub base_url: String,
}

/// Category pick lists for the record form. Defaults match the reference
/// service; override either list in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoriesConfig {
  #[serde(default = "default_income_categories")]
  pub income: Vec<String>,
  #[serde(default = "default_expense_categories")]
  pub expense: Vec<String>,
}

impl CategoriesConfig {
  pub fn for_type(&self, record_type: RecordType) -> &[String] {
    match record_type {
      RecordType::Income => &self.income,
      RecordType::Expense => &self.expense,
    }
  }
}

impl Default for CategoriesConfig {
  fn default() -> Self {
    CategoriesConfig {
      income: default_income_categories(),
      expense: default_expense_categories(),
    }
  }
}

fn default_income_categories() -> Vec<String> {
  RecordType::Income
    .default_categories()
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_expense_categories() -> Vec<String> {
  RecordType::Expense
    .default_categories()
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./tally.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/tally/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/tally/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("tally.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("tally").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_gets_default_categories() {
    let config: Config =
      serde_yaml::from_str("api:\n  base_url: http://localhost:5000\n").unwrap();

    assert_eq!(config.api.base_url, "http://localhost:5000");
    assert_eq!(config.title, None);
    assert_eq!(config.categories.income.len(), 3);
    assert_eq!(config.categories.expense.len(), 11);
    assert!(config.categories.income.contains(&"Salary".to_string()));
    assert!(config.categories.expense.contains(&"Groceries".to_string()));
  }

  #[test]
  fn test_category_overrides_replace_one_list() {
    let yaml = "\
api:
  base_url: http://localhost:5000
categories:
  income:
    - Wages
    - Tips
";
    let config: Config = serde_yaml::from_str(yaml).unwrap();

    assert_eq!(config.categories.income, vec!["Wages", "Tips"]);
    // The untouched list keeps its defaults
    assert_eq!(config.categories.expense.len(), 11);
  }

  #[test]
  fn test_for_type_picks_matching_list() {
    let categories = CategoriesConfig::default();
    assert_eq!(categories.for_type(RecordType::Income).len(), 3);
    assert_eq!(categories.for_type(RecordType::Expense).len(), 11);
  }

  #[test]
  fn test_explicit_missing_path_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.yaml");
    assert!(Config::load(Some(&missing)).is_err());
  }

  #[test]
  fn test_load_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tally.yaml");
    std::fs::write(&path, "api:\n  base_url: https://money.example.com\n").unwrap();

    let config = Config::load(Some(&path)).unwrap();
    assert_eq!(config.api.base_url, "https://money.example.com");
  }
}
