use radius_pair::{
    ArenaConfig, AttrDef, Dictionary, DictionaryService, PairError, Value, ValidationMode, ValueType,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error("Pair error: {0}")]
    Pair(#[from] PairError),
}

/// Dictionary attribute definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeDef {
    /// Attribute name, unique among its siblings
    pub name: String,
    /// Attribute number within its parent
    pub number: u32,
    /// Data type, for example "uint32", "string" or "group"
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Dotted name of the parent attribute (must be structural)
    #[serde(default)]
    pub parent: Option<String>,
    /// Vendor number (0 for standard attributes)
    #[serde(default)]
    pub vendor: u32,
    /// Named values, name -> value text
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl AttributeDef {
    /// Dotted name this attribute is registered under
    pub fn full_name(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{}.{}", parent, self.name),
            None => self.name.clone(),
        }
    }
}

/// Tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level: "trace", "debug", "info", "warn", "error" (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Fail validation when a filter attribute is missing (default: true)
    /// Set to false to skip missing attributes instead.
    #[serde(default = "default_strict_validation")]
    pub strict_validation: bool,

    /// Pair arena limits
    #[serde(default)]
    pub arena: ArenaConfig,

    /// Dictionary attributes, parents before children
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_strict_validation() -> bool {
    true
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_log_level(),
            strict_validation: default_strict_validation(),
            arena: ArenaConfig::default(),
            attributes: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Validation mode selected by `strict_validation`
    pub fn validation_mode(&self) -> ValidationMode {
        if self.strict_validation {
            ValidationMode::Strict
        } else {
            ValidationMode::Relaxed
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid log level: {}",
                self.log_level
            )));
        }

        if self.arena.max_pairs == Some(0) {
            return Err(ConfigError::Invalid(
                "arena.max_pairs cannot be 0".to_string(),
            ));
        }

        for attr in &self.attributes {
            if attr.name.is_empty() {
                return Err(ConfigError::Invalid(
                    "Attribute has empty name".to_string(),
                ));
            }
            if attr.name.contains('.') {
                return Err(ConfigError::Invalid(format!(
                    "Attribute name {} cannot contain '.', use \"parent\" instead",
                    attr.name
                )));
            }
        }

        // Catches unknown parents, duplicates and bad enum values
        self.build_dictionary()?;
        Ok(())
    }

    /// Build the attribute dictionary
    ///
    /// Attributes are defined in file order, so a parent must be listed
    /// before its children.
    pub fn build_dictionary(&self) -> Result<Dictionary, ConfigError> {
        let mut dict = Dictionary::new();
        for attr in &self.attributes {
            let parent = match &attr.parent {
                Some(name) => Some(dict.attr_by_name(name).ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "Attribute {} has unknown parent {}",
                        attr.name, name
                    ))
                })?),
                None => None,
            };

            let mut def = AttrDef::new(attr.name.as_str(), attr.number, attr.value_type)
                .with_vendor(attr.vendor);
            for (name, text) in &attr.values {
                let value = Value::parse(attr.value_type, text, None).map_err(|e| {
                    ConfigError::Invalid(format!(
                        "Value {} of {}: {}",
                        name,
                        attr.full_name(),
                        e
                    ))
                })?;
                def = def.with_value(name.as_str(), value);
            }

            dict.define(def, parent.as_ref())?;
        }
        Ok(dict)
    }

    /// Create an example configuration file
    pub fn example() -> Self {
        let attr = |name: &str, number: u32, value_type: ValueType| AttributeDef {
            name: name.to_string(),
            number,
            value_type,
            parent: None,
            vendor: 0,
            values: BTreeMap::new(),
        };

        let mut service_type = attr("Service-Type", 6, ValueType::Uint32);
        service_type
            .values
            .insert("Login-User".to_string(), "1".to_string());
        service_type
            .values
            .insert("Framed-User".to_string(), "2".to_string());

        let mut vlan = attr("Vlan-Id", 1, ValueType::Uint16);
        vlan.parent = Some("Tunnel".to_string());
        let mut medium = attr("Medium", 2, ValueType::String);
        medium.parent = Some("Tunnel".to_string());

        Config {
            log_level: "info".to_string(),
            strict_validation: true,
            arena: ArenaConfig {
                max_pairs: Some(10000),
                ..ArenaConfig::default()
            },
            attributes: vec![
                attr("User-Name", 1, ValueType::String),
                attr("NAS-IP-Address", 4, ValueType::Ipv4Addr),
                attr("NAS-Port", 5, ValueType::Uint32),
                service_type,
                attr("Framed-IP-Address", 8, ValueType::Ipv4Addr),
                attr("Class", 25, ValueType::Octets),
                attr("Session-Timeout", 27, ValueType::Uint32),
                attr("Tunnel", 241, ValueType::Group),
                vlan,
                medium,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, "info");
        assert!(config.strict_validation);
        assert!(config.attributes.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_config_is_valid() {
        let config = Config::example();
        assert!(config.validate().is_ok());

        let dict = config.build_dictionary().unwrap();
        assert_eq!(dict.len(), config.attributes.len());
        let vlan = dict.attr_by_name("Tunnel.Vlan-Id").unwrap();
        assert_eq!(vlan.parent().map(|p| p.name()), Some("Tunnel"));
        let service = dict.attr_by_name("Service-Type").unwrap();
        assert_eq!(service.enum_name(&Value::Uint32(2)), Some("Framed-User"));
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let json = r#"{ "attributes": [ { "name": "NAS-Port", "number": 5, "type": "uint32" } ] }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.log_level, "info");
        assert!(config.strict_validation);
        assert_eq!(config.arena.max_pairs, None);
        assert_eq!(config.attributes[0].value_type, ValueType::Uint32);
        assert_eq!(config.attributes[0].vendor, 0);
    }

    #[test]
    fn test_validation_mode() {
        let mut config = Config::default();
        assert_eq!(config.validation_mode(), ValidationMode::Strict);
        config.strict_validation = false;
        assert_eq!(config.validation_mode(), ValidationMode::Relaxed);
    }

    #[test]
    fn test_invalid_log_level() {
        let config = Config {
            log_level: "loud".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_parent() {
        let mut config = Config::example();
        config.attributes[8].parent = Some("Missing".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_parent_must_be_structural() {
        let mut config = Config::example();
        config.attributes[8].parent = Some("User-Name".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Pair(PairError::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn test_duplicate_attribute() {
        let mut config = Config::example();
        let dup = config.attributes[0].clone();
        config.attributes.push(dup);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Pair(PairError::DuplicateAttribute(_)))
        ));
    }

    #[test]
    fn test_bad_enum_value() {
        let mut config = Config::example();
        config.attributes[3]
            .values
            .insert("Broken".to_string(), "not-a-number".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_dotted_name_rejected() {
        let mut config = Config::default();
        config.attributes.push(AttributeDef {
            name: "Tunnel.Vlan-Id".to_string(),
            number: 1,
            value_type: ValueType::Uint16,
            parent: None,
            vendor: 0,
            values: BTreeMap::new(),
        });
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
