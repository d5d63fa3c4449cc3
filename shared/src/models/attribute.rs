//! Attribute Model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of value an attribute holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AttributeType {
    /// Free text
    ShortText,
    /// One or more values from the attribute's options
    MultiSelect,
}

impl AttributeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortText => "SHORTTEXT",
            Self::MultiSelect => "MULTISELECT",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SHORTTEXT" => Ok(Self::ShortText),
            "MULTISELECT" => Ok(Self::MultiSelect),
            other => Err(other.to_string()),
        }
    }
}

/// Attribute entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub id: i64,
    /// Unique key, e.g. "os_version"
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    /// Unix millis
    pub created_at: i64,
    /// Unix millis
    pub updated_at: i64,
}

/// Create attribute payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeCreate {
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
}

/// Direct category → attribute link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct CategoryAttribute {
    pub category_id: i64,
    pub attribute_id: i64,
}

/// Enumerated value of a multi-select attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct AttributeOption {
    pub id: i64,
    pub attribute_id: i64,
    pub value: String,
}

/// How an attribute relates to a set of categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// Linked to one of the categories
    Direct,
    /// Linked to a strict ancestor of one of the categories
    Inherited,
    /// Not linked to any category at all
    Global,
}

impl LinkType {
    pub const ALL: [LinkType; 3] = [LinkType::Direct, LinkType::Inherited, LinkType::Global];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Inherited => "inherited",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LinkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "inherited" => Ok(Self::Inherited),
            "global" => Ok(Self::Global),
            other => Err(other.to_string()),
        }
    }
}

/// Attribute row returned by the attribute query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeView {
    pub id: i64,
    pub key: String,
    pub name: String,
    #[serde(rename = "type")]
    pub attr_type: AttributeType,
    /// `None` when the attribute does not apply, or no categories were given
    pub link_type: Option<LinkType>,
}

impl AttributeView {
    pub fn new(attribute: &Attribute, link_type: Option<LinkType>) -> Self {
        Self {
            id: attribute.id,
            key: attribute.key.clone(),
            name: attribute.name.clone(),
            attr_type: attribute.attr_type,
            link_type,
        }
    }
}
