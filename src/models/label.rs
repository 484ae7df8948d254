use serde::{Deserialize, Serialize};

/// The two independent label partitions used by the catalog filters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LabelFacet {
    Category,
    Event,
}

impl std::fmt::Display for LabelFacet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LabelFacet::Category => "category",
            LabelFacet::Event => "event",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for LabelFacet {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "category" => Ok(LabelFacet::Category),
            "event" => Ok(LabelFacet::Event),
            _ => Err(anyhow::anyhow!("Unknown label facet: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Label {
    pub id: i64,
    pub name: String,
    pub facet: LabelFacet,
}

/// Body for POST /labels.
#[derive(Debug, Deserialize)]
pub struct CreateLabelRequest {
    pub name: String,
    pub facet: LabelFacet,
}
