use serde::{Deserialize, Serialize};

/// AFIP environment the credentials and endpoints belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentKind {
    Production,
    Homologation,
}

impl EnvironmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentKind::Production => "production",
            EnvironmentKind::Homologation => "homologation",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "production" | "prod" => EnvironmentKind::Production,
            _ => EnvironmentKind::Homologation,
        }
    }
}
