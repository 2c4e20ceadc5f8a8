//! Brand / model / year display model

use serde::Serialize;
use tabled::Tabled;

use crate::client::Reference;

/// Any hierarchy level as a CODE / NAME row
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct ReferenceDisplay {
    #[tabled(rename = "CODE")]
    pub code: String,

    #[tabled(rename = "NAME")]
    pub name: String,
}

impl From<Reference> for ReferenceDisplay {
    fn from(r: Reference) -> Self {
        Self {
            code: r.code,
            name: r.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_reference() {
        let display = ReferenceDisplay::from(Reference::new("2020-1", "2020 Gasolina"));
        assert_eq!(display.code, "2020-1");
        assert_eq!(display.name, "2020 Gasolina");
    }
}
