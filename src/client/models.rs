//! FIPE API data types

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ApiError;

/// Vehicle category segment of the FIPE API path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum VehicleKind {
    /// Passenger cars
    #[default]
    #[serde(rename = "carros")]
    #[value(name = "carros")]
    Cars,
    /// Motorcycles
    #[serde(rename = "motos")]
    #[value(name = "motos")]
    Motorcycles,
    /// Trucks
    #[serde(rename = "caminhoes")]
    #[value(name = "caminhoes")]
    Trucks,
}

impl VehicleKind {
    pub fn as_path(&self) -> &'static str {
        match self {
            VehicleKind::Cars => "carros",
            VehicleKind::Motorcycles => "motos",
            VehicleKind::Trucks => "caminhoes",
        }
    }
}

impl fmt::Display for VehicleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

/// A labeled code at any level of the hierarchy (brand, model or model-year)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Upstream identifier. The API sends brand codes as strings and model
    /// codes as numbers.
    #[serde(alias = "codigo", deserialize_with = "code_from_string_or_number")]
    pub code: String,

    #[serde(alias = "nome")]
    pub name: String,
}

impl Reference {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

fn code_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Text(String),
        Number(i64),
    }

    Ok(match Code::deserialize(deserializer)? {
        Code::Text(s) => s,
        Code::Number(n) => n.to_string(),
    })
}

/// Price record for one model-year as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamValue {
    #[serde(rename = "TipoVeiculo", default)]
    pub vehicle_type: i64,

    /// Formatted price, e.g. `R$ 85.000,00`
    #[serde(rename = "Valor")]
    pub price: String,

    #[serde(rename = "Marca")]
    pub brand: String,

    #[serde(rename = "Modelo")]
    pub model: String,

    #[serde(rename = "AnoModelo")]
    pub model_year: i32,

    #[serde(rename = "Combustivel")]
    pub fuel: String,

    #[serde(rename = "CodigoFipe")]
    pub fipe_code: String,

    #[serde(rename = "MesReferencia")]
    pub reference_month: String,

    #[serde(rename = "SiglaCombustivel", default)]
    pub fuel_abbreviation: String,
}

/// Monetary amount in centavos
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(i64);

impl Price {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn as_reais(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Parse the API's Brazilian currency format (`R$ 85.000,00`)
    pub fn parse(raw: &str) -> Result<Self, ApiError> {
        let invalid = || ApiError::InvalidResponse(format!("Unparseable price: {:?}", raw));

        let numeric: String = raw
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == ',')
            .collect();
        if numeric.is_empty() {
            return Err(invalid());
        }

        let (whole, fraction) = match numeric.split_once(',') {
            Some((w, f)) => (w, f),
            None => (numeric.as_str(), ""),
        };
        if fraction.len() > 2 || fraction.contains(',') {
            return Err(invalid());
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = (self.0 / 100).to_string();
        let cents = self.0 % 100;

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "R$ {},{:02}", grouped, cents)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_reais())
    }
}
