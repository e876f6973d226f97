use serde::{Deserialize, Serialize};

/// Yield prediction input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldRequest {
  pub crop: String,
  pub soil: String,
  /// Hectares
  pub area: f64,
  pub season: String,
  pub sowing_date: String,
  /// Millimetres over the season
  #[serde(skip_serializing_if = "Option::is_none")]
  pub rainfall: Option<f64>,
  /// Average °C
  #[serde(skip_serializing_if = "Option::is_none")]
  pub temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldPrediction {
  /// Tonnes per hectare
  pub yield_per_hectare: f64,
  /// Tonnes over the whole area
  pub total_yield: f64,
  pub crop: String,
  pub area: f64,
  /// Percent
  pub confidence: f64,
  #[serde(default)]
  pub model: String,
}

/// Irrigation recommendation input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationRequest {
  pub crop: String,
  pub soil: String,
  /// Soil moisture percent
  #[serde(skip_serializing_if = "Option::is_none")]
  pub moisture: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationPlan {
  /// Litres per hectare per day
  pub water_per_day: u32,
  /// Interval between irrigations, e.g. "48h"
  pub schedule: String,
  pub moisture_level: String,
  pub moisture_status: String,
  #[serde(default)]
  pub recommendation: String,
}

/// Fertilizer recommendation input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerRequest {
  pub crop: String,
  pub soil: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub area: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fertilizer {
  pub name: String,
  pub dosage: String,
  #[serde(default)]
  pub icon: String,
  #[serde(default)]
  pub desc: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerPlan {
  pub fertilizers: Vec<Fertilizer>,
  #[serde(default)]
  pub tips: String,
  pub crop: String,
  #[serde(default)]
  pub area: Option<f64>,
  #[serde(default)]
  pub stage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
  pub day: String,
  pub icon: String,
  pub high: i32,
  pub low: i32,
  pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
  /// °C
  pub temp: i32,
  pub icon: String,
  pub description: String,
  pub location: String,
  /// Percent
  pub humidity: i32,
  /// km/h
  pub wind: i32,
  /// hPa
  pub pressure: i32,
  #[serde(default)]
  pub forecast: Vec<ForecastDay>,
  #[serde(default)]
  pub advisory: String,
}

/// Crop photo to analyse
#[derive(Debug, Clone)]
pub struct DiseaseImage {
  pub file_name: String,
  pub content_type: String,
  pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
  Healthy,
  Diseased,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseReport {
  pub disease: String,
  pub status: HealthStatus,
  /// Percent
  pub confidence: f64,
  pub severity: Option<String>,
  pub health_score: Option<f64>,
  /// Plain-text findings and treatment advice
  pub details: String,
}

/// Registered farmer as seen by an admin
#[derive(Debug, Clone, PartialEq)]
pub struct Farmer {
  pub id: i64,
  pub name: String,
  pub contact: String,
  pub address: Option<String>,
  pub is_active: bool,
  pub created_at: Option<String>,
}

/// One stored analysis for a farmer
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalysisRecord {
  pub id: i64,
  #[serde(default)]
  pub crop_type: Option<String>,
  #[serde(default)]
  pub disease_prediction: Option<String>,
  #[serde(default)]
  pub confidence: Option<f64>,
  #[serde(default)]
  pub is_healthy: Option<bool>,
  #[serde(default)]
  pub yield_per_ha: Option<f64>,
  #[serde(default)]
  pub total_yield: Option<f64>,
  #[serde(default)]
  pub created_at: Option<String>,
}

/// Analyses for one farmer; empty placeholder when the lookup failed
#[derive(Debug, Clone, PartialEq)]
pub struct FarmerHistory {
  pub farmer_id: i64,
  pub records: Vec<AnalysisRecord>,
  /// False when this entry stands in for a failed lookup
  pub available: bool,
}

impl FarmerHistory {
  pub fn placeholder(farmer_id: i64) -> Self {
    Self {
      farmer_id,
      records: Vec::new(),
      available: false,
    }
  }

  pub fn count(&self) -> usize {
    self.records.len()
  }
}

/// Outcome of a revoke/restore toggle
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccessChange {
  pub message: String,
  pub is_active: bool,
}

/// Farmer signup input
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignupRequest {
  pub name: String,
  pub address: String,
  pub age: u32,
  pub email_phone: String,
  pub password: String,
}
