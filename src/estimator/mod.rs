//! Local stand-ins for backend advice.
//!
//! When the backend cannot be reached the services fall back to these
//! estimates so the dashboard stays usable. They are table lookups with simple
//! arithmetic, not models. Randomized parts draw from an injected [`Rng`] so
//! tests can pin them with a seeded generator.

mod tables;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

use crate::api::types::{
  DiseaseReport, Fertilizer, FertilizerPlan, FertilizerRequest, ForecastDay, HealthStatus,
  IrrigationPlan, IrrigationRequest, WeatherReport, YieldPrediction, YieldRequest,
};
use tables::WEATHER_CONDITIONS;

const DEFAULT_MOISTURE: f64 = 40.0;
const ESTIMATE_MODEL: &str = "Local estimate (offline)";

fn normalize(s: &str) -> String {
  s.trim().to_lowercase()
}

/// Estimator with its own random source.
pub struct Estimator {
  rng: Mutex<StdRng>,
}

impl Estimator {
  pub fn new() -> Self {
    Self {
      rng: Mutex::new(StdRng::from_entropy()),
    }
  }

  /// Deterministic estimator for tests and reproducible demos.
  pub fn seeded(seed: u64) -> Self {
    Self {
      rng: Mutex::new(StdRng::seed_from_u64(seed)),
    }
  }

  fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
    let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
    f(&mut rng)
  }

  pub fn yield_prediction(&self, req: &YieldRequest) -> YieldPrediction {
    self.with_rng(|rng| estimate_yield(req, rng))
  }

  pub fn irrigation(&self, req: &IrrigationRequest) -> IrrigationPlan {
    estimate_irrigation(req)
  }

  pub fn fertilizer(&self, req: &FertilizerRequest) -> FertilizerPlan {
    estimate_fertilizer(req)
  }

  pub fn weather(&self, location: &str) -> WeatherReport {
    self.with_rng(|rng| estimate_weather(location, rng))
  }

  pub fn disease(&self) -> DiseaseReport {
    self.with_rng(estimate_disease)
  }
}

impl Default for Estimator {
  fn default() -> Self {
    Self::new()
  }
}

// ============================================================================
// Yield
// ============================================================================

/// Per-hectare yield before jitter: table product with weather penalties.
pub fn yield_before_jitter(req: &YieldRequest) -> f64 {
  let mut per_ha = tables::base_yield(&normalize(&req.crop))
    * tables::soil_multiplier(&normalize(&req.soil))
    * tables::season_multiplier(&normalize(&req.season));

  if let Some(temperature) = req.temperature {
    if !(10.0..=35.0).contains(&temperature) {
      per_ha *= 0.85;
    }
  }

  if let Some(rainfall) = req.rainfall {
    if rainfall > 300.0 {
      per_ha *= 0.90;
    } else if rainfall < 50.0 {
      per_ha *= 0.80;
    }
  }

  per_ha
}

pub fn estimate_yield<R: Rng + ?Sized>(req: &YieldRequest, rng: &mut R) -> YieldPrediction {
  let jitter = rng.gen_range(0.95..=1.05);
  let yield_per_hectare = yield_before_jitter(req) * jitter;
  let confidence = rng.gen_range(78.0..=95.0);

  YieldPrediction {
    yield_per_hectare,
    total_yield: yield_per_hectare * req.area,
    crop: req.crop.clone(),
    area: req.area,
    confidence,
    model: ESTIMATE_MODEL.to_string(),
  }
}

// ============================================================================
// Irrigation
// ============================================================================

pub fn schedule_for(moisture: f64) -> &'static str {
  if moisture > 60.0 {
    "72h"
  } else if moisture > 40.0 {
    "48h"
  } else {
    "24h"
  }
}

pub fn moisture_status(moisture: f64) -> &'static str {
  if moisture < 30.0 {
    "Critical — Irrigate Immediately"
  } else if moisture < 40.0 {
    "Low — Schedule Irrigation"
  } else if moisture > 70.0 {
    "High — Reduce Irrigation"
  } else {
    "Adequate"
  }
}

pub fn estimate_irrigation(req: &IrrigationRequest) -> IrrigationPlan {
  let crop = normalize(&req.crop);
  let soil = normalize(&req.soil);
  let stage = req
    .stage
    .as_deref()
    .map(normalize)
    .unwrap_or_else(|| "vegetative".to_string());
  let moisture = req.moisture.unwrap_or(DEFAULT_MOISTURE);

  let litres = tables::water_need(&crop) * tables::stage_multiplier(&stage) * tables::soil_drainage(&soil);

  let urgency = if moisture < 35.0 {
    "Immediate irrigation recommended."
  } else {
    "Current moisture levels are acceptable."
  };
  let mut recommendation = format!(
    "For {} in {} soil at {} stage with {}% moisture: {} \
     Apply water during early morning or late evening for best efficiency. \
     Consider drip irrigation for up to 40% water savings.",
    req.crop, req.soil, stage, moisture, urgency
  );
  if soil == "sandy" {
    recommendation.push_str(" Sandy soil needs more frequent, lighter irrigation.");
  }

  IrrigationPlan {
    // Whole litres, truncated
    water_per_day: litres.max(0.0) as u32,
    schedule: schedule_for(moisture).to_string(),
    moisture_level: format!("{}%", moisture),
    moisture_status: moisture_status(moisture).to_string(),
    recommendation,
  }
}

// ============================================================================
// Fertilizer
// ============================================================================

pub fn estimate_fertilizer(req: &FertilizerRequest) -> FertilizerPlan {
  let crop = normalize(&req.crop);
  let soil = normalize(&req.soil);
  let rows = tables::fertilizer_rows(&crop)
    .or_else(|| tables::fertilizer_rows("rice"))
    .unwrap_or_default();
  let stage = req.stage.clone().unwrap_or_else(|| "basal".to_string());

  let fertilizers = rows
    .iter()
    .map(|(name, dosage, icon, desc)| Fertilizer {
      name: name.to_string(),
      dosage: dosage.to_string(),
      icon: icon.to_string(),
      desc: desc.to_string(),
    })
    .collect();

  let mut tips = format!(
    "For {} in {} soil at {} stage: Apply fertilizers when soil has adequate moisture. \
     Best time is early morning or late evening.",
    req.crop, req.soil, stage
  );
  match soil.as_str() {
    "sandy" => tips
      .push_str(" Sandy soil: Apply in smaller, more frequent doses to prevent nutrient leaching."),
    "clay" => {
      tips.push_str(" Clay soil: Good nutrient retention — follow standard recommendations.")
    }
    _ => {}
  }
  tips.push_str(
    " Incorporate organic manure (FYM/Compost) at 10-15 t/ha for improved soil health. \
     Conduct soil testing every season for precise nutrient management.",
  );

  FertilizerPlan {
    fertilizers,
    tips,
    crop: req.crop.clone(),
    area: Some(req.area.unwrap_or(1.0)),
    stage: Some(stage),
  }
}

// ============================================================================
// Weather
// ============================================================================

pub fn estimate_weather<R: Rng + ?Sized>(location: &str, rng: &mut R) -> WeatherReport {
  // Current conditions lean towards fair weather
  let (icon, description, kind) = WEATHER_CONDITIONS[rng.gen_range(0..3)];
  let temp = rng.gen_range(22..=35);
  let humidity = rng.gen_range(40..=85);
  let wind = rng.gen_range(5..=25);
  let pressure = rng.gen_range(1005..=1020);

  let forecast = tables::FORECAST_DAYS
    .iter()
    .map(|day| {
      let (icon, description, _) = WEATHER_CONDITIONS[rng.gen_range(0..WEATHER_CONDITIONS.len())];
      let high = rng.gen_range(24..=38);
      let low = high - rng.gen_range(5..=12);
      ForecastDay {
        day: day.to_string(),
        icon: icon.to_string(),
        high,
        low,
        description: description.to_string(),
      }
    })
    .collect();

  let advisory = format!(
    "Weather in {}: {} with temperature of {}°C. {}",
    location,
    description,
    temp,
    tables::field_advisory(kind)
  );

  WeatherReport {
    temp,
    icon: icon.to_string(),
    description: description.to_string(),
    location: location.to_string(),
    humidity,
    wind,
    pressure,
    forecast,
    advisory,
  }
}

// ============================================================================
// Disease
// ============================================================================

/// One of three canned outcomes, chosen uniformly.
pub fn estimate_disease<R: Rng + ?Sized>(rng: &mut R) -> DiseaseReport {
  match rng.gen_range(0..3) {
    0 => DiseaseReport {
      disease: "Tomato Early Blight".to_string(),
      status: HealthStatus::Diseased,
      confidence: 87.5,
      severity: Some("Moderate".to_string()),
      health_score: Some(58.0),
      details: "Dark brown concentric rings on older leaves with yellowing around spots.\n\
                Treatment:\n\
                • Apply Mancozeb 75% WP at 2.5g/L every 7-10 days\n\
                • Remove and destroy severely infected lower leaves\n\
                • Ensure proper plant spacing for air circulation"
        .to_string(),
    },
    1 => DiseaseReport {
      disease: "Healthy Plant".to_string(),
      status: HealthStatus::Healthy,
      confidence: 94.2,
      severity: None,
      health_score: Some(91.0),
      details: "No disease symptoms detected. Leaf colour and texture look normal.\n\
                • Continue regular monitoring\n\
                • Maintain balanced irrigation and nutrition"
        .to_string(),
    },
    _ => DiseaseReport {
      disease: "Rice Brown Spot".to_string(),
      status: HealthStatus::Diseased,
      confidence: 82.1,
      severity: Some("Mild".to_string()),
      health_score: Some(74.0),
      details: "Small oval brown spots with grey centres on leaves.\n\
                Treatment:\n\
                • Spray Mancozeb at 2.5g/L\n\
                • Apply balanced potassium fertilizer\n\
                • Use certified disease-free seed next season"
        .to_string(),
    },
  }
}
