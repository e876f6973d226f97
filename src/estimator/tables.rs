//! Lookup tables backing the local estimates.
//!
//! Keys are matched case-insensitively; unknown keys get the documented default.

/// Typical yield in tonnes per hectare. Default 4.0.
pub fn base_yield(crop: &str) -> f64 {
  match crop {
    "rice" => 4.5,
    "wheat" => 3.8,
    "corn" => 6.2,
    "soybean" => 2.8,
    "cotton" => 1.8,
    "sugarcane" => 70.0,
    "potato" => 25.0,
    "tomato" => 30.0,
    _ => 4.0,
  }
}

/// Yield multiplier per soil type. Default 1.0.
pub fn soil_multiplier(soil: &str) -> f64 {
  match soil {
    "clay" => 0.92,
    "sandy" => 0.78,
    "loamy" => 1.1,
    "silt" => 1.0,
    "peat" => 0.88,
    "chalky" => 0.82,
    _ => 1.0,
  }
}

/// Yield multiplier per growing season. Default 1.0.
pub fn season_multiplier(season: &str) -> f64 {
  match season {
    "kharif" => 1.05,
    "rabi" => 0.95,
    "zaid" => 0.85,
    _ => 1.0,
  }
}

/// Daily water need in litres per hectare. Default 4000.
pub fn water_need(crop: &str) -> f64 {
  match crop {
    "rice" => 6000.0,
    "wheat" => 3500.0,
    "corn" => 4500.0,
    "soybean" => 3000.0,
    "cotton" => 4000.0,
    "sugarcane" => 7000.0,
    _ => 4000.0,
  }
}

/// Water multiplier per growth stage. Default 1.0.
pub fn stage_multiplier(stage: &str) -> f64 {
  match stage {
    "seedling" => 0.6,
    "vegetative" => 1.0,
    "flowering" => 1.3,
    "fruiting" => 1.1,
    "maturity" => 0.5,
    _ => 1.0,
  }
}

/// Water multiplier for how fast the soil drains. Default 1.0.
pub fn soil_drainage(soil: &str) -> f64 {
  match soil {
    "clay" => 0.7,
    "sandy" => 1.4,
    "loamy" => 1.0,
    "silt" => 0.9,
    _ => 1.0,
  }
}

/// (name, dosage, icon, application note)
pub type NutrientRow = (&'static str, &'static str, &'static str, &'static str);

/// Nitrogen, phosphorus and potassium rows for a crop; `None` for unknown crops.
pub fn fertilizer_rows(crop: &str) -> Option<[NutrientRow; 3]> {
  let rows = match crop {
    "rice" => [
      ("Urea (N)", "120 kg/ha", "🟢", "Apply in 3 split doses: basal, tillering, panicle initiation"),
      ("DAP (P₂O₅)", "60 kg/ha", "🟡", "Full dose at basal application"),
      ("MOP (K₂O)", "40 kg/ha", "🔴", "Split: 50% basal + 50% at tillering"),
    ],
    "wheat" => [
      ("Urea (N)", "100 kg/ha", "🟢", "50% basal + 50% at first irrigation"),
      ("SSP (P₂O₅)", "50 kg/ha", "🟡", "Full dose at sowing"),
      ("MOP (K₂O)", "30 kg/ha", "🔴", "Full dose at sowing"),
    ],
    "corn" => [
      ("Urea (N)", "150 kg/ha", "🟢", "1/3 basal + 1/3 knee-high + 1/3 tasseling"),
      ("DAP (P₂O₅)", "70 kg/ha", "🟡", "Full dose at planting"),
      ("MOP (K₂O)", "50 kg/ha", "🔴", "Full dose at planting"),
    ],
    "soybean" => [
      ("Urea (N)", "30 kg/ha", "🟢", "Minimal N needed — nitrogen-fixing crop"),
      ("SSP (P₂O₅)", "80 kg/ha", "🟡", "Full dose at sowing"),
      ("MOP (K₂O)", "40 kg/ha", "🔴", "Full dose at sowing"),
    ],
    "cotton" => [
      ("Urea (N)", "80 kg/ha", "🟢", "Split: 40% basal + 30% squaring + 30% boll formation"),
      ("DAP (P₂O₅)", "40 kg/ha", "🟡", "Full dose at sowing"),
      ("MOP (K₂O)", "40 kg/ha", "🔴", "Full dose at sowing"),
    ],
    "sugarcane" => [
      ("Urea (N)", "250 kg/ha", "🟢", "Apply in 4 split doses across growth stages"),
      ("SSP (P₂O₅)", "100 kg/ha", "🟡", "Full dose at planting"),
      ("MOP (K₂O)", "120 kg/ha", "🔴", "50% at planting + 50% at earthing up"),
    ],
    _ => return None,
  };
  Some(rows)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
  Clear,
  Overcast,
  Rain,
  Storm,
}

/// (icon, description, kind). The first three are the fair-weather entries.
pub const WEATHER_CONDITIONS: [(&str, &str, ConditionKind); 6] = [
  ("☀️", "Sunny", ConditionKind::Clear),
  ("🌤️", "Partly Cloudy", ConditionKind::Clear),
  ("⛅", "Mostly Cloudy", ConditionKind::Overcast),
  ("☁️", "Cloudy", ConditionKind::Overcast),
  ("🌧️", "Light Rain", ConditionKind::Rain),
  ("⛈️", "Thunderstorm", ConditionKind::Storm),
];

pub const FORECAST_DAYS: [&str; 5] = ["Mon", "Tue", "Wed", "Thu", "Fri"];

pub fn field_advisory(kind: ConditionKind) -> &'static str {
  match kind {
    ConditionKind::Clear => {
      "Favorable conditions for field operations, spraying, and harvesting. \
       Ensure adequate irrigation as evapotranspiration will be high. \
       Apply pesticides/fungicides in early morning or late evening to avoid rapid evaporation."
    }
    ConditionKind::Overcast => {
      "Good conditions for transplanting and field operations. \
       Reduced evapotranspiration - adjust irrigation accordingly. \
       Monitor for fungal diseases as humidity may increase."
    }
    ConditionKind::Rain => {
      "Postpone pesticide/herbicide application. \
       Ensure proper drainage in fields to prevent waterlogging. \
       Good time for fertilizer application if rain is light. \
       Monitor for leaf diseases that thrive in wet conditions."
    }
    ConditionKind::Storm => {
      "Avoid all field operations. Protect nursery beds and young transplants. \
       Ensure drainage channels are clear. Stake tall crops to prevent lodging. \
       Inspect fields after the storm for damage assessment."
    }
  }
}
