//! Cache keys for advisory requests.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt::Display;

use crate::cache::QueryKey;

use super::types::{FertilizerRequest, IrrigationRequest, YieldRequest};

/// Domain tag plus request fields, serialized in field-name order.
#[derive(Clone, Debug, PartialEq)]
pub struct AdvisoryKey {
  domain: &'static str,
  fields: BTreeMap<&'static str, String>,
}

impl AdvisoryKey {
  pub fn new(domain: &'static str) -> Self {
    Self {
      domain,
      fields: BTreeMap::new(),
    }
  }

  pub fn field(mut self, name: &'static str, value: impl Display) -> Self {
    self.fields.insert(name, value.to_string().trim().to_string());
    self
  }

  /// Absent values are left out, so `None` and a missing field share a key.
  pub fn opt_field<V: Display>(self, name: &'static str, value: Option<V>) -> Self {
    match value {
      Some(v) => self.field(name, v),
      None => self,
    }
  }

  pub fn for_yield(req: &YieldRequest) -> Self {
    Self::new("yield")
      .field("crop", &req.crop)
      .field("soil", &req.soil)
      .field("area", req.area)
      .field("season", &req.season)
      .field("sowing_date", &req.sowing_date)
      .opt_field("rainfall", req.rainfall)
      .opt_field("temperature", req.temperature)
  }

  pub fn for_irrigation(req: &IrrigationRequest) -> Self {
    Self::new("irrigation")
      .field("crop", &req.crop)
      .field("soil", &req.soil)
      .opt_field("moisture", req.moisture)
      .opt_field("stage", req.stage.as_deref())
  }

  pub fn for_fertilizer(req: &FertilizerRequest) -> Self {
    Self::new("fertilizer")
      .field("crop", &req.crop)
      .field("soil", &req.soil)
      .opt_field("area", req.area)
      .opt_field("stage", req.stage.as_deref())
  }

  pub fn for_weather(location: &str) -> Self {
    Self::new("weather").field("location", location)
  }

  /// `domain|name=value|...` with names in sorted order.
  pub fn canonical(&self) -> String {
    let mut out = self.domain.to_string();
    for (name, value) in &self.fields {
      out.push('|');
      out.push_str(name);
      out.push('=');
      out.push_str(value);
    }
    out
  }
}

impl QueryKey for AdvisoryKey {
  fn cache_hash(&self) -> String {
    let mut hasher = Sha256::new();
    hasher.update(self.canonical().as_bytes());
    hex::encode(hasher.finalize())
  }

  fn description(&self) -> String {
    self.canonical()
  }
}
