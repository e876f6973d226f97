//! Form validation.
//!
//! Raw field text from the views is checked here and turned into typed
//! requests. A failed check is shown beside the form and nothing is sent.

use chrono::NaiveDate;
use std::path::Path;
use thiserror::Error;

use crate::api::types::{
  DiseaseImage, FertilizerRequest, IrrigationRequest, SignupRequest, YieldRequest,
};

pub const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
  #[error("{0} is required")]
  Required(&'static str),

  #[error("{0} must be a number")]
  NotANumber(&'static str),

  #[error("{0} must be greater than zero")]
  NotPositive(&'static str),

  #[error("{field} must be between {min} and {max}")]
  OutOfRange {
    field: &'static str,
    min: f64,
    max: f64,
  },

  #[error("{field} must be at least {min} characters")]
  TooShort { field: &'static str, min: usize },

  #[error("{0} must be a date like 2026-06-15")]
  InvalidDate(&'static str),

  #[error("Please choose a JPG or PNG image")]
  UnsupportedImage,

  #[error("The image file is empty")]
  EmptyImage,

  #[error("The image is larger than 10 MB")]
  ImageTooLarge,

  #[error("Cannot read image: {0}")]
  ImageUnreadable(String),
}

type Validated<T> = std::result::Result<T, ValidationError>;

fn required(field: &'static str, value: &str) -> Validated<String> {
  let value = value.trim();
  if value.is_empty() {
    return Err(ValidationError::Required(field));
  }
  Ok(value.to_string())
}

fn optional(value: &str) -> Option<String> {
  let value = value.trim();
  (!value.is_empty()).then(|| value.to_string())
}

fn number(field: &'static str, value: &str) -> Validated<Option<f64>> {
  let value = value.trim();
  if value.is_empty() {
    return Ok(None);
  }
  match value.parse::<f64>() {
    Ok(n) if n.is_finite() => Ok(Some(n)),
    _ => Err(ValidationError::NotANumber(field)),
  }
}

fn positive(field: &'static str, value: &str) -> Validated<Option<f64>> {
  match number(field, value)? {
    Some(n) if n <= 0.0 => Err(ValidationError::NotPositive(field)),
    other => Ok(other),
  }
}

fn in_range(field: &'static str, value: Option<f64>, min: f64, max: f64) -> Validated<Option<f64>> {
  match value {
    Some(n) if !(min..=max).contains(&n) => Err(ValidationError::OutOfRange { field, min, max }),
    other => Ok(other),
  }
}

fn min_len(field: &'static str, value: &str, min: usize) -> Validated<String> {
  let value = required(field, value)?;
  if value.chars().count() < min {
    return Err(ValidationError::TooShort { field, min });
  }
  Ok(value)
}

/// Raw yield form fields
#[derive(Debug, Default, Clone, Copy)]
pub struct YieldInput<'a> {
  pub crop: &'a str,
  pub soil: &'a str,
  pub area: &'a str,
  pub season: &'a str,
  pub sowing_date: &'a str,
  pub rainfall: &'a str,
  pub temperature: &'a str,
}

impl YieldInput<'_> {
  /// An empty sowing date means `today`.
  pub fn validate(&self, today: NaiveDate) -> Validated<YieldRequest> {
    let crop = required("Crop", self.crop)?;
    let soil = required("Soil type", self.soil)?;
    let area = positive("Area", self.area)?.ok_or(ValidationError::Required("Area"))?;
    let season = required("Season", self.season)?;

    let sowing_date = match optional(self.sowing_date) {
      Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate("Sowing date"))?,
      None => today,
    };

    let rainfall = in_range("Rainfall", number("Rainfall", self.rainfall)?, 0.0, 5000.0)?;
    let temperature = in_range("Temperature", number("Temperature", self.temperature)?, -20.0, 60.0)?;

    Ok(YieldRequest {
      crop: crop.to_lowercase(),
      soil: soil.to_lowercase(),
      area,
      season: season.to_lowercase(),
      sowing_date: sowing_date.format("%Y-%m-%d").to_string(),
      rainfall,
      temperature,
    })
  }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct IrrigationInput<'a> {
  pub crop: &'a str,
  pub soil: &'a str,
  pub moisture: &'a str,
  pub stage: &'a str,
}

impl IrrigationInput<'_> {
  pub fn validate(&self) -> Validated<IrrigationRequest> {
    Ok(IrrigationRequest {
      crop: required("Crop", self.crop)?.to_lowercase(),
      soil: required("Soil type", self.soil)?.to_lowercase(),
      moisture: in_range("Soil moisture", number("Soil moisture", self.moisture)?, 0.0, 100.0)?,
      stage: optional(self.stage).map(|s| s.to_lowercase()),
    })
  }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FertilizerInput<'a> {
  pub crop: &'a str,
  pub soil: &'a str,
  pub area: &'a str,
  pub stage: &'a str,
}

impl FertilizerInput<'_> {
  pub fn validate(&self) -> Validated<FertilizerRequest> {
    Ok(FertilizerRequest {
      crop: required("Crop", self.crop)?.to_lowercase(),
      soil: required("Soil type", self.soil)?.to_lowercase(),
      area: positive("Area", self.area)?,
      stage: optional(self.stage).map(|s| s.to_lowercase()),
    })
  }
}

/// Weather location, falling back to the configured default.
pub fn weather_location(raw: &str, default: &str) -> String {
  optional(raw).unwrap_or_else(|| default.to_string())
}

/// Validated login credentials as (contact, password).
pub fn credentials(contact: &str, password: &str) -> Validated<(String, String)> {
  let contact = required("Email or phone", contact)?;
  if password.is_empty() {
    return Err(ValidationError::Required("Password"));
  }
  Ok((contact, password.to_string()))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SignupInput<'a> {
  pub name: &'a str,
  pub address: &'a str,
  pub age: &'a str,
  pub contact: &'a str,
  pub password: &'a str,
}

impl SignupInput<'_> {
  pub fn validate(&self) -> Validated<SignupRequest> {
    let name = min_len("Name", self.name, 2)?;
    let address = min_len("Address", self.address, 5)?;

    let age_raw = required("Age", self.age)?;
    let age: u32 = age_raw
      .parse()
      .map_err(|_| ValidationError::NotANumber("Age"))?;
    if !(18..=100).contains(&age) {
      return Err(ValidationError::OutOfRange {
        field: "Age",
        min: 18.0,
        max: 100.0,
      });
    }

    let email_phone = min_len("Email or phone", self.contact, 3)?;
    if self.password.chars().count() < 6 {
      return Err(if self.password.is_empty() {
        ValidationError::Required("Password")
      } else {
        ValidationError::TooShort {
          field: "Password",
          min: 6,
        }
      });
    }

    Ok(SignupRequest {
      name,
      address,
      age,
      email_phone,
      password: self.password.to_string(),
    })
  }
}

/// MIME type for an accepted image file name.
pub fn image_content_type(file_name: &str) -> Validated<&'static str> {
  let ext = Path::new(file_name)
    .extension()
    .and_then(|e| e.to_str())
    .map(|e| e.to_lowercase());
  match ext.as_deref() {
    Some("jpg") | Some("jpeg") => Ok("image/jpeg"),
    Some("png") => Ok("image/png"),
    _ => Err(ValidationError::UnsupportedImage),
  }
}

pub fn check_image_size(size: u64) -> Validated<()> {
  if size == 0 {
    return Err(ValidationError::EmptyImage);
  }
  if size > MAX_IMAGE_BYTES {
    return Err(ValidationError::ImageTooLarge);
  }
  Ok(())
}

/// Read and check a crop photo from disk.
pub fn load_image(path: &str) -> Validated<DiseaseImage> {
  let path = required("Image path", path)?;
  let path = Path::new(&path);
  let file_name = path
    .file_name()
    .and_then(|n| n.to_str())
    .ok_or(ValidationError::UnsupportedImage)?
    .to_string();
  let content_type = image_content_type(&file_name)?;

  let metadata =
    std::fs::metadata(path).map_err(|e| ValidationError::ImageUnreadable(e.to_string()))?;
  check_image_size(metadata.len())?;

  let bytes = std::fs::read(path).map_err(|e| ValidationError::ImageUnreadable(e.to_string()))?;
  check_image_size(bytes.len() as u64)?;

  Ok(DiseaseImage {
    file_name,
    content_type: content_type.to_string(),
    bytes,
  })
}
