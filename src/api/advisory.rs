//! Advisory requests: yield, irrigation, fertilizer, weather and disease.
//!
//! Each call goes cache → gateway → local estimate. Only successful backend
//! answers are cached; disease detection is never cached because the backend
//! records every analysis.

use std::sync::Arc;
use tracing::info;

use super::api_types::ApiDiseaseResponse;
use super::cache::AdvisoryKey;
use super::client::{Gateway, GatewayResult};
use super::types::{
  DiseaseImage, DiseaseReport, FertilizerPlan, FertilizerRequest, IrrigationPlan,
  IrrigationRequest, WeatherReport, YieldPrediction, YieldRequest,
};
use crate::cache::{CacheLayer, FetchError, Sourced, Storage};
use crate::estimator::Estimator;

#[derive(Clone)]
pub struct AdvisoryService {
  gateway: Gateway,
  cache: CacheLayer<Storage>,
  estimator: Arc<Estimator>,
}

impl AdvisoryService {
  pub fn new(gateway: Gateway, cache: CacheLayer<Storage>, estimator: Arc<Estimator>) -> Self {
    Self {
      gateway,
      cache,
      estimator,
    }
  }

  pub async fn predict_yield(&self, req: &YieldRequest) -> GatewayResult<Sourced<YieldPrediction>> {
    self
      .cache
      .fetch_or_estimate(
        &AdvisoryKey::for_yield(req),
        || self.gateway.post_json("/api/yield/predict", req),
        || self.estimator.yield_prediction(req),
      )
      .await
  }

  pub async fn recommend_irrigation(
    &self,
    req: &IrrigationRequest,
  ) -> GatewayResult<Sourced<IrrigationPlan>> {
    self
      .cache
      .fetch_or_estimate(
        &AdvisoryKey::for_irrigation(req),
        || self.gateway.post_json("/api/irrigation/recommend", req),
        || self.estimator.irrigation(req),
      )
      .await
  }

  pub async fn recommend_fertilizer(
    &self,
    req: &FertilizerRequest,
  ) -> GatewayResult<Sourced<FertilizerPlan>> {
    self
      .cache
      .fetch_or_estimate(
        &AdvisoryKey::for_fertilizer(req),
        || self.gateway.post_json("/api/fertilizer/recommend", req),
        || self.estimator.fertilizer(req),
      )
      .await
  }

  pub async fn weather(&self, location: &str) -> GatewayResult<Sourced<WeatherReport>> {
    let query = [("location", location)];
    self
      .cache
      .fetch_or_estimate(
        &AdvisoryKey::for_weather(location),
        || self.gateway.get_json("/api/weather", &query),
        || self.estimator.weather(location),
      )
      .await
  }

  pub async fn detect_disease(&self, image: &DiseaseImage) -> GatewayResult<Sourced<DiseaseReport>> {
    let result = self
      .gateway
      .post_multipart::<ApiDiseaseResponse>("/api/disease/detect", "file", image)
      .await;

    match result {
      Ok(resp) => Ok(Sourced::from_network(resp.into())),
      Err(e) if e.allows_fallback() => {
        info!(file = %image.file_name, error = %e, "disease detection unavailable, using estimate");
        Ok(Sourced::estimated(self.estimator.disease()))
      }
      Err(e) => Err(e),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::test_support::{unreachable_url, MockServer, Route};
  use crate::cache::{DataSource, MemoryStorage, QueryKey};
  use std::time::Duration;

  const YIELD_BODY: &str = r#"{
    "yield_per_hectare": 4.12, "total_yield": 8.24, "crop": "wheat", "area": 2.0,
    "confidence": 88.1, "model": "DSSAT + Random Forest Regression v2.1"
  }"#;

  const DISEASE_BODY: &str = r#"{
    "disease": "Rice Blast", "status": "diseased", "confidence": 91.0,
    "severity": "Severe", "health_score": 35.0,
    "details": "<strong>Treatment:</strong> Tricyclazole<br>Drain the field"
  }"#;

  fn service(url: &str) -> (AdvisoryService, CacheLayer<Storage>) {
    let gateway = Gateway::new(url, Duration::from_secs(2)).unwrap();
    let cache = CacheLayer::new(Storage::Memory(MemoryStorage::new()));
    let service = AdvisoryService::new(gateway, cache.clone(), Arc::new(Estimator::seeded(1)));
    (service, cache)
  }

  fn wheat() -> YieldRequest {
    YieldRequest {
      crop: "wheat".into(),
      soil: "loamy".into(),
      area: 2.0,
      season: "rabi".into(),
      sowing_date: "2026-11-01".into(),
      rainfall: None,
      temperature: None,
    }
  }

  fn leaf() -> DiseaseImage {
    DiseaseImage {
      file_name: "leaf.jpg".into(),
      content_type: "image/jpeg".into(),
      bytes: vec![0xFF, 0xD8, 0xFF],
    }
  }

  #[tokio::test]
  async fn test_repeat_request_within_ttl_hits_backend_once() {
    let server =
      MockServer::start(vec![Route::json("POST", "/api/yield/predict", 200, YIELD_BODY)]).await;
    let (service, _) = service(&server.url);

    let first = service.predict_yield(&wheat()).await.unwrap();
    let second = service.predict_yield(&wheat()).await.unwrap();

    assert_eq!(first.source, DataSource::Network);
    assert_eq!(second.source, DataSource::Cache);
    assert_eq!(first.data, second.data);
    assert_eq!(server.hits(), 1);
    assert_eq!(server.requests()[0].json()["sowing_date"], "2026-11-01");
  }

  #[tokio::test]
  async fn test_concurrent_identical_requests_share_one_call() {
    let server = MockServer::start(vec![Route::json("POST", "/api/yield/predict", 200, YIELD_BODY)
      .delayed(Duration::from_millis(300))])
    .await;
    let (service, _) = service(&server.url);

    let (req_a, req_b) = (wheat(), wheat());
    let (first, second) = tokio::join!(service.predict_yield(&req_a), service.predict_yield(&req_b));
    let mut sources = vec![first.unwrap().source, second.unwrap().source];
    sources.sort_by_key(|s| *s == DataSource::Cache);

    assert_eq!(sources, vec![DataSource::Network, DataSource::Cache]);
    assert_eq!(server.hits(), 1);
  }

  #[tokio::test]
  async fn test_predictions_run_as_background_queries() {
    let server =
      MockServer::start(vec![Route::json("POST", "/api/yield/predict", 200, YIELD_BODY)]).await;
    let (service, _) = service(&server.url);

    let mut query = crate::query::Query::new(move || {
      let service = service.clone();
      async move { service.predict_yield(&wheat()).await.map_err(|e| e.to_string()) }
    });
    query.fetch();
    for _ in 0..100 {
      if query.poll() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(20)).await;
    }

    assert_eq!(query.data().map(|p| p.data.crop.as_str()), Some("wheat"));
  }

  #[tokio::test]
  async fn test_unreachable_backend_returns_uncached_estimate() {
    let (service, cache) = service(&unreachable_url().await);

    let result = service.predict_yield(&wheat()).await.unwrap();
    assert_eq!(result.source, DataSource::Estimated);
    assert!(result.data.yield_per_hectare >= 3.971 * 0.95 - 1e-9);
    assert!(result.data.yield_per_hectare <= 3.971 * 1.05 + 1e-9);
    assert!(cache
      .get::<YieldPrediction>(&AdvisoryKey::for_yield(&wheat()))
      .unwrap()
      .is_none());
  }

  #[tokio::test]
  async fn test_server_error_falls_back() {
    let server = MockServer::start(vec![Route::json(
      "POST",
      "/api/irrigation/recommend",
      500,
      r#"{"detail":"boom"}"#,
    )])
    .await;
    let (service, _) = service(&server.url);

    let req = IrrigationRequest {
      crop: "rice".into(),
      soil: "clay".into(),
      moisture: Some(25.0),
      stage: Some("vegetative".into()),
    };
    let plan = service.recommend_irrigation(&req).await.unwrap();
    assert!(plan.is_estimated());
    assert_eq!(plan.data.water_per_day, 4200);
  }

  #[tokio::test]
  async fn test_rejection_with_reason_is_surfaced() {
    let server = MockServer::start(vec![Route::json(
      "POST",
      "/api/fertilizer/recommend",
      422,
      r#"{"detail":[{"loc":["body","crop"],"msg":"field required"}]}"#,
    )])
    .await;
    let (service, _) = service(&server.url);

    let err = service
      .recommend_fertilizer(&FertilizerRequest {
        crop: String::new(),
        soil: "clay".into(),
        area: None,
        stage: None,
      })
      .await
      .unwrap_err();
    assert_eq!(err.to_string(), "field required");
  }

  #[tokio::test]
  async fn test_weather_sends_location_and_caches() {
    let body = r#"{"temp": 30, "icon": "☀️", "description": "Sunny", "location": "Guntur",
      "humidity": 60, "wind": 10, "pressure": 1010, "forecast": [], "advisory": "Fine"}"#;
    let server = MockServer::start(vec![Route::json("GET", "/api/weather", 200, body)]).await;
    let (service, cache) = service(&server.url);

    let report = service.weather("Guntur").await.unwrap();
    assert_eq!(report.data.location, "Guntur");
    assert_eq!(server.requests()[0].target, "/api/weather?location=Guntur");
    assert!(cache
      .get::<WeatherReport>(&AdvisoryKey::for_weather("Guntur"))
      .unwrap()
      .is_some());

    service.weather("Guntur").await.unwrap();
    assert_eq!(server.hits(), 1);
  }

  #[tokio::test]
  async fn test_disease_detection_is_not_cached() {
    let server =
      MockServer::start(vec![Route::json("POST", "/api/disease/detect", 200, DISEASE_BODY)]).await;
    let (service, _) = service(&server.url);

    let first = service.detect_disease(&leaf()).await.unwrap();
    service.detect_disease(&leaf()).await.unwrap();

    assert_eq!(server.hits(), 2);
    assert_eq!(first.source, DataSource::Network);
    assert_eq!(first.data.details, "Treatment: Tricyclazole\nDrain the field");
  }

  #[tokio::test]
  async fn test_disease_detection_falls_back_when_offline() {
    let (service, _) = service(&unreachable_url().await);
    let report = service.detect_disease(&leaf()).await.unwrap();
    assert!(report.is_estimated());
  }

  #[tokio::test]
  async fn test_disease_rejection_is_surfaced() {
    let server = MockServer::start(vec![Route::json(
      "POST",
      "/api/disease/detect",
      400,
      r#"{"detail":"Empty file uploaded."}"#,
    )])
    .await;
    let (service, _) = service(&server.url);
    let err = service.detect_disease(&leaf()).await.unwrap_err();
    assert_eq!(err.rejection(), Some("Empty file uploaded."));
  }

  #[test]
  fn test_keys_differ_per_domain() {
    assert_ne!(
      AdvisoryKey::for_weather("x").cache_hash(),
      AdvisoryKey::new("yield").field("location", "x").cache_hash()
    );
  }
}
