mod admin;
mod disease;
mod fertilizer;
mod irrigation;
mod login;
mod weather;
mod yields;

#[cfg(test)]
pub(crate) mod test_support;

pub use admin::AdminView;
pub use disease::DiseaseView;
pub use fertilizer::FertilizerView;
pub use irrigation::IrrigationView;
pub use login::LoginView;
pub use weather::WeatherView;
pub use yields::YieldView;
