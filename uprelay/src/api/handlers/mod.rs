pub mod static_assets;
pub mod uploads;
