//! Outside-world lookups for the character: currently the weather.

pub mod source;
pub mod weather;

pub use source::validate_url;
pub use weather::{OpenWeatherSource, StaticWeather};
