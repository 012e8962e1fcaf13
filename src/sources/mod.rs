//! Third-party content sources feeding the notification handlers.

mod tips;
mod weather;

pub use tips::{
    default_tip, parse_tip, trip_context, ChatTipGenerator, FallbackTipGenerator, Tip, TipGenerator,
    TripInfo,
};
pub use weather::{OpenWeatherClient, WeatherSource};
