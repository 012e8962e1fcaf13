mod settings;

pub use settings::{
    ApiConfig, DatabaseConfig, EmailConfig, LogConfig, LogFormat, OtelConfig, PushConfig,
    ServerConfig, ServiceAccount, Settings, TipsConfig, WeatherConfig,
};
