use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{PushConfig, Settings};
use crate::credentials::{CachedTokenSource, CredentialExchanger, SigningIdentity, TokenSource};
use crate::email::{DisabledEmailSender, EmailSender, ResendSender};
use crate::error::ConfigurationError;
use crate::notification::{DispatcherConfig, FanoutDispatcher, FcmProvider};
use crate::sources::{ChatTipGenerator, FallbackTipGenerator, OpenWeatherClient, TipGenerator, WeatherSource};
use crate::store::{create_recipient_store, RecipientStore};

/// Timeout for weather, tip and email API calls
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn RecipientStore>,
    /// Push pipeline, or why it could not be built
    push: Result<Arc<FanoutDispatcher>, ConfigurationError>,
    pub weather: Option<Arc<dyn WeatherSource>>,
    pub tips: Arc<dyn TipGenerator>,
    pub email: Arc<dyn EmailSender>,
    pub start_time: Instant,
}

impl AppState {
    /// Wire every component from configuration. Missing credentials leave
    /// the matching endpoints failing with a configuration error instead of
    /// aborting startup.
    pub fn new(settings: Settings) -> Self {
        let store = create_recipient_store(&settings.database);

        let push = build_push_dispatcher(&settings.push);
        match &push {
            Ok(_) => tracing::info!(
                fcm_base_url = %settings.push.fcm_base_url,
                token_cache = settings.push.token_cache,
                "Push pipeline ready"
            ),
            Err(e) => tracing::warn!(error = %e, "Push pipeline disabled"),
        }

        let weather = non_empty(&settings.weather.api_key).and_then(|key| {
            match OpenWeatherClient::new(&settings.weather.base_url, key, UPSTREAM_TIMEOUT) {
                Ok(client) => Some(Arc::new(client) as Arc<dyn WeatherSource>),
                Err(e) => {
                    tracing::warn!(error = %e, "Weather client unavailable");
                    None
                }
            }
        });

        let tips: Arc<dyn TipGenerator> = match non_empty(&settings.tips.api_key) {
            Some(key) => match ChatTipGenerator::new(
                &settings.tips.base_url,
                key,
                settings.tips.model.clone(),
                UPSTREAM_TIMEOUT,
            ) {
                Ok(generator) => Arc::new(generator),
                Err(e) => {
                    tracing::warn!(error = %e, "Tip model client unavailable, using built-in tips");
                    Arc::new(FallbackTipGenerator)
                }
            },
            None => {
                tracing::info!("No tip model key configured, using built-in tips");
                Arc::new(FallbackTipGenerator)
            }
        };

        let email: Arc<dyn EmailSender> = match non_empty(&settings.email.api_key) {
            Some(key) => match ResendSender::new(
                &settings.email.base_url,
                key,
                settings.email.from.clone(),
                UPSTREAM_TIMEOUT,
            ) {
                Ok(sender) => Arc::new(sender),
                Err(e) => {
                    tracing::warn!(error = %e, "Email client unavailable");
                    Arc::new(DisabledEmailSender)
                }
            },
            None => {
                tracing::warn!("No email API key configured, support emails will not be sent");
                Arc::new(DisabledEmailSender)
            }
        };

        Self {
            settings: Arc::new(settings),
            store,
            push,
            weather,
            tips,
            email,
            start_time: Instant::now(),
        }
    }

    /// State with only a store; push unconfigured, no weather source,
    /// built-in tips and no email delivery.
    pub fn with_store(settings: Settings, store: Arc<dyn RecipientStore>) -> Self {
        Self {
            settings: Arc::new(settings),
            store,
            push: Err(ConfigurationError::MissingSigningKey),
            weather: None,
            tips: Arc::new(FallbackTipGenerator),
            email: Arc::new(DisabledEmailSender),
            start_time: Instant::now(),
        }
    }

    pub fn with_push(mut self, dispatcher: Arc<FanoutDispatcher>) -> Self {
        self.push = Ok(dispatcher);
        self
    }

    pub fn with_weather(mut self, weather: Arc<dyn WeatherSource>) -> Self {
        self.weather = Some(weather);
        self
    }

    pub fn with_tips(mut self, tips: Arc<dyn TipGenerator>) -> Self {
        self.tips = tips;
        self
    }

    pub fn with_email(mut self, email: Arc<dyn EmailSender>) -> Self {
        self.email = email;
        self
    }

    /// The push dispatcher, or the configuration problem that disabled it
    pub fn push_dispatcher(&self) -> Result<Arc<FanoutDispatcher>, ConfigurationError> {
        self.push.clone()
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_ref()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Service account -> signing identity -> (cached) exchanger -> FCM provider
fn build_push_dispatcher(config: &PushConfig) -> Result<Arc<FanoutDispatcher>, ConfigurationError> {
    let account = config.service_account()?;
    let timeout = Duration::from_millis(config.delivery_timeout_ms);

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigurationError::HttpClient(e.to_string()))?;

    let identity =
        SigningIdentity::from_service_account(&account, &config.scope, config.token_endpoint.as_deref());
    let exchanger = Arc::new(CredentialExchanger::new(identity, client.clone()));
    let tokens: Arc<dyn TokenSource> = if config.token_cache {
        Arc::new(CachedTokenSource::new(exchanger))
    } else {
        exchanger
    };

    let provider = FcmProvider::with_client(client, &config.fcm_base_url, &account.project_id);

    Ok(Arc::new(FanoutDispatcher::with_config(
        tokens,
        Arc::new(provider),
        DispatcherConfig {
            max_concurrent_deliveries: config.max_concurrent_deliveries,
            delivery_timeout: timeout,
        },
    )))
}
