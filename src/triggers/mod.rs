mod http;

pub use http::{
    check_weather, daily_tip, send_push, support_email, DailyTipRequest, DailyTipResponse,
    PushContent, PushErrorBody, SendPushRequest, SendPushResponse, SupportEmailRequest,
    SupportEmailResponse, WeatherCheckResponse,
};
