//! Webhook delivery: Telegram POSTs each update to `/bot{token}`.

use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Router,
        body::Bytes,
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::post,
    },
    secrecy::{ExposeSecret, Secret},
    teloxide::{
        prelude::*,
        types::{AllowedUpdate, Update},
    },
    tokio_util::{sync::CancellationToken, task::TaskTracker},
    tracing::{debug, info, warn},
};

use {courier_auto_reply::Dispatcher, courier_config::CourierConfig};

use crate::{Result, error::Error, handlers};

/// Header Telegram uses to echo the secret registered with `setWebhook`.
pub const SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Everything needed to serve the webhook endpoint.
pub struct WebhookSettings {
    pub bind: String,
    pub port: u16,
    pub public_base_url: String,
    pub token: Secret<String>,
    pub secret: Option<Secret<String>>,
}

impl WebhookSettings {
    pub fn from_config(config: &CourierConfig) -> Result<Self> {
        let public_base_url = config
            .server
            .webhook_base_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .ok_or(Error::MissingWebhookUrl)?;
        Ok(Self {
            bind: config.server.bind.clone(),
            port: config.server.port,
            public_base_url,
            token: config.telegram.token.clone(),
            secret: config.telegram.webhook_secret.clone(),
        })
    }

    /// Public URL registered with Telegram.
    pub fn public_url(&self) -> Result<reqwest::Url> {
        let raw = format!(
            "{}/bot{}",
            self.public_base_url.trim_end_matches('/'),
            self.token.expose_secret()
        );
        reqwest::Url::parse(&raw).map_err(|e| Error::InvalidWebhookUrl {
            url: self.public_base_url.clone(),
            reason: e.to_string(),
        })
    }

    fn listen_addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.bind, self.port);
        addr.parse().map_err(|e: std::net::AddrParseError| Error::InvalidListenAddr {
            reason: e.to_string(),
            addr,
        })
    }
}

#[derive(Clone)]
struct WebhookState {
    /// Expected path segment, `bot{token}`.
    segment: Arc<str>,
    secret: Option<Arc<str>>,
    dispatcher: Arc<Dispatcher>,
    tracker: TaskTracker,
}

/// Router serving `POST /bot{token}`; handler tasks are spawned on `tracker`.
pub fn router(
    token: &str,
    secret: Option<&str>,
    dispatcher: Arc<Dispatcher>,
    tracker: TaskTracker,
) -> Router {
    let state = WebhookState {
        segment: format!("bot{token}").into(),
        secret: secret.filter(|s| !s.is_empty()).map(Into::into),
        dispatcher,
        tracker,
    };
    Router::new()
        .route("/{segment}", post(handle_update))
        .with_state(state)
}

async fn handle_update(
    State(state): State<WebhookState>,
    Path(segment): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if segment != *state.segment {
        return StatusCode::NOT_FOUND;
    }

    if let Some(expected) = &state.secret {
        let given = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if given != Some(expected.as_ref()) {
            warn!("webhook call with missing or wrong secret token");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "webhook body is not a telegram update");
            return StatusCode::BAD_REQUEST;
        },
    };

    debug!(update_id = update.id.0, "webhook update received");
    handlers::spawn_update(&state.dispatcher, &state.tracker, update);
    StatusCode::OK
}

/// Register the webhook with Telegram and serve it until `cancel` fires.
///
/// After the listener stops, handlers that are still running get
/// [`handlers::SHUTDOWN_GRACE`] to finish.
pub async fn run_webhook(
    bot: Bot,
    dispatcher: Arc<Dispatcher>,
    settings: WebhookSettings,
    cancel: CancellationToken,
) -> Result<()> {
    let url = settings.public_url()?;
    let mut request = bot
        .set_webhook(url)
        .allowed_updates(vec![AllowedUpdate::Message]);
    if let Some(secret) = &settings.secret {
        request = request.secret_token(secret.expose_secret().clone());
    }
    request.send().await?;
    info!(base_url = %settings.public_base_url, "telegram webhook registered");

    let addr = settings.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "webhook listener started");

    let tracker = TaskTracker::new();
    let app = router(
        settings.token.expose_secret(),
        settings.secret.as_ref().map(|s| s.expose_secret().as_str()),
        dispatcher,
        tracker.clone(),
    );
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await;
    handlers::drain(&tracker, handlers::SHUTDOWN_GRACE).await;
    info!("webhook listener stopped");
    served?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            handlers::tests::{dispatcher_for, user_message_json},
            mock_api::MockServer,
        },
        courier_config::{ServerConfig, TelegramConfig},
        serde_json::json,
    };

    struct Endpoint {
        base: String,
        client: reqwest::Client,
        cancel: CancellationToken,
    }

    async fn serve(app: Router) -> Endpoint {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let shutdown = cancel.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown.cancelled_owned())
                .await
                .unwrap();
        });
        Endpoint {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            cancel,
        }
    }

    fn update_body() -> String {
        json!({
            "update_id": 7,
            "message": user_message_json(5, 1001, json!({ "text": "Hello" }))
        })
        .to_string()
    }

    #[tokio::test]
    async fn accepted_update_is_dispatched() {
        let server = MockServer::start().await;
        let (dispatcher, _) = dispatcher_for(&server).await;
        let app = router("123:ABC", Some("s3cret"), dispatcher, TaskTracker::new());
        let endpoint = serve(app).await;

        let resp = endpoint
            .client
            .post(format!("{}/bot123:ABC", endpoint.base))
            .header(SECRET_HEADER, "s3cret")
            .header("content-type", "application/json")
            .body(update_body())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let forwards = server.api.wait_for("ForwardMessage", 1).await;
        assert_eq!(forwards.len(), 1);
        endpoint.cancel.cancel();
    }

    #[tokio::test]
    async fn rejects_bad_requests() {
        let server = MockServer::start().await;
        let (dispatcher, _) = dispatcher_for(&server).await;
        let app = router("123:ABC", Some("s3cret"), dispatcher, TaskTracker::new());
        let endpoint = serve(app).await;

        let wrong_path = endpoint
            .client
            .post(format!("{}/bot999:XYZ", endpoint.base))
            .header(SECRET_HEADER, "s3cret")
            .body(update_body())
            .send()
            .await
            .unwrap();
        assert_eq!(wrong_path.status(), reqwest::StatusCode::NOT_FOUND);

        let no_secret = endpoint
            .client
            .post(format!("{}/bot123:ABC", endpoint.base))
            .body(update_body())
            .send()
            .await
            .unwrap();
        assert_eq!(no_secret.status(), reqwest::StatusCode::UNAUTHORIZED);

        let wrong_secret = endpoint
            .client
            .post(format!("{}/bot123:ABC", endpoint.base))
            .header(SECRET_HEADER, "guess")
            .body(update_body())
            .send()
            .await
            .unwrap();
        assert_eq!(wrong_secret.status(), reqwest::StatusCode::UNAUTHORIZED);

        let bad_json = endpoint
            .client
            .post(format!("{}/bot123:ABC", endpoint.base))
            .header(SECRET_HEADER, "s3cret")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(bad_json.status(), reqwest::StatusCode::BAD_REQUEST);

        assert!(server.api.calls("ForwardMessage").is_empty());
        endpoint.cancel.cancel();
    }

    #[tokio::test]
    async fn no_secret_configured_accepts_any_header() {
        let server = MockServer::start().await;
        let (dispatcher, _) = dispatcher_for(&server).await;
        let app = router("123:ABC", None, dispatcher, TaskTracker::new());
        let endpoint = serve(app).await;

        let resp = endpoint
            .client
            .post(format!("{}/bot123:ABC", endpoint.base))
            .body(update_body())
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        endpoint.cancel.cancel();
    }

    #[test]
    fn settings_require_base_url() {
        let config = CourierConfig::default();
        assert!(matches!(
            WebhookSettings::from_config(&config),
            Err(Error::MissingWebhookUrl)
        ));

        let config = CourierConfig {
            telegram: TelegramConfig {
                token: Secret::new("123:ABC".into()),
                ..Default::default()
            },
            server: ServerConfig {
                webhook_base_url: Some("https://relay.example.com/".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let settings = WebhookSettings::from_config(&config).unwrap();
        assert_eq!(
            settings.public_url().unwrap().as_str(),
            "https://relay.example.com/bot123:ABC"
        );
        assert_eq!(settings.listen_addr().unwrap().port(), 8080);
    }

    #[tokio::test]
    async fn run_webhook_registers_url_with_secret() {
        let server = MockServer::start().await;
        let (dispatcher, _) = dispatcher_for(&server).await;
        let settings = WebhookSettings {
            bind: "127.0.0.1".into(),
            port: 0,
            public_base_url: "https://relay.example.com".into(),
            token: Secret::new("123:ABC".into()),
            secret: Some(Secret::new("s3cret".into())),
        };
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run_webhook(server.bot.clone(), dispatcher, settings, cancel.clone()));

        let calls = server.api.wait_for("SetWebhook", 1).await;
        assert_eq!(calls[0]["url"], "https://relay.example.com/bot123:ABC");
        assert_eq!(calls[0]["secret_token"], "s3cret");

        cancel.cancel();
        task.await.unwrap().unwrap();
    }
}
