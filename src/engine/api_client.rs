use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::engine::protocol::{ActionReply, ApiError, GameAction, Method};

/// Network seam between the engine worker and the game server.
pub trait GameApi {
    fn execute(&self, action: &GameAction) -> Result<ActionReply, ApiError>;
}

/// Blocking HTTP client keeping the server session cookie between calls.
pub struct HttpGameApi {
    client: Client,
    base_url: String,
    jar: Arc<Jar>,
    origin: Url,
}

impl HttpGameApi {
    /// `session` is a `Cookie` header value saved by an earlier run, e.g. `session=abc`.
    pub fn new(base_url: impl Into<String>, session: Option<&str>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let origin = Url::parse(&base_url)
            .with_context(|| format!("invalid server url {base_url}"))?;

        let jar = Arc::new(Jar::default());
        if let Some(session) = session {
            for pair in session.split(';').map(str::trim).filter(|p| !p.is_empty()) {
                jar.add_cookie_str(pair, &origin);
            }
            info!("restored saved server session");
        }

        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(Option::<Duration>::None)
            .build()?;

        Ok(Self {
            client,
            base_url,
            jar,
            origin,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Current session cookies for the server, as a `Cookie` header value.
    pub fn session(&self) -> Option<String> {
        self.jar
            .cookies(&self.origin)
            .and_then(|v| v.to_str().ok().map(str::to_string))
            .filter(|v| !v.is_empty())
    }
}

impl GameApi for HttpGameApi {
    fn execute(&self, action: &GameAction) -> Result<ActionReply, ApiError> {
        let url = self.url(action.path());
        debug!(%url, kind = ?action.kind(), "sending request");

        let request = match (action.method(), action) {
            (Method::Get, _) => self.client.get(&url),
            (Method::PostForm, GameAction::StartGame(form)) => self.client.post(&url).form(&form.fields()),
            (_, _) => match action.body() {
                Some(body) => self.client.post(&url).json(&body),
                None => self.client.post(&url),
            },
        };

        let response = request
            .send()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        debug!(%url, status = status.as_u16(), "reply received");

        if let GameAction::StartGame(_) = action {
            // The server answers the form with a redirect: `/game` on
            // success, back to `/` when it refused the setup.
            let landed_on_game = response.url().path() == "/game";
            return if status.is_success() && landed_on_game {
                Ok(ActionReply {
                    message: Some("New colony founded.".to_string()),
                    session: self.session(),
                    ..Default::default()
                })
            } else {
                Err(ApiError::Rejected {
                    status: status.as_u16(),
                    message: "the server refused the new game setup".to_string(),
                })
            };
        }

        let text = response
            .text()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if !status.is_success() {
            let err = classify_failure(action, status.as_u16(), &body);
            warn!(%url, status = status.as_u16(), error = %err, "request rejected");
            return Err(err);
        }

        if body.is_null() {
            return Err(ApiError::Malformed("reply is not JSON".to_string()));
        }

        ActionReply::from_body(action, body)
    }
}

/// Maps a non-2xx reply to an error; 401/404 on a state fetch means the session is gone.
pub fn classify_failure(action: &GameAction, status: u16, body: &Value) -> ApiError {
    if matches!(action, GameAction::FetchState) && matches!(status, 401 | 404) {
        return ApiError::SessionExpired { status };
    }

    let message = body
        .get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("request failed")
                .to_string()
        });

    ApiError::Rejected { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::protocol::{CharacterChoice, NewGameForm};
    use serde_json::json;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    struct Captured {
        request_line: String,
        headers: Vec<String>,
        body: String,
    }

    impl Captured {
        fn header(&self, name: &str) -> Option<&str> {
            let prefix = format!("{name}:");
            self.headers
                .iter()
                .find(|h| h.to_ascii_lowercase().starts_with(&prefix))
                .map(|h| h[prefix.len()..].trim())
        }
    }

    /// One canned reply per connection: status line, extra header lines, body.
    type Canned = (&'static str, &'static str, &'static str);

    /// Serves the replies in order, one connection each, and hands back what was asked.
    fn serve(replies: Vec<Canned>) -> (String, JoinHandle<Vec<Captured>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = std::thread::spawn(move || {
            let mut captured = Vec::new();
            for (status_line, extra_headers, body) in replies {
                let (stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());

                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();

                let mut headers = Vec::new();
                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    if line == "\r\n" || line.is_empty() {
                        break;
                    }
                    let line = line.trim_end().to_string();
                    if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                        content_length = v.trim().parse().unwrap();
                    }
                    headers.push(line);
                }
                let mut request_body = vec![0u8; content_length];
                reader.read_exact(&mut request_body).unwrap();

                let mut stream = stream;
                write!(
                    stream,
                    "HTTP/1.1 {status_line}\r\n{extra_headers}Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .unwrap();
                stream.flush().unwrap();

                captured.push(Captured {
                    request_line: request_line.trim().to_string(),
                    headers,
                    body: String::from_utf8(request_body).unwrap(),
                });
            }
            captured
        });

        (base, handle)
    }

    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<Vec<Captured>>) {
        serve(vec![(status_line, "", body)])
    }

    #[test]
    fn state_fetch_401_is_session_expiry() {
        let (base, server) = serve_once("401 Unauthorized", r#"{"error":"Not authenticated"}"#);
        let api = HttpGameApi::new(base, None).unwrap();

        let err = api.execute(&GameAction::FetchState).unwrap_err();

        assert_eq!(err, ApiError::SessionExpired { status: 401 });
        let requests = server.join().unwrap();
        assert!(requests[0].request_line.starts_with("GET /api/game_state"));
        assert_eq!(requests[0].header("cookie"), None);
    }

    #[test]
    fn saved_session_is_sent_by_a_fresh_client() {
        let (base, server) = serve_once("200 OK", r#"{"current_turn":12}"#);
        let api = HttpGameApi::new(base, Some("session=eyJwbGF5ZXIiOiJwMSJ9")).unwrap();

        let reply = api.execute(&GameAction::FetchState).unwrap();

        assert_eq!(reply.state, Some(json!({ "current_turn": 12 })));
        let requests = server.join().unwrap();
        assert_eq!(requests[0].header("cookie"), Some("session=eyJwbGF5ZXIiOiJwMSJ9"));
    }

    #[test]
    fn new_game_redirect_hands_back_the_session() {
        let (base, server) = serve(vec![
            (
                "302 Found",
                "Location: /game\r\nSet-Cookie: session=fresh123; Path=/; HttpOnly\r\n",
                "",
            ),
            ("200 OK", "", "<html></html>"),
        ]);
        let api = HttpGameApi::new(base, None).unwrap();
        let form = NewGameForm {
            player_name: "Ares".into(),
            faction_id: "MUSK_CORP".into(),
            choice: CharacterChoice::Predefined("commander_shepard".into()),
        };

        let reply = api.execute(&GameAction::StartGame(form)).unwrap();

        assert_eq!(reply.session.as_deref(), Some("session=fresh123"));
        assert_eq!(api.session().as_deref(), Some("session=fresh123"));
        let requests = server.join().unwrap();
        assert!(requests[0].request_line.starts_with("POST /start_game"));
        assert!(requests[0].body.contains("character_selection=commander_shepard"));
        assert!(requests[1].request_line.starts_with("GET /game"));
        assert_eq!(requests[1].header("cookie"), Some("session=fresh123"));
    }

    #[test]
    fn refused_new_game_is_a_rejection() {
        let (base, server) = serve(vec![
            ("302 Found", "Location: /\r\n", ""),
            ("200 OK", "", "<html></html>"),
        ]);
        let api = HttpGameApi::new(base, None).unwrap();

        let err = api
            .execute(&GameAction::StartGame(NewGameForm::default()))
            .unwrap_err();

        assert!(matches!(err, ApiError::Rejected { .. }));
        server.join().unwrap();
    }

    #[test]
    fn rejection_carries_server_error_text() {
        let (base, server) = serve_once("400 Bad Request", r#"{"error":"Not enough Energia"}"#);
        let api = HttpGameApi::new(format!("{base}/"), None).unwrap();

        let action = GameAction::Build { blueprint_id: "SolarArrayMk1".into(), q: 1, r: 0 };
        let err = api.execute(&action).unwrap_err();

        assert_eq!(
            err,
            ApiError::Rejected { status: 400, message: "Not enough Energia".into() }
        );
        let requests = server.join().unwrap();
        assert!(requests[0].request_line.starts_with("POST /api/action/build"));
        let sent: Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(sent, json!({ "blueprint_id": "SolarArrayMk1", "q": 1, "r": 0 }));
    }

    #[test]
    fn successful_reply_is_decoded() {
        let (base, server) = serve_once(
            "200 OK",
            r#"{"game_state":{"current_turn":8},"event_messages":["Supply drop"]}"#,
        );
        let api = HttpGameApi::new(base, None).unwrap();

        let reply = api.execute(&GameAction::AdvanceTurn).unwrap();

        assert_eq!(reply.state, Some(json!({ "current_turn": 8 })));
        assert_eq!(reply.event_messages, vec!["Supply drop".to_string()]);
        server.join().unwrap();
    }

    #[test]
    fn unreachable_server_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let api = HttpGameApi::new(base, None).unwrap();
        assert!(matches!(api.execute(&GameAction::FetchState), Err(ApiError::Network(_))));
    }

    #[test]
    fn non_fetch_404_is_a_plain_rejection() {
        let err = classify_failure(&GameAction::AdvanceTurn, 404, &Value::Null);
        assert_eq!(err, ApiError::Rejected { status: 404, message: "Not Found".into() });
    }
}
