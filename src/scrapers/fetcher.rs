use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE, REFERER};
use reqwest::{Client, ClientBuilder};
use tracing::{debug, warn};

use crate::config::SessionCredentials;
use crate::scrapers::traits::PageFetcher;
use crate::{Result, ScoutError};

const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANG_ZH: &str = "zh-CN,zh;q=0.9,en;q=0.8";

/// Markers of the verification page served instead of content
const BLOCK_MARKERS: [&str; 2] = ["访问验证", "请开启JavaScript"];

/// reqwest-backed fetcher carrying the session cookie on every request
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(credentials: &SessionCredentials, timeout: Duration) -> Result<Self> {
        Self::with_builder(Client::builder(), credentials, timeout)
    }

    fn with_builder(
        builder: ClientBuilder,
        credentials: &SessionCredentials,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANG_ZH));
        let cookie = HeaderValue::from_str(&credentials.cookie).map_err(|_| {
            ScoutError::Configuration("cookie contains characters not allowed in a header".to_string())
        })?;
        headers.insert(COOKIE, cookie);

        let client = builder
            .timeout(timeout)
            .user_agent(credentials.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|err| ScoutError::Configuration(format!("Failed to create HTTP client: {err}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, referer: Option<&str>) -> Result<String> {
        debug!("Fetching URL: {}", url);

        let mut request = self.client.get(url);
        if let Some(referer) = referer {
            request = request.header(REFERER, referer);
        }

        let response = request.send().await.map_err(|err| ScoutError::Fetch {
            url: url.to_string(),
            reason: err.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} returned status: {}", url, status);
            return Err(ScoutError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        let html = response.text().await?;
        debug!("Downloaded {} bytes of HTML", html.len());

        if is_blocked(&html) {
            return Err(ScoutError::Blocked { url: url.to_string() });
        }
        Ok(html)
    }

    async fn warm_up(&self, url: &str) {
        if let Err(err) = self.client.get(url).send().await {
            debug!("Warm-up request to {} failed: {}", url, err);
        }
    }
}

fn is_blocked(html: &str) -> bool {
    BLOCK_MARKERS.iter().any(|marker| html.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP/1.1 server answering by path and keeping every raw request
    async fn spawn_site() -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => buf.extend_from_slice(&chunk[..n]),
                    }
                }
                let request = String::from_utf8_lossy(&buf).to_string();
                let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
                seen.lock().unwrap().push(request);

                let (status, body) = match path.as_str() {
                    "/missing" => ("404 Not Found", "gone"),
                    "/captcha" => ("200 OK", "<title>人机访问验证</title>"),
                    _ => ("200 OK", r#"<ul class="sellListContent"><li>ok</li></ul>"#),
                };
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (base, requests)
    }

    fn local_fetcher() -> HttpFetcher {
        let creds = SessionCredentials {
            cookie: "lianjia_uuid=abc; lianjia_token=def".to_string(),
            user_agent: "scout-test/1.0".to_string(),
        };
        HttpFetcher::with_builder(Client::builder().no_proxy(), &creds, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetch_sends_session_headers_and_returns_html() {
        let (base, requests) = spawn_site().await;
        let fetcher = local_fetcher();
        let referer = format!("{base}/ershoufang/");

        let html = fetcher
            .fetch(&format!("{base}/ershoufang/pg1/"), Some(&referer))
            .await
            .unwrap();
        assert!(html.contains("sellListContent"));

        let request = requests.lock().unwrap()[0].to_ascii_lowercase();
        assert!(request.starts_with("get /ershoufang/pg1/ "));
        assert!(request.contains("cookie: lianjia_uuid=abc; lianjia_token=def\r\n"));
        assert!(request.contains("user-agent: scout-test/1.0\r\n"));
        assert!(request.contains(&format!("referer: {referer}\r\n")));
        assert!(request.contains("accept-language: zh-cn"));
    }

    #[tokio::test]
    async fn non_success_status_is_a_fetch_error() {
        let (base, _) = spawn_site().await;
        let url = format!("{base}/missing");

        let err = local_fetcher().fetch(&url, None).await.unwrap_err();
        match err {
            ScoutError::Fetch { url: failed, reason } => {
                assert_eq!(failed, url);
                assert!(reason.contains("404"), "{reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn verification_page_is_blocked() {
        let (base, _) = spawn_site().await;
        let err = local_fetcher()
            .fetch(&format!("{base}/captcha"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ScoutError::Blocked { .. }));
    }

    #[tokio::test]
    async fn warm_up_requests_the_origin_listing() {
        let (base, requests) = spawn_site().await;
        let fetcher = local_fetcher();

        fetcher.warm_up(&format!("{base}/ershoufang/")).await;
        fetcher.fetch(&format!("{base}/ershoufang/1.html"), None).await.unwrap();

        let seen = requests.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].starts_with("GET /ershoufang/ "));
        assert!(seen[0].to_ascii_lowercase().contains("cookie: lianjia_uuid=abc"));
        assert!(seen[1].starts_with("GET /ershoufang/1.html "));
    }

    #[test]
    fn detects_verification_page() {
        assert!(is_blocked("<title>人机访问验证</title>"));
        assert!(is_blocked("<p>请开启JavaScript并刷新该页</p>"));
        assert!(!is_blocked("<ul class=\"sellListContent\"></ul>"));
    }

    #[test]
    fn rejects_cookie_with_newline() {
        let creds = SessionCredentials {
            cookie: "a=1\nb=2".to_string(),
            user_agent: "UA".to_string(),
        };
        assert!(matches!(
            HttpFetcher::new(&creds, Duration::from_secs(1)),
            Err(ScoutError::Configuration(_))
        ));
    }

    #[test]
    fn builds_with_valid_credentials() {
        let creds = SessionCredentials {
            cookie: "lianjia_uuid=abc; lianjia_token=def".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
        };
        assert!(HttpFetcher::new(&creds, Duration::from_secs(1)).is_ok());
    }
}
