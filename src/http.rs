use std::thread;
use std::time::Duration;

fn should_retry_http_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..=599).contains(&status)
}

pub(crate) struct FetchConfig {
    pub(crate) connect_timeout: Duration,
    pub(crate) read_timeout: Duration,
    pub(crate) attempts: usize,
    pub(crate) retry_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            attempts: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

pub(crate) fn get_text_with_retries(
    url: &str,
    query: &[(String, String)],
    config: &FetchConfig,
) -> Result<String, String> {
    let attempts = config.attempts.max(1);
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(config.connect_timeout)
        .timeout_read(config.read_timeout)
        .timeout_write(config.read_timeout)
        .build();

    for attempt in 1..=attempts {
        let mut request = agent.get(url);
        for (key, value) in query {
            request = request.query(key, value);
        }

        match request.call() {
            Ok(response) => match response.into_string() {
                Ok(body) => return Ok(body),
                Err(err) => {
                    return Err(format!("request failed: response decode failed: {err}"));
                }
            },
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                let body = body.trim();
                let detail = if body.is_empty() {
                    format!("HTTP status {status}")
                } else {
                    let truncated = body.chars().take(240).collect::<String>();
                    format!("HTTP status {status} ({truncated})")
                };

                if !should_retry_http_status(status) {
                    return Err(format!("request failed: {detail}"));
                }
                if attempt == attempts {
                    return Err(format!(
                        "request failed after {attempts} attempt(s): {detail}"
                    ));
                }
                thread::sleep(config.retry_delay);
            }
            Err(ureq::Error::Transport(err)) => {
                if attempt == attempts {
                    return Err(format!(
                        "request failed after {attempts} attempt(s): transport error: {err}"
                    ));
                }
                thread::sleep(config.retry_delay);
            }
        }
    }

    Err("request failed: exhausted attempts without a concrete error".to_string())
}
