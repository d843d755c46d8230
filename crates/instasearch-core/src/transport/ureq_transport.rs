use crate::models::SearchError;
use crate::transport::{HttpGetRequest, HttpResponse, SearchTransport, TransportResult};

/// Blocking HTTP transport backed by a pooled `ureq` agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(ureq::AgentBuilder::new().build())
    }
}

impl UreqTransport {
    pub fn new(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl SearchTransport for UreqTransport {
    fn get(&self, request: &HttpGetRequest) -> TransportResult<HttpResponse> {
        let outcome = self
            .agent
            .get(&request.url)
            .timeout(request.timeout)
            .set("User-Agent", &request.user_agent)
            .call();

        let (status, response) = match outcome {
            Ok(response) => (response.status(), response),
            Err(ureq::Error::Status(status, response)) => (status, response),
            Err(ureq::Error::Transport(transport)) => {
                return Err(SearchError::transport(format!(
                    "search request to '{}' failed: {transport}",
                    request.url
                )));
            }
        };

        let body = response.into_string().map_err(|error| {
            SearchError::transport(format!(
                "failed to read search response body from '{}': {error}",
                request.url
            ))
        })?;

        Ok(HttpResponse { status, body })
    }
}
