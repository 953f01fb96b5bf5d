use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bench_api::util::now_secs_f64;
use bench_api::{BackendError, MetricSample, MetricSource};

/// Prometheus `MetricSource`.
///
/// Evaluates queries through the HTTP instant-query endpoint
/// (`/api/v1/query`) at the current time. Range queries are not used.
pub struct PrometheusSource {
    http: reqwest::Client,
    base_url: String,
}

impl PrometheusSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::config(format!("HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn exec(&self, query: &str) -> Result<Vec<MetricSample>, BackendError> {
        let endpoint = format!("{}/api/v1/query", self.base_url);
        let time = format!("{:.3}", now_secs_f64());
        let resp = self
            .http
            .get(&endpoint)
            .query(&[("query", query), ("time", time.as_str())])
            .send()
            .await
            .map_err(|e| BackendError::io(format!("prometheus request: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| BackendError::io(format!("prometheus read: {e}")))?;
        tracing::trace!(%status, body = %body, "prometheus response");

        // Prometheus answers 400/422/503 with a JSON error envelope; prefer its
        // message over the bare status when it parses.
        match parse_query_response(&body) {
            Ok(samples) if status.is_success() => Ok(samples),
            Ok(_) => Err(BackendError::protocol(format!("prometheus returned {status}"))),
            Err(e) if status.is_success() => Err(e),
            Err(e) => Err(e.with_context(format!("prometheus returned {status}"))),
        }
    }
}

impl MetricSource for PrometheusSource {
    fn query_instant<'a>(
        &'a self,
        query: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<MetricSample>, BackendError>> + Send + 'a>> {
        Box::pin(self.exec(query))
    }
}

// ═══════════════════════════════════════════════════════════════
//  Response model
// ═══════════════════════════════════════════════════════════════

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    status: String,
    #[serde(default)]
    data: Option<QueryData>,
    #[serde(default)]
    error_type: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryData {
    result_type: String,
    result: serde_json::Value,
}

/// Element of an instant vector: `{"metric": {...}, "value": [ts, "v"]}`.
#[derive(serde::Deserialize)]
struct VectorElement {
    value: (f64, String),
}

/// Parse the body of an instant query into samples.
///
/// A `vector` yields one sample per series, a `scalar` exactly one.
pub fn parse_query_response(body: &str) -> Result<Vec<MetricSample>, BackendError> {
    let resp: QueryResponse = serde_json::from_str(body)
        .map_err(|e| BackendError::format_err(format!("prometheus response: {e}")))?;

    if resp.status != "success" {
        return Err(BackendError::protocol(format!(
            "prometheus query failed ({}): {}",
            resp.error_type.as_deref().unwrap_or("unknown"),
            resp.error.as_deref().unwrap_or("no error message"),
        )));
    }

    let data = resp
        .data
        .ok_or_else(|| BackendError::protocol("prometheus response missing data"))?;

    match data.result_type.as_str() {
        "vector" => {
            let elements: Vec<VectorElement> = serde_json::from_value(data.result)
                .map_err(|e| BackendError::format_err(format!("prometheus vector: {e}")))?;
            elements
                .into_iter()
                .map(|el| sample(el.value.0, &el.value.1))
                .collect()
        }
        "scalar" => {
            let (ts, value): (f64, String) = serde_json::from_value(data.result)
                .map_err(|e| BackendError::format_err(format!("prometheus scalar: {e}")))?;
            Ok(vec![sample(ts, &value)?])
        }
        other => Err(BackendError::protocol(format!(
            "prometheus returned unsupported result type '{other}' for an instant query"
        ))),
    }
}

fn sample(timestamp: f64, value: &str) -> Result<MetricSample, BackendError> {
    let value = value
        .parse::<f64>()
        .map_err(|e| BackendError::format_err(format!("prometheus value '{value}': {e}")))?;
    Ok(MetricSample::new(timestamp, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_api::ErrorKind;

    #[test]
    fn empty_vector_has_no_samples() {
        let body = r#"{"status":"success","data":{"resultType":"vector","result":[]}}"#;
        assert!(parse_query_response(body).unwrap().is_empty());
    }

    #[test]
    fn vector_yields_one_sample_per_series() {
        let body = r#"{"status":"success","data":{"resultType":"vector","result":[
            {"metric":{"instance":"a"},"value":[1700000000.5,"100"]},
            {"metric":{"instance":"b"},"value":[1700000000.5,"7.25"]}
        ]}}"#;
        let samples = parse_query_response(body).unwrap();
        assert_eq!(
            samples,
            vec![
                MetricSample::new(1_700_000_000.5, 100.0),
                MetricSample::new(1_700_000_000.5, 7.25),
            ]
        );
    }

    #[test]
    fn scalar_yields_exactly_one_sample() {
        let body = r#"{"status":"success","data":{"resultType":"scalar","result":[1700000000,"42"]}}"#;
        assert_eq!(
            parse_query_response(body).unwrap(),
            vec![MetricSample::new(1_700_000_000.0, 42.0)]
        );
    }

    #[test]
    fn special_float_values_parse() {
        let body = r#"{"status":"success","data":{"resultType":"vector","result":[
            {"metric":{},"value":[1,"NaN"]}
        ]}}"#;
        assert!(parse_query_response(body).unwrap()[0].value.is_nan());
    }

    #[test]
    fn error_envelope_is_protocol_error() {
        let body = r#"{"status":"error","errorType":"bad_data","error":"parse error at char 3"}"#;
        let err = parse_query_response(body).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(err.message().contains("bad_data"));
        assert!(err.message().contains("parse error at char 3"));
    }

    #[test]
    fn matrix_is_rejected() {
        let body = r#"{"status":"success","data":{"resultType":"matrix","result":[]}}"#;
        assert_eq!(parse_query_response(body).unwrap_err().kind(), ErrorKind::Protocol);
    }

    #[test]
    fn garbage_is_format_error() {
        assert_eq!(parse_query_response("<html>").unwrap_err().kind(), ErrorKind::Format);
    }
}
