//! Map/reduce orchestration for document summarization.
//!
//! Oversized documents are chunked and summarized piecewise, the partial
//! summaries are joined and reduced to a single summary, and reduce-phase
//! failures are recovered according to their classification: transient and
//! rate-limit failures get one delayed retry, an oversized combined summary
//! is re-chunked by recursing into the whole controller, and anything else
//! aborts the run.

use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::pipeline::chunking::split_document;
use crate::summarization::{Summarize, SummarizeError};

/// Default per-request chunk budget, in characters.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 4000;

/// Default delay before retrying a transient service failure.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Fixed delay before retrying a rate-limited request.
pub const RATE_LIMIT_DELAY: Duration = Duration::from_secs(5);

/// Tuning knobs for [`reduce`].
#[derive(Debug, Clone)]
pub struct ReduceOptions {
    /// Maximum characters submitted to the service in one request.
    pub max_chunk_size: usize,
    /// Delay before the single retry of a transient service failure.
    pub retry_delay: Duration,
    /// Delay before the single retry of a rate-limited request.
    pub rate_limit_delay: Duration,
}

impl Default for ReduceOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            retry_delay: DEFAULT_RETRY_DELAY,
            rate_limit_delay: RATE_LIMIT_DELAY,
        }
    }
}

impl ReduceOptions {
    /// Build options from configuration, clamping the chunk budget to at
    /// least one character.
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_chunk_size: config
                .max_chunk_size
                .unwrap_or(DEFAULT_MAX_CHUNK_SIZE)
                .max(1),
            retry_delay: config
                .retry_delay_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_RETRY_DELAY),
            rate_limit_delay: RATE_LIMIT_DELAY,
        }
    }
}

/// Reduce `text` to a single summary through the given client.
///
/// Inputs over the chunk budget are split and summarized chunk by chunk, in
/// order, before the combined result is reduced; inputs within the budget are
/// reduced directly. Map-phase calls are not retried; only the final reduce
/// call is protected by the recovery policy, and a retry that fails again
/// propagates whatever error it produced.
pub fn reduce<S: Summarize>(
    text: &str,
    client: &S,
    options: &ReduceOptions,
) -> Result<String, SummarizeError> {
    let combined = if text.chars().count() > options.max_chunk_size {
        let chunks = split_document(text, options.max_chunk_size);
        tracing::debug!(chunk_count = chunks.len(), "Summarizing document in chunks");
        let mut partials = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            partials.push(client.summarize(chunk)?);
        }
        partials.join(" ")
    } else {
        text.to_string()
    };

    match client.summarize(&combined) {
        Ok(summary) => Ok(summary),
        Err(SummarizeError::ServerError(reason)) => {
            tracing::warn!(%reason, "Summarization service error; retrying once after delay");
            thread::sleep(options.retry_delay);
            client.summarize(&combined)
        }
        Err(SummarizeError::RateLimited(reason)) => {
            tracing::warn!(%reason, "Rate limited; retrying once after delay");
            thread::sleep(options.rate_limit_delay);
            client.summarize(&combined)
        }
        Err(SummarizeError::RequestTooLarge(reason)) => {
            tracing::debug!(%reason, "Combined summary over budget; re-chunking");
            reduce(&combined, client, options)
        }
        Err(error) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Instant;

    struct ScriptedSummarizer {
        responses: RefCell<VecDeque<Result<String, SummarizeError>>>,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedSummarizer {
        fn new(responses: Vec<Result<String, SummarizeError>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl Summarize for ScriptedSummarizer {
        fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
            self.calls.borrow_mut().push(text.to_string());
            self.responses
                .borrow_mut()
                .pop_front()
                .expect("summarizer script exhausted")
        }
    }

    fn fast_options(max_chunk_size: usize) -> ReduceOptions {
        ReduceOptions {
            max_chunk_size,
            retry_delay: Duration::from_millis(20),
            rate_limit_delay: Duration::from_millis(20),
        }
    }

    #[test]
    fn short_input_skips_map_phase() {
        let client = ScriptedSummarizer::new(vec![Ok("done".into())]);

        let summary = reduce("short text", &client, &fast_options(4000)).expect("summary");

        assert_eq!(summary, "done");
        // No partial summarization happened; the original text was reduced.
        assert_eq!(client.calls(), vec!["short text".to_string()]);
    }

    #[test]
    fn long_input_is_mapped_in_order_then_reduced() {
        let client = ScriptedSummarizer::new(vec![
            Ok("one".into()),
            Ok("two".into()),
            Ok("three".into()),
            Ok("final".into()),
        ]);

        let summary =
            reduce("alpha beta gamma delta epsilon", &client, &fast_options(16)).expect("summary");

        assert_eq!(summary, "final");
        let calls = client.calls();
        assert_eq!(
            calls,
            vec![
                "alpha beta".to_string(),
                "gamma delta".to_string(),
                "epsilon".to_string(),
                "one two three".to_string(),
            ]
        );
    }

    #[test]
    fn transient_failure_is_retried_once_after_delay() {
        let client = ScriptedSummarizer::new(vec![
            Err(SummarizeError::ServerError("503".into())),
            Ok("recovered".into()),
        ]);
        let options = fast_options(4000);

        let started = Instant::now();
        let summary = reduce("short", &client, &options).expect("summary");

        assert_eq!(summary, "recovered");
        assert_eq!(client.calls().len(), 2);
        assert!(started.elapsed() >= options.retry_delay);
    }

    #[test]
    fn second_transient_failure_is_fatal() {
        let client = ScriptedSummarizer::new(vec![
            Err(SummarizeError::ServerError("503".into())),
            Err(SummarizeError::ServerError("503 again".into())),
        ]);

        let error = reduce("short", &client, &fast_options(4000)).expect_err("fatal");

        assert!(matches!(error, SummarizeError::ServerError(_)));
        assert_eq!(client.calls().len(), 2);
    }

    #[test]
    fn rate_limit_is_retried_once_after_fixed_delay() {
        let client = ScriptedSummarizer::new(vec![
            Err(SummarizeError::RateLimited("quota".into())),
            Ok("recovered".into()),
        ]);
        let options = fast_options(4000);

        let started = Instant::now();
        let summary = reduce("short", &client, &options).expect("summary");

        assert_eq!(summary, "recovered");
        assert_eq!(client.calls().len(), 2);
        assert!(started.elapsed() >= options.rate_limit_delay);
    }

    #[test]
    fn too_large_combined_summary_reenters_the_controller() {
        let client = ScriptedSummarizer::new(vec![
            Ok("aa".into()),
            Ok("bb".into()),
            Ok("cc".into()),
            Err(SummarizeError::RequestTooLarge("context length".into())),
            Ok("tiny".into()),
        ]);

        let summary =
            reduce("alpha beta gamma delta epsilon", &client, &fast_options(16)).expect("summary");

        assert_eq!(summary, "tiny");
        let calls = client.calls();
        // The whole controller re-runs on the combined string, not a bare
        // retry of the failed request: the recursion re-evaluates the size
        // check and reduces the same combined text again.
        assert_eq!(calls.len(), 5);
        assert_eq!(calls[3], "aa bb cc");
        assert_eq!(calls[4], "aa bb cc");
    }

    #[test]
    fn invalid_requests_fail_without_retry() {
        let client = ScriptedSummarizer::new(vec![Err(SummarizeError::Api(
            "401: Invalid API Key".into(),
        ))]);

        let error = reduce("short", &client, &fast_options(4000)).expect_err("fatal");

        assert!(matches!(error, SummarizeError::Api(_)));
        assert_eq!(client.calls().len(), 1);
    }

    #[test]
    fn map_phase_failures_propagate_unretried() {
        let client =
            ScriptedSummarizer::new(vec![Err(SummarizeError::ServerError("503".into()))]);

        let error = reduce("alpha beta gamma delta epsilon", &client, &fast_options(16))
            .expect_err("fatal");

        assert!(matches!(error, SummarizeError::ServerError(_)));
        // Only the first chunk was attempted; no retry, no further chunks.
        assert_eq!(client.calls(), vec!["alpha beta".to_string()]);
    }
}
