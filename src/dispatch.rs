//! Response dispatcher
//!
//! Every turn goes through [`Dispatcher::dispatch`]. Math is tried first and
//! answered locally. Anything else goes to the generator, gated by a cached
//! availability probe unless the policy says to always try.

use crate::availability::{AvailabilityState, Clock, SystemClock};
use crate::config::AssistantConfig;
use crate::history::History;
use crate::inference::{
    Generator, InferenceClient, InferenceError, LoggingGenerator, ReqwestTransport,
};
use crate::math::MathBackend;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use std::sync::Arc;
use std::time::Duration;

/// Reply used when the generator is known to be down
pub const UNAVAILABLE_REPLY: &str =
    "I'm sorry, I can only help with mathematical calculations. Please enter a math problem.";

/// Phrases a math answer can be wrapped in. `{}` is the value.
pub const MATH_TEMPLATES: &[&str] = &[
    "The answer is {}.",
    "It's definitely {}.",
    "That comes out to {}.",
    "I make it {}.",
    "{}, if my arithmetic is right.",
];

/// How non-math input reaches the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingPolicy {
    /// Check availability (cached per cooldown) and apologize when down
    #[default]
    ProbeThenRoute,
    /// Always attempt generation and let its retries handle failures
    MathFirstThenGenerate,
}

/// Which path produced a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Math,
    Generated,
    Unavailable,
}

/// Result of dispatching one input
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    /// History to pass into the next turn
    pub history: History,
    pub route: Route,
}

pub struct Dispatcher {
    math: Box<dyn MathBackend>,
    generator: Arc<dyn Generator>,
    clock: Arc<dyn Clock>,
    availability: AvailabilityState,
    policy: RoutingPolicy,
    templates: Option<Box<dyn RngCore + Send>>,
}

impl Dispatcher {
    pub fn new(math: Box<dyn MathBackend>, generator: Arc<dyn Generator>) -> Self {
        Self {
            math,
            generator,
            clock: Arc::new(SystemClock),
            availability: AvailabilityState::default(),
            policy: RoutingPolicy::default(),
            templates: None,
        }
    }

    /// Wire the HTTP inference client, logging and routing options from
    /// configuration.
    pub fn from_config(config: &AssistantConfig) -> Result<Self, InferenceError> {
        let transport = ReqwestTransport::new(&config.endpoint, config.api_token.clone())?;
        let client = InferenceClient::new(Arc::new(transport))
            .with_parameters(config.parameters)
            .with_retry_policy(config.retry);
        let generator = Arc::new(LoggingGenerator::new(Arc::new(client)));

        let dispatcher = Self::new(config.math_engine.backend(), generator)
            .with_policy(config.policy)
            .with_cooldown(config.availability_cooldown);

        Ok(if config.wrap_math {
            dispatcher.with_math_templates(Box::new(StdRng::from_entropy()))
        } else {
            dispatcher
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RoutingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resets the availability cache.
    #[must_use]
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.availability = AvailabilityState::new(cooldown);
        self
    }

    /// Wrap successful math answers in a phrase picked with `rng`.
    #[must_use]
    pub fn with_math_templates(mut self, rng: Box<dyn RngCore + Send>) -> Self {
        self.templates = Some(rng);
        self
    }

    pub fn policy(&self) -> RoutingPolicy {
        self.policy
    }

    pub fn availability(&self) -> &AvailabilityState {
        &self.availability
    }

    /// Produce the reply for one input and the history for the next turn.
    pub async fn dispatch(&mut self, input: &str, history: &History) -> Reply {
        let input = input.trim();

        if self.math.classify(input) {
            let (result, ok) = self.math.evaluate_reply(input);
            let text = if ok { self.decorate(&result) } else { result };
            tracing::debug!(engine = %self.math.engine(), ok, "Answered locally");
            return Reply {
                history: history.with_exchange(input, &text),
                text,
                route: Route::Math,
            };
        }

        if self.policy == RoutingPolicy::ProbeThenRoute && !self.generator_available().await {
            tracing::debug!("Generator unavailable, declining free text");
            return Reply {
                text: UNAVAILABLE_REPLY.to_string(),
                history: history.clone(),
                route: Route::Unavailable,
            };
        }

        let generation = self.generator.generate(input, history).await;
        Reply {
            text: generation.text,
            history: generation.history,
            route: Route::Generated,
        }
    }

    /// Cached availability, probing only once the cooldown has elapsed
    async fn generator_available(&mut self) -> bool {
        if self.availability.is_stale(self.clock.now()) {
            let available = self.generator.probe().await;
            self.availability.record(self.clock.now(), available);
        }
        self.availability.cached().unwrap_or(false)
    }

    fn decorate(&mut self, value: &str) -> String {
        let Some(rng) = self.templates.as_mut() else {
            return value.to_string();
        };
        MATH_TEMPLATES
            .choose(rng)
            .map_or_else(|| value.to_string(), |t| t.replace("{}", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::TransportResponse;
    use crate::math::{ExactBackend, MathEngine};
    use crate::testing::{ManualClock, MockGenerator, MockTransport, RecordingSleeper};
    use rand::rngs::mock::StepRng;

    const REPLY: &str = "Ownership is Rust's memory model.";

    fn setup(available: bool) -> (Dispatcher, Arc<MockGenerator>, Arc<ManualClock>) {
        let generator = Arc::new(MockGenerator::new(REPLY, available));
        let clock = Arc::new(ManualClock::new());
        let dispatcher = Dispatcher::new(Box::new(ExactBackend), generator.clone())
            .with_clock(clock.clone());
        (dispatcher, generator, clock)
    }

    #[tokio::test]
    async fn test_math_answered_without_probe() {
        let (mut dispatcher, generator, _) = setup(false);

        let reply = dispatcher.dispatch("2 + 2", &History::default()).await;

        assert_eq!(reply.text, "4");
        assert_eq!(reply.route, Route::Math);
        assert_eq!(reply.history.len(), 1);
        assert_eq!(reply.history.exchanges()[0].response, "4");
        assert_eq!(generator.probe_count(), 0);
        assert!(generator.recorded_prompts().is_empty());
    }

    #[tokio::test]
    async fn test_keyword_phrasing_evaluates() {
        let (mut dispatcher, _, _) = setup(true);
        let reply = dispatcher.dispatch("what is 4 + 4", &History::default()).await;
        assert_eq!(reply.text, "8");
        assert_eq!(reply.route, Route::Math);
    }

    #[tokio::test]
    async fn test_math_failure_stays_local() {
        let (mut dispatcher, generator, _) = setup(true);

        let reply = dispatcher.dispatch("10/0", &History::default()).await;

        assert_eq!(reply.route, Route::Math);
        assert_eq!(
            reply.text,
            "An error occurred while evaluating the expression."
        );
        assert_eq!(generator.probe_count(), 0);
    }

    #[tokio::test]
    async fn test_long_operator_chain_survives() {
        let (mut dispatcher, generator, _) = setup(true);
        let chain = format!("1{}", "+1".repeat(100_000));

        let reply = dispatcher
            .dispatch(&format!("calculate {chain}"), &History::default())
            .await;
        assert_eq!(reply.route, Route::Math);
        assert_eq!(reply.text, "I'm sorry, I couldn't evaluate that expression.");

        let reply = dispatcher.dispatch(&chain, &History::default()).await;
        assert_eq!(reply.route, Route::Generated);
        assert_eq!(generator.recorded_prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_math_is_idempotent() {
        let (mut dispatcher, _, _) = setup(true);
        let first = dispatcher.dispatch("(3 + 4) * 6", &History::default()).await;
        let second = dispatcher.dispatch("(3 + 4) * 6", &first.history).await;
        assert_eq!(first.text, "42");
        assert_eq!(second.text, first.text);
        assert_eq!(second.history.len(), 2);
    }

    #[tokio::test]
    async fn test_templates_wrap_value() {
        let (dispatcher, _, _) = setup(true);
        let mut dispatcher = dispatcher.with_math_templates(Box::new(StepRng::new(0, 0)));

        let reply = dispatcher.dispatch("4 + 4", &History::default()).await;
        assert_eq!(reply.text, "The answer is 8.");

        let failed = dispatcher.dispatch("solve x + 1", &History::default()).await;
        assert_eq!(failed.route, Route::Math);
        assert_eq!(
            failed.text,
            "I'm sorry, I couldn't evaluate that expression because it contains variables."
        );
    }

    #[tokio::test]
    async fn test_seeded_templates_are_deterministic() {
        async fn run(seed: u64) -> Vec<String> {
            let (dispatcher, _, _) = setup(true);
            let mut dispatcher =
                dispatcher.with_math_templates(Box::new(StdRng::seed_from_u64(seed)));
            let mut replies = Vec::new();
            for _ in 0..5 {
                replies.push(dispatcher.dispatch("6 * 7", &History::default()).await.text);
            }
            replies
        }

        let first = run(7).await;
        assert_eq!(first, run(7).await);
        for text in &first {
            assert!(MATH_TEMPLATES.iter().any(|t| t.replace("{}", "42") == *text));
        }
    }

    #[tokio::test]
    async fn test_free_text_generated_when_available() {
        let (mut dispatcher, generator, _) = setup(true);

        let reply = dispatcher
            .dispatch("  tell me about ownership  ", &History::default())
            .await;

        assert_eq!(reply.route, Route::Generated);
        assert_eq!(reply.text, REPLY);
        assert_eq!(reply.history.len(), 1);
        assert_eq!(generator.recorded_prompts(), vec!["tell me about ownership"]);
        assert_eq!(generator.probe_count(), 1);
        assert_eq!(dispatcher.availability().cached(), Some(true));
    }

    #[tokio::test]
    async fn test_question_mark_goes_to_generator() {
        let (mut dispatcher, generator, _) = setup(true);
        let reply = dispatcher.dispatch("is 2+2 4?", &History::default()).await;
        assert_eq!(reply.route, Route::Generated);
        assert_eq!(generator.recorded_prompts(), vec!["is 2+2 4?"]);
    }

    #[tokio::test]
    async fn test_unavailable_apologizes_and_keeps_history() {
        let (mut dispatcher, generator, _) = setup(false);
        let history = History::default().with_exchange("1+1", "2");

        let reply = dispatcher.dispatch("hello there", &history).await;

        assert_eq!(reply.route, Route::Unavailable);
        assert_eq!(reply.text, UNAVAILABLE_REPLY);
        assert_eq!(reply.history, history);
        assert!(generator.recorded_prompts().is_empty());
    }

    #[tokio::test]
    async fn test_probe_cached_within_cooldown() {
        let (mut dispatcher, generator, clock) = setup(true);
        let history = History::default();

        dispatcher.dispatch("hello", &history).await;
        clock.advance(Duration::from_secs(30));
        dispatcher.dispatch("hello again", &history).await;
        assert_eq!(generator.probe_count(), 1);

        clock.advance(Duration::from_secs(30));
        dispatcher.dispatch("still there?", &history).await;
        assert_eq!(generator.probe_count(), 2);
    }

    #[tokio::test]
    async fn test_recovery_seen_after_cooldown() {
        let (mut dispatcher, generator, clock) = setup(false);
        let history = History::default();

        assert_eq!(
            dispatcher.dispatch("hi", &history).await.route,
            Route::Unavailable
        );

        generator.set_available(true);
        assert_eq!(
            dispatcher.dispatch("hi", &history).await.route,
            Route::Unavailable
        );

        clock.advance(Duration::from_secs(60));
        assert_eq!(
            dispatcher.dispatch("hi", &history).await.route,
            Route::Generated
        );
        assert_eq!(generator.probe_count(), 2);
    }

    #[tokio::test]
    async fn test_custom_cooldown() {
        let (dispatcher, generator, clock) = setup(true);
        let mut dispatcher = dispatcher.with_cooldown(Duration::from_secs(5));

        dispatcher.dispatch("hi", &History::default()).await;
        clock.advance(Duration::from_secs(5));
        dispatcher.dispatch("hi", &History::default()).await;

        assert_eq!(generator.probe_count(), 2);
    }

    #[tokio::test]
    async fn test_generate_policy_never_probes() {
        let (dispatcher, generator, _) = setup(false);
        let mut dispatcher = dispatcher.with_policy(RoutingPolicy::MathFirstThenGenerate);

        let reply = dispatcher.dispatch("hello", &History::default()).await;

        assert_eq!(reply.route, Route::Generated);
        assert_eq!(generator.probe_count(), 0);
        assert_eq!(dispatcher.availability().cached(), None);
    }

    #[tokio::test]
    async fn test_continuation_history_untouched_by_math() {
        let (mut dispatcher, _, _) = setup(true);
        let history = History::continuation(vec![50256, 15496]);

        let reply = dispatcher.dispatch("3 * 3", &history).await;

        assert_eq!(reply.text, "9");
        assert_eq!(reply.history, history);
    }

    #[tokio::test]
    async fn test_numeric_engine_dispatch() {
        let generator = Arc::new(MockGenerator::new(REPLY, true));
        let mut dispatcher = Dispatcher::new(MathEngine::Numeric.backend(), generator);
        let reply = dispatcher.dispatch("compute 2 ** 10", &History::default()).await;
        assert_eq!(reply.text, "1024");
    }

    #[tokio::test]
    async fn test_end_to_end_with_inference_client() {
        let transport = Arc::new(MockTransport::new());
        // Probe, then two generations
        transport.queue_response(TransportResponse::new(200, "[]"));
        transport.queue_response(TransportResponse::new(
            200,
            r#"[{"generated_text": "Hello!"}]"#,
        ));
        transport.queue_response(TransportResponse::new(
            200,
            r#"{"generated_text": "Borrowing lends a reference."}"#,
        ));

        let client = InferenceClient::new(transport.clone())
            .with_sleeper(Arc::new(RecordingSleeper::new()));
        let clock = Arc::new(ManualClock::new());
        let mut dispatcher = Dispatcher::new(Box::new(ExactBackend), Arc::new(client))
            .with_clock(clock.clone());

        let first = dispatcher.dispatch("hi", &History::default()).await;
        let math = dispatcher.dispatch("calculate 12 / 4", &first.history).await;
        clock.advance(Duration::from_secs(10));
        let second = dispatcher.dispatch("what about borrowing?", &math.history).await;

        assert_eq!(first.text, "Hello!");
        assert_eq!(math.text, "3");
        assert_eq!(second.text, "Borrowing lends a reference.");
        assert_eq!(second.history.len(), 3);
        assert_eq!(transport.probe_count(), 1);
        assert_eq!(transport.request_count(), 3);
    }

    #[tokio::test]
    async fn test_end_to_end_probe_failure() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_response(TransportResponse::new(503, "loading"));

        let client = InferenceClient::new(transport.clone())
            .with_sleeper(Arc::new(RecordingSleeper::new()));
        let mut dispatcher = Dispatcher::new(Box::new(ExactBackend), Arc::new(client))
            .with_clock(Arc::new(ManualClock::new()));

        let reply = dispatcher.dispatch("hi", &History::default()).await;

        assert_eq!(reply.text, UNAVAILABLE_REPLY);
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn test_from_config_builds() {
        let config = AssistantConfig {
            policy: RoutingPolicy::MathFirstThenGenerate,
            ..AssistantConfig::default()
        };
        let dispatcher = Dispatcher::from_config(&config).unwrap();
        assert_eq!(dispatcher.policy(), RoutingPolicy::MathFirstThenGenerate);
        assert_eq!(
            dispatcher.availability().cooldown(),
            config.availability_cooldown
        );
    }
}
