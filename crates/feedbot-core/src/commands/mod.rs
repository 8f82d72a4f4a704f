//! Command dispatch: trigger table, handler trait and the dispatcher.
//!
//! The registry is built once at startup and shared immutably. Every
//! inbound text is matched against it in registration order; the first
//! matching command runs its handler and the handler's text becomes the
//! reply.

pub mod handlers;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::feeds::{clients_from_config, QuestionSource, QuoteSource};
use handlers::{DailyQuestionHandler, StaticReplyHandler, StockQuoteHandler};

pub const START_TEXT: &str = "Welcome! I'm your helper bot. Use /help to see what I can do.";

pub const HELP_TEXT: &str = "Available commands:
/start - Start the bot
/help - Show this help message
/lc - Get today's LeetCode daily challenge
!s SYMBOL - Get stock price (e.g., !s AAPL)";

/// How a trigger is compared with the inbound text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchMode {
    /// Full-string equality.
    Exact,
    /// Leading-substring match; the remainder is the argument.
    Prefix,
}

/// A trigger and the way it is matched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    trigger: String,
    mode: MatchMode,
}

impl Command {
    pub fn exact(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            mode: MatchMode::Exact,
        }
    }

    pub fn prefix(trigger: impl Into<String>) -> Self {
        Self {
            trigger: trigger.into(),
            mode: MatchMode::Prefix,
        }
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    /// Match `text` case-sensitively and return the argument on success.
    ///
    /// Exact commands always yield an empty argument. A prefix command also
    /// matches its own trigger without the trailing whitespace (`"!s"` for
    /// `"!s "`), since chat clients strip it before sending.
    pub fn matches<'a>(&self, text: &'a str) -> Option<&'a str> {
        match self.mode {
            MatchMode::Exact => (text == self.trigger).then_some(""),
            MatchMode::Prefix => text.strip_prefix(self.trigger.as_str()).or_else(|| {
                let bare = self.trigger.trim_end();
                (!bare.is_empty() && text == bare).then_some("")
            }),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            MatchMode::Exact => write!(f, "{:?} (exact)", self.trigger),
            MatchMode::Prefix => write!(f, "{:?} (prefix)", self.trigger),
        }
    }
}

/// Something that turns a matched command into reply text.
///
/// Handlers report failures in the returned text; they never fail the
/// dispatch itself.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Produce the reply for `args` (empty for exact commands).
    async fn handle(&self, args: &str) -> String;
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("command {0} is already registered")]
    Duplicate(Command),

    #[error("command trigger must not be empty")]
    EmptyTrigger,
}

/// Ordered trigger-to-handler table.
pub struct CommandRegistry {
    entries: Vec<(Command, Arc<dyn CommandHandler>)>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// The bot's standard command set.
    pub fn with_defaults(
        questions: Arc<dyn QuestionSource>,
        quotes: Arc<dyn QuoteSource>,
        site_url: &str,
    ) -> Self {
        let start: Arc<dyn CommandHandler> = Arc::new(StaticReplyHandler::new("start", START_TEXT));
        let help: Arc<dyn CommandHandler> = Arc::new(StaticReplyHandler::new("help", HELP_TEXT));
        let daily: Arc<dyn CommandHandler> =
            Arc::new(DailyQuestionHandler::new(questions, site_url));
        let stock: Arc<dyn CommandHandler> = Arc::new(StockQuoteHandler::new(quotes));

        let mut registry = Self::new();
        let defaults = [
            (Command::exact("/start"), start),
            (Command::exact("/help"), help),
            (Command::exact("/lc"), Arc::clone(&daily)),
            (Command::exact("!lc"), daily),
            (Command::prefix("!s "), stock),
        ];
        for (command, handler) in defaults {
            // Distinct literals above; a clash would be a programming error.
            if let Err(e) = registry.register(command, handler) {
                tracing::error!("Default command table is inconsistent: {}", e);
            }
        }
        registry
    }

    /// Append a command. Trigger and mode together must be unique.
    pub fn register(
        &mut self,
        command: Command,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<(), RegistryError> {
        if command.trigger.is_empty() {
            return Err(RegistryError::EmptyTrigger);
        }
        if self.entries.iter().any(|(c, _)| *c == command) {
            return Err(RegistryError::Duplicate(command));
        }
        debug!(command = %command, handler = handler.name(), "Registered command");
        self.entries.push((command, handler));
        Ok(())
    }

    /// First command matching `text`, with its handler and argument.
    pub fn find<'a>(&self, text: &'a str) -> Option<(&Command, &dyn CommandHandler, &'a str)> {
        self.entries.iter().find_map(|(command, handler)| {
            command
                .matches(text)
                .map(|args| (command, handler.as_ref(), args))
        })
    }

    pub fn commands(&self) -> impl Iterator<Item = &Command> {
        self.entries.iter().map(|(c, _)| c)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// What happens to text that matches no command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UnknownCommandPolicy {
    /// Drop it without replying.
    #[default]
    Silent,
    /// Answer with a fixed message.
    Reply(String),
}

/// Serialized selector for [`UnknownCommandPolicy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCommandMode {
    #[default]
    Silent,
    Reply,
}

pub struct Dispatcher {
    registry: CommandRegistry,
    unknown: UnknownCommandPolicy,
}

impl Dispatcher {
    pub fn new(registry: CommandRegistry, unknown: UnknownCommandPolicy) -> Self {
        Self { registry, unknown }
    }

    /// The default command table wired to the configured feeds.
    pub fn from_config(config: &Config) -> Self {
        let (questions, quotes) = clients_from_config(config);
        let registry =
            CommandRegistry::with_defaults(questions, quotes, &config.feeds.leetcode.site_url);
        Self::new(registry, config.unknown_command_policy())
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Resolve `text` to a command, or to the unknown-command outcome.
    pub fn route<'d, 't>(&'d self, text: &'t str) -> Route<'d, 't> {
        match self.registry.find(text) {
            Some((command, handler, args)) => Route::Command(Matched {
                command,
                handler,
                args,
            }),
            None => Route::Unknown(match &self.unknown {
                UnknownCommandPolicy::Silent => None,
                UnknownCommandPolicy::Reply(reply) => Some(reply.as_str()),
            }),
        }
    }

    /// Run the handler for `text`, or apply the unknown-command policy.
    ///
    /// `None` means nothing should be sent back.
    pub async fn dispatch(&self, text: &str) -> Option<String> {
        match self.route(text) {
            Route::Command(matched) => Some(matched.run().await),
            Route::Unknown(reply) => reply.map(str::to_owned),
        }
    }
}

/// Outcome of matching one inbound text.
pub enum Route<'d, 't> {
    Command(Matched<'d, 't>),
    /// No command matched; carries the reply, if the policy has one.
    Unknown(Option<&'d str>),
}

/// A matched command waiting to run.
pub struct Matched<'d, 't> {
    command: &'d Command,
    handler: &'d dyn CommandHandler,
    args: &'t str,
}

impl Matched<'_, '_> {
    pub fn command(&self) -> &Command {
        self.command
    }

    pub async fn run(self) -> String {
        debug!(command = %self.command, handler = self.handler.name(), "Dispatching command");
        self.handler.handle(self.args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::feeds::{CompanyProfile, DailyQuestion, Quote};
    use std::sync::Mutex;

    /// Records every call so routing can be asserted without a network.
    #[derive(Default)]
    struct RecordingSource {
        questions: Mutex<usize>,
        symbols: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl QuestionSource for RecordingSource {
        async fn fetch_daily_question(&self) -> Result<DailyQuestion, FetchError> {
            *self.questions.lock().unwrap() += 1;
            Ok(DailyQuestion {
                title: "Two Sum".into(),
                title_slug: "two-sum".into(),
                difficulty: "Easy".into(),
            })
        }
    }

    #[async_trait]
    impl QuoteSource for RecordingSource {
        async fn fetch_quote(&self, symbol: &str) -> Result<Quote, FetchError> {
            self.symbols.lock().unwrap().push(symbol.to_owned());
            Ok(Quote {
                current: 10.0,
                ..Default::default()
            })
        }

        async fn fetch_profile(&self, _symbol: &str) -> Result<CompanyProfile, FetchError> {
            Err(FetchError::HttpStatus(403))
        }
    }

    fn dispatcher(source: &Arc<RecordingSource>, unknown: UnknownCommandPolicy) -> Dispatcher {
        let registry = CommandRegistry::with_defaults(
            Arc::clone(source) as Arc<dyn QuestionSource>,
            Arc::clone(source) as Arc<dyn QuoteSource>,
            "https://leetcode.com",
        );
        Dispatcher::new(registry, unknown)
    }

    #[test]
    fn test_exact_match() {
        let cmd = Command::exact("/lc");
        assert_eq!(cmd.matches("/lc"), Some(""));
        assert_eq!(cmd.matches("/lc "), None);
        assert_eq!(cmd.matches("/LC"), None);
        assert_eq!(cmd.matches("/lcx"), None);
    }

    #[test]
    fn test_prefix_match() {
        let cmd = Command::prefix("!s ");
        assert_eq!(cmd.matches("!s aapl"), Some("aapl"));
        assert_eq!(cmd.matches("!s   "), Some("  "));
        assert_eq!(cmd.matches("!s"), Some(""));
        assert_eq!(cmd.matches("!S aapl"), None);
        assert_eq!(cmd.matches("!saapl"), None);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let handler: Arc<dyn CommandHandler> = Arc::new(StaticReplyHandler::new("a", "a"));
        let mut registry = CommandRegistry::new();
        registry
            .register(Command::exact("/x"), Arc::clone(&handler))
            .unwrap();
        // Same trigger under another mode is a different command.
        registry
            .register(Command::prefix("/x"), Arc::clone(&handler))
            .unwrap();

        let err = registry
            .register(Command::exact("/x"), Arc::clone(&handler))
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate(Command::exact("/x")));
        assert_eq!(
            registry.register(Command::exact(""), handler).unwrap_err(),
            RegistryError::EmptyTrigger
        );
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_first_match_wins() {
        let first: Arc<dyn CommandHandler> = Arc::new(StaticReplyHandler::new("first", "1"));
        let second: Arc<dyn CommandHandler> = Arc::new(StaticReplyHandler::new("second", "2"));
        let mut registry = CommandRegistry::new();
        registry.register(Command::prefix("!"), first).unwrap();
        registry.register(Command::exact("!x"), second).unwrap();

        let (_, handler, args) = registry.find("!x").unwrap();
        assert_eq!(handler.name(), "first");
        assert_eq!(args, "x");
    }

    #[test]
    fn test_default_table() {
        let source = Arc::new(RecordingSource::default());
        let d = dispatcher(&source, UnknownCommandPolicy::Silent);
        let triggers: Vec<_> = d.registry().commands().map(|c| c.trigger()).collect();
        assert_eq!(triggers, vec!["/start", "/help", "/lc", "!lc", "!s "]);
    }

    #[tokio::test]
    async fn test_start_routes_only_to_start() {
        let source = Arc::new(RecordingSource::default());
        let d = dispatcher(&source, UnknownCommandPolicy::Silent);

        assert_eq!(d.dispatch("/start").await.as_deref(), Some(START_TEXT));
        assert_eq!(*source.questions.lock().unwrap(), 0);
        assert!(source.symbols.lock().unwrap().is_empty());

        assert_eq!(d.dispatch("/help").await.as_deref(), Some(HELP_TEXT));
    }

    #[tokio::test]
    async fn test_both_daily_triggers_fetch_question() {
        let source = Arc::new(RecordingSource::default());
        let d = dispatcher(&source, UnknownCommandPolicy::Silent);

        let reply = d.dispatch("/lc").await.unwrap();
        assert!(reply.contains("Title: Two Sum"));
        d.dispatch("!lc").await.unwrap();
        assert_eq!(*source.questions.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_stock_argument_is_normalized() {
        let source = Arc::new(RecordingSource::default());
        let d = dispatcher(&source, UnknownCommandPolicy::Silent);

        let reply = d.dispatch("!s  aapl ").await.unwrap();
        assert_eq!(*source.symbols.lock().unwrap(), vec!["AAPL".to_string()]);
        // Profile failure is swallowed.
        assert!(reply.starts_with("AAPL 🟢\n"));
    }

    #[tokio::test]
    async fn test_missing_symbol_skips_fetch() {
        let source = Arc::new(RecordingSource::default());
        let d = dispatcher(&source, UnknownCommandPolicy::Silent);

        for text in ["!s", "!s   "] {
            let reply = d.dispatch(text).await.unwrap();
            assert_eq!(reply, handlers::MISSING_SYMBOL_TEXT);
        }
        assert!(source.symbols.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command_policies() {
        let source = Arc::new(RecordingSource::default());

        let silent = dispatcher(&source, UnknownCommandPolicy::Silent);
        assert_eq!(silent.dispatch("hello there").await, None);
        assert_eq!(silent.dispatch("/START").await, None);

        let verbose = dispatcher(&source, UnknownCommandPolicy::Reply("Unknown command".into()));
        assert_eq!(
            verbose.dispatch("hello there").await.as_deref(),
            Some("Unknown command")
        );
    }

    #[tokio::test]
    async fn test_route_defers_handler_until_run() {
        let source = Arc::new(RecordingSource::default());
        let dispatcher = dispatcher(&source, UnknownCommandPolicy::Silent);

        let Route::Command(matched) = dispatcher.route("!s msft") else {
            panic!("expected a matched command");
        };
        assert_eq!(matched.command(), &Command::prefix("!s "));
        assert!(source.symbols.lock().unwrap().is_empty());

        assert!(matched.run().await.starts_with("MSFT"));
        assert_eq!(*source.symbols.lock().unwrap(), vec!["MSFT"]);

        assert!(matches!(dispatcher.route("hello"), Route::Unknown(None)));
    }
}
