//! CLI command implementations
//!
//! Sequence for every invocation:
//! 1. Load and validate configuration
//! 2. Read and decode stdin, check confirmations
//! 3. Open the store, run the operation, close the store
//! 4. Print one response line

use std::path::Path;

use serde_json::{json, Value};

use crate::config::Config;
use crate::kv::StoreHandle;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::post::{Post, PostDraft, PostId, PostResult, PostService};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// A command with its input already read and decoded.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    Create(PostDraft),
    Get(PostId),
    Update(Post),
    Delete(PostId),
    Share { id: PostId, target: String },
    List(usize),
    Ids,
    Recent(usize),
    Public(PostId),
    Subscribe(String),
    Unsubscribe(String),
    Subscriptions,
    Feed(String),
    Flush,
}

impl Action {
    /// `read_stdin` is only called for commands that take a document.
    fn from_command<F>(cmd: Command, read_stdin: F) -> CliResult<Self>
    where
        F: FnOnce() -> CliResult<Value>,
    {
        Ok(match cmd {
            Command::Create => Action::Create(decode(read_stdin()?)?),
            Command::Get { id } => Action::Get(id),
            Command::Update => Action::Update(decode(read_stdin()?)?),
            Command::Delete { id } => Action::Delete(id),
            Command::Share { id, target } => Action::Share { id, target },
            Command::List { offset } => Action::List(offset),
            Command::Ids => Action::Ids,
            Command::Recent { offset } => Action::Recent(offset),
            Command::Public { id } => Action::Public(id),
            Command::Subscribe { url } => Action::Subscribe(url),
            Command::Unsubscribe { url } => Action::Unsubscribe(url),
            Command::Subscriptions => Action::Subscriptions,
            Command::Feed { url } => Action::Feed(url),
            Command::Flush { yes: false } => return Err(CliError::confirmation_required("flush")),
            Command::Flush { yes: true } => Action::Flush,
        })
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> CliResult<T> {
    serde_json::from_value(value).map_err(|e| CliError::invalid_input(e.to_string()))
}

/// Run one action against the service; the result is the response `data`.
pub(crate) async fn execute(service: &PostService, action: Action) -> PostResult<Value> {
    match action {
        Action::Create(draft) => Ok(json!(service.create(draft).await?)),
        Action::Get(id) => Ok(json!(service.get(id).await?)),
        Action::Update(post) => Ok(json!(service.update(post).await?)),
        Action::Delete(id) => {
            service.del(id).await?;
            Ok(json!({ "deleted": id }))
        }
        Action::Share { id, target } => {
            let source = service.get(id).await?;
            Ok(json!(service.share(&source, &target).await?))
        }
        Action::List(offset) => Ok(json!(service.get_all(offset).await?)),
        Action::Ids => Ok(json!(service.get_all_ids().await?)),
        Action::Recent(offset) => Ok(json!(service.share_recent(offset).await?)),
        Action::Public(id) => Ok(json!(service.share_one(id).await?)),
        Action::Subscribe(url) => Ok(json!({ "subscribed": service.subscribe(&url).await? })),
        Action::Unsubscribe(url) => {
            Ok(json!({ "unsubscribed": service.unsubscribe(&url).await? }))
        }
        Action::Subscriptions => Ok(json!(service.get_subscriptions().await?)),
        Action::Feed(url) => Ok(json!({ "posts": service.get_subscription_recent(&url).await? })),
        Action::Flush => Ok(json!({ "flushed": service.flush().await? })),
    }
}

/// Build the service over an open store. The store is closed again when
/// the service cannot be built.
async fn open_service(store: &StoreHandle, config: &Config) -> CliResult<PostService> {
    match PostService::from_config(store.clone(), config) {
        Ok(service) => Ok(service),
        Err(e) => {
            store.close().await?;
            Err(CliError::boot_failed(e.to_string()))
        }
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches. This is the only function that
/// main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(&cli.config, cli.command)
}

/// Run one command with the configuration at `config_path`
pub fn run_command(config_path: &Path, cmd: Command) -> CliResult<()> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.log_severity()?);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[("data_dir", &config.data_dir), ("username", &config.username)],
    );

    let action = Action::from_command(cmd, read_request::<Value>)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))?;

    let outcome = rt.block_on(async {
        let store = StoreHandle::open_log(config.data_path())?;
        let service = open_service(&store, &config).await?;

        let result = execute(&service, action).await;
        store.close().await?;
        Ok::<_, CliError>(result)
    })?;

    match outcome {
        Ok(data) => write_response(data),
        Err(e) => {
            write_error(e.code(), &e.to_string())?;
            Err(CliError::command_failed(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{FeedError, FeedResult, FeedSource};
    use crate::post::Owner;
    use async_trait::async_trait;
    use std::sync::Arc;

    #[derive(Debug)]
    struct StaticFeed;

    #[async_trait]
    impl FeedSource for StaticFeed {
        async fn fetch(&self, url: &str) -> FeedResult<String> {
            if url == "http://friend.example/" {
                Ok(r#"{"posts": [{"id": 1, "body": "hey"}]}"#.to_string())
            } else {
                Err(FeedError::Status(404))
            }
        }
    }

    fn service() -> PostService {
        let owner = Owner::new("alice", "Alice", "http://alice.example/");
        PostService::new(StoreHandle::in_memory(), owner, Arc::new(StaticFeed)).unwrap()
    }

    fn no_stdin() -> CliResult<Value> {
        panic!("stdin must not be read for this command")
    }

    #[test]
    fn test_flush_requires_confirmation() {
        let err = Action::from_command(Command::Flush { yes: false }, no_stdin).unwrap_err();
        assert_eq!(err.code_str(), "PL_CLI_CONFIRMATION_REQUIRED");

        let action = Action::from_command(Command::Flush { yes: true }, no_stdin).unwrap();
        assert_eq!(action, Action::Flush);
    }

    #[test]
    fn test_create_decodes_stdin() {
        let action = Action::from_command(Command::Create, || {
            Ok(json!({"content": {"body": "hi"}}))
        })
        .unwrap();
        assert_eq!(action, Action::Create(PostDraft::new("hi")));
    }

    #[test]
    fn test_update_rejects_non_post() {
        let err = Action::from_command(Command::Update, || Ok(json!({"body": "x"}))).unwrap_err();
        assert_eq!(err.code_str(), "PL_CLI_INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_execute_create_list_and_share() {
        let svc = service();

        let created = execute(&svc, Action::Create(PostDraft::new("first")))
            .await
            .unwrap();
        assert_eq!(created["id"], 1);
        assert_eq!(created["fullName"], "Alice");

        let shared = execute(
            &svc,
            Action::Share {
                id: 1,
                target: "http://bob.example/".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(shared["id"], 2);
        assert_eq!(shared["meta"]["isShared"], true);

        let page = execute(&svc, Action::List(0)).await.unwrap();
        assert_eq!(page["posts"][0]["id"], 2);
        assert_eq!(page["posts"][1]["id"], 1);
        assert_eq!(page["has_more"], false);

        assert_eq!(execute(&svc, Action::Ids).await.unwrap(), json!([2, 1]));
    }

    #[tokio::test]
    async fn test_execute_feed() {
        let svc = service();
        execute(&svc, Action::Subscribe("HTTP://Friend.example/".into()))
            .await
            .unwrap();

        let feed = execute(&svc, Action::Feed("http://friend.example/".into()))
            .await
            .unwrap();
        assert_eq!(feed["posts"][0]["body"], "hey");

        assert_eq!(
            execute(&svc, Action::Subscriptions).await.unwrap(),
            json!(["http://friend.example/"])
        );
    }

    #[tokio::test]
    async fn test_execute_errors_carry_codes() {
        let svc = service();
        let err = execute(&svc, Action::Get(7)).await.unwrap_err();
        assert_eq!(err.code(), "POST_NOT_FOUND");

        execute(&svc, Action::Create(PostDraft::new("secret").private(true)))
            .await
            .unwrap();
        let err = execute(&svc, Action::Public(1)).await.unwrap_err();
        assert_eq!(err.code(), "POST_PRIVATE");
    }

    #[tokio::test]
    async fn test_failed_service_build_closes_store() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = StoreHandle::open_log(dir.path()).unwrap();
        // Skips validation, so the namespace check is what fails
        let config = Config::new(dir.path().to_string_lossy(), "a!b", "A");

        let err = open_service(&store, &config).await.unwrap_err();
        assert_eq!(err.code_str(), "PL_CLI_BOOT_FAILED");

        let closed = store.get(b"a!b!count".to_vec()).await.unwrap_err();
        assert_eq!(closed.code(), crate::kv::StorageErrorCode::Closed);
    }

    #[test]
    fn test_run_command_missing_config() {
        let err = run_command(Path::new("/nonexistent/postline.json"), Command::Ids).unwrap_err();
        assert_eq!(err.code_str(), "PL_CLI_CONFIG_ERROR");
    }
}
