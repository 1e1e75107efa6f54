//! Character browser example - a render loop over a fetching cache.
//!
//! Walks through the whole lifecycle: a cold render that suspends on a
//! simulated API, a warm render answered from cache, and a failing key
//! that reaches the error boundary and is retried after a reset.

use anyhow::Result;
use async_trait::async_trait;
use greenroom::{CacheKey, Coordinator, DataSource, FetchError, Rejection, Store};
use greenroom_runtime::{Boundary, Fallback, RenderError, Scheduler};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Character {
    id: u32,
    name: String,
    description: String,
}

/// Simulated character API with a little latency.
struct CharacterApi;

#[async_trait]
impl DataSource<Vec<Character>> for CharacterApi {
    async fn fetch(&self, key: &CacheKey) -> greenroom::Result<Vec<Character>> {
        tokio::time::sleep(Duration::from_millis(300)).await;

        if key.as_str() != "characters:all" {
            return Err(FetchError::api("Failed to fetch characters"));
        }
        Ok(vec![
            Character {
                id: 1,
                name: "Spider-Man".to_string(),
                description: "Friendly neighborhood wall-crawler".to_string(),
            },
            Character {
                id: 2,
                name: "Iron Man".to_string(),
                description: "Genius billionaire in a flying suit".to_string(),
            },
        ])
    }
}

/// Fallback that plays the role of a loading placeholder.
struct ConsoleFallback;

impl Fallback for ConsoleFallback {
    fn on_suspend(&self, key: &CacheKey) {
        println!("  [fallback] Loading... (waiting on {})", key);
    }

    fn on_resume(&self, key: &CacheKey) {
        println!("  [fallback] {} settled, re-rendering", key);
    }
}

/// Boundary that plays the role of an error screen.
struct ConsoleBoundary;

impl Boundary for ConsoleBoundary {
    fn on_rejection(&self, rejection: &Rejection) {
        println!("  [boundary] Something went wrong: {}", rejection.error);
    }
}

fn render_roster(characters: &[Character]) -> String {
    characters
        .iter()
        .map(|c| format!("  #{} {} - {}", c.id, c.name, c.description))
        .collect::<Vec<_>>()
        .join("\n")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let store = Store::with_ttl(Duration::from_secs(60));
    let coordinator = Coordinator::new(store.clone());
    let api: Arc<CharacterApi> = Arc::new(CharacterApi);
    let scheduler = Scheduler::builder()
        .with_fallback(Arc::new(ConsoleFallback))
        .with_boundary(Arc::new(ConsoleBoundary))
        .build();

    println!("=== Cold render: nothing cached yet ===");
    let roster = scheduler
        .render(|| {
            let characters = coordinator
                .resolve_from("characters:all", &api)
                .into_result()?;
            Ok(render_roster(&characters))
        })
        .await?;
    println!("{}", roster);

    println!("\n=== Warm render: answered from cache, no fetch ===");
    let roster = scheduler
        .render(|| {
            let characters = coordinator
                .resolve_from("characters:all", &api)
                .into_result()?;
            Ok(render_roster(&characters))
        })
        .await?;
    println!("{}", roster);

    println!("\n=== Failing render: unknown key hits the boundary ===");
    let failed = scheduler
        .render(|| {
            let characters = coordinator
                .resolve_from("characters:missing", &api)
                .into_result()?;
            Ok(render_roster(&characters))
        })
        .await;
    match failed {
        Err(RenderError::Rejected(rejection)) => {
            println!("  render ended with: {}", rejection);
            // A retry would fetch again only after an explicit reset.
            coordinator.reset(&"characters:missing".into());
            println!("  key reset; the next render would start a fresh fetch");
        }
        Err(RenderError::Unsettled { passes }) => {
            println!("  render gave up after {} passes", passes);
        }
        Ok(_) => println!("  unexpectedly succeeded"),
    }

    println!("\n=== Store statistics ===");
    println!("{}", serde_json::to_string_pretty(&store.stats())?);

    Ok(())
}
