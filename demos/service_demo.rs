//! Walks through the generation and compliance services
//!
//! This example shows how to:
//! - Submit prioritized generation requests and watch them drain
//! - Hit the cache with a duplicate request
//! - Record audit events, scan results and handle a subject request
//! - Print performance metrics and a compliance report
//!
//! Set `RUST_LOG=imagegen_core=debug` for the full trace.

use imagegen_core::compliance::{AuditEvent, NetworkOrigin, SubjectRequestKind};
use imagegen_core::generation::SimulatedProvider;
use imagegen_core::{
    ChannelNotifier, GenerationRequest, Priority, ServiceConfig, ServiceHub, ServiceParts,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "imagegen_core=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = ServiceConfig::from_env()?;
    config.scheduler.drain_interval = Duration::from_millis(100);
    config.scheduler.min_dispatch_interval = Duration::from_millis(100);

    let (notifier, mut notifications) = ChannelNotifier::new();
    let parts = ServiceParts {
        provider: Arc::new(
            SimulatedProvider::new()
                .with_latency_scale(0.02)
                .with_failure_rate(0.2),
        ),
        notifier: Arc::new(notifier),
        ..Default::default()
    };
    let hub = ServiceHub::with_parts(config, parts)?;
    let _tasks = hub.start();

    // 1. Submit requests
    println!("1. Submitting requests...");
    let requests = vec![
        GenerationRequest::new("stability-ai/sdxl", "a lighthouse at dusk", "alice")
            .with_priority(Priority::Low),
        GenerationRequest::new("stability-ai/sdxl", "portrait of an astronaut", "alice")
            .with_priority(Priority::High)
            .with_parameter("qualityRequirement", 0.95),
        GenerationRequest::new("playgroundai/playground-v2.5-1024px-aesthetic", "watercolor fox", "bob")
            .with_parameter("category", "artistic"),
        GenerationRequest::new("bytedance/sdxl-lightning-4step", "sneaker product shot", "bob")
            .with_parameter("category", "commercial")
            .with_parameter("width", 1024),
    ];

    let mut ids = Vec::new();
    for request in requests {
        hub.compliance
            .record(
                AuditEvent::new(&request.user_id, "generation_requested", &request.id)
                    .with_detail("prompt", request.prompt.clone())
                    .with_origin(NetworkOrigin::new("127.0.0.1", "service-demo")),
            )
            .await;
        ids.push(hub.scheduler.submit(request).await);
    }
    println!("   Queue: {:?}\n", hub.scheduler.queued_ids().await);

    // 2. Wait for the drain loop
    println!("2. Draining...");
    while hub.scheduler.queue_len().await > 0 {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tokio::time::sleep(Duration::from_millis(500)).await;

    for id in &ids {
        match hub.scheduler.status(id).await {
            Some(result) => println!(
                "   {} -> {} on {} ({})",
                id,
                result.status,
                result.model_id.as_deref().unwrap_or("-"),
                result.image_ref.as_deref().or(result.error.as_deref()).unwrap_or("-"),
            ),
            None => println!("   {} -> still queued", id),
        }
    }
    while let Ok(notification) = notifications.try_recv() {
        println!("   [{}] {}", notification.level, notification.message);
    }
    println!();

    // 3. Duplicate submission
    println!("3. Resubmitting an identical request...");
    let duplicate = GenerationRequest::new("bytedance/sdxl-lightning-4step", "sneaker product shot", "carol")
        .with_parameter("width", 1024)
        .with_parameter("category", "commercial");
    let duplicate_id = hub.scheduler.submit(duplicate).await;
    println!("   Returned id {} (queue length {})\n", duplicate_id, hub.scheduler.queue_len().await);

    // 4. Content scans
    println!("4. Scanning generated images...");
    for id in &ids {
        if let Some(image) = hub.scheduler.status(id).await.and_then(|r| r.image_ref) {
            let scan = hub.compliance.scan(&image).await;
            println!("   {} passed={} {:?}", scan.id, scan.passed, scan.flagged_reasons);
        }
    }
    println!();

    // 5. Subject requests
    println!("5. Handling subject requests for bob...");
    let export = hub
        .compliance
        .handle_subject_request("bob", SubjectRequestKind::Portability)
        .await;
    println!("   Exported {} entries", export.entries().len());
    let erased = hub
        .compliance
        .handle_subject_request("bob", SubjectRequestKind::Delete)
        .await;
    println!("   {:?}\n", erased);

    // 6. Metrics and report
    println!("6. Metrics");
    println!("   {}", hub.cache.statistics().await);
    println!("   {:?}", hub.scheduler.metrics().await);
    for hint in hub.scheduler.cost_optimization_hints().await {
        println!("   hint: {}", hint);
    }

    let report = hub.compliance.compliance_report().await;
    println!("\n{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
