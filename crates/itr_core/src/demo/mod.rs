use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::macros::datetime;
use time::Duration;

use crate::domain::{Incident, IncidentStatus, Severity};
use crate::error::AppError;
use crate::normalize::timestamps::format_timestamp;

pub const DEMO_INCIDENT_COUNT: usize = 200;

const SERVICES: [&str; 20] = [
    "Auth Service",
    "Payment Gateway",
    "User API",
    "Notification Service",
    "Search Engine",
    "Analytics Pipeline",
    "Database Cluster",
    "CDN",
    "Load Balancer",
    "Cache Layer",
    "Message Queue",
    "File Storage",
    "Email Service",
    "SMS Gateway",
    "Recommendation Engine",
    "Video Streaming",
    "API Gateway",
    "Monitoring Service",
    "Logging Service",
    "Backup Service",
];

const OWNERS: [Option<&str>; 12] = [
    Some("Alice Johnson"),
    Some("Bob Smith"),
    Some("Carol Davis"),
    Some("David Wilson"),
    Some("Emma Brown"),
    Some("Frank Miller"),
    Some("Grace Lee"),
    Some("Henry Taylor"),
    Some("Iris Chen"),
    Some("Jack Anderson"),
    None,
    None,
];

const TITLES: [&str; 15] = [
    "Service Downtime",
    "High Latency Detected",
    "Database Connection Pool Exhausted",
    "Memory Leak",
    "API Rate Limit Exceeded",
    "Authentication Failure",
    "Payment Processing Error",
    "Cache Invalidation Issue",
    "Network Timeout",
    "Disk Space Critical",
    "SSL Certificate Expiring",
    "Data Sync Failure",
    "DNS Resolution Error",
    "Queue Processing Delay",
    "Database Replication Lag",
];

const SUMMARY_TEMPLATES: [&str; 5] = [
    "Users reported inability to access the service. Investigation revealed {issue}.",
    "Monitoring alerts triggered for abnormal behavior. Root cause identified as {issue}.",
    "Performance degradation observed across multiple regions. Analysis shows {issue}.",
    "Automated health checks failed. Manual inspection confirmed {issue}.",
    "Production deployment caused unexpected behavior. Rollback initiated due to {issue}.",
];

const ISSUES: [&str; 8] = [
    "misconfigured firewall rules",
    "insufficient capacity planning",
    "memory leak in recent deployment",
    "network congestion",
    "expired credentials",
    "upstream dependency failure",
    "cache stampede",
    "DNS propagation delay",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub by_severity: Vec<(Severity, usize)>,
    pub by_status: Vec<(IncidentStatus, usize)>,
}

fn demo_incident(i: usize) -> Result<Incident, AppError> {
    let service = SERVICES[i % SERVICES.len()];
    // Different strides so severity/status/owner do not lock-step with the service.
    let severity = Severity::ALL[(i / 3) % Severity::ALL.len()];
    let status = IncidentStatus::ALL[(i / 2) % IncidentStatus::ALL.len()];
    let owner = OWNERS[(i * 7) % OWNERS.len()].map(str::to_string);
    let title = format!("{} - {}", TITLES[(i * 11) % TITLES.len()], service);
    let summary = (i % 5 != 0).then(|| {
        SUMMARY_TEMPLATES[(i / 5) % SUMMARY_TEMPLATES.len()]
            .replace("{issue}", ISSUES[(i * 3) % ISSUES.len()])
    });

    // Base time 2026-01-01T00:00:00Z, one incident roughly every 10.6 hours.
    let created = datetime!(2026-01-01 00:00:00 UTC) + Duration::minutes(637 * i as i64);
    let created_at = format_timestamp(created)?;

    Ok(Incident {
        id: uuid::Uuid::new_v4().to_string(),
        title,
        service: service.to_string(),
        severity,
        status,
        owner,
        summary,
        updated_at: created_at.clone(),
        created_at,
    })
}

/// Insert the deterministic demo dataset (content and timestamps are fixed; ids are fresh).
pub fn seed_demo_dataset(conn: &mut Connection) -> Result<SeedSummary, AppError> {
    let tx = conn.transaction().map_err(|e| {
        AppError::new("DB_TX_FAILED", "Failed to start seed transaction").with_details(e.to_string())
    })?;

    let mut incidents = Vec::with_capacity(DEMO_INCIDENT_COUNT);
    for i in 0..DEMO_INCIDENT_COUNT {
        let incident = demo_incident(i)?;
        crate::repo::import_incident(&tx, &incident)?;
        incidents.push(incident);
    }

    tx.commit().map_err(|e| {
        AppError::new("DB_TX_FAILED", "Failed to commit seed transaction").with_details(e.to_string())
    })?;

    let by_severity = Severity::ALL
        .into_iter()
        .map(|s| (s, incidents.iter().filter(|i| i.severity == s).count()))
        .collect();
    let by_status = IncidentStatus::ALL
        .into_iter()
        .map(|s| (s, incidents.iter().filter(|i| i.status == s).count()))
        .collect();

    tracing::info!(inserted = incidents.len(), "seeded demo incidents");
    Ok(SeedSummary {
        inserted: incidents.len(),
        by_severity,
        by_status,
    })
}
