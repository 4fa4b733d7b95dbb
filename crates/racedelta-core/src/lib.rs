//! # Racedelta Core
//!
//! Aggregation and resilience pipeline for multi-provider race data.
//!
//! ## Overview
//!
//! This crate pulls per-race classification data from several inconsistent,
//! rate-limited upstream providers, reconciles their identity schemes, and
//! derives season analytics:
//!
//! - **Provider gateway** with mirror failover, retry/backoff, and request
//!   budgets
//! - **Layered cache**: a bounded in-memory tier for raw responses plus a
//!   durable tier for expensive composite results
//! - **Identity reconciliation** across provider-specific team and driver
//!   spellings
//! - **Season metrics**, **radar normalization**, **standings**, and
//!   **two-driver timelines**
//! - **Fallback snapshots** so a fully degraded pipeline still answers
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Per-provider JSON parsing seams (Ergast, OpenF1) |
//! | [`cache`] | Bounded in-memory response cache |
//! | [`comparison`] | Latest-event lap comparison |
//! | [`domain`] | Canonical record and payload types |
//! | [`envelope`] | Provenance tagging for responses |
//! | [`error`] | Core error types |
//! | [`fallback`] | Embedded last-known-good datasets |
//! | [`gateway`] | Mirror-failover fetch primitive |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`identity`] | Alias tables and fragment merging |
//! | [`metrics`] | Per-driver season aggregation |
//! | [`points`] | Championship points table |
//! | [`radar`] | Bounded-score normalization |
//! | [`retry`] | Backoff and retry policy |
//! | [`service`] | Public operations, dependency-injected |
//! | [`source`] | Provider identifiers |
//! | [`standings`] | Championship table derivation |
//! | [`throttle`] | Upstream request budgets |
//! | [`timeline`] | Bounded-parallel round timeline builder |
//!
//! ## Error Handling
//!
//! Upstream failure never crosses a component boundary as an error. The
//! gateway's worst outcome is a `Miss`; every service operation returns a
//! payload tagged `live`, `cache`, or `fallback`. The only `Err` surface is
//! pre-I/O input validation ([`ValidationError`]).

pub mod adapters;
pub mod cache;
pub mod comparison;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod fallback;
pub mod gateway;
pub mod http_client;
pub mod identity;
pub mod metrics;
pub mod points;
pub mod radar;
pub mod retry;
pub mod service;
pub mod source;
pub mod standings;
pub mod throttle;
pub mod timeline;

// Re-export commonly used types at crate root for convenience

// Domain types
pub use domain::{
    DriverCode, DriverIdentity, EventComparison, HeadToHead, LapSummary, MetricsBundle,
    PairScore, QualiVsRace, QualifyingResult, RaceClassification, RaceEvent, RadarScore,
    RoundWinner, Season, SeasonMetrics, StandingsEntry, TeamEntry, TeammateComparison,
    TimelineRound, TimelineSeries, UtcDateTime,
};

// Envelope types
pub use envelope::{DataOrigin, Sourced};

// Error types
pub use error::{CoreError, ValidationError};

// Fallback datasets
pub use fallback::FallbackCatalog;

// Gateway and transport
pub use gateway::{FetchOutcome, ProviderGateway};
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
};

// Identity reconciliation
pub use identity::{AliasTable, IdentityFragment, IdentityReconciler};

// Caching
pub use cache::MemoryCache;

// Durable tier (re-exported from racedelta-store)
pub use racedelta_store::{DurableCache, StoreError};

// Points
pub use points::PointsTable;

// Retry logic
pub use retry::{Backoff, RetryConfig};

// Request budgets
pub use throttle::RequestBudget;

// Service
pub use service::{RaceDataService, ServiceConfig};

// Source identifiers
pub use source::ProviderId;

// Timeline building
pub use timeline::{RoundScores, TimelineBuilder};
