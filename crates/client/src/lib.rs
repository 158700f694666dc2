//! Offline caching worker for the spritz cocktail catalog.
//!
//! This crate provides the network seam ([`Fetcher`]), the worker that
//! intercepts requests and applies caching strategies ([`OfflineWorker`]),
//! and the registration that swaps worker versions ([`Registration`]).

pub mod fetch;
pub mod register;
pub mod worker;

pub use fetch::{FetchConfig, FetchError, Fetcher, HttpFetcher, Request, Response};
pub use register::{ReloadPrompt, Registration, UPDATE_PROMPT, UpdateOutcome, UpdateSource};
pub use worker::{AssetClass, BucketNames, Classifier, OfflineWorker, Strategy, WorkerState};
