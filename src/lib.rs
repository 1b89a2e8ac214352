#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_excessive_bools,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::similar_names
)]

//! # Game Store Server
//!
//! A multi-tenant game-distribution and match-hosting platform server:
//! developers publish games, players browse and download them, and rooms
//! coordinate the in-process or subprocess game servers that back a match.
//!
//! Two raw TCP listeners — one for developers, one for players — share a
//! single in-memory catalog, room registry, and presence table. Principal
//! credentials live outside this process entirely; `credential::CredentialClient`
//! speaks the same length-prefixed JSON wire protocol to whatever store is
//! listening on the port passed at startup.

/// Game catalog: publishing, browsing, bundles, reviews.
pub mod catalog;

/// Layered configuration: compiled defaults -> config file -> env vars.
pub mod config;

/// Client to the external credential store.
pub mod credential;

/// Structured logging configuration.
pub mod logging;

/// Metrics collection and reporting.
pub mod metrics;

/// Online/in-room player presence tracking.
pub mod presence;

/// Wire protocol: handshake, request/response frames, actions, error codes.
pub mod protocol;

/// Bounded retry with backoff for transient credential-store failures.
pub mod retry;

/// Room lifecycle: create, join, leave, start, reset.
pub mod room;

/// Connection handling: shared state, endpoint roles, process bootstrap.
pub mod server;

/// Game-server subprocess launching, tracking, and reaping.
pub mod supervisor;

/// Length-prefixed JSON framing over a `TcpStream`.
pub mod transport;
