//! Readiness and persistence probe for the chat backend stack.
//!
//! Brings the compose stack up, waits for MongoDB, ChromaDB and the backend
//! to become ready, exercises the HTTP surface, creates a conversation and
//! checks that it survives a restart of the datastore and the backend.

pub mod api;
pub mod cli;
pub mod config;
pub mod datastore;
pub mod endpoints;
pub mod error;
pub mod marker;
pub mod models;
pub mod probe;
pub mod runtime;

pub use api::{extract_conversation_id, BackendClient, HttpReply};
pub use config::{ProbeConfig, RunOptions};
pub use datastore::{DocumentStore, MongoStore};
pub use error::{ProbeError, ProbeResult};
pub use marker::MarkerFile;
pub use models::{CollectionCounts, ConversationRecord, CreatedConversation};
pub use probe::{Probe, ProbeContext, ProbeOutcome, ProbeStep, RestartOutcome, SoftWarning};
pub use runtime::{ContainerRuntime, DockerCompose};
