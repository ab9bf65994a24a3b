//! # RoadHog
//!
//! Typed prompt flows for the RoadHog road trip planner.
//!
//! A flow pairs an input schema, a prompt template, an output schema and an
//! async handler. The executor validates the input, lets the handler render
//! the prompt and call the generative backend, then validates the answer
//! before returning it, so callers never see data that breaks the contract.
//!
//! ## Core Features
//!
//! - **Declarative schemas**: closed object shapes, enums, optional and non-empty fields
//! - **Templates**: handlebars-style prompts with `if`/`unless`/`each`, parsed once
//! - **Typed flows**: serde structs in, serde structs out
//! - **Pluggable backends**: Gemini over `reqwest`, or a scripted mock for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use roadhog::{Config, RoadhogBuilder, flows::{RouteRequest, weather}};
//!
//! let config = Config::create("roadhog.toml")?;
//! let executor = RoadhogBuilder::new().config(config).build()?;
//!
//! let route = RouteRequest::new("Denver, CO", "Moab, UT").via("Grand Junction, CO");
//! let forecast = weather::get_weather_for_route(&executor, &route).await?;
//! ```

pub mod backend;
mod builder;
mod config;
mod error;
pub mod flow;
pub mod flows;
mod model;
mod planner;
pub mod route;
pub mod schema;
pub mod template;
mod utils;

pub use backend::{BackendType, GeminiBackend, GenerateRequest, GenerativeBackend, MockBackend};
pub use builder::RoadhogBuilder;
pub use config::{BackendConfig, Config, MapsConfig};
pub use error::RoadhogError;
pub use flow::{FlowDefinition, FlowExecutor, FlowRegistry, InvocationRecord, InvokePolicy, TypedFlow};
pub use model::FlowModel;
pub use planner::{RouteBriefing, TripPlanner};
pub use schema::{Schema, Violation, ViolationKind};
pub use template::Template;

/// Result type alias for RoadHog operations.
pub type Result<T> = std::result::Result<T, RoadhogError>;
