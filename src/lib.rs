//! Async client for the wage-advance REST API, built around a resilient request pipeline:
//! single-flight bearer tokens, token-bucket admission, HMAC request signing, an AES-GCM
//! credential vault, and a retrying transport chain that every outbound call passes through.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod context;
pub mod envelope;
pub mod error;
pub mod http;
pub mod obs;
pub mod store;
pub mod transport;
pub mod vault;

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::{
		context::RequestContext,
		error::{Error, Result},
	};
}

pub use client::{ApiRequest, ApiResponse, Client};
pub use config::ClientConfig;
pub use context::RequestContext;
pub use error::{Error, Result};
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
