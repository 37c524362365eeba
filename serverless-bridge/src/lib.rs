#![doc = include_str!("../../README.md")]
#![warn(missing_docs)]

// These are documented public exports since the `Container` and `Integration` traits and the
// canonical request/response depend on them.
pub use async_trait;
pub use aws_lambda_events::apigw::ApiGatewayProxyRequestContext;
pub use aws_lambda_events::encodings::Body;
pub use aws_lambda_events::http::{HeaderMap, HeaderName, HeaderValue, Method};
pub use http::{Extensions, StatusCode};
pub use lambda_runtime::{Context as LambdaContext, LambdaEvent};

pub mod apigw;

/// Dynamic base path resolution for greedy API Gateway resources.
pub mod base_path;

pub mod codec;

mod container;

pub use container::Container;

/// Error handling.
pub mod error;

pub use error::{AdapterError, BoxError, LifecycleError};

pub mod openwhisk;

mod request;

pub use request::{Entity, Request};

mod response;

pub use response::Response;

mod router;

pub use router::{PathParams, Router};

mod runtime;

pub use runtime::run_lambda;

pub mod service;

mod shell;

pub use shell::{Integration, Shell, ShellState};

pub mod sns;
