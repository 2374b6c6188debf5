//! Resolution of cloud instance data as a configuration source.
//!
//! On a cloud instance the user-data document is parsed as a delimited key/value list and
//! registered, together with the well-known instance attributes, as the lowest precedence
//! [property_source::PropertySource]. Outside of a cloud environment nothing is registered.
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod http_client;
pub mod logging;
pub mod metadata;
pub mod parser;
pub mod property_source;
