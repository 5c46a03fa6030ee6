//! Infrastructure layer: sockets, TLS, subprocesses and OS input.

pub mod bootstrap;
pub mod browser;
pub mod credentials;
pub mod http_server;
pub mod input_injection;
pub mod net;
pub mod port;
pub mod tls;
