pub mod body;
pub mod coerce;
pub mod config;
pub mod context;
pub mod controller;
pub mod cookie;
pub mod exception;
pub mod finalizer;
pub mod param;
pub mod request;
pub mod response;
pub mod schema;
pub mod server;
pub mod transport;
pub mod upload;
pub mod util;

pub use config::Config;
pub use context::RequestContext;
pub use controller::{Controller, Renderer};
pub use cookie::CookieOptions;
pub use exception::Exception;
pub use finalizer::{finalize, TerminalAction};
pub use param::{ContentType, HttpRequestMethod, HttpVersion};
pub use request::Request;
pub use response::{ResponseMode, ResponseState};
pub use schema::{bind_form, Field, Schema};
pub use server::{handle_connection, App};
pub use transport::{BufferedTransport, Transport};
pub use upload::{Files, UploadedFile};
pub use util::HtmlBuilder;
