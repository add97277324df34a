//! Captive portal HTTP server.
//!
//! # Routes
//!
//! ## `/` (GET)
//!
//!   Returns HTTP 302 (Found) redirecting to `/config`.
//!
//! ## `/config` (GET)
//!
//!   Returns HTTP 200 (OK) and the portal page read from
//!   [`Config::html_path`][crate::config::Config::html_path]. A built-in page is served when that
//!   file can't be read.
//!
//! ## `/generate_204`, `/hotspot-detect.html`, `/connecttest.txt`, `/redirect` (GET)
//!
//!   The connectivity probes of Android, Apple and Windows clients. All return the `/config` page,
//!   which makes the client open the portal.
//!
//! ## `/log/<type>` (GET)
//!
//!   Returns HTTP 200 (OK) with a `text/csv` body from the
//!   [`LogSource`][crate::collaborators::LogSource], or HTTP 404 (Not Found) if `type` contains
//!   `..` or no such log exists.
//!
//! ## `/scripts/<path>` (GET)
//!
//!   Returns the file at `<path>` below [`Config::scripts_dir`][crate::config::Config::scripts_dir],
//!   or HTTP 404 (Not Found) if `path` contains `..` or the file doesn't exist.
//!
//! ## `/data` (GET)
//!
//!   Returns HTTP 200 (OK) and the `decorated` member of the
//!   [`ConfigStore`][crate::collaborators::ConfigStore] mapping as JSON.
//!
//! ## `/data` (POST)
//!
//!   Expects a JSON object body, e.g.:
//!
//!   ```json
//!   { "ap": { "ssid": "newnet" } }
//!   ```
//!
//!   The decoded object is forwarded verbatim to
//!   [`ConfigStore::update_config`][crate::collaborators::ConfigStore::update_config] and the
//!   response is HTTP 200 (OK) with the body `Config data updated successfully!`. Bodies that
//!   aren't a JSON object get HTTP 400 (Bad Request).
//!
//! ## `/display` (GET)
//!
//!   Invokes the display toggle callback and returns HTTP 200 (OK) with the body
//!   `Display toggled!`, or HTTP 503 (Service Unavailable) if no callback was set.
//!
//! Failed requests other than the redirects get a JSON body of the form
//! `{"error": "<description>"}`.

mod html;
mod http_error;
mod routes;
pub mod server;

pub use server::CaptivePortalHttpServer;
