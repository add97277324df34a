//! Host-side collaborator implementations.
//!
//! [`memory::InMemoryConfigStore`] keeps the configuration mapping in memory only;
//! [`file::FileConfigStore`] wraps it and writes the mapping to a JSON file after every update.
//! [`logs::DirLogSource`] serves CSV logs from a directory, [`memory::InMemoryLogSource`] from a
//! map.
//!
//! Both configuration stores serve the same `get_config()` mapping:
//!
//! ```json
//! {
//!   "plain": { "ap": { "ssid": "freakwan", "pw": "secret123" } },
//!   "decorated": { "ap": { "ssid": "freakwan", "pw": "********" } }
//! }
//! ```
//!
//! Secret values (`pw`, `pass`, `password`, `key`) are masked in the decorated view, and an update
//! that posts a masked value back leaves the stored secret untouched.

pub mod file;
pub mod logs;
pub mod memory;

pub use file::FileConfigStore;
pub use logs::DirLogSource;
pub use memory::{InMemoryConfigStore, InMemoryLogSource};
