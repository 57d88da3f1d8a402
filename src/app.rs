//! Application module: the front-end model shared by the TUI and runtime.
//!
//! `App` holds the browsable catalog, the cursor, the filter and the last
//! playback snapshot observed from the session.

mod model;

pub use model::*;
