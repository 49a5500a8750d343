mod output;

pub use output::{display_error, display_reply, display_sessions, display_tools};
