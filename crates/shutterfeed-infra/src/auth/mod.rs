//! `AuthProvider` implementations and the persisted session file they share.

pub mod local;
pub mod session_file;

pub use local::LocalAuthProvider;
pub use session_file::SessionFile;
