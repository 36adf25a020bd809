mod directory;
mod magic;
mod session;

pub use directory::UserDirectory;
pub use magic::MagicLinkIssuer;
pub use session::{Arrival, Sessions, Viewer};
