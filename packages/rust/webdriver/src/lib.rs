//! W3C WebDriver backend for [`nbshelf_discovery::PageDriver`].
//!
//! Talks to a WebDriver server (chromedriver by default) over HTTP. The
//! browser profile given in [`LaunchOptions`](nbshelf_discovery::LaunchOptions)
//! carries the signed-in Google session; nothing here handles login.

mod launcher;
mod protocol;
mod session;

pub use launcher::WebDriverLauncher;
pub use session::WebDriverSession;
