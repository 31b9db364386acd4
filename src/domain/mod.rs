pub mod booking;
pub mod content;
pub mod inquiry;
pub mod locale;
pub mod user;

pub use booking::*;
pub use content::*;
pub use inquiry::*;
pub use locale::*;
pub use user::*;
