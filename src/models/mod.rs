mod post;
mod user;

pub use post::Post;
pub use user::{Identity, PublicProfile, Role, SessionUser, User};
