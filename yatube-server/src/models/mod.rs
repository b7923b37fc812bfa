//! Domain models with validation at construction
//!
//! All user input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod group;
pub mod pagination;
pub mod password;
pub mod text;
pub mod username;
pub mod validation;

pub use group::{GroupSlug, GroupTitle};
pub use pagination::{
    Page, Paginator, Pagination, PaginationParams, GROUP_POSTS_PER_PAGE, POSTS_PER_PAGE,
};
pub use password::Password;
pub use text::{short_label, CommentText, PostText};
pub use username::Username;
pub use validation::ValidationError;
