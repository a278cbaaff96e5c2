pub mod blog_post;
pub mod campaign;
pub mod theme;
