pub mod env;
pub mod html;
pub mod logging;
pub mod response;
