//! Page routing: which template renders which URL.

mod route;

pub use route::{PageRoute, RouteError, RouteTable};
