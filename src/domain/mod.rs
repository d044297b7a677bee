pub mod forecast;
pub mod project;
pub mod scenario;
pub mod velocity;
