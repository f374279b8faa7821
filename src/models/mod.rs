// Models module - rows served by the data API

pub mod automation;
pub mod campaign;
pub mod client;
pub mod dynamic_route;
pub mod pass;
pub mod push_request;

pub use automation::Automation;
pub use campaign::Campaign;
pub use client::Client;
pub use dynamic_route::DynamicRoute;
pub use pass::Pass;
pub use push_request::PushRequest;
