// Services module - Business logic

pub mod auth;
pub mod qr_generator;
pub mod redirect;
pub mod scanning;
pub mod short_code;
