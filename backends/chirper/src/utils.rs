pub mod auth;
pub mod extract;
pub mod form;
pub mod hasher;
pub mod jwt;
pub mod password;
