//! Data models for the API service

pub mod product;
pub mod user;

pub use product::{CartLine, CreatorInfo, Product, ProductFields, ProductResponse, ProductWithCreator};
pub use user::{NewUser, Role, User};
