//! Checkout
//!
//! Point-of-sale discount evaluation. A [`basket::Basket`] is evaluated against an
//! ordered set of [`rules::Rule`]s; the [`engine::Engine`] resolves conflicts so
//! every item receives at most one discount and prices the result as a
//! [`receipt::Receipt`].

pub mod basket;
pub mod catalog;
pub mod config;
pub mod discounts;
pub mod engine;
pub mod fixtures;
pub mod items;
pub mod logging;
pub mod prelude;
pub mod pricing;
pub mod receipt;
pub mod rules;
