//! Recipe-sharing backend.
//!
//! Recipes are composite documents (scalar fields, an ingredient-amount list and a tag set)
//! written through [`recipes::RecipeComposer`]. Users keep favorites, a shopping cart and
//! subscriptions to authors; [`shopping_list::build_shopping_list`] collapses the cart into
//! one quantity-summed ingredient list.
//!
//! Persistence goes through the [`store::Store`] trait: [`store::DatabaseStore`] for
//! PostgreSQL and [`store::MemoryStore`] for tests and local experiments.
#![warn(clippy::all)]

pub mod catalog;
pub mod config;
pub mod database;
pub mod error;
pub mod http;
pub mod membership;
pub mod recipes;
pub mod shopping_list;
pub mod store;
