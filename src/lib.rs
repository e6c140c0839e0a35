pub mod api_connection;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod ingest;
pub mod match_registry;
pub mod matching;
pub mod nutrition_aggregator;
pub mod nutrition_table;
pub mod recipe;
pub mod recipe_book;
pub mod recipe_store;
pub mod report;
pub mod search;
pub mod storage;
pub mod translation;
