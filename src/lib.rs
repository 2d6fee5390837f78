pub mod checker;
pub mod config;
pub mod db;
pub mod web;
