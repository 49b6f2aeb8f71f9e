//! Headless content management core: a config-driven content model with
//! localized collections and singletons, role-based access control, media
//! uploads and a JSON API served by actix-web.

pub mod accounts;
pub mod app_config;
pub mod auth;
pub mod cms_config;
pub mod content;
pub mod context;
pub mod db;
pub mod error;
pub mod fields;
pub mod ip;
pub mod media;
pub mod model;
pub mod orm;
pub mod rate_limit;
pub mod settings;
pub mod storage;
pub mod web;
