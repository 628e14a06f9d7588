pub mod app;
pub mod config;
pub mod favourites;
pub mod genres;
pub mod models;
pub mod scroll;
pub mod search;
pub mod storage;
pub mod tmdb;
