//! Tandem Server
//!
//! Backend for a language-exchange community: accounts, onboarding,
//! partner recommendations, friend requests and chat tokens.

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod db;
pub mod social;
