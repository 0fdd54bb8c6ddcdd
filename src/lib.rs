//! Research assistant agent.
//!
//! Web research, activity tracking and report tools behind one registry,
//! driven by an LLM tool-calling loop or served to other agents over MCP.

pub mod agent;
pub mod collab;
pub mod config;
pub mod error;
pub mod llm;
pub mod server;
pub mod state;
pub mod text;
pub mod tools;
pub mod types;
pub mod web;
